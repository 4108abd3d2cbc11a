//! An observable list.

use herald_bus::{Bus, ChangeType, Event};
use serde::Serialize;

use crate::error::{PropertyError, PropertyResult};
use crate::notifier::{Notifier, to_payload};

/// An ordered list that announces each insertion and removal.
///
/// Every mutation goes through a single-element insert or remove, each of
/// which is proposed with a `vetoable_list_change` when constrained and
/// confirmed with a `list_change` carrying the element, its position and
/// the [`ChangeType`].
#[derive(Debug, Clone)]
pub struct ListProperty<T> {
    notifier: Notifier,
    values: Vec<T>,
}

impl<T> ListProperty<T>
where
    T: Serialize + Clone + PartialEq,
{
    /// An empty list.
    #[must_use]
    pub fn new(notifier: Notifier) -> Self {
        Self {
            notifier,
            values: Vec::new(),
        }
    }

    /// Insert `value` at `index`, shifting later elements right.
    ///
    /// # Errors
    ///
    /// Returns [`PropertyError::IndexOutOfBounds`] if `index > len`, the veto
    /// if a handler rejected the insertion, or any other publish failure.
    pub fn insert(&mut self, index: usize, value: T) -> PropertyResult<()> {
        if index > self.values.len() {
            return Err(PropertyError::IndexOutOfBounds {
                index,
                len: self.values.len(),
            });
        }

        let payload = to_payload(&value)?;
        let name = self.notifier.name();
        self.notifier.propose(|source| {
            Event::vetoable_list_change(source, name, payload.clone(), index, ChangeType::Insert)
        })?;

        self.values.insert(index, value);

        self.notifier.announce(|source| {
            Event::list_change(source, name, payload, index, ChangeType::Insert)
        })
    }

    /// Append `value`.
    ///
    /// # Errors
    ///
    /// See [`insert`](Self::insert).
    pub fn push(&mut self, value: T) -> PropertyResult<()> {
        self.insert(self.values.len(), value)
    }

    /// Append every element of `values`, one event pair at a time.
    ///
    /// # Errors
    ///
    /// Stops at the first rejected element; earlier ones stay appended.
    pub fn extend(&mut self, values: impl IntoIterator<Item = T>) -> PropertyResult<()> {
        for value in values {
            self.push(value)?;
        }
        Ok(())
    }

    /// Remove and return the element at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`PropertyError::IndexOutOfBounds`] if `index >= len`, the
    /// veto if a handler rejected the removal, or any other publish failure.
    pub fn remove(&mut self, index: usize) -> PropertyResult<T> {
        let Some(value) = self.values.get(index) else {
            return Err(PropertyError::IndexOutOfBounds {
                index,
                len: self.values.len(),
            });
        };

        let payload = to_payload(value)?;
        let name = self.notifier.name();
        self.notifier.propose(|source| {
            Event::vetoable_list_change(source, name, payload.clone(), index, ChangeType::Delete)
        })?;

        let removed = self.values.remove(index);

        self.notifier.announce(|source| {
            Event::list_change(source, name, payload, index, ChangeType::Delete)
        })?;
        Ok(removed)
    }

    /// Remove the first element equal to `value`.
    ///
    /// Returns `false` if there was none.
    ///
    /// # Errors
    ///
    /// See [`remove`](Self::remove).
    pub fn remove_value(&mut self, value: &T) -> PropertyResult<bool> {
        match self.index_of(value) {
            Some(index) => self.remove(index).map(|_| true),
            None => Ok(false),
        }
    }

    /// Remove the first occurrence of each of `values`.
    ///
    /// Returns whether anything was removed.
    ///
    /// # Errors
    ///
    /// Stops at the first rejected removal.
    pub fn remove_all<'a>(&mut self, values: impl IntoIterator<Item = &'a T>) -> PropertyResult<bool>
    where
        T: 'a,
    {
        let mut changed = false;
        for value in values {
            changed |= self.remove_value(value)?;
        }
        Ok(changed)
    }

    /// Remove every element, front to back.
    ///
    /// # Errors
    ///
    /// Stops at the first rejected removal; the remaining elements stay.
    pub fn clear(&mut self) -> PropertyResult<()> {
        while !self.values.is_empty() {
            self.remove(0)?;
        }
        Ok(())
    }

    /// Remove every element for which `keep` returns `false`.
    ///
    /// # Errors
    ///
    /// Stops at the first rejected removal.
    pub fn retain(&mut self, mut keep: impl FnMut(&T) -> bool) -> PropertyResult<()> {
        let mut index = 0;
        while let Some(value) = self.values.get(index) {
            if keep(value) {
                index = index.saturating_add(1);
            } else {
                self.remove(index)?;
            }
        }
        Ok(())
    }

    /// The element at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&T> {
        self.values.get(index)
    }

    /// Number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the list is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Whether an element equals `value`.
    #[must_use]
    pub fn contains(&self, value: &T) -> bool {
        self.values.contains(value)
    }

    /// Whether every one of `values` is present.
    pub fn contains_all<'a>(&self, values: impl IntoIterator<Item = &'a T>) -> bool
    where
        T: 'a,
    {
        values.into_iter().all(|value| self.contains(value))
    }

    /// Position of the first element equal to `value`.
    #[must_use]
    pub fn index_of(&self, value: &T) -> Option<usize> {
        self.values.iter().position(|v| v == value)
    }

    /// Position of the last element equal to `value`.
    #[must_use]
    pub fn last_index_of(&self, value: &T) -> Option<usize> {
        self.values.iter().rposition(|v| v == value)
    }

    /// Iterate over the elements. Use [`retain`](Self::retain) to remove
    /// while walking the list.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.values.iter()
    }

    /// The elements as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        &self.values
    }

    /// The value's notifier.
    #[must_use]
    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    /// Replace or detach the bus.
    pub fn set_bus(&mut self, bus: Option<Bus>) {
        self.notifier.set_bus(bus);
    }
}

impl<'a, T> IntoIterator for &'a ListProperty<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}
