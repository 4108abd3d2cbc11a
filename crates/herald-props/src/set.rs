//! An observable set.

use std::collections::HashSet;
use std::hash::Hash;

use herald_bus::{Bus, ChangeType, Event};
use serde::Serialize;

use crate::error::PropertyResult;
use crate::notifier::{Notifier, to_payload};

/// An unordered set that announces each insertion and removal.
///
/// Only actual changes are announced: inserting a present element or
/// removing an absent one publishes nothing, not even a proposal, so a
/// vetoing handler never sees (and cannot reject) a no-op. The other
/// observable values behave the same way for equal values.
#[derive(Debug, Clone)]
pub struct SetProperty<T> {
    notifier: Notifier,
    values: HashSet<T>,
}

impl<T> SetProperty<T>
where
    T: Serialize + Clone + Eq + Hash,
{
    /// An empty set.
    #[must_use]
    pub fn new(notifier: Notifier) -> Self {
        Self {
            notifier,
            values: HashSet::new(),
        }
    }

    /// Add `value`. Returns whether it was absent.
    ///
    /// # Errors
    ///
    /// Returns the veto if a handler rejected the insertion, or any other
    /// publish failure.
    pub fn insert(&mut self, value: T) -> PropertyResult<bool> {
        if self.values.contains(&value) {
            return Ok(false);
        }
        self.change(value, ChangeType::Insert)
    }

    /// Remove `value`. Returns whether it was present.
    ///
    /// # Errors
    ///
    /// Returns the veto if a handler rejected the removal, or any other
    /// publish failure.
    pub fn remove(&mut self, value: &T) -> PropertyResult<bool> {
        if !self.values.contains(value) {
            return Ok(false);
        }
        self.change(value.clone(), ChangeType::Delete)
    }

    fn change(&mut self, value: T, change: ChangeType) -> PropertyResult<bool> {
        let payload = to_payload(&value)?;
        let name = self.notifier.name();
        self.notifier.propose(|source| {
            Event::vetoable_set_change(source, name, payload.clone(), change)
        })?;

        match change {
            ChangeType::Insert => self.values.insert(value),
            ChangeType::Delete => self.values.remove(&value),
        };

        self.notifier
            .announce(|source| Event::set_change(source, name, payload, change))?;
        Ok(true)
    }

    /// Add every element of `values`. Returns whether any was absent.
    ///
    /// # Errors
    ///
    /// Stops at the first rejected insertion.
    pub fn extend(&mut self, values: impl IntoIterator<Item = T>) -> PropertyResult<bool> {
        let mut changed = false;
        for value in values {
            changed |= self.insert(value)?;
        }
        Ok(changed)
    }

    /// Remove every one of `values`. Returns whether any was present.
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
            changed |= self.remove(value)?;
        }
        Ok(changed)
    }

    /// Remove every element.
    ///
    /// # Errors
    ///
    /// Stops at the first rejected removal.
    pub fn clear(&mut self) -> PropertyResult<()> {
        self.retain(|_| false)
    }

    /// Remove every element for which `keep` returns `false`.
    ///
    /// # Errors
    ///
    /// Stops at the first rejected removal.
    pub fn retain(&mut self, mut keep: impl FnMut(&T) -> bool) -> PropertyResult<()> {
        let doomed: Vec<T> = self.values.iter().filter(|v| !keep(*v)).cloned().collect();
        for value in &doomed {
            self.remove(value)?;
        }
        Ok(())
    }

    /// Whether `value` is present.
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

    /// Number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// A copy of the elements, in no particular order.
    #[must_use]
    pub fn values(&self) -> Vec<T> {
        self.values.iter().cloned().collect()
    }

    /// Iterate over the elements, in no particular order.
    pub fn iter(&self) -> std::collections::hash_set::Iter<'_, T> {
        self.values.iter()
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
