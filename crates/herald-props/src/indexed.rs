//! An observable sparse array.

use std::collections::BTreeMap;

use herald_bus::{Bus, Event};
use serde::Serialize;

use crate::error::PropertyResult;
use crate::notifier::{Notifier, to_payload};

/// A sparse array whose slots announce their changes individually.
///
/// Each slot behaves like a [`Property`](crate::Property): changing it to an
/// equal value does nothing, a constrained property proposes the change
/// first, and every change is confirmed with an `indexed_property_change`
/// naming the slot. An empty slot appears as `null` in event payloads.
#[derive(Debug, Clone)]
pub struct IndexedProperty<T> {
    notifier: Notifier,
    values: BTreeMap<usize, T>,
}

impl<T> IndexedProperty<T>
where
    T: Serialize + Clone + PartialEq,
{
    /// An empty indexed property.
    #[must_use]
    pub fn new(notifier: Notifier) -> Self {
        Self {
            notifier,
            values: BTreeMap::new(),
        }
    }

    /// The value in slot `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&T> {
        self.values.get(&index)
    }

    /// Fill (`Some`) or clear (`None`) slot `index`.
    ///
    /// Returns `false` if the slot already held an equal value.
    ///
    /// # Errors
    ///
    /// Returns the veto if a handler rejected the proposal, leaving the slot
    /// unchanged, or any other publish failure.
    pub fn set(&mut self, index: usize, value: Option<T>) -> PropertyResult<bool> {
        let old = self.values.get(&index).cloned();
        if old == value {
            return Ok(false);
        }

        let old_payload = to_payload(&old)?;
        let new_payload = to_payload(&value)?;
        let name = self.notifier.name();

        self.notifier.propose(|source| {
            Event::vetoable_indexed_property_change(
                source,
                name,
                old_payload.clone(),
                new_payload.clone(),
                index,
            )
        })?;

        match value {
            Some(value) => self.values.insert(index, value),
            None => self.values.remove(&index),
        };

        self.notifier.announce(|source| {
            Event::indexed_property_change(source, name, old_payload, new_payload, index)
        })?;
        Ok(true)
    }

    /// Replace the whole array with `values`.
    ///
    /// Slot `i` is set to `values[i]`, then every slot at or past
    /// `values.len()` is cleared, each with its own events.
    ///
    /// # Errors
    ///
    /// Stops at the first failing slot; earlier slots keep their new values.
    pub fn set_all(&mut self, values: &[T]) -> PropertyResult<()> {
        for (index, value) in values.iter().enumerate() {
            self.set(index, Some(value.clone()))?;
        }

        let stale: Vec<usize> = self.values.range(values.len()..).map(|(i, _)| *i).collect();
        for index in stale {
            self.set(index, None)?;
        }
        Ok(())
    }

    /// A dense copy, from slot 0 to the highest filled slot.
    #[must_use]
    pub fn to_vec(&self) -> Vec<Option<T>> {
        let Some(&last) = self.values.keys().next_back() else {
            return Vec::new();
        };
        (0..=last).map(|i| self.values.get(&i).cloned()).collect()
    }

    /// Number of filled slots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no slot is filled.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
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
