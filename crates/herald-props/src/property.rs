//! A single observable value.

use herald_bus::{Bus, Event};
use serde::Serialize;

use crate::error::PropertyResult;
use crate::notifier::{Notifier, to_payload};

/// A value that announces every change on its bus.
///
/// Setting an equal value does nothing. Otherwise, if the property is
/// constrained, a `vetoable_property_change` is published first and a veto
/// leaves the value untouched. Then the value is replaced and a
/// `property_change` carrying the old and new value is published.
#[derive(Debug, Clone)]
pub struct Property<T> {
    notifier: Notifier,
    value: T,
}

impl<T> Property<T>
where
    T: Serialize + Clone + PartialEq,
{
    /// Create a property with an initial value. No event is published.
    #[must_use]
    pub fn new(notifier: Notifier, value: T) -> Self {
        Self { notifier, value }
    }

    /// The current value.
    #[must_use]
    pub fn value(&self) -> &T {
        &self.value
    }

    /// Replace the value.
    ///
    /// Returns `false` if `value` equals the current value.
    ///
    /// # Errors
    ///
    /// Returns the veto if a handler rejected the proposal, in which case
    /// the value is unchanged. Returns any other publish failure from the
    /// confirmation, in which case the value has already changed.
    pub fn set_value(&mut self, value: T) -> PropertyResult<bool> {
        if value == self.value {
            return Ok(false);
        }
        if !self.notifier.is_attached() {
            self.value = value;
            return Ok(true);
        }

        let old_payload = to_payload(&self.value)?;
        let new_payload = to_payload(&value)?;
        let name = self.notifier.name();

        self.notifier.propose(|source| {
            Event::vetoable_property_change(
                source,
                name,
                old_payload.clone(),
                new_payload.clone(),
            )
        })?;

        self.value = value;

        self.notifier.announce(|source| {
            Event::property_change(source, name, old_payload, new_payload)
        })?;
        Ok(true)
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

    /// Consume the property, keeping only the value.
    #[must_use]
    pub fn into_value(self) -> T {
        self.value
    }
}
