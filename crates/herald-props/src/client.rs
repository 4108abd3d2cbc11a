//! Free-form keyed values attached to a model object.

use std::collections::HashMap;

use herald_bus::{Bus, Event};
use serde_json::Value;

use crate::error::{PropertyError, PropertyResult};
use crate::notifier::Notifier;

/// A bag of named JSON values, each behaving like a [`Property`](crate::Property)
/// whose name is its key.
///
/// Clearing a key and leaving it unset are the same thing: both read back
/// as `None` and appear as `null` in events.
#[derive(Debug, Clone)]
pub struct ClientProperties {
    notifier: Notifier,
    values: HashMap<String, Value>,
}

impl ClientProperties {
    /// An empty bag. The notifier's name is only used in logs; events are
    /// named after the key being changed.
    #[must_use]
    pub fn new(notifier: Notifier) -> Self {
        Self {
            notifier,
            values: HashMap::new(),
        }
    }

    /// Set (`Some`) or clear (`None`) the value under `key`.
    ///
    /// Returns `false` if nothing changed.
    ///
    /// # Errors
    ///
    /// Returns [`PropertyError::EmptyKey`] for an empty key, the veto if a
    /// handler rejected the change, or any other publish failure.
    pub fn set(&mut self, key: &str, value: Option<Value>) -> PropertyResult<bool> {
        if key.is_empty() {
            return Err(PropertyError::EmptyKey);
        }

        let old = self.values.get(key).cloned();
        if old == value {
            return Ok(false);
        }

        let old_payload = old.unwrap_or(Value::Null);
        let new_payload = value.clone().unwrap_or(Value::Null);

        self.notifier.propose(|source| {
            Event::vetoable_property_change(
                source,
                key,
                old_payload.clone(),
                new_payload.clone(),
            )
        })?;

        match value {
            Some(value) => self.values.insert(key.to_string(), value),
            None => self.values.remove(key),
        };

        self.notifier.announce(|source| {
            Event::property_change(source, key, old_payload, new_payload)
        })?;
        Ok(true)
    }

    /// The value under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Whether a value is set under `key`.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// The keys that hold a value, sorted.
    #[must_use]
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<_> = self.values.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }

    /// Number of keys holding a value.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no key holds a value.
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
