//! Shared announcement logic for every observable value.

use herald_bus::{Bus, Event, EventSource};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, trace};

use crate::error::PropertyResult;

/// Where and how an observable value announces its changes.
///
/// A notifier carries the value's name, the source stamped on its events,
/// an optional bus and the `constrained` flag. Without a bus nothing is
/// published and nothing can be vetoed. When constrained, every change is
/// first proposed with a vetoable event.
///
/// ```rust
/// use herald_bus::{Bus, EventSource, kinds};
/// use herald_props::Notifier;
///
/// let bus = Bus::new();
/// let notifier = Notifier::new("title")
///     .with_bus(&bus)
///     .with_source(EventSource::new(kinds::ANY, "document"))
///     .constrained();
///
/// assert_eq!(notifier.name(), "title");
/// assert!(notifier.is_constrained());
/// ```
#[derive(Debug, Clone)]
pub struct Notifier {
    name: String,
    source: Option<EventSource>,
    bus: Option<Bus>,
    constrained: bool,
}

impl Notifier {
    /// A detached, unconstrained notifier.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: None,
            bus: None,
            constrained: false,
        }
    }

    /// Publish on `bus`.
    #[must_use]
    pub fn with_bus(mut self, bus: &Bus) -> Self {
        self.bus = Some(bus.clone());
        self
    }

    /// Stamp events with `source`.
    #[must_use]
    pub fn with_source(mut self, source: EventSource) -> Self {
        self.source = Some(source);
        self
    }

    /// Propose every change with a vetoable event first.
    #[must_use]
    pub fn constrained(mut self) -> Self {
        self.constrained = true;
        self
    }

    /// The value's name, used as the events' attribute name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The source stamped on events.
    #[must_use]
    pub fn source(&self) -> Option<&EventSource> {
        self.source.as_ref()
    }

    /// The bus events go to.
    #[must_use]
    pub fn bus(&self) -> Option<&Bus> {
        self.bus.as_ref()
    }

    /// Replace or detach the bus.
    pub fn set_bus(&mut self, bus: Option<Bus>) {
        self.bus = bus;
    }

    /// Whether changes are proposed before they are made.
    #[must_use]
    pub fn is_constrained(&self) -> bool {
        self.constrained
    }

    /// Publish the vetoable proposal built by `build`, if constrained and
    /// attached.
    pub(crate) fn propose(
        &self,
        build: impl FnOnce(Option<EventSource>) -> Event,
    ) -> PropertyResult<()> {
        let Some(bus) = self.bus.as_ref().filter(|_| self.constrained) else {
            return Ok(());
        };

        let event = build(self.source.clone());
        if let Err(err) = bus.publish(event) {
            if let Some(veto) = err.as_veto() {
                debug!(property = %self.name, reason = %veto.reason(), "Change vetoed");
            }
            return Err(err.into());
        }
        Ok(())
    }

    /// Publish the confirmation built by `build`, if attached.
    pub(crate) fn announce(
        &self,
        build: impl FnOnce(Option<EventSource>) -> Event,
    ) -> PropertyResult<()> {
        let Some(bus) = &self.bus else {
            return Ok(());
        };

        let event = build(self.source.clone());
        trace!(property = %self.name, event_kind = %event.kind(), "Announcing change");
        bus.publish(event)?;
        Ok(())
    }

    /// Whether any event would be published.
    pub(crate) fn is_attached(&self) -> bool {
        self.bus.is_some()
    }
}

/// Convert a value to an event payload.
pub(crate) fn to_payload<T: Serialize + ?Sized>(value: &T) -> PropertyResult<Value> {
    Ok(serde_json::to_value(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use herald_bus::kinds;
    use herald_test::{Journal, RecordingSubscriber};
    use serde_json::json;

    #[test]
    fn test_detached_notifier_publishes_nothing() {
        let notifier = Notifier::new("x").constrained();
        assert!(!notifier.is_attached());
        notifier
            .propose(|_| panic!("no proposal without a bus"))
            .unwrap();
        notifier
            .announce(|_| panic!("no announcement without a bus"))
            .unwrap();
    }

    #[test]
    fn test_unconstrained_notifier_skips_proposal() {
        let bus = Bus::new();
        let journal = Journal::new();
        let recorder = RecordingSubscriber::new("all", &journal);
        bus.register(&recorder).unwrap();

        let notifier = Notifier::new("x").with_bus(&bus);
        notifier
            .propose(|_| panic!("unconstrained values are not proposed"))
            .unwrap();
        notifier
            .announce(|source| Event::property_change(source, "x", json!(1), json!(2)))
            .unwrap();

        assert_eq!(journal.entries(), vec!["all:property_change"]);
    }

    #[test]
    fn test_source_is_stamped() {
        let bus = Bus::new();
        let journal = Journal::new();
        let recorder = RecordingSubscriber::new("all", &journal);
        bus.register(&recorder).unwrap();

        let notifier = Notifier::new("x")
            .with_bus(&bus)
            .with_source(EventSource::new(kinds::ANY, "model"))
            .constrained();
        notifier
            .propose(|source| Event::vetoable_property_change(source, "x", json!(1), json!(2)))
            .unwrap();

        let events = recorder.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].source().map(EventSource::id), Some("model"));
    }

    #[test]
    fn test_set_bus_detaches() {
        let bus = Bus::new();
        let mut notifier = Notifier::new("x").with_bus(&bus);
        assert!(notifier.bus().is_some_and(|b| b.ptr_eq(&bus)));

        notifier.set_bus(None);
        assert!(!notifier.is_attached());
    }
}
