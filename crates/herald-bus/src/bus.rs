//! The message bus: registration, dispatch and escalation.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fmt;
use std::rc::{Rc, Weak};

use tracing::{Level, debug, trace, warn};

use crate::config::BusConfig;
use crate::error::{ConfigResult, HandlerError, PublishError, PublishResult};
use crate::event::Event;
use crate::registry::{Registry, Removed};
use crate::subscriber::{Delivery, Descriptor, Subscriber, extract, identity};

const UNNAMED: &str = "bus";

/// A single-threaded message bus.
///
/// `Bus` is a cheap handle: clones share the same registry, staging area
/// and pending queue, so handlers, observable values and child buses can
/// each hold one.
///
/// Subscribers are tracked through weak handles. The bus never keeps a
/// subscriber alive; once the last `Rc` to it is dropped its handlers stop
/// receiving events and are pruned on the next sweep.
///
/// A handler may call back into the bus. Registrations and unregistrations
/// made while a dispatch pass is running are staged and applied when the
/// pass ends; events published while a pass is running are queued and
/// delivered, in order, after it.
///
/// **WARNING:** a handler closure that captures a `Bus` creates an `Rc`
/// cycle through the bus's own registry. Capture a [`WeakBus`] instead, or
/// keep the bus in the subscriber's fields.
#[derive(Clone)]
pub struct Bus {
    inner: Rc<BusInner>,
}

struct BusInner {
    config: BusConfig,
    registry: RefCell<Registry>,
    pending: RefCell<VecDeque<Rc<Event>>>,
    dispatching: Cell<bool>,
    parent: Option<Bus>,
}

impl Bus {
    /// Create a root bus.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(BusConfig::default(), None)
    }

    /// Create a bus whose unconsumed events escalate to `parent`.
    ///
    /// The parent's own events never reach this bus. The chain of parents
    /// must not form a cycle.
    #[must_use]
    pub fn with_parent(parent: &Bus) -> Self {
        Self::with_config(BusConfig::default(), Some(parent))
    }

    /// Create a bus from a configuration and an optional parent.
    #[must_use]
    pub fn with_config(config: BusConfig, parent: Option<&Bus>) -> Self {
        Self {
            inner: Rc::new(BusInner {
                config,
                registry: RefCell::new(Registry::new()),
                pending: RefCell::new(VecDeque::new()),
                dispatching: Cell::new(false),
                parent: parent.cloned(),
            }),
        }
    }

    /// Register every handler in `subscriber`'s binding table.
    ///
    /// The table is validated as a whole; if any binding is malformed
    /// nothing is registered. During a dispatch pass the new handlers are
    /// staged and do not see the event being dispatched.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigurationError`](crate::ConfigurationError) naming
    /// the subscriber type and the offending handler.
    pub fn register<S: Subscriber>(&self, subscriber: &Rc<S>) -> ConfigResult<()> {
        let descriptors = extract(subscriber)?;
        let count = descriptors.len();
        let staged = self.is_dispatching();

        let swept = {
            let mut registry = self.inner.registry.borrow_mut();
            if staged {
                registry.stage_add(descriptors);
                registry.stage_garbage();
                Removed::new()
            } else {
                registry.add(descriptors);
                registry.sweep_garbage()
            }
        };

        debug!(
            bus = %self.name(),
            subscriber_type = %subscriber.type_name(),
            handlers = count,
            staged,
            swept = swept.len(),
            "Subscriber registered"
        );
        Ok(())
    }

    /// Remove every handler of `subscriber`, along with any handlers whose
    /// subscriber has already been dropped.
    ///
    /// During a dispatch pass the removal is staged: the current event is
    /// still delivered to the subscriber if it has not been reached yet.
    /// Pending staged registrations of `subscriber` are discarded.
    pub fn unregister<S: Any>(&self, subscriber: &Rc<S>) {
        self.unregister_identity(&identity(subscriber));
    }

    fn unregister_identity(&self, subscriber: &Weak<dyn Any>) {
        let staged = self.is_dispatching();

        let (removed, purged) = {
            let mut registry = self.inner.registry.borrow_mut();
            let removed = if staged {
                registry.stage_remove_matching(subscriber);
                Removed::new()
            } else {
                registry.remove_matching(subscriber)
            };
            (removed, registry.purge_staged(subscriber))
        };

        debug!(
            bus = %self.name(),
            staged,
            removed = removed.len(),
            purged = purged.len(),
            "Subscriber unregistered"
        );
    }

    /// Publish an event.
    ///
    /// Outside a dispatch pass the event is delivered immediately, in
    /// registration order, to every live handler whose filter accepts it.
    /// A handler returning [`Delivery::Consumed`] stops delivery and
    /// escalation. If nobody consumes the event and this bus has a parent,
    /// the event is published on the parent.
    ///
    /// Inside a dispatch pass (a handler publishing on the same bus) the
    /// event is queued and this call returns at once.
    ///
    /// When the pass ends, staged registry mutations are applied on every
    /// exit path. Queued events are then delivered in FIFO order, but only
    /// if the pass succeeded.
    ///
    /// # Errors
    ///
    /// - [`PublishError::Vetoed`] if a handler here or on an ancestor bus
    ///   vetoed the event, unchanged.
    /// - [`PublishError::HandlerFault`] if a handler failed in any other
    ///   way.
    ///
    /// Either error stops delivery of the event to later handlers.
    pub fn publish(&self, event: impl Into<Rc<Event>>) -> PublishResult {
        let event = event.into();

        if self.is_dispatching() {
            trace!(
                bus = %self.name(),
                event_id = %event.metadata().event_id,
                event_kind = %event.kind(),
                "Dispatch in progress, queueing event"
            );
            self.inner.pending.borrow_mut().push_back(event);
            return Ok(());
        }

        self.dispatch(&event)?;

        loop {
            let next = self.inner.pending.borrow_mut().pop_front();
            let Some(next) = next else {
                break;
            };
            self.dispatch(&next)?;
        }
        Ok(())
    }

    fn dispatch(&self, event: &Rc<Event>) -> PublishResult {
        let _pass = DispatchPass::enter(self);
        let snapshot = self.inner.registry.borrow().snapshot();

        trace!(
            bus = %self.name(),
            event_id = %event.metadata().event_id,
            event_kind = %event.kind(),
            handlers = snapshot.len(),
            "Dispatching event"
        );

        let mut consumed = false;
        for descriptor in &snapshot {
            let Some(target) = descriptor.upgrade() else {
                self.inner.registry.borrow_mut().stage_removal(descriptor);
                continue;
            };
            if !descriptor.filter().accepts(event) {
                continue;
            }

            self.log_delivery(descriptor, event);
            match descriptor.invoke(&*target, event) {
                Ok(Delivery::Continue) => {},
                Ok(Delivery::Consumed) => {
                    trace!(
                        bus = %self.name(),
                        handler = %descriptor.handler_name(),
                        "Event consumed"
                    );
                    consumed = true;
                    break;
                },
                Err(HandlerError::Veto(veto)) => {
                    debug!(
                        bus = %self.name(),
                        handler = %descriptor.handler_name(),
                        subscriber_type = %descriptor.subscriber_type(),
                        reason = %veto.reason(),
                        "Handler vetoed event"
                    );
                    return Err(PublishError::Vetoed(veto));
                },
                Err(HandlerError::Failed(source)) => {
                    warn!(
                        bus = %self.name(),
                        handler = %descriptor.handler_name(),
                        subscriber_type = %descriptor.subscriber_type(),
                        error = %source,
                        "Handler failed"
                    );
                    return Err(PublishError::HandlerFault {
                        handler: descriptor.handler_name().to_string(),
                        subscriber_type: descriptor.subscriber_type().to_string(),
                        source,
                    });
                },
            }
        }

        if !consumed && let Some(parent) = &self.inner.parent {
            trace!(
                bus = %self.name(),
                parent = %parent.name(),
                "Escalating unconsumed event"
            );
            parent.publish(Rc::clone(event))?;
        }
        Ok(())
    }

    fn log_delivery(&self, descriptor: &Descriptor, event: &Event) {
        if self.inner.config.log_deliveries && tracing::enabled!(Level::DEBUG) {
            debug!(
                bus = %self.name(),
                handler = %descriptor.handler_name(),
                subscriber_type = %descriptor.subscriber_type(),
                event_kind = %event.kind(),
                "Delivering event"
            );
        }
    }

    /// Number of registered handlers whose subscriber is still alive.
    ///
    /// Handlers staged during a running dispatch pass are not counted until
    /// the pass commits.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner.registry.borrow().live_count()
    }

    /// Number of registered handlers, including ones whose subscriber was
    /// dropped but which have not been pruned yet.
    #[must_use]
    pub fn descriptor_count(&self) -> usize {
        self.inner.registry.borrow().len()
    }

    /// Number of registry mutations waiting for the running pass to end.
    #[must_use]
    pub fn staged_count(&self) -> usize {
        self.inner.registry.borrow().staged_len()
    }

    /// Number of events waiting to be delivered.
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.inner.pending.borrow().len()
    }

    /// Whether a dispatch pass is running on this bus.
    #[must_use]
    pub fn is_dispatching(&self) -> bool {
        self.inner.dispatching.get()
    }

    /// The parent bus, if any.
    #[must_use]
    pub fn parent(&self) -> Option<&Bus> {
        self.inner.parent.as_ref()
    }

    /// The configured name, or `"bus"`.
    #[must_use]
    pub fn name(&self) -> &str {
        self.inner.config.name.as_deref().unwrap_or(UNNAMED)
    }

    /// The bus configuration.
    #[must_use]
    pub fn config(&self) -> &BusConfig {
        &self.inner.config
    }

    /// Whether two handles refer to the same bus.
    #[must_use]
    pub fn ptr_eq(&self, other: &Bus) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// A handle that does not keep the bus alive.
    #[must_use]
    pub fn downgrade(&self) -> WeakBus {
        WeakBus {
            inner: Rc::downgrade(&self.inner),
        }
    }
}

impl Default for Bus {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Bus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (descriptors, staged) = self
            .inner
            .registry
            .try_borrow()
            .map(|r| (r.len(), r.staged_len()))
            .unwrap_or_default();
        f.debug_struct("Bus")
            .field("name", &self.name())
            .field("descriptors", &descriptors)
            .field("staged", &staged)
            .field("pending", &self.inner.pending.try_borrow().map(|p| p.len()).unwrap_or_default())
            .field("dispatching", &self.is_dispatching())
            .field("parent", &self.parent().map(Bus::name))
            .finish()
    }
}

/// A non-owning handle to a [`Bus`].
#[derive(Clone)]
pub struct WeakBus {
    inner: Weak<BusInner>,
}

impl WeakBus {
    /// Get the bus back if it is still alive.
    #[must_use]
    pub fn upgrade(&self) -> Option<Bus> {
        self.inner.upgrade().map(|inner| Bus { inner })
    }
}

impl fmt::Debug for WeakBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakBus")
            .field("alive", &(self.inner.strong_count() > 0))
            .finish()
    }
}

/// Marks a bus as dispatching for the lifetime of one pass.
///
/// Dropping the guard applies the staged registry mutations and clears the
/// flag, whichever way the pass exits.
struct DispatchPass<'a> {
    bus: &'a Bus,
}

impl<'a> DispatchPass<'a> {
    fn enter(bus: &'a Bus) -> Self {
        bus.inner.dispatching.set(true);
        Self { bus }
    }
}

impl Drop for DispatchPass<'_> {
    fn drop(&mut self) {
        let commit = self.bus.inner.registry.borrow_mut().commit_staged();
        self.bus.inner.dispatching.set(false);

        if !commit.is_empty() {
            debug!(
                bus = %self.bus.name(),
                added = commit.added,
                removed = commit.removed.len(),
                "Applied staged registry changes"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Veto;
    use crate::kind::Kind;
    use crate::kinds;
    use crate::subscriber::{Binding, Bindings, HandlerResult};
    use serde_json::json;
    use std::cell::RefCell;

    static PING: Kind = Kind::derived("ping", &kinds::EVENT);
    static PONG: Kind = Kind::derived("pong", &kinds::EVENT);

    type Journal = Rc<RefCell<Vec<String>>>;

    fn journal() -> Journal {
        Rc::new(RefCell::new(Vec::new()))
    }

    fn entries(journal: &Journal) -> Vec<String> {
        journal.borrow().clone()
    }

    /// Records every event it sees and reacts according to its mode.
    struct Recorder {
        label: &'static str,
        journal: Journal,
        mode: Mode,
    }

    #[derive(Clone, Copy)]
    enum Mode {
        Pass,
        Consume,
        Veto,
        Fail,
    }

    impl Recorder {
        fn new(label: &'static str, journal: &Journal, mode: Mode) -> Rc<Self> {
            Rc::new(Self {
                label,
                journal: Rc::clone(journal),
                mode,
            })
        }

        fn on_event(&self, event: &Event) -> HandlerResult<Delivery> {
            self.journal
                .borrow_mut()
                .push(format!("{}:{}", self.label, event.kind()));
            match self.mode {
                Mode::Pass => Ok(Delivery::Continue),
                Mode::Consume => Ok(Delivery::Consumed),
                Mode::Veto => Err(HandlerError::veto(format!("{} says no", self.label))),
                Mode::Fail => Err(HandlerError::failed("broken handler")),
            }
        }
    }

    impl Subscriber for Recorder {
        fn bindings(&self) -> Bindings<Self> {
            Bindings::new().on("on_event", kinds::EVENT, Self::on_event)
        }

        fn type_name(&self) -> &str {
            "Recorder"
        }
    }

    fn ping() -> Event {
        Event::new(PING)
    }

    #[test]
    fn test_bus_creation() {
        let bus = Bus::new();
        assert_eq!(bus.subscriber_count(), 0);
        assert_eq!(bus.name(), "bus");
        assert!(bus.parent().is_none());
        assert!(!bus.is_dispatching());
    }

    #[test]
    fn test_fan_out_in_registration_order() {
        let bus = Bus::new();
        let log = journal();
        let subs = [
            Recorder::new("h1", &log, Mode::Pass),
            Recorder::new("h2", &log, Mode::Pass),
            Recorder::new("h3", &log, Mode::Pass),
        ];
        for sub in &subs {
            bus.register(sub).unwrap();
        }

        bus.publish(ping()).unwrap();

        assert_eq!(entries(&log), vec!["h1:ping", "h2:ping", "h3:ping"]);
        assert_eq!(bus.subscriber_count(), 3);
    }

    #[test]
    fn test_consumed_event_stops_delivery_and_escalation() {
        let root = Bus::new();
        let bus = Bus::with_parent(&root);
        let log = journal();
        let above = Recorder::new("root", &log, Mode::Pass);
        root.register(&above).unwrap();

        let h1 = Recorder::new("h1", &log, Mode::Pass);
        let h2 = Recorder::new("h2", &log, Mode::Consume);
        let h3 = Recorder::new("h3", &log, Mode::Pass);
        bus.register(&h1).unwrap();
        bus.register(&h2).unwrap();
        bus.register(&h3).unwrap();

        bus.publish(ping()).unwrap();

        assert_eq!(entries(&log), vec!["h1:ping", "h2:ping"]);
    }

    #[test]
    fn test_unconsumed_event_escalates() {
        let root = Bus::new();
        let bus = Bus::with_parent(&root);
        let log = journal();
        let above = Recorder::new("root", &log, Mode::Pass);
        let below = Recorder::new("child", &log, Mode::Pass);
        root.register(&above).unwrap();
        bus.register(&below).unwrap();

        bus.publish(ping()).unwrap();
        root.publish(Event::new(PONG)).unwrap();

        assert_eq!(entries(&log), vec!["child:ping", "root:ping", "root:pong"]);
    }

    #[test]
    fn test_filter_skips_unrelated_handlers() {
        struct PongOnly {
            journal: Journal,
        }

        impl Subscriber for PongOnly {
            fn bindings(&self) -> Bindings<Self> {
                Bindings::new().on("on_pong", PONG, |s: &Self, _| {
                    s.journal.borrow_mut().push("pong".to_string());
                    Ok(())
                })
            }
        }

        let bus = Bus::new();
        let log = journal();
        let sub = Rc::new(PongOnly {
            journal: Rc::clone(&log),
        });
        bus.register(&sub).unwrap();

        bus.publish(ping()).unwrap();
        assert!(entries(&log).is_empty());

        bus.publish(Event::new(PONG)).unwrap();
        assert_eq!(entries(&log), vec!["pong"]);
    }

    #[test]
    fn test_unregister_stops_delivery() {
        let bus = Bus::new();
        let log = journal();
        let sub = Recorder::new("h1", &log, Mode::Pass);
        bus.register(&sub).unwrap();
        bus.unregister(&sub);

        bus.publish(ping()).unwrap();

        assert!(entries(&log).is_empty());
        assert_eq!(bus.descriptor_count(), 0);
    }

    #[test]
    fn test_dropped_subscriber_is_skipped_and_pruned() {
        let bus = Bus::new();
        let log = journal();
        let keep = Recorder::new("keep", &log, Mode::Pass);
        let gone = Recorder::new("gone", &log, Mode::Pass);
        bus.register(&gone).unwrap();
        bus.register(&keep).unwrap();

        drop(gone);
        assert_eq!(bus.subscriber_count(), 1);
        assert_eq!(bus.descriptor_count(), 2);

        bus.publish(ping()).unwrap();

        assert_eq!(entries(&log), vec!["keep:ping"]);
        assert_eq!(bus.descriptor_count(), 1);
    }

    #[test]
    fn test_register_sweeps_garbage() {
        let bus = Bus::new();
        let log = journal();
        let gone = Recorder::new("gone", &log, Mode::Pass);
        bus.register(&gone).unwrap();
        drop(gone);

        let fresh = Recorder::new("fresh", &log, Mode::Pass);
        bus.register(&fresh).unwrap();

        assert_eq!(bus.descriptor_count(), 1);
    }

    #[test]
    fn test_bus_does_not_keep_subscriber_alive() {
        let bus = Bus::new();
        let log = journal();
        let sub = Recorder::new("h1", &log, Mode::Pass);
        bus.register(&sub).unwrap();
        assert_eq!(Rc::strong_count(&sub), 1);
    }

    #[test]
    fn test_veto_propagates_and_stops_delivery() {
        let bus = Bus::new();
        let log = journal();
        let h1 = Recorder::new("h1", &log, Mode::Veto);
        let h2 = Recorder::new("h2", &log, Mode::Pass);
        bus.register(&h1).unwrap();
        bus.register(&h2).unwrap();

        let err = bus.publish(ping()).unwrap_err();

        assert_eq!(err.as_veto(), Some(&Veto::new("h1 says no")));
        assert_eq!(entries(&log), vec!["h1:ping"]);
        assert!(!bus.is_dispatching());
    }

    #[test]
    fn test_veto_from_parent_reaches_child_caller_unchanged() {
        let root = Bus::new();
        let bus = Bus::with_parent(&root);
        let log = journal();
        let guard = Recorder::new("guard", &log, Mode::Veto);
        root.register(&guard).unwrap();

        let err = bus.publish(ping()).unwrap_err();
        assert!(matches!(err, PublishError::Vetoed(ref v) if v.reason() == "guard says no"));
    }

    #[test]
    fn test_handler_fault_is_wrapped_with_context() {
        let bus = Bus::new();
        let log = journal();
        let h1 = Recorder::new("h1", &log, Mode::Fail);
        let h2 = Recorder::new("h2", &log, Mode::Pass);
        bus.register(&h1).unwrap();
        bus.register(&h2).unwrap();

        let err = bus.publish(ping()).unwrap_err();

        match err {
            PublishError::HandlerFault {
                handler,
                subscriber_type,
                source,
            } => {
                assert_eq!(handler, "on_event");
                assert_eq!(subscriber_type, "Recorder");
                assert_eq!(source.to_string(), "broken handler");
            },
            PublishError::Vetoed(v) => panic!("unexpected veto: {v}"),
        }
        assert_eq!(entries(&log), vec!["h1:ping"]);
    }

    /// Unregisters itself and publishes a follow-up from inside its handler.
    struct SelfRemover {
        me: RefCell<Option<Rc<SelfRemover>>>,
        bus: Bus,
        journal: Journal,
    }

    impl Subscriber for SelfRemover {
        fn bindings(&self) -> Bindings<Self> {
            Bindings::new().on("on_event", kinds::EVENT, |s: &Self, event: &Event| {
                s.journal
                    .borrow_mut()
                    .push(format!("remover:{}", event.kind()));
                if event.is(&PING)
                    && let Some(me) = s.me.borrow_mut().take()
                {
                    s.bus.unregister(&me);
                    assert_eq!(s.bus.staged_count(), 1);
                    s.bus.publish(Event::new(PONG))?;
                    assert_eq!(s.bus.pending_len(), 1);
                }
                Ok(())
            })
        }
    }

    #[test]
    fn test_self_unregister_and_nested_publish_are_deferred() {
        let bus = Bus::new();
        let log = journal();
        let remover = Rc::new(SelfRemover {
            me: RefCell::new(None),
            bus: bus.clone(),
            journal: Rc::clone(&log),
        });
        *remover.me.borrow_mut() = Some(Rc::clone(&remover));
        let after = Recorder::new("after", &log, Mode::Pass);
        bus.register(&remover).unwrap();
        bus.register(&after).unwrap();

        bus.publish(ping()).unwrap();

        assert_eq!(
            entries(&log),
            vec!["remover:ping", "after:ping", "after:pong"]
        );
        assert_eq!(bus.subscriber_count(), 1);
        assert_eq!(bus.pending_len(), 0);
        assert_eq!(bus.staged_count(), 0);
    }

    /// Registers a newcomer while handling an event.
    struct Recruiter {
        bus: Bus,
        recruit: Rc<Recorder>,
    }

    impl Subscriber for Recruiter {
        fn bindings(&self) -> Bindings<Self> {
            Bindings::new().on("recruit", PING, |s: &Self, _| {
                s.bus.register(&s.recruit).map_err(HandlerError::failed)?;
                Ok(())
            })
        }
    }

    #[test]
    fn test_registration_during_dispatch_is_staged() {
        let bus = Bus::new();
        let log = journal();
        let recruit = Recorder::new("recruit", &log, Mode::Pass);
        let recruiter = Rc::new(Recruiter {
            bus: bus.clone(),
            recruit: Rc::clone(&recruit),
        });
        bus.register(&recruiter).unwrap();

        bus.publish(ping()).unwrap();
        assert!(entries(&log).is_empty());
        assert_eq!(bus.subscriber_count(), 2);

        bus.publish(Event::new(PONG)).unwrap();
        assert_eq!(entries(&log), vec!["recruit:pong"]);
    }

    /// Registers and then unregisters a newcomer within one handler call.
    struct Flipper {
        bus: Bus,
        other: Rc<Recorder>,
    }

    impl Subscriber for Flipper {
        fn bindings(&self) -> Bindings<Self> {
            Bindings::new().on("flip", PING, |s: &Self, _| {
                s.bus.register(&s.other).map_err(HandlerError::failed)?;
                s.bus.unregister(&s.other);
                Ok(())
            })
        }
    }

    #[test]
    fn test_unregister_purges_staged_registration() {
        let bus = Bus::new();
        let log = journal();
        let other = Recorder::new("other", &log, Mode::Pass);
        let flipper = Rc::new(Flipper {
            bus: bus.clone(),
            other: Rc::clone(&other),
        });
        bus.register(&flipper).unwrap();

        bus.publish(ping()).unwrap();

        assert_eq!(bus.subscriber_count(), 1);
        bus.publish(Event::new(PONG)).unwrap();
        assert!(entries(&log).is_empty());
    }

    /// Republishes until it has seen `limit` events.
    struct Echo {
        bus: Bus,
        seen: Cell<usize>,
        limit: usize,
    }

    impl Subscriber for Echo {
        fn bindings(&self) -> Bindings<Self> {
            Bindings::new().on("echo", kinds::EVENT, |s: &Self, event: &Event| {
                let seen = s.seen.get().saturating_add(1);
                s.seen.set(seen);
                assert!(!s.bus.is_dispatching() || s.bus.pending_len() == 0);
                if seen < s.limit {
                    s.bus.publish(event.clone())?;
                }
                Ok(())
            })
        }
    }

    #[test]
    fn test_nested_publish_is_queued_not_recursive() {
        let bus = Bus::new();
        let echo = Rc::new(Echo {
            bus: bus.clone(),
            seen: Cell::new(0),
            limit: 5,
        });
        bus.register(&echo).unwrap();

        bus.publish(ping()).unwrap();

        assert_eq!(echo.seen.get(), 5);
        assert_eq!(bus.pending_len(), 0);
    }

    /// Publishes a follow-up, then vetoes.
    struct QueueThenVeto {
        bus: Bus,
    }

    impl Subscriber for QueueThenVeto {
        fn bindings(&self) -> Bindings<Self> {
            Bindings::new().on("veto", PING, |s: &Self, _| -> HandlerResult {
                s.bus.publish(Event::new(PONG))?;
                Err(HandlerError::veto("not now"))
            })
        }
    }

    #[test]
    fn test_veto_leaves_queue_undrained_and_commits_staging() {
        let bus = Bus::new();
        let log = journal();
        let vetoer = Rc::new(QueueThenVeto { bus: bus.clone() });
        let watcher = Recorder::new("watcher", &log, Mode::Pass);
        bus.register(&vetoer).unwrap();

        let err = bus.publish(ping()).unwrap_err();
        assert!(err.is_veto());
        assert_eq!(bus.pending_len(), 1);
        assert!(!bus.is_dispatching());

        // The queued follow-up goes out with the next successful publish.
        bus.unregister(&vetoer);
        bus.register(&watcher).unwrap();
        bus.publish(Event::new(kinds::EVENT)).unwrap();
        assert_eq!(entries(&log), vec!["watcher:event", "watcher:pong"]);
        assert_eq!(bus.pending_len(), 0);
    }

    /// Unregisters a victim, then vetoes.
    struct UnregisterThenVeto {
        bus: Bus,
        victim: Rc<Recorder>,
    }

    impl Subscriber for UnregisterThenVeto {
        fn bindings(&self) -> Bindings<Self> {
            Bindings::new().on("veto", PING, |s: &Self, _| -> HandlerResult {
                s.bus.unregister(&s.victim);
                Err(HandlerError::veto("no"))
            })
        }
    }

    #[test]
    fn test_staging_commits_on_veto_path() {
        let bus = Bus::new();
        let log = journal();
        let victim = Recorder::new("victim", &log, Mode::Pass);
        let vetoer = Rc::new(UnregisterThenVeto {
            bus: bus.clone(),
            victim: Rc::clone(&victim),
        });
        bus.register(&vetoer).unwrap();
        bus.register(&victim).unwrap();

        assert!(bus.publish(ping()).is_err());

        assert_eq!(bus.subscriber_count(), 1);
        assert_eq!(bus.staged_count(), 0);
        assert!(entries(&log).is_empty());
    }

    /// Unregisters a victim, then fails.
    struct UnregisterThenFail {
        bus: Bus,
        victim: Rc<Recorder>,
    }

    impl Subscriber for UnregisterThenFail {
        fn bindings(&self) -> Bindings<Self> {
            Bindings::new().on("fail", PING, |s: &Self, _| -> HandlerResult {
                s.bus.unregister(&s.victim);
                Err(HandlerError::failed("gave up"))
            })
        }

        fn type_name(&self) -> &str {
            "UnregisterThenFail"
        }
    }

    #[test]
    fn test_staging_commits_on_fault_path() {
        let bus = Bus::new();
        let log = journal();
        let victim = Recorder::new("victim", &log, Mode::Pass);
        let failer = Rc::new(UnregisterThenFail {
            bus: bus.clone(),
            victim: Rc::clone(&victim),
        });
        bus.register(&failer).unwrap();
        bus.register(&victim).unwrap();
        assert_eq!(bus.subscriber_count(), 2);

        let err = bus.publish(ping()).unwrap_err();

        assert!(matches!(
            err,
            PublishError::HandlerFault { ref handler, ref subscriber_type, .. }
                if handler == "fail" && subscriber_type == "UnregisterThenFail"
        ));
        assert_eq!(bus.subscriber_count(), 1);
        assert_eq!(bus.descriptor_count(), 1);
        assert_eq!(bus.staged_count(), 0);
        assert!(!bus.is_dispatching());
        assert!(entries(&log).is_empty());

        bus.publish(Event::new(PONG)).unwrap();
        assert!(entries(&log).is_empty());
    }

    /// One valid binding followed by one bound to a non-event kind.
    struct HalfValid;

    impl Subscriber for HalfValid {
        fn bindings(&self) -> Bindings<Self> {
            Bindings::new()
                .on("fine", kinds::EVENT, |_: &Self, _| Ok(()))
                .on("broken", kinds::ANY, |_: &Self, _| Ok(()))
        }

        fn type_name(&self) -> &str {
            "HalfValid"
        }
    }

    #[test]
    fn test_malformed_table_registers_nothing() {
        let bus = Bus::new();
        let log = journal();
        let existing = Recorder::new("existing", &log, Mode::Pass);
        bus.register(&existing).unwrap();

        let half = Rc::new(HalfValid);
        let err = bus.register(&half).unwrap_err();

        assert!(matches!(
            err,
            crate::ConfigurationError::NotAnEventKind { ref handler, ref subscriber_type, .. }
                if handler == "broken" && subscriber_type == "HalfValid"
        ));
        assert_eq!(bus.descriptor_count(), 1);
        assert_eq!(bus.subscriber_count(), 1);
        assert_eq!(bus.staged_count(), 0);
    }

    #[test]
    fn test_default_binding_accepts_root_kind_source() {
        static PANEL: Kind = Kind::root("panel");

        let bus = Bus::new();
        let log = journal();
        let recorder = Recorder::new("rec", &log, Mode::Pass);
        bus.register(&recorder).unwrap();

        let source = crate::event::EventSource::new(PANEL, "p");
        bus.publish(Event::new(kinds::EVENT).with_source(source))
            .unwrap();

        assert_eq!(entries(&log), vec!["rec:event"]);
    }

    #[test]
    fn test_consumption_leaves_unvisited_garbage_for_later() {
        let bus = Bus::new();
        let log = journal();
        let first = Recorder::new("first", &log, Mode::Consume);
        let gone = Recorder::new("gone", &log, Mode::Pass);
        bus.register(&first).unwrap();
        bus.register(&gone).unwrap();
        drop(gone);

        bus.publish(ping()).unwrap();
        assert_eq!(bus.descriptor_count(), 2);
        assert_eq!(bus.subscriber_count(), 1);

        bus.unregister(&first);
        assert_eq!(bus.descriptor_count(), 0);
    }

    #[test]
    fn test_source_and_property_filters() {
        static PANEL: Kind = Kind::derived("panel", &kinds::ANY);

        struct Picky {
            journal: Journal,
        }

        impl Subscriber for Picky {
            fn bindings(&self) -> Bindings<Self> {
                let log = |tag: &'static str| {
                    move |s: &Self, _: &Event| -> HandlerResult {
                        s.journal.borrow_mut().push(tag.to_string());
                        Ok(())
                    }
                };
                Bindings::new()
                    .with(Binding::new("from_panel", kinds::EVENT, log("panel")).from_source(PANEL))
                    .with(Binding::new("sourced", kinds::EVENT, log("sourced")).require_source())
                    .with(Binding::new("named", kinds::EVENT, log("named")).for_property("oele"))
            }
        }

        let bus = Bus::new();
        let log = journal();
        let picky = Rc::new(Picky {
            journal: Rc::clone(&log),
        });
        bus.register(&picky).unwrap();

        let source = crate::event::EventSource::new(kinds::ANY, "model");
        bus.publish(Event::property_change(Some(source), "oele", json!(0), json!(1)))
            .unwrap();
        assert_eq!(entries(&log), vec!["sourced", "named"]);

        log.borrow_mut().clear();
        bus.publish(Event::new(kinds::EVENT)).unwrap();
        assert_eq!(entries(&log), vec!["panel"]);
    }

    #[test]
    fn test_weak_bus() {
        let bus = Bus::new();
        let weak = bus.downgrade();
        assert!(weak.upgrade().is_some_and(|b| b.ptr_eq(&bus)));
        drop(bus);
        assert!(weak.upgrade().is_none());
    }

    #[test]
    fn test_debug_output() {
        let root = Bus::with_config(BusConfig::named("root"), None);
        let bus = Bus::with_config(BusConfig::named("child"), Some(&root));
        let dbg = format!("{bus:?}");
        assert!(dbg.contains("\"child\""));
        assert!(dbg.contains("Some(\"root\")"));
    }
}
