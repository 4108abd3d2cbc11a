//! A subscriber that records what it receives.

use std::cell::RefCell;
use std::rc::Rc;

use herald_bus::{Bindings, Delivery, Event, HandlerError, HandlerResult, Kind, Subscriber, kinds};

/// A shared, ordered log of handler invocations.
///
/// Several recorders can write to one journal, which makes the relative
/// order of deliveries across subscribers and buses observable.
#[derive(Debug, Clone, Default)]
pub struct Journal {
    entries: Rc<RefCell<Vec<String>>>,
}

impl Journal {
    /// An empty journal.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry.
    pub fn record(&self, entry: impl Into<String>) {
        self.entries.borrow_mut().push(entry.into());
    }

    /// A copy of all entries, oldest first.
    #[must_use]
    pub fn entries(&self) -> Vec<String> {
        self.entries.borrow().clone()
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    /// Whether nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    /// Forget all entries.
    pub fn clear(&self) {
        self.entries.borrow_mut().clear();
    }
}

/// What a [`RecordingSubscriber`] does after recording an event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Reaction {
    /// Let the event continue.
    #[default]
    Continue,
    /// Consume the event.
    Consume,
    /// Veto with the given reason.
    Veto(String),
    /// Fail with the given message.
    Fail(String),
}

/// A subscriber with a single handler, `record`, that logs
/// `"{label}:{event kind}"` to a [`Journal`], keeps a copy of the event and
/// then reacts as configured.
#[derive(Debug)]
pub struct RecordingSubscriber {
    label: String,
    kind: Kind,
    reaction: Reaction,
    journal: Journal,
    events: RefCell<Vec<Event>>,
}

impl RecordingSubscriber {
    /// Record every event and let it continue.
    #[must_use]
    pub fn new(label: impl Into<String>, journal: &Journal) -> Rc<Self> {
        Self::with_reaction(label, kinds::EVENT, journal, Reaction::Continue)
    }

    /// Record events of `kind` and let them continue.
    #[must_use]
    pub fn with_kind(label: impl Into<String>, kind: Kind, journal: &Journal) -> Rc<Self> {
        Self::with_reaction(label, kind, journal, Reaction::Continue)
    }

    /// Record every event and consume it.
    #[must_use]
    pub fn consuming(label: impl Into<String>, journal: &Journal) -> Rc<Self> {
        Self::with_reaction(label, kinds::EVENT, journal, Reaction::Consume)
    }

    /// Record events of `kind` and react with `reaction`.
    #[must_use]
    pub fn with_reaction(
        label: impl Into<String>,
        kind: Kind,
        journal: &Journal,
        reaction: Reaction,
    ) -> Rc<Self> {
        Rc::new(Self {
            label: label.into(),
            kind,
            reaction,
            journal: journal.clone(),
            events: RefCell::new(Vec::new()),
        })
    }

    /// The label used in journal entries.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Copies of the events received, oldest first.
    #[must_use]
    pub fn events(&self) -> Vec<Event> {
        self.events.borrow().clone()
    }

    /// Number of events received.
    #[must_use]
    pub fn event_count(&self) -> usize {
        self.events.borrow().len()
    }

    /// The most recent event.
    #[must_use]
    pub fn last_event(&self) -> Option<Event> {
        self.events.borrow().last().cloned()
    }

    fn record(&self, event: &Event) -> HandlerResult<Delivery> {
        self.journal.record(format!("{}:{}", self.label, event.kind()));
        self.events.borrow_mut().push(event.clone());

        match &self.reaction {
            Reaction::Continue => Ok(Delivery::Continue),
            Reaction::Consume => Ok(Delivery::Consumed),
            Reaction::Veto(reason) => Err(HandlerError::veto(reason.clone())),
            Reaction::Fail(message) => Err(HandlerError::failed(message.clone())),
        }
    }
}

impl Subscriber for RecordingSubscriber {
    fn bindings(&self) -> Bindings<Self> {
        Bindings::new().on("record", self.kind, Self::record)
    }

    fn type_name(&self) -> &str {
        "RecordingSubscriber"
    }
}
