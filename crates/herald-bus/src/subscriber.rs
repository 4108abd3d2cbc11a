//! Subscriber trait, binding tables and descriptor extraction.
//!
//! A subscriber describes its handlers with an explicit [`Bindings`] table.
//! Registration turns each entry into a [`Descriptor`] that refers to the
//! subscriber through a [`Weak`] handle only, so the bus never keeps a
//! subscriber alive.

use std::any::Any;
use std::fmt;
use std::rc::{Rc, Weak};

use tracing::trace;

use crate::error::{ConfigResult, ConfigurationError, HandlerError};
use crate::event::Event;
use crate::kind::Kind;
use crate::kinds;

/// What a handler did with an event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Delivery {
    /// Keep delivering to later handlers and, if nobody consumes the
    /// event, to the parent bus.
    #[default]
    Continue,
    /// The event is fully handled. Later handlers and the parent bus do not
    /// see it.
    Consumed,
}

impl Delivery {
    /// Whether the event was consumed.
    #[must_use]
    pub fn is_consumed(self) -> bool {
        self == Self::Consumed
    }
}

impl From<bool> for Delivery {
    fn from(consumed: bool) -> Self {
        if consumed {
            Self::Consumed
        } else {
            Self::Continue
        }
    }
}

impl From<()> for Delivery {
    fn from((): ()) -> Self {
        Self::Continue
    }
}

/// Result type for handlers.
pub type HandlerResult<R = ()> = Result<R, HandlerError>;

type TypedHandler<S> = Rc<dyn Fn(&S, &Event) -> HandlerResult<Delivery>>;
type ErasedHandler = Rc<dyn Fn(&dyn Any, &Event) -> HandlerResult<Delivery>>;

/// An object that receives events.
///
/// # Example
///
/// ```rust
/// use herald_bus::{Bindings, Event, HandlerResult, Subscriber, kinds};
/// use std::cell::Cell;
///
/// #[derive(Default)]
/// struct Counter {
///     seen: Cell<usize>,
/// }
///
/// impl Counter {
///     fn on_change(&self, _event: &Event) -> HandlerResult {
///         self.seen.set(self.seen.get().saturating_add(1));
///         Ok(())
///     }
/// }
///
/// impl Subscriber for Counter {
///     fn bindings(&self) -> Bindings<Self> {
///         Bindings::new().on("on_change", kinds::PROPERTY_CHANGE, Self::on_change)
///     }
/// }
/// ```
pub trait Subscriber: Any {
    /// The subscriber's handler table, in dispatch order.
    fn bindings(&self) -> Bindings<Self>
    where
        Self: Sized;

    /// Name used in error messages and logs.
    fn type_name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// Which events a handler accepts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    event_kind: Kind,
    source_kind: Option<Kind>,
    allow_null_source: bool,
    property_name: Option<String>,
}

impl Filter {
    /// Accept every event of `event_kind` (or a derived kind) from any
    /// source, including events without a source.
    #[must_use]
    pub fn new(event_kind: Kind) -> Self {
        Self {
            event_kind,
            source_kind: None,
            allow_null_source: true,
            property_name: None,
        }
    }

    /// The accepted event kind.
    #[must_use]
    pub fn event_kind(&self) -> &Kind {
        &self.event_kind
    }

    /// The accepted source kind, or `None` if any source is accepted.
    #[must_use]
    pub fn source_kind(&self) -> Option<&Kind> {
        self.source_kind.as_ref()
    }

    /// Whether events without a source are accepted.
    #[must_use]
    pub fn allows_null_source(&self) -> bool {
        self.allow_null_source
    }

    /// The required attribute name, if any.
    #[must_use]
    pub fn property_name(&self) -> Option<&str> {
        self.property_name.as_deref()
    }

    /// Whether `event` passes this filter.
    #[must_use]
    pub fn accepts(&self, event: &Event) -> bool {
        if !event.kind().is_a(&self.event_kind) {
            return false;
        }

        let source_ok = match event.source() {
            None => self.allow_null_source,
            Some(source) => self
                .source_kind
                .as_ref()
                .is_none_or(|wanted| source.kind().is_a(wanted)),
        };
        if !source_ok {
            return false;
        }

        match &self.property_name {
            Some(wanted) => event.name() == Some(wanted.as_str()),
            None => true,
        }
    }
}

/// One entry of a subscriber's handler table.
pub struct Binding<S> {
    name: String,
    filter: Filter,
    handler: TypedHandler<S>,
}

impl<S: 'static> Binding<S> {
    /// Bind `handler` to events of `event_kind`.
    ///
    /// The handler may return `()` (never consumes), `bool` (`true`
    /// consumes) or a [`Delivery`].
    pub fn new<F, R>(name: impl Into<String>, event_kind: Kind, handler: F) -> Self
    where
        F: Fn(&S, &Event) -> HandlerResult<R> + 'static,
        R: Into<Delivery>,
    {
        Self {
            name: name.into(),
            filter: Filter::new(event_kind),
            handler: Rc::new(move |subscriber: &S, event: &Event| {
                handler(subscriber, event).map(Into::into)
            }),
        }
    }

    /// Only accept events whose source is-a `source_kind`.
    #[must_use]
    pub fn from_source(mut self, source_kind: Kind) -> Self {
        self.filter.source_kind = Some(source_kind);
        self
    }

    /// Reject events that carry no source.
    #[must_use]
    pub fn require_source(mut self) -> Self {
        self.filter.allow_null_source = false;
        self
    }

    /// Only accept events whose attribute name equals `name`.
    #[must_use]
    pub fn for_property(mut self, name: impl Into<String>) -> Self {
        self.filter.property_name = Some(name.into());
        self
    }

    /// The handler name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The binding's filter.
    #[must_use]
    pub fn filter(&self) -> &Filter {
        &self.filter
    }
}

impl<S> fmt::Debug for Binding<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding")
            .field("name", &self.name)
            .field("filter", &self.filter)
            .finish_non_exhaustive()
    }
}

/// A subscriber's ordered handler table.
pub struct Bindings<S> {
    entries: Vec<Binding<S>>,
}

impl<S: 'static> Bindings<S> {
    /// An empty table.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Append a handler accepting events of `event_kind` from any source.
    #[must_use]
    pub fn on<F, R>(self, name: impl Into<String>, event_kind: Kind, handler: F) -> Self
    where
        F: Fn(&S, &Event) -> HandlerResult<R> + 'static,
        R: Into<Delivery>,
    {
        self.with(Binding::new(name, event_kind, handler))
    }

    /// Append a fully configured binding.
    #[must_use]
    pub fn with(mut self, binding: Binding<S>) -> Self {
        self.entries.push(binding);
        self
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over the entries in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &Binding<S>> {
        self.entries.iter()
    }
}

impl<S: 'static> Default for Bindings<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> fmt::Debug for Bindings<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(&self.entries).finish()
    }
}

/// A registered handler: the binding's filter plus a weak handle to its
/// subscriber.
///
/// A descriptor is *live* while its subscriber can still be upgraded and
/// *garbage* afterwards.
pub struct Descriptor {
    subscriber: Weak<dyn Any>,
    subscriber_type: Rc<str>,
    handler_name: String,
    filter: Filter,
    handler: ErasedHandler,
}

impl Descriptor {
    /// Whether the subscriber is still alive.
    #[must_use]
    pub fn is_live(&self) -> bool {
        self.subscriber.strong_count() > 0
    }

    /// Whether the subscriber has been dropped.
    #[must_use]
    pub fn is_garbage(&self) -> bool {
        !self.is_live()
    }

    /// Whether this descriptor was registered for `subscriber`.
    #[must_use]
    pub fn belongs_to(&self, subscriber: &Weak<dyn Any>) -> bool {
        Weak::ptr_eq(&self.subscriber, subscriber)
    }

    /// The subscriber's declared type.
    #[must_use]
    pub fn subscriber_type(&self) -> &str {
        &self.subscriber_type
    }

    /// The handler name.
    #[must_use]
    pub fn handler_name(&self) -> &str {
        &self.handler_name
    }

    /// The handler's filter.
    #[must_use]
    pub fn filter(&self) -> &Filter {
        &self.filter
    }

    /// Temporarily upgrade the subscriber handle.
    pub(crate) fn upgrade(&self) -> Option<Rc<dyn Any>> {
        self.subscriber.upgrade()
    }

    /// Call the handler on an upgraded subscriber.
    pub(crate) fn invoke(&self, target: &dyn Any, event: &Event) -> HandlerResult<Delivery> {
        trace!(
            handler = %self.handler_name,
            subscriber_type = %self.subscriber_type,
            event_kind = %event.kind(),
            "Invoking handler"
        );
        (self.handler)(target, event)
    }
}

impl fmt::Debug for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Descriptor")
            .field("subscriber_type", &self.subscriber_type)
            .field("handler_name", &self.handler_name)
            .field("filter", &self.filter)
            .field("live", &self.is_live())
            .finish_non_exhaustive()
    }
}

/// The type-erased identity of a subscriber, as stored in descriptors.
pub fn identity<S: Any>(subscriber: &Rc<S>) -> Weak<dyn Any> {
    let erased: Rc<dyn Any> = Rc::clone(subscriber) as Rc<dyn Any>;
    Rc::downgrade(&erased)
}

/// Turn a subscriber's binding table into descriptors.
///
/// Every binding is validated before any descriptor is produced, so a
/// malformed table yields nothing.
///
/// # Errors
///
/// Returns [`ConfigurationError::EmptyHandlerName`] for an unnamed binding
/// and [`ConfigurationError::NotAnEventKind`] for a binding whose accepted
/// kind does not derive from [`kinds::EVENT`].
pub fn extract<S: Subscriber>(candidate: &Rc<S>) -> ConfigResult<Vec<Descriptor>> {
    let subscriber_type: Rc<str> = Rc::from(candidate.type_name());
    let bindings = candidate.bindings();

    for binding in bindings.iter() {
        if binding.name.is_empty() {
            return Err(ConfigurationError::EmptyHandlerName {
                subscriber_type: subscriber_type.to_string(),
            });
        }
        if !binding.filter.event_kind.is_a(&kinds::EVENT) {
            return Err(ConfigurationError::NotAnEventKind {
                subscriber_type: subscriber_type.to_string(),
                handler: binding.name.clone(),
                kind: binding.filter.event_kind.to_string(),
            });
        }
    }

    let subscriber = identity(candidate);
    Ok(bindings
        .entries
        .into_iter()
        .map(|binding| {
            let typed = binding.handler;
            let handler: ErasedHandler = Rc::new(move |target: &dyn Any, event: &Event| {
                match target.downcast_ref::<S>() {
                    Some(subscriber) => typed(subscriber, event),
                    None => Ok(Delivery::Continue),
                }
            });
            Descriptor {
                subscriber: subscriber.clone(),
                subscriber_type: Rc::clone(&subscriber_type),
                handler_name: binding.name,
                filter: binding.filter,
                handler,
            }
        })
        .collect())
}
