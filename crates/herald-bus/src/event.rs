//! Event types published on the bus.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::kind::Kind;
use crate::kinds;

const OLD_VALUE: &str = "old_value";
const NEW_VALUE: &str = "new_value";
const VALUE: &str = "value";
const INDEX: &str = "index";
const CHANGE: &str = "change";

/// Metadata attached to every event.
#[derive(Debug, Clone, Serialize)]
pub struct EventMetadata {
    /// Unique event identifier.
    pub event_id: Uuid,
    /// When the event was created.
    pub timestamp: DateTime<Utc>,
    /// Correlation ID for tracing related events.
    pub correlation_id: Option<Uuid>,
}

impl EventMetadata {
    /// Create new event metadata.
    #[must_use]
    pub fn new() -> Self {
        Self {
            event_id: Uuid::new_v4(),
            timestamp: Utc::now(),
            correlation_id: None,
        }
    }

    /// Set correlation ID.
    #[must_use]
    pub fn with_correlation_id(mut self, id: Uuid) -> Self {
        self.correlation_id = Some(id);
        self
    }
}

impl Default for EventMetadata {
    fn default() -> Self {
        Self::new()
    }
}

/// The component an event originates from.
///
/// Handlers filter on the source's [`Kind`]; the `id` only identifies the
/// publisher in logs and payload inspection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct EventSource {
    kind: Kind,
    id: String,
}

impl EventSource {
    /// Create a source of the given kind.
    #[must_use]
    pub fn new(kind: Kind, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
        }
    }

    /// The source's declared kind.
    #[must_use]
    pub fn kind(&self) -> &Kind {
        &self.kind
    }

    /// The source's identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }
}

/// Direction of a collection change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeType {
    /// A value was (or is about to be) inserted.
    Insert,
    /// A value was (or is about to be) removed.
    Delete,
}

/// An immutable notification.
///
/// An event carries a [`Kind`], an optional [`EventSource`], an optional
/// attribute name (the property a change refers to) and a free-form JSON
/// payload. Once built it is never mutated; the bus shares it by reference
/// while it is queued or escalated.
#[derive(Debug, Clone, Serialize)]
pub struct Event {
    metadata: EventMetadata,
    kind: Kind,
    source: Option<EventSource>,
    name: Option<String>,
    payload: Map<String, Value>,
}

impl Event {
    /// Create an event of `kind` with no source, name or payload.
    #[must_use]
    pub fn new(kind: Kind) -> Self {
        Self {
            metadata: EventMetadata::new(),
            kind,
            source: None,
            name: None,
            payload: Map::new(),
        }
    }

    /// Set the source.
    #[must_use]
    pub fn with_source(mut self, source: EventSource) -> Self {
        self.source = Some(source);
        self
    }

    /// Set the attribute name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Add a payload field.
    #[must_use]
    pub fn with_field(mut self, key: impl Into<String>, value: Value) -> Self {
        self.payload.insert(key.into(), value);
        self
    }

    /// Replace the metadata.
    #[must_use]
    pub fn with_metadata(mut self, metadata: EventMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// A committed change of the value called `name`.
    #[must_use]
    pub fn property_change(
        source: Option<EventSource>,
        name: impl Into<String>,
        old_value: Value,
        new_value: Value,
    ) -> Self {
        Self::change(kinds::PROPERTY_CHANGE, source, name)
            .with_field(OLD_VALUE, old_value)
            .with_field(NEW_VALUE, new_value)
    }

    /// A proposed change of the value called `name`.
    #[must_use]
    pub fn vetoable_property_change(
        source: Option<EventSource>,
        name: impl Into<String>,
        old_value: Value,
        new_value: Value,
    ) -> Self {
        Self::change(kinds::VETOABLE_PROPERTY_CHANGE, source, name)
            .with_field(OLD_VALUE, old_value)
            .with_field(NEW_VALUE, new_value)
    }

    /// A committed change of slot `index` of the value called `name`.
    #[must_use]
    pub fn indexed_property_change(
        source: Option<EventSource>,
        name: impl Into<String>,
        old_value: Value,
        new_value: Value,
        index: usize,
    ) -> Self {
        Self::change(kinds::INDEXED_PROPERTY_CHANGE, source, name)
            .with_field(OLD_VALUE, old_value)
            .with_field(NEW_VALUE, new_value)
            .with_field(INDEX, Value::from(index))
    }

    /// A proposed change of slot `index` of the value called `name`.
    #[must_use]
    pub fn vetoable_indexed_property_change(
        source: Option<EventSource>,
        name: impl Into<String>,
        old_value: Value,
        new_value: Value,
        index: usize,
    ) -> Self {
        Self::change(kinds::VETOABLE_INDEXED_PROPERTY_CHANGE, source, name)
            .with_field(OLD_VALUE, old_value)
            .with_field(NEW_VALUE, new_value)
            .with_field(INDEX, Value::from(index))
    }

    /// A committed list insertion or removal at `index`.
    #[must_use]
    pub fn list_change(
        source: Option<EventSource>,
        name: impl Into<String>,
        value: Value,
        index: usize,
        change: ChangeType,
    ) -> Self {
        Self::collection_change(kinds::LIST_CHANGE, source, name, value, change)
            .with_field(INDEX, Value::from(index))
    }

    /// A proposed list insertion or removal at `index`.
    #[must_use]
    pub fn vetoable_list_change(
        source: Option<EventSource>,
        name: impl Into<String>,
        value: Value,
        index: usize,
        change: ChangeType,
    ) -> Self {
        Self::collection_change(kinds::VETOABLE_LIST_CHANGE, source, name, value, change)
            .with_field(INDEX, Value::from(index))
    }

    /// A committed set insertion or removal.
    #[must_use]
    pub fn set_change(
        source: Option<EventSource>,
        name: impl Into<String>,
        value: Value,
        change: ChangeType,
    ) -> Self {
        Self::collection_change(kinds::SET_CHANGE, source, name, value, change)
    }

    /// A proposed set insertion or removal.
    #[must_use]
    pub fn vetoable_set_change(
        source: Option<EventSource>,
        name: impl Into<String>,
        value: Value,
        change: ChangeType,
    ) -> Self {
        Self::collection_change(kinds::VETOABLE_SET_CHANGE, source, name, value, change)
    }

    fn change(kind: Kind, source: Option<EventSource>, name: impl Into<String>) -> Self {
        Self {
            source,
            ..Self::new(kind)
        }
        .with_name(name)
    }

    fn collection_change(
        kind: Kind,
        source: Option<EventSource>,
        name: impl Into<String>,
        value: Value,
        change: ChangeType,
    ) -> Self {
        let change = match change {
            ChangeType::Insert => "insert",
            ChangeType::Delete => "delete",
        };
        Self::change(kind, source, name)
            .with_field(VALUE, value)
            .with_field(CHANGE, Value::from(change))
    }

    /// The event metadata.
    #[must_use]
    pub fn metadata(&self) -> &EventMetadata {
        &self.metadata
    }

    /// The event's kind.
    #[must_use]
    pub fn kind(&self) -> &Kind {
        &self.kind
    }

    /// The source, if the publisher declared one.
    #[must_use]
    pub fn source(&self) -> Option<&EventSource> {
        self.source.as_ref()
    }

    /// The attribute name the event refers to.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// The whole payload.
    #[must_use]
    pub fn payload(&self) -> &Map<String, Value> {
        &self.payload
    }

    /// A single payload field.
    #[must_use]
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.payload.get(key)
    }

    /// The value before a change.
    #[must_use]
    pub fn old_value(&self) -> Option<&Value> {
        self.field(OLD_VALUE)
    }

    /// The value after a change.
    #[must_use]
    pub fn new_value(&self) -> Option<&Value> {
        self.field(NEW_VALUE)
    }

    /// The element inserted into or removed from a collection.
    #[must_use]
    pub fn value(&self) -> Option<&Value> {
        self.field(VALUE)
    }

    /// The slot an indexed or list change refers to.
    #[must_use]
    pub fn index(&self) -> Option<usize> {
        self.field(INDEX)
            .and_then(Value::as_u64)
            .and_then(|i| usize::try_from(i).ok())
    }

    /// The direction of a collection change.
    #[must_use]
    pub fn change_type(&self) -> Option<ChangeType> {
        self.field(CHANGE)
            .and_then(|v| ChangeType::deserialize(v).ok())
    }

    /// Whether this event's kind is `kind` or derives from it.
    #[must_use]
    pub fn is(&self, kind: &Kind) -> bool {
        self.kind.is_a(kind)
    }
}
