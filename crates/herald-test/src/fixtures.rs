//! Test fixtures for kinds, sources and events.

use herald_bus::{Event, EventSource, Kind, kinds};

/// A plain event kind for tests.
pub static PING: Kind = Kind::derived("ping", &kinds::EVENT);

/// A second plain event kind, unrelated to [`PING`].
pub static PONG: Kind = Kind::derived("pong", &kinds::EVENT);

/// A source kind for tests.
pub static WIDGET: Kind = Kind::derived("widget", &kinds::ANY);

/// Create a [`PING`] event with no source.
#[must_use]
pub fn ping_event() -> Event {
    Event::new(PING)
}

/// Create a [`PONG`] event with no source.
#[must_use]
pub fn pong_event() -> Event {
    Event::new(PONG)
}

/// Create a [`WIDGET`] source with the given id.
#[must_use]
pub fn test_source(id: impl Into<String>) -> EventSource {
    EventSource::new(WIDGET, id)
}
