//! Prelude module - commonly used types for convenient import.
//!
//! Use `use herald_bus::prelude::*;` to import all essential types.

// Bus
pub use crate::{Bus, BusConfig, BusDirectory, WeakBus, bus_for_path};

// Events
pub use crate::{ChangeType, Event, EventSource, Kind, kinds};

// Subscriber system
pub use crate::{Binding, Bindings, Delivery, HandlerResult, Subscriber};

// Errors
pub use crate::{ConfigurationError, HandlerError, PublishError, Veto};
