//! Herald Bus - single-threaded publish/subscribe for UI-style object models.
//!
//! This crate provides:
//! - [`Kind`] tags with declared supertypes, and the built-in [`kinds`]
//! - Immutable [`Event`]s with an optional source, attribute name and payload
//! - [`Subscriber`]s that declare their handlers in a [`Bindings`] table
//! - A [`Bus`] that holds subscribers weakly and dispatches synchronously
//! - A [`BusDirectory`] that builds bus hierarchies from dotted paths
//!
//! # Architecture
//!
//! Handlers run on the publishing thread, in registration order. A handler
//! may register, unregister or publish on the bus that is calling it:
//! registry changes are staged until the current pass ends and nested
//! events are queued behind it, so a pass always sees a stable handler list
//! and events are delivered one at a time.
//!
//! A handler ends delivery early by returning [`Delivery::Consumed`].
//! Events that nobody consumes move on to the parent bus. A handler can
//! also reject a proposed change with a [`Veto`], which travels back to the
//! publisher unchanged.
//!
//! # Example
//!
//! ```rust
//! use herald_bus::prelude::*;
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! #[derive(Default)]
//! struct Logger {
//!     seen: RefCell<Vec<String>>,
//! }
//!
//! impl Subscriber for Logger {
//!     fn bindings(&self) -> Bindings<Self> {
//!         Bindings::new().on("on_change", kinds::PROPERTY_CHANGE, |s: &Self, e: &Event| {
//!             s.seen.borrow_mut().push(e.name().unwrap_or_default().to_string());
//!             Ok(())
//!         })
//!     }
//! }
//!
//! let parent = Bus::new();
//! let child = Bus::with_parent(&parent);
//! let logger = Rc::new(Logger::default());
//! parent.register(&logger).unwrap();
//!
//! child
//!     .publish(Event::property_change(None, "title", "old".into(), "new".into()))
//!     .unwrap();
//!
//! assert_eq!(*logger.seen.borrow(), vec!["title"]);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod kinds;
pub mod prelude;

mod bus;
mod config;
mod directory;
mod error;
mod event;
mod kind;
mod registry;
mod subscriber;

pub use bus::{Bus, WeakBus};
pub use config::{BusConfig, DEFAULT_PATH_SEPARATOR};
pub use directory::{BusDirectory, bus_for_path};
pub use error::{
    BoxError, ConfigResult, ConfigurationError, HandlerError, PublishError, PublishResult, Veto,
};
pub use event::{ChangeType, Event, EventMetadata, EventSource};
pub use kind::Kind;
pub use subscriber::{
    Binding, Bindings, Delivery, Descriptor, Filter, HandlerResult, Subscriber, extract, identity,
};
