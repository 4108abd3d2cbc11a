//! Herald Props - observable values that announce their changes on a bus.
//!
//! Model objects keep their state in these wrappers instead of plain
//! fields. Every change publishes an event on the value's bus, so views and
//! controllers can follow the model without the model knowing about them.
//!
//! - [`Property`]: a single value
//! - [`IndexedProperty`]: a sparse array, announced slot by slot
//! - [`ListProperty`]: an ordered list, announced element by element
//! - [`SetProperty`]: an unordered set
//! - [`ClientProperties`]: free-form JSON values by key
//!
//! A value built with a constrained [`Notifier`] proposes each change with
//! a vetoable event first; a handler returning a
//! [`Veto`](herald_bus::Veto) stops the change and the error reaches the
//! caller of the setter.
//!
//! # Example
//!
//! ```rust
//! use herald_bus::{Bus, Bindings, Event, HandlerError, Subscriber, kinds};
//! use herald_props::{Notifier, Property};
//! use std::rc::Rc;
//!
//! struct NoNegatives;
//!
//! impl Subscriber for NoNegatives {
//!     fn bindings(&self) -> Bindings<Self> {
//!         Bindings::new().on(
//!             "check",
//!             kinds::VETOABLE_PROPERTY_CHANGE,
//!             |_: &Self, e: &Event| match e.new_value().and_then(|v| v.as_i64()) {
//!                 Some(n) if n < 0 => Err(HandlerError::veto("negative")),
//!                 _ => Ok(()),
//!             },
//!         )
//!     }
//! }
//!
//! let bus = Bus::new();
//! let guard = Rc::new(NoNegatives);
//! bus.register(&guard).unwrap();
//!
//! let mut balance = Property::new(Notifier::new("balance").with_bus(&bus).constrained(), 10);
//! assert!(balance.set_value(-5).unwrap_err().is_veto());
//! assert_eq!(*balance.value(), 10);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod client;
mod error;
mod indexed;
mod list;
mod notifier;
mod property;
mod set;

pub use client::ClientProperties;
pub use error::{PropertyError, PropertyResult};
pub use indexed::IndexedProperty;
pub use list::ListProperty;
pub use notifier::Notifier;
pub use property::Property;
pub use set::SetProperty;
