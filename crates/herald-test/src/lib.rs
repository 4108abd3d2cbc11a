//! Herald Test - shared test utilities for the herald crates.
//!
//! This crate provides a recording subscriber, event fixtures and test log
//! setup that can be used across the herald crates as a dev-dependency.
//!
//! # Usage
//!
//! ```toml
//! [dev-dependencies]
//! herald-test.workspace = true
//! ```
//!
//! ```rust
//! use herald_bus::Bus;
//! use herald_test::{Journal, RecordingSubscriber, ping_event};
//!
//! let bus = Bus::new();
//! let journal = Journal::new();
//! let recorder = RecordingSubscriber::new("first", &journal);
//! bus.register(&recorder).unwrap();
//!
//! bus.publish(ping_event()).unwrap();
//! assert_eq!(journal.entries(), vec!["first:ping"]);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod prelude;

pub mod fixtures;
pub mod harness;
pub mod recording;

pub use fixtures::*;
pub use harness::*;
pub use recording::*;
