//! Prelude module - commonly used test utilities.
//!
//! Use `use herald_test::prelude::*;` to import all test helpers.

pub use crate::{
    Journal, PING, PONG, Reaction, RecordingSubscriber, WIDGET, init_test_logging,
    init_test_logging_with, ping_event, pong_event, test_source,
};
