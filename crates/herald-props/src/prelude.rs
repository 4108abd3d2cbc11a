//! Prelude module - commonly used types for convenient import.
//!
//! Use `use herald_props::prelude::*;` to import all essential types.

pub use crate::{
    ClientProperties, IndexedProperty, ListProperty, Notifier, Property, PropertyError,
    PropertyResult, SetProperty,
};
