//! Herald Telemetry - logging setup for applications built on the herald bus.
//!
//! The bus crates log through `tracing` only. This crate installs a
//! `tracing-subscriber` pipeline for them: a level, per-target directives
//! and an output format.
//!
//! # Example
//!
//! ```rust,no_run
//! use herald_telemetry::{LogConfig, LogFormat, setup_logging};
//!
//! # fn main() -> Result<(), herald_telemetry::TelemetryError> {
//! let config = LogConfig::new("info")
//!     .with_format(LogFormat::Compact)
//!     .with_directive("herald_bus=debug");
//!
//! setup_logging(&config)?;
//! tracing::info!("logging ready");
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod error;
mod logging;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::{LogConfig, LogFormat, LogTarget, setup_default_logging, setup_logging};
