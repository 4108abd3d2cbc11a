//! Bus configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ConfigResult;

/// Default separator between the segments of a bus path.
pub const DEFAULT_PATH_SEPARATOR: char = '.';

/// Settings for a [`Bus`](crate::Bus) and for the buses a
/// [`BusDirectory`](crate::BusDirectory) creates.
///
/// Every field has a default, so an empty TOML document is a valid
/// configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BusConfig {
    /// Name used in logs and `Debug` output.
    pub name: Option<String>,
    /// Separator between path segments in a directory.
    pub path_separator: char,
    /// Log each handler delivery at `debug` instead of `trace`.
    pub log_deliveries: bool,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            name: None,
            path_separator: DEFAULT_PATH_SEPARATOR,
            log_deliveries: false,
        }
    }
}

impl BusConfig {
    /// A default configuration with a name.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Set the path separator.
    #[must_use]
    pub fn with_path_separator(mut self, separator: char) -> Self {
        self.path_separator = separator;
        self
    }

    /// Enable or disable per-delivery debug logging.
    #[must_use]
    pub fn with_log_deliveries(mut self, enabled: bool) -> Self {
        self.log_deliveries = enabled;
        self
    }

    /// Parse a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::Parse`](crate::ConfigurationError::Parse)
    /// if the document is not valid TOML or has fields of the wrong type.
    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Read and parse a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::Io`](crate::ConfigurationError::Io) if
    /// the file cannot be read and
    /// [`ConfigurationError::Parse`](crate::ConfigurationError::Parse) if it
    /// cannot be parsed.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        debug!(path = %path.display(), "Loading bus configuration");
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }
}
