//! Hierarchical lookup of buses by dotted path.
//!
//! Looking up `"a.b.c"` creates `"a"`, `"a.b"` and `"a.b.c"` as needed and
//! links each one to its prefix as parent, so events left unconsumed on
//! `"a.b.c"` bubble up through `"a.b"` to `"a"`.

use std::cell::RefCell;
use std::collections::HashMap;

use tracing::debug;

use crate::bus::Bus;
use crate::config::BusConfig;
use crate::error::{ConfigResult, ConfigurationError};

/// A table of buses keyed by path.
///
/// Repeated lookups of the same path return handles to the same bus.
#[derive(Debug, Default)]
pub struct BusDirectory {
    config: BusConfig,
    buses: RefCell<HashMap<String, Bus>>,
}

impl BusDirectory {
    /// An empty directory using `.` as separator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty directory whose buses are created from `config`.
    ///
    /// Each bus takes its own path as name; the other settings are shared.
    #[must_use]
    pub fn with_config(config: BusConfig) -> Self {
        Self {
            config,
            buses: RefCell::new(HashMap::new()),
        }
    }

    /// The bus at `path`, creating it and any missing ancestors.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::InvalidPath`] if `path` is empty or
    /// has an empty segment (`"a..b"`, `".a"`, `"a."`).
    pub fn bus_for_path(&self, path: &str) -> ConfigResult<Bus> {
        let separator = self.config.path_separator;
        if path.is_empty() || path.split(separator).any(str::is_empty) {
            return Err(ConfigurationError::InvalidPath(path.to_string()));
        }

        let existing = self.buses.borrow().get(path).cloned();
        if let Some(bus) = existing {
            return Ok(bus);
        }

        let mut buses = self.buses.borrow_mut();
        let mut parent: Option<Bus> = None;
        for (end, _) in path
            .match_indices(separator)
            .chain(std::iter::once((path.len(), "")))
        {
            let prefix = &path[..end];
            let bus = match buses.get(prefix) {
                Some(bus) => bus.clone(),
                None => {
                    let config = BusConfig {
                        name: Some(prefix.to_string()),
                        ..self.config.clone()
                    };
                    let bus = Bus::with_config(config, parent.as_ref());
                    debug!(
                        path = %prefix,
                        parent = ?parent.as_ref().map(Bus::name),
                        "Created bus"
                    );
                    buses.insert(prefix.to_string(), bus.clone());
                    bus
                },
            };
            parent = Some(bus);
        }

        parent.ok_or_else(|| ConfigurationError::InvalidPath(path.to_string()))
    }

    /// The bus at `path`, if it has been created.
    #[must_use]
    pub fn get(&self, path: &str) -> Option<Bus> {
        self.buses.borrow().get(path).cloned()
    }

    /// Number of buses created so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buses.borrow().len()
    }

    /// Whether no bus has been created yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buses.borrow().is_empty()
    }

    /// Paths of all created buses, sorted.
    #[must_use]
    pub fn paths(&self) -> Vec<String> {
        let mut paths: Vec<_> = self.buses.borrow().keys().cloned().collect();
        paths.sort();
        paths
    }
}

thread_local! {
    static DEFAULT_DIRECTORY: BusDirectory = BusDirectory::new();
}

/// The bus at `path` in this thread's default directory.
///
/// # Errors
///
/// Returns [`ConfigurationError::InvalidPath`] for a malformed path.
///
/// # Example
///
/// ```rust
/// let leaf = herald_bus::bus_for_path("app.editor.buffer").unwrap();
/// let mid = herald_bus::bus_for_path("app.editor").unwrap();
///
/// assert!(leaf.parent().is_some_and(|p| p.ptr_eq(&mid)));
/// assert!(herald_bus::bus_for_path("app.editor").unwrap().ptr_eq(&mid));
/// ```
pub fn bus_for_path(path: &str) -> ConfigResult<Bus> {
    DEFAULT_DIRECTORY.with(|directory| directory.bus_for_path(path))
}
