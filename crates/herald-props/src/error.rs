//! Error types for observable values.

use herald_bus::{PublishError, Veto};
use thiserror::Error;

/// Errors raised when changing an observable value.
#[derive(Debug, Error)]
pub enum PropertyError {
    /// Publishing the proposal or the confirmation failed. A veto arrives
    /// here unchanged.
    #[error(transparent)]
    Publish(#[from] PublishError),

    /// A list position is past the end.
    #[error("index {index} out of bounds for length {len}")]
    IndexOutOfBounds {
        /// The requested position.
        index: usize,
        /// The current length.
        len: usize,
    },

    /// A client property was addressed with an empty key.
    #[error("client property key cannot be empty")]
    EmptyKey,

    /// A value could not be turned into an event payload.
    #[error("failed to serialize value: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl PropertyError {
    /// The veto, if a handler rejected the change.
    #[must_use]
    pub fn as_veto(&self) -> Option<&Veto> {
        match self {
            Self::Publish(err) => err.as_veto(),
            _ => None,
        }
    }

    /// Whether a handler rejected the change.
    #[must_use]
    pub fn is_veto(&self) -> bool {
        self.as_veto().is_some()
    }
}

/// Result type for changes to observable values.
pub type PropertyResult<T> = Result<T, PropertyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_veto_passes_through() {
        let err = PropertyError::from(PublishError::from(Veto::new("too long")));
        assert!(err.is_veto());
        assert_eq!(err.as_veto().unwrap().reason(), "too long");
        assert_eq!(err.to_string(), "change vetoed: too long");
    }

    #[test]
    fn test_out_of_bounds_display() {
        let err = PropertyError::IndexOutOfBounds { index: 4, len: 2 };
        assert!(!err.is_veto());
        assert_eq!(err.to_string(), "index 4 out of bounds for length 2");
    }
}
