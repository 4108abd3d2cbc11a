//! Error types for registration and dispatch.

use std::error::Error as StdError;

use thiserror::Error;

/// A boxed error raised by a handler.
pub type BoxError = Box<dyn StdError + 'static>;

/// A subscriber's binding table or a bus path is malformed.
///
/// Raised synchronously by `register` (or path lookup); nothing is
/// registered when it occurs.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    /// A binding was declared with an empty handler name.
    #[error("subscriber '{subscriber_type}' declares a handler with an empty name")]
    EmptyHandlerName {
        /// The subscriber's declared type.
        subscriber_type: String,
    },

    /// A binding accepts a kind that is not an event kind.
    #[error(
        "subscriber '{subscriber_type}' binds handler '{handler}' to '{kind}', which is not an event kind"
    )]
    NotAnEventKind {
        /// The subscriber's declared type.
        subscriber_type: String,
        /// The offending handler.
        handler: String,
        /// The kind the handler was bound to.
        kind: String,
    },

    /// A bus path is empty or contains an empty segment.
    #[error("invalid bus path: '{0}'")]
    InvalidPath(String),

    /// A configuration document could not be parsed.
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// A configuration file could not be read.
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),
}

/// A handler rejected a proposed change.
///
/// The veto travels unchanged out of every nested and escalated `publish`
/// to the original caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("change vetoed: {reason}")]
pub struct Veto {
    reason: String,
}

impl Veto {
    /// Create a veto with a human-readable reason.
    #[must_use]
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    /// Why the change was rejected.
    #[must_use]
    pub fn reason(&self) -> &str {
        &self.reason
    }
}

/// What a handler may fail with.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// Reject the change announced by the event.
    #[error(transparent)]
    Veto(#[from] Veto),

    /// Any other failure.
    #[error(transparent)]
    Failed(BoxError),
}

impl HandlerError {
    /// Shorthand for a veto.
    #[must_use]
    pub fn veto(reason: impl Into<String>) -> Self {
        Self::Veto(Veto::new(reason))
    }

    /// Wrap an arbitrary error.
    #[must_use]
    pub fn failed(error: impl Into<BoxError>) -> Self {
        Self::Failed(error.into())
    }
}

/// A handler that publishes and hits an error passes a veto through as a
/// veto and anything else as a failure.
impl From<PublishError> for HandlerError {
    fn from(err: PublishError) -> Self {
        match err {
            PublishError::Vetoed(veto) => Self::Veto(veto),
            fault @ PublishError::HandlerFault { .. } => Self::Failed(Box::new(fault)),
        }
    }
}

/// Failure of a `publish` call.
#[derive(Debug, Error)]
pub enum PublishError {
    /// A handler vetoed the event.
    #[error(transparent)]
    Vetoed(#[from] Veto),

    /// A handler failed for any other reason.
    #[error("handler '{handler}' on an instance of '{subscriber_type}' failed: {source}")]
    HandlerFault {
        /// The handler that failed.
        handler: String,
        /// The subscriber's declared type.
        subscriber_type: String,
        /// The underlying failure.
        #[source]
        source: BoxError,
    },
}

impl PublishError {
    /// The veto, if this error is one.
    #[must_use]
    pub fn as_veto(&self) -> Option<&Veto> {
        match self {
            Self::Vetoed(veto) => Some(veto),
            Self::HandlerFault { .. } => None,
        }
    }

    /// Whether a handler vetoed the event.
    #[must_use]
    pub fn is_veto(&self) -> bool {
        self.as_veto().is_some()
    }
}

/// Result type for registration and configuration.
pub type ConfigResult<T> = Result<T, ConfigurationError>;

/// Result type for publishing.
pub type PublishResult<T = ()> = Result<T, PublishError>;
