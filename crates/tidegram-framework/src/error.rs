//! Error types for the dispatch pipeline.

use thiserror::Error;
use tidegram_core::{ApiError, UpdateType};
use tower::BoxError;

/// Everything a filter, middleware or callback can fail with.
///
/// [`HandlerError::StopPropagation`] is control flow, not a failure: the
/// dispatcher ends the current handler's chain without logging an error and
/// moves on to the next handler.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// Stops the current handler's chain silently.
    #[error("stop propagation")]
    StopPropagation,

    /// A callback parameter could not be extracted.
    #[error(transparent)]
    Extract(#[from] ExtractError),

    /// A Bot API call failed.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// The chain panicked and was caught by the recovery middleware.
    #[error("handler panicked: {0}")]
    Panicked(String),

    /// Any other error raised by user code.
    #[error("{0}")]
    Other(#[from] BoxError),
}

impl HandlerError {
    /// Whether this is the stop-propagation sentinel.
    pub fn is_stop(&self) -> bool {
        matches!(self, Self::StopPropagation)
    }

    /// Wraps an arbitrary error.
    pub fn other(err: impl Into<BoxError>) -> Self {
        Self::Other(err.into())
    }

    /// Creates an error from a plain message.
    pub fn msg(message: impl Into<String>) -> Self {
        Self::Other(message.into().into())
    }
}

/// Result type of every stage in the pipeline.
pub type HandlerResult<T = ()> = Result<T, HandlerError>;

/// Errors that can occur during context extraction.
#[derive(Debug, Clone, Error)]
pub enum ExtractError {
    /// The event does not carry the requested piece of data.
    #[error("{what} is not available on '{update_type}' updates")]
    Missing {
        /// What was requested (e.g. "message", "sender").
        what: &'static str,
        /// The routing key the handler was activated under.
        update_type: UpdateType,
    },

    /// Custom extraction error.
    #[error("{0}")]
    Custom(String),
}

impl ExtractError {
    pub fn missing(what: &'static str, update_type: UpdateType) -> Self {
        Self::Missing { what, update_type }
    }

    /// Creates a custom extraction error.
    pub fn custom(msg: impl Into<String>) -> Self {
        Self::Custom(msg.into())
    }
}

/// Result type for extraction operations.
pub type ExtractResult<T> = Result<T, ExtractError>;
