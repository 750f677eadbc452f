//! Error types shared by every tidegram layer.
//!
//! Dispatch-level errors (`HandlerError`, `ExtractError`) live in
//! `tidegram-framework`; this module only covers talking to the Bot API.

use thiserror::Error;

// =============================================================================
// Transport Errors
// =============================================================================

/// Errors raised while moving bytes to and from the Bot API.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// The HTTP request could not be sent or its body could not be read.
    #[error("request failed: {0}")]
    Request(String),

    /// The server answered with a status the API never uses for envelopes.
    #[error("HTTP {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Raw response body (possibly truncated by the server).
        body: String,
    },

    /// A local file could not be read for upload.
    #[error("I/O error: {0}")]
    Io(String),
}

impl From<std::io::Error> for TransportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

// =============================================================================
// API Errors
// =============================================================================

/// Error type for Bot API calls.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// The platform answered with `ok: false`.
    #[error("telegram error ({code}): {description}")]
    Telegram {
        /// `error_code` from the response envelope.
        code: i64,
        /// Human readable `description` from the response envelope.
        description: String,
    },

    /// The response envelope was `ok: false` without an error code.
    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),

    /// Failed to serialize parameters or deserialize a result.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Transport error.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The call was abandoned because the bot is shutting down.
    #[error("request cancelled")]
    Cancelled,

    /// The bot was started without a token.
    #[error("empty bot token")]
    EmptyToken,

    /// An [`InputFile`](crate::InputFile) carried no usable source.
    #[error("unknown file source")]
    UnknownFileSource,

    /// A method that must return `true` returned something else.
    #[error("expected `true` result from {0}")]
    ExpectedTrue(&'static str),
}

impl ApiError {
    /// Returns the platform error code, if this is a platform error.
    pub fn code(&self) -> Option<i64> {
        match self {
            Self::Telegram { code, .. } => Some(*code),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;

/// Result type for API calls.
pub type ApiResult<T> = Result<T, ApiError>;
