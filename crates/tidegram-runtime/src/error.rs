//! Runtime error types.

use thiserror::Error;
use tidegram_core::ApiError;
use tidegram_transport::ServerError;

use crate::config::ConfigError;

/// Errors that end [`Runtime::run`](crate::Runtime::run).
#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Startup calls (`getMe`, webhook registration) failed, or the token
    /// was empty.
    #[error("Bot API error during startup: {0}")]
    Api(#[from] ApiError),

    #[error(transparent)]
    Server(#[from] ServerError),
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
