use thiserror::Error;

/// Errors raised by the webhook server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The listen address could not be bound.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// The server stopped with an I/O error.
    #[error("webhook server error: {0}")]
    Serve(#[source] std::io::Error),
}
