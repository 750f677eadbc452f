//! tidegram runtime: configuration, logging and bootstrapping.
//!
//! - [`config`]: layered configuration (defaults, files, `TIDEGRAM_*`
//!   environment variables) and validation
//! - [`logging`]: `tracing-subscriber` setup driven by the configuration
//! - [`Runtime`]: connects the bot, runs long polling or the webhook server,
//!   and shuts down on Ctrl+C / SIGTERM
//!
//! ```rust,ignore
//! use tidegram_framework::Dispatcher;
//! use tidegram_runtime::Runtime;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut dispatcher = Dispatcher::new();
//!     dispatcher.on_command("start", || async { "Hello!" });
//!
//!     Runtime::builder().build()?.run(dispatcher).await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod runtime;

pub use config::{
    ConfigError, ConfigLoader, ConfigResult, LogFormat, LogOutput, LoggingConfig, Profile,
    TidegramConfig,
};
pub use error::{RuntimeError, RuntimeResult};
pub use logging::{LoggingBuilder, SpanEvents};
pub use runtime::{Runtime, RuntimeBuilder};

pub use tracing;
pub use tracing_subscriber;
