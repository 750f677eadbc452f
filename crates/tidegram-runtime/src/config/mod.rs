//! Configuration loading and validation.
//!
//! A configuration file is optional: every setting except `bot.token` has a
//! default, and the token is usually supplied as `TIDEGRAM_BOT__TOKEN`.
//!
//! ```toml
//! [bot]
//! token = "123456:ABC-DEF"
//!
//! [polling]
//! timeout_secs = 30
//! allowed_updates = ["message", "callback_query"]
//!
//! # Present means webhook mode.
//! [webhook]
//! listen = "0.0.0.0:8443"
//! path = "/telegram"
//! url = "https://bot.example.com/telegram"
//! secret_token = "change-me"
//!
//! [logging]
//! level = "info"
//! format = "compact"
//! quiet_dependencies = true
//! ```

pub mod error;
pub mod loader;
pub mod schema;
pub mod validation;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigLoader, Profile, load_config, load_config_from_file};
pub use schema::{
    BotConfig, LogFormat, LogOutput, LoggingConfig, PollingConfig, SpanEventConfig,
    TidegramConfig, WebhookConfig,
};
pub use validation::validate_config;
