//! Configuration schema definitions.
//!
//! Every section has serde defaults, so an empty file (or no file at all)
//! deserializes into a complete configuration. Only `bot.token` has no
//! usable default.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tidegram_core::UpdateType;
use tidegram_transport::{DEFAULT_API_URL, DEFAULT_RETRY_INTERVAL, DEFAULT_TIMEOUT};

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TidegramConfig {
    /// Bot credentials and API client settings.
    #[serde(default)]
    pub bot: BotConfig,

    /// Long polling settings, used when no webhook is configured.
    #[serde(default)]
    pub polling: PollingConfig,

    /// Webhook settings. Present means webhook mode.
    #[serde(default)]
    pub webhook: Option<WebhookConfig>,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

// =============================================================================
// Bot
// =============================================================================

/// Bot credentials and API client settings.
#[derive(Clone, Serialize, Deserialize)]
pub struct BotConfig {
    /// Token issued by BotFather.
    #[serde(default)]
    pub token: String,

    /// Bot API base URL.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Per-request timeout. Must exceed the long-poll timeout.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl BotConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            api_url: default_api_url(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl fmt::Debug for BotConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BotConfig")
            .field("token", &if self.token.is_empty() { "" } else { "***" })
            .field("api_url", &self.api_url)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT.as_secs()
}

// =============================================================================
// Update sources
// =============================================================================

/// Long polling settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollingConfig {
    /// Long-poll timeout in seconds.
    #[serde(default = "default_poll_timeout_secs")]
    pub timeout_secs: u64,

    /// Maximum updates per batch (1-100).
    #[serde(default = "default_limit")]
    pub limit: u8,

    /// Update kinds to receive. Empty keeps the server-side setting.
    #[serde(default)]
    pub allowed_updates: Vec<UpdateType>,

    /// Wait before retrying a failed `getUpdates`.
    #[serde(default = "default_retry_interval_ms")]
    pub retry_interval_ms: u64,
}

impl PollingConfig {
    pub fn retry_interval(&self) -> Duration {
        Duration::from_millis(self.retry_interval_ms)
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_poll_timeout_secs(),
            limit: default_limit(),
            allowed_updates: Vec::new(),
            retry_interval_ms: default_retry_interval_ms(),
        }
    }
}

fn default_poll_timeout_secs() -> u64 {
    30
}

fn default_limit() -> u8 {
    100
}

fn default_retry_interval_ms() -> u64 {
    DEFAULT_RETRY_INTERVAL.as_millis() as u64
}

/// Webhook settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookConfig {
    /// Socket address the server binds, e.g. `0.0.0.0:8443`.
    #[serde(default)]
    pub listen: String,

    /// Route path of the update endpoint.
    #[serde(default = "default_webhook_path")]
    pub path: String,

    /// Expected `X-Telegram-Bot-Api-Secret-Token` header value.
    #[serde(default)]
    pub secret_token: Option<String>,

    /// Public URL registered with `setWebhook` on start. When unset the
    /// webhook is assumed to be registered already.
    #[serde(default)]
    pub url: Option<String>,

    /// Drop updates queued before the webhook was registered.
    #[serde(default)]
    pub drop_pending_updates: bool,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            listen: String::new(),
            path: default_webhook_path(),
            secret_token: None,
            url: None,
            drop_pending_updates: false,
        }
    }
}

fn default_webhook_path() -> String {
    "/".to_string()
}

// =============================================================================
// Logging
// =============================================================================

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Base level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub format: LogFormat,

    #[serde(default)]
    pub output: LogOutput,

    /// Target file when `output` is `file`.
    #[serde(default)]
    pub file_path: Option<PathBuf>,

    #[serde(default)]
    pub span_events: SpanEventConfig,

    #[serde(default)]
    pub thread_ids: bool,

    /// Include file names and line numbers.
    #[serde(default)]
    pub file_location: bool,

    /// Per-target levels, e.g. `tidegram_transport = "debug"`.
    #[serde(default)]
    pub filters: BTreeMap<String, String>,

    /// Caps the HTTP stack (hyper, reqwest, h2) at `warn` unless `RUST_LOG`
    /// or `filters` say otherwise.
    #[serde(default = "default_quiet_dependencies")]
    pub quiet_dependencies: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
            output: LogOutput::default(),
            file_path: None,
            span_events: SpanEventConfig::default(),
            thread_ids: false,
            file_location: false,
            filters: BTreeMap::new(),
            quiet_dependencies: default_quiet_dependencies(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_quiet_dependencies() -> bool {
    true
}

/// Log line layout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Full,
    Pretty,
    /// Requires the `json-log` feature; falls back to compact otherwise.
    Json,
}

/// Log destination.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    #[default]
    Stdout,
    Stderr,
    File,
}

/// Which span lifecycle events are logged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpanEventConfig {
    #[serde(default)]
    pub new: bool,
    #[serde(default)]
    pub enter: bool,
    #[serde(default)]
    pub exit: bool,
    #[serde(default)]
    pub close: bool,
}
