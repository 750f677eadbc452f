//! # tidegram
//!
//! An async Telegram bot framework built around a filter and middleware
//! pipeline.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐     ┌────────────┐     ┌─────────────────────────────────────────┐
//! │ Poller /     │────▶│ Dispatcher │────▶│ global middleware ─▶ handler middleware │──▶ callback
//! │ WebhookServer│     │            │────▶│ global middleware ─▶ handler middleware │──▶ callback
//! └──────────────┘     └────────────┘     └─────────────────────────────────────────┘
//! ```
//!
//! - **Runtime**: loads configuration, connects the bot, runs an update source
//! - **Update sources**: long polling or an axum webhook endpoint
//! - **Dispatcher**: routes each update to the handlers of every key it
//!   activates (a captioned photo reaches both `message` and `photo`)
//! - **Middleware**: onion-style wrappers; filters become middleware that
//!   stop the chain on a mismatch
//! - **Handlers**: async functions taking extractors such as [`Context`],
//!   [`Command`] or [`Message`]
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use tidegram::prelude::*;
//!
//! async fn ping() -> &'static str {
//!     "pong"
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut dispatcher = Dispatcher::new();
//!     dispatcher.use_middleware(middleware::recover());
//!     dispatcher.on_command("ping", ping);
//!
//!     Runtime::builder().build()?.run(dispatcher).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - `toml-config`: TOML configuration files (default)
//! - `yaml-config`: YAML configuration files
//! - `json-log`: JSON log output
//!
//! [`Context`]: prelude::Context
//! [`Command`]: prelude::Command
//! [`Message`]: prelude::Message

pub use tidegram_core as core;
pub use tidegram_framework as framework;
pub use tidegram_runtime as runtime;
pub use tidegram_transport as transport;

/// Commonly used types for building bots.
///
/// ```rust,ignore
/// use tidegram::prelude::*;
/// ```
pub mod prelude {
    // Runtime - main entry point
    pub use tidegram_runtime::{Runtime, RuntimeBuilder, TidegramConfig};

    // Registration and routing
    pub use tidegram_framework::{Dispatcher, Handler, Middleware, Next};
    pub use tidegram_framework::{Filter, all_of, and, any_of, nand, none_of, not, or, xor};
    pub use tidegram_framework::{filters, middleware};

    // Handler parameters and results
    pub use tidegram_framework::{
        Command, Context, FromContext, HandlerError, HandlerResponse, HandlerResult,
    };

    // Platform types and the Bot API
    pub use tidegram_core::{
        AnswerCallbackQueryParams, ApiError, Bot, BoxedBot, CallbackQuery, Chat, ChatId,
        ChatPermissions, InlineKeyboardButton, InlineKeyboardMarkup, InputFile, InputMedia,
        KeyboardButton, Message, ParseMode, ReplyKeyboardMarkup, ReplyMarkup, SendMessageParams,
        Update, UpdateType, User,
    };

    // Update sources, for running without the runtime
    pub use tidegram_transport::{HttpBot, Poller, WebhookServer};
}
