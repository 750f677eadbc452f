//! # tidegram transport
//!
//! Concrete Bot API plumbing for the tidegram bot framework.
//!
//! ## Features
//!
//! - `http-client` (default): [`HttpBot`], a `reqwest` implementation of
//!   the [`Bot`](tidegram_core::Bot) contract
//! - `webhook` (default): [`WebhookServer`], an axum receiver for pushed
//!   updates
//!
//! Long polling ([`Poller`]) only needs a `Bot` and is always available.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐ getUpdates ┌────────┐
//! │   Poller     │───────────▶│        │
//! └──────┬───────┘            │  Bot   │──▶ api.telegram.org
//!        │ dispatch           │  API   │
//! ┌──────▼───────┐   push     │        │
//! │  Dispatcher  │◀───────────│        │
//! └──────▲───────┘ (webhook)  └────────┘
//!        │
//! ┌──────┴───────┐
//! │WebhookServer │
//! └──────────────┘
//! ```
//!
//! ```rust,ignore
//! let cancel = CancellationToken::new();
//! let bot: BoxedBot = Arc::new(HttpBot::builder(token).cancellation(cancel.clone()).build()?);
//!
//! Poller::new(bot, Arc::new(dispatcher))
//!     .timeout(30)
//!     .cancellation(cancel)
//!     .run()
//!     .await;
//! ```

pub mod polling;

#[cfg(feature = "http-client")]
pub mod client;

#[cfg(feature = "webhook")]
pub mod error;
#[cfg(feature = "webhook")]
pub mod webhook;

pub use polling::{DEFAULT_RETRY_INTERVAL, Poller};

#[cfg(feature = "http-client")]
pub use client::{DEFAULT_API_URL, DEFAULT_TIMEOUT, HttpBot, HttpBotBuilder};

#[cfg(feature = "webhook")]
pub use error::ServerError;
#[cfg(feature = "webhook")]
pub use webhook::{SECRET_HEADER, WebhookServer};
