//! # tidegram core
//!
//! Shared building blocks for the tidegram bot framework:
//!
//! - **Types**: serde mirrors of the Bot API entities routing needs
//!   ([`Message`], [`CallbackQuery`], [`User`], [`Chat`], ...)
//! - **Updates**: [`Update`], its routing keys ([`UpdateType`]) and the
//!   fan-out into activations
//! - **Events**: the [`Event`] capability surface handlers and filters read
//! - **Transport contract**: the [`Bot`] trait with its two raw calls, plus
//!   typed helpers layered on `dyn Bot`
//! - **Errors**: [`ApiError`] and [`TransportError`]
//!
//! ```text
//! ┌──────────────┐  Update   ┌──────────────┐  (UpdateType, Event)  ┌──────────┐
//! │ update source│──────────▶│ activations()│──────────────────────▶│dispatcher│
//! └──────────────┘           └──────────────┘                       └──────────┘
//! ```

pub mod api;
pub mod bot;
pub mod error;
pub mod event;
pub mod types;
pub mod update;

pub use api::{
    AdministratorRights, AnswerCallbackQueryParams, BanChatMemberParams, ChatId, ChatPermissions,
    GetUpdatesParams, InputMedia, MediaKind, ParseMode, ReplyParameters, SendAudioParams,
    SendDocumentParams, SendMediaGroupParams, SendMessageParams, SendPhotoParams, SendVideoParams,
    SetWebhookParams, to_params,
};
pub use bot::{Bot, BoxedBot, Files, Params, parse_chat_id, parse_result};
pub use error::{ApiError, ApiResult, TransportError, TransportResult};
pub use event::Event;
pub use types::*;
pub use update::{Update, UpdateType, decode_update, media_kinds, raw_update_id};
