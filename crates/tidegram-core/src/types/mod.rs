//! Bot API entities consumed by the framework.
//!
//! Only the fields routing and the bundled API helpers need are mirrored.
//! Unknown fields are ignored on deserialization.

mod chat;
mod entity;
mod file;
mod markup;
mod media;
mod member;
mod message;
mod user;

pub use chat::{Chat, ChatType};
pub use entity::{EntityType, MessageEntity, utf16_slice};
pub use file::{InputFile, WebhookInfo};
pub use markup::{
    ForceReply, InlineKeyboardButton, InlineKeyboardMarkup, KeyboardButton, ReplyKeyboardMarkup,
    ReplyKeyboardRemove, ReplyMarkup,
};
pub use media::{Animation, Audio, Document, PhotoSize, Video, Voice};
pub use member::{ChatMember, ChatMemberStatus};
pub use message::{CallbackQuery, InaccessibleMessage, MaybeInaccessibleMessage, Message};
pub use user::User;
