//! Inbound updates and their routing keys.
//!
//! An [`Update`] carries at most one payload. [`Update::activations`] turns
//! it into the list of `(UpdateType, Event)` pairs the dispatcher routes:
//! a message activates its generic key and, independently, one key per
//! populated media field.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ApiResult;
use crate::event::Event;
use crate::types::{CallbackQuery, Message};

/// Routing key for registered handlers.
///
/// The first seven mirror the payload fields of an update. The media keys
/// are derived from message content and never appear on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateType {
    Message,
    EditedMessage,
    ChannelPost,
    EditedChannelPost,
    BusinessMessage,
    EditedBusinessMessage,
    CallbackQuery,

    Animation,
    Audio,
    Document,
    Photo,
    Video,
    Voice,
}

impl UpdateType {
    /// Keys that correspond to real update payloads, in wire order.
    pub const PAYLOADS: [UpdateType; 7] = [
        Self::Message,
        Self::EditedMessage,
        Self::ChannelPost,
        Self::EditedChannelPost,
        Self::BusinessMessage,
        Self::EditedBusinessMessage,
        Self::CallbackQuery,
    ];

    /// Keys derived from the media content of a message.
    pub const MEDIA: [UpdateType; 6] = [
        Self::Animation,
        Self::Audio,
        Self::Document,
        Self::Photo,
        Self::Video,
        Self::Voice,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Message => "message",
            Self::EditedMessage => "edited_message",
            Self::ChannelPost => "channel_post",
            Self::EditedChannelPost => "edited_channel_post",
            Self::BusinessMessage => "business_message",
            Self::EditedBusinessMessage => "edited_business_message",
            Self::CallbackQuery => "callback_query",
            Self::Animation => "animation",
            Self::Audio => "audio",
            Self::Document => "document",
            Self::Photo => "photo",
            Self::Video => "video",
            Self::Voice => "voice",
        }
    }

    /// Whether this key is derived from message media.
    pub fn is_media(&self) -> bool {
        Self::MEDIA.contains(self)
    }
}

impl fmt::Display for UpdateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An incoming update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<Message>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edited_message: Option<Message>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_post: Option<Message>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edited_channel_post: Option<Message>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub business_message: Option<Message>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edited_business_message: Option<Message>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub callback_query: Option<CallbackQuery>,
}

impl Update {
    /// An update with no payload.
    pub fn empty(update_id: i64) -> Self {
        Self {
            update_id,
            message: None,
            edited_message: None,
            channel_post: None,
            edited_channel_post: None,
            business_message: None,
            edited_business_message: None,
            callback_query: None,
        }
    }

    /// Wraps a new message.
    pub fn with_message(update_id: i64, message: Message) -> Self {
        Self {
            message: Some(message),
            ..Self::empty(update_id)
        }
    }

    /// Wraps a callback query.
    pub fn with_callback_query(update_id: i64, query: CallbackQuery) -> Self {
        Self {
            callback_query: Some(query),
            ..Self::empty(update_id)
        }
    }

    /// Projects the populated payload into an [`Event`].
    ///
    /// Returns `None` for updates carrying a payload this crate does not
    /// mirror (inline queries, polls, ...).
    pub fn event(&self) -> Option<Event> {
        let message = |m: &Message| Arc::new(m.clone());
        if let Some(m) = &self.message {
            return Some(Event::Message(message(m)));
        }
        if let Some(m) = &self.edited_message {
            return Some(Event::EditedMessage(message(m)));
        }
        if let Some(m) = &self.channel_post {
            return Some(Event::ChannelPost(message(m)));
        }
        if let Some(m) = &self.edited_channel_post {
            return Some(Event::EditedChannelPost(message(m)));
        }
        if let Some(m) = &self.business_message {
            return Some(Event::BusinessMessage(message(m)));
        }
        if let Some(m) = &self.edited_business_message {
            return Some(Event::EditedBusinessMessage(message(m)));
        }
        self.callback_query
            .as_ref()
            .map(|q| Event::CallbackQuery(Arc::new(q.clone())))
    }

    /// Every routing key this update activates, paired with its event.
    ///
    /// A new message yields [`UpdateType::Message`] followed by one entry per
    /// populated media field, in [`UpdateType::MEDIA`] order. Every other
    /// payload yields exactly one entry.
    pub fn activations(&self) -> Vec<(UpdateType, Event)> {
        let Some(event) = self.event() else {
            return Vec::new();
        };

        let mut out = vec![(event.kind(), event.clone())];
        if let Event::Message(message) = &event {
            out.extend(
                media_kinds(message)
                    .into_iter()
                    .map(|kind| (kind, event.clone())),
            );
        }
        out
    }
}

/// Media keys populated on `message`.
pub fn media_kinds(message: &Message) -> Vec<UpdateType> {
    let mut kinds = Vec::new();
    if message.animation.is_some() {
        kinds.push(UpdateType::Animation);
    }
    if message.audio.is_some() {
        kinds.push(UpdateType::Audio);
    }
    if message.document.is_some() {
        kinds.push(UpdateType::Document);
    }
    if !message.photo.is_empty() {
        kinds.push(UpdateType::Photo);
    }
    if message.video.is_some() {
        kinds.push(UpdateType::Video);
    }
    if message.voice.is_some() {
        kinds.push(UpdateType::Voice);
    }
    kinds
}

/// Decodes one entry of a `getUpdates` batch.
pub fn decode_update(value: Value) -> ApiResult<Update> {
    Ok(serde_json::from_value(value)?)
}

/// Reads `update_id` from an entry that may not decode as a whole.
pub fn raw_update_id(value: &Value) -> Option<i64> {
    value.get("update_id").and_then(Value::as_i64)
}
