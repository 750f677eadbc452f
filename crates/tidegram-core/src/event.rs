//! The event capability surface.
//!
//! [`Event`] is a read-only projection of one update payload. Every accessor
//! is total: a field that does not apply to the variant yields `None` or an
//! empty slice, never an error.

use std::sync::Arc;

use crate::types::{CallbackQuery, Chat, Message, MessageEntity, User};
use crate::update::UpdateType;

/// One concrete update payload.
///
/// Payloads are reference counted so a fanned-out update shares a single
/// allocation across every activation.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Message(Arc<Message>),
    EditedMessage(Arc<Message>),
    ChannelPost(Arc<Message>),
    EditedChannelPost(Arc<Message>),
    BusinessMessage(Arc<Message>),
    EditedBusinessMessage(Arc<Message>),
    CallbackQuery(Arc<CallbackQuery>),
}

impl Event {
    /// The payload key of this event.
    pub fn kind(&self) -> UpdateType {
        match self {
            Self::Message(_) => UpdateType::Message,
            Self::EditedMessage(_) => UpdateType::EditedMessage,
            Self::ChannelPost(_) => UpdateType::ChannelPost,
            Self::EditedChannelPost(_) => UpdateType::EditedChannelPost,
            Self::BusinessMessage(_) => UpdateType::BusinessMessage,
            Self::EditedBusinessMessage(_) => UpdateType::EditedBusinessMessage,
            Self::CallbackQuery(_) => UpdateType::CallbackQuery,
        }
    }

    /// The carried chat message.
    ///
    /// `None` for callback queries; their attached message is reachable
    /// through [`Event::callback_query`].
    pub fn message(&self) -> Option<&Message> {
        match self {
            Self::Message(m)
            | Self::EditedMessage(m)
            | Self::ChannelPost(m)
            | Self::EditedChannelPost(m)
            | Self::BusinessMessage(m)
            | Self::EditedBusinessMessage(m) => Some(&**m),
            Self::CallbackQuery(_) => None,
        }
    }

    /// Shared handle to the carried message.
    pub fn message_arc(&self) -> Option<Arc<Message>> {
        match self {
            Self::Message(m)
            | Self::EditedMessage(m)
            | Self::ChannelPost(m)
            | Self::EditedChannelPost(m)
            | Self::BusinessMessage(m)
            | Self::EditedBusinessMessage(m) => Some(Arc::clone(m)),
            Self::CallbackQuery(_) => None,
        }
    }

    pub fn callback_query(&self) -> Option<&CallbackQuery> {
        match self {
            Self::CallbackQuery(q) => Some(&**q),
            _ => None,
        }
    }

    /// The sender.
    pub fn from(&self) -> Option<&User> {
        match self {
            Self::CallbackQuery(q) => Some(&q.from),
            _ => self.message().and_then(|m| m.from.as_ref()),
        }
    }

    /// The chat the event belongs to.
    ///
    /// For callback queries this is the chat of the attached message, which
    /// may be inaccessible.
    pub fn chat(&self) -> Option<&Chat> {
        match self {
            Self::CallbackQuery(q) => q.message.as_ref().map(|m| m.chat()),
            _ => self.message().map(|m| &m.chat),
        }
    }

    /// Text entities of the message; empty for callback queries.
    pub fn entities(&self) -> &[MessageEntity] {
        self.message().map(|m| m.entities.as_slice()).unwrap_or(&[])
    }

    /// Message text, if any.
    pub fn text(&self) -> Option<&str> {
        self.message().and_then(|m| m.text.as_deref())
    }
}
