//! Messages and callback queries.

use serde::{Deserialize, Deserializer, Serialize};

use super::{
    Animation, Audio, Chat, Document, EntityType, MessageEntity, PhotoSize, User, Video, Voice,
};

/// A message in a chat, channel or business connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub message_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_thread_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<User>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender_chat: Option<Chat>,
    /// Unix time. Zero for inaccessible messages.
    pub date: i64,
    pub chat: Chat,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub business_connection_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to_message: Option<Box<Message>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edit_date: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_group_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub entities: Vec<MessageEntity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub caption_entities: Vec<MessageEntity>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub animation: Option<Animation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio: Option<Audio>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document: Option<Document>,
    /// Available sizes of the photo, smallest first.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub photo: Vec<PhotoSize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video: Option<Video>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voice: Option<Voice>,
}

impl Message {
    /// Creates a plain text message with no entities.
    pub fn plain(message_id: i64, chat: Chat, text: impl Into<String>) -> Self {
        Self {
            message_id,
            message_thread_id: None,
            from: None,
            sender_chat: None,
            date: 0,
            chat,
            business_connection_id: None,
            reply_to_message: None,
            edit_date: None,
            media_group_id: None,
            text: Some(text.into()),
            entities: Vec::new(),
            caption: None,
            caption_entities: Vec::new(),
            animation: None,
            audio: None,
            document: None,
            photo: Vec::new(),
            video: None,
            voice: None,
        }
    }

    /// Text if present, otherwise the media caption.
    pub fn text_or_caption(&self) -> Option<&str> {
        self.text.as_deref().or(self.caption.as_deref())
    }

    /// Returns the text covered by `entity`.
    ///
    /// Looks in `text` first, then in `caption`.
    pub fn entity_text(&self, entity: &MessageEntity) -> Option<&str> {
        entity.extract(self.text_or_caption()?)
    }

    /// Returns the `bot_command` entity anchored at the start of the text.
    ///
    /// A `@botname` directly following the entity is included even when the
    /// entity only covers the command itself.
    pub fn leading_command(&self) -> Option<&str> {
        let text = self.text.as_deref()?;
        let command = self
            .entities
            .iter()
            .find(|e| e.kind == EntityType::BotCommand && e.offset == 0)
            .and_then(|e| e.extract(text))?;

        if command.contains('@') {
            return Some(command);
        }
        let rest = text.get(command.len()..)?;
        let Some(mention) = rest.strip_prefix('@') else {
            return Some(command);
        };
        let len = mention
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(mention.len());
        if len == 0 {
            return Some(command);
        }
        text.get(..command.len() + 1 + len)
    }

    /// Largest available photo size.
    pub fn largest_photo(&self) -> Option<&PhotoSize> {
        self.photo.iter().max_by_key(|p| u64::from(p.width) * u64::from(p.height))
    }
}

// =============================================================================
// MaybeInaccessibleMessage
// =============================================================================

/// A message attached to a callback query.
///
/// The platform sends a stub with `date == 0` when the bot can no longer
/// access the message.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MaybeInaccessibleMessage {
    Message(Box<Message>),
    Inaccessible(InaccessibleMessage),
}

/// A message that was deleted or is otherwise out of reach.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InaccessibleMessage {
    pub chat: Chat,
    pub message_id: i64,
    /// Always zero.
    pub date: i64,
}

impl MaybeInaccessibleMessage {
    pub fn chat(&self) -> &Chat {
        match self {
            Self::Message(message) => &message.chat,
            Self::Inaccessible(message) => &message.chat,
        }
    }

    pub fn message_id(&self) -> i64 {
        match self {
            Self::Message(message) => message.message_id,
            Self::Inaccessible(message) => message.message_id,
        }
    }

    /// The full message, if it is still accessible.
    pub fn accessible(&self) -> Option<&Message> {
        match self {
            Self::Message(message) => Some(&**message),
            Self::Inaccessible(_) => None,
        }
    }
}

impl<'de> Deserialize<'de> for MaybeInaccessibleMessage {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        let date = value.get("date").and_then(serde_json::Value::as_i64);
        if date == Some(0) {
            InaccessibleMessage::deserialize(value)
                .map(Self::Inaccessible)
                .map_err(serde::de::Error::custom)
        } else {
            Message::deserialize(value)
                .map(|m| Self::Message(Box::new(m)))
                .map_err(serde::de::Error::custom)
        }
    }
}

// =============================================================================
// CallbackQuery
// =============================================================================

/// Incoming callback query from an inline keyboard button.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallbackQuery {
    pub id: String,
    pub from: User,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<MaybeInaccessibleMessage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inline_message_id: Option<String>,
    pub chat_instance: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub game_short_name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHAT: &str = r#"{"id": -100, "type": "supergroup", "title": "t"}"#;

    #[test]
    fn test_leading_command() {
        let json = format!(
            r#"{{"message_id": 1, "date": 5, "chat": {CHAT}, "text": "/ping@mybot hi",
                "entities": [{{"type": "bot_command", "offset": 0, "length": 11}}]}}"#
        );
        let message: Message = serde_json::from_str(&json).unwrap();
        assert_eq!(message.leading_command(), Some("/ping@mybot"));
    }

    #[test]
    fn test_leading_command_extends_through_mention() {
        let json = format!(
            r#"{{"message_id": 1, "date": 5, "chat": {CHAT}, "text": "/ping@mybot hi",
                "entities": [{{"type": "bot_command", "offset": 0, "length": 5}}]}}"#
        );
        let message: Message = serde_json::from_str(&json).unwrap();
        assert_eq!(message.leading_command(), Some("/ping@mybot"));

        let json = format!(
            r#"{{"message_id": 1, "date": 5, "chat": {CHAT}, "text": "/ping@ hi",
                "entities": [{{"type": "bot_command", "offset": 0, "length": 5}}]}}"#
        );
        let message: Message = serde_json::from_str(&json).unwrap();
        assert_eq!(message.leading_command(), Some("/ping"));
    }

    #[test]
    fn test_command_not_at_start() {
        let json = format!(
            r#"{{"message_id": 1, "date": 5, "chat": {CHAT}, "text": "hi /ping",
                "entities": [{{"type": "bot_command", "offset": 3, "length": 5}}]}}"#
        );
        let message: Message = serde_json::from_str(&json).unwrap();
        assert_eq!(message.leading_command(), None);
    }

    #[test]
    fn test_entity_text_uses_caption() {
        let json = format!(
            r#"{{"message_id": 1, "date": 5, "chat": {CHAT}, "caption": "look #cats",
                "caption_entities": [{{"type": "hashtag", "offset": 5, "length": 5}}]}}"#
        );
        let message: Message = serde_json::from_str(&json).unwrap();
        let entity = &message.caption_entities[0];
        assert_eq!(message.entity_text(entity), Some("#cats"));
    }

    #[test]
    fn test_inaccessible_message() {
        let json = format!(r#"{{"message_id": 9, "date": 0, "chat": {CHAT}}}"#);
        let message: MaybeInaccessibleMessage = serde_json::from_str(&json).unwrap();
        assert!(message.accessible().is_none());
        assert_eq!(message.message_id(), 9);
        assert_eq!(message.chat().id, -100);
    }

    #[test]
    fn test_accessible_message() {
        let json = format!(r#"{{"message_id": 9, "date": 17, "chat": {CHAT}, "text": "x"}}"#);
        let message: MaybeInaccessibleMessage = serde_json::from_str(&json).unwrap();
        assert_eq!(
            message.accessible().and_then(|m| m.text.as_deref()),
            Some("x")
        );
    }
}
