use serde::{Deserialize, Serialize};

/// Kind of a chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatType {
    Private,
    Group,
    Supergroup,
    Channel,
    /// Sender chat of inline-mode queries.
    Sender,
    /// A chat kind introduced after this crate was written.
    #[serde(other)]
    Unknown,
}

/// A private chat, group, supergroup or channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chat {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: ChatType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_forum: Option<bool>,
}

impl Chat {
    pub fn is_private(&self) -> bool {
        self.kind == ChatType::Private
    }

    pub fn is_group(&self) -> bool {
        matches!(self.kind, ChatType::Group | ChatType::Supergroup)
    }

    pub fn is_channel(&self) -> bool {
        self.kind == ChatType::Channel
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unrecognized_chat_type() {
        let chat: Chat = serde_json::from_str(r#"{"id": -5, "type": "forum"}"#).unwrap();
        assert_eq!(chat.kind, ChatType::Unknown);

        let chat: Chat = serde_json::from_str(r#"{"id": 5, "type": "private"}"#).unwrap();
        assert_eq!(chat.kind, ChatType::Private);
    }
}
