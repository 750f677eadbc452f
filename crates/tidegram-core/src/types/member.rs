use serde::{Deserialize, Serialize};

use super::User;

/// Membership status of a user in a chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatMemberStatus {
    Creator,
    Administrator,
    Member,
    Restricted,
    Left,
    Kicked,
    #[serde(other)]
    Unknown,
}

/// Information about one member of a chat.
///
/// Status-specific permission fields are kept only where they affect
/// membership (`is_member` for restricted users).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMember {
    pub status: ChatMemberStatus,
    pub user: User,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_anonymous: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_member: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub until_date: Option<i64>,
}

impl ChatMember {
    pub fn is_owner(&self) -> bool {
        self.status == ChatMemberStatus::Creator
    }

    pub fn is_admin(&self) -> bool {
        self.status == ChatMemberStatus::Administrator
    }

    pub fn is_restricted(&self) -> bool {
        self.status == ChatMemberStatus::Restricted
    }

    /// True for every status that keeps the user inside the chat.
    /// Unrecognized statuses never count.
    pub fn is_present(&self) -> bool {
        matches!(
            self.status,
            ChatMemberStatus::Creator
                | ChatMemberStatus::Administrator
                | ChatMemberStatus::Member
                | ChatMemberStatus::Restricted
        )
    }
}
