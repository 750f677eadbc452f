//! Chat member administration.

use serde::Serialize;
use serde_json::{Value, json};

use super::{ChatId, expect_true};
use crate::bot::Bot;
use crate::error::ApiResult;

/// Actions a non-administrator may take in a chat.
///
/// Omitted flags are sent as absent, which the platform reads as `false`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ChatPermissions {
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub can_send_messages: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub can_send_audios: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub can_send_documents: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub can_send_photos: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub can_send_videos: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub can_send_video_notes: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub can_send_voice_notes: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub can_send_polls: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub can_send_other_messages: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub can_add_web_page_previews: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub can_change_info: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub can_invite_users: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub can_pin_messages: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub can_manage_topics: bool,
}

impl ChatPermissions {
    /// Everything a regular member can do.
    pub fn all() -> Self {
        Self {
            can_send_messages: true,
            can_send_audios: true,
            can_send_documents: true,
            can_send_photos: true,
            can_send_videos: true,
            can_send_video_notes: true,
            can_send_voice_notes: true,
            can_send_polls: true,
            can_send_other_messages: true,
            can_add_web_page_previews: true,
            can_change_info: true,
            can_invite_users: true,
            can_pin_messages: true,
            can_manage_topics: true,
        }
    }
}

/// Rights granted by `promoteChatMember`. All `false` demotes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AdministratorRights {
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub is_anonymous: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub can_manage_chat: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub can_delete_messages: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub can_manage_video_chats: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub can_restrict_members: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub can_promote_members: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub can_change_info: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub can_invite_users: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub can_post_stories: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub can_edit_stories: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub can_delete_stories: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub can_post_messages: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub can_edit_messages: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub can_pin_messages: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub can_manage_topics: bool,
}

/// Options of `banChatMember`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BanChatMemberParams {
    /// Unix time the ban ends; absent bans forever.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub until_date: Option<i64>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub revoke_messages: bool,
}

/// `{chat_id, user_id}` merged with the fields of `extra`.
fn member_body(chat_id: ChatId, user_id: i64, extra: &impl Serialize) -> ApiResult<Value> {
    let mut body = serde_json::to_value(extra)?;
    if let Value::Object(map) = &mut body {
        map.insert("chat_id".to_string(), serde_json::to_value(chat_id)?);
        map.insert("user_id".to_string(), Value::from(user_id));
    }
    Ok(body)
}

impl dyn Bot {
    pub async fn ban_chat_member(
        &self,
        chat_id: impl Into<ChatId> + Send,
        user_id: i64,
        params: BanChatMemberParams,
    ) -> ApiResult<()> {
        let body = member_body(chat_id.into(), user_id, &params)?;
        let data = self.raw("banChatMember", body).await?;
        expect_true("banChatMember", &data)
    }

    /// Lifts a ban. With `only_if_banned` a current member is left alone
    /// instead of being removed from the chat.
    pub async fn unban_chat_member(
        &self,
        chat_id: impl Into<ChatId> + Send,
        user_id: i64,
        only_if_banned: bool,
    ) -> ApiResult<()> {
        let body = member_body(
            chat_id.into(),
            user_id,
            &json!({ "only_if_banned": only_if_banned }),
        )?;
        let data = self.raw("unbanChatMember", body).await?;
        expect_true("unbanChatMember", &data)
    }

    pub async fn restrict_chat_member(
        &self,
        chat_id: impl Into<ChatId> + Send,
        user_id: i64,
        permissions: ChatPermissions,
        until_date: Option<i64>,
    ) -> ApiResult<()> {
        let mut extra = json!({ "permissions": permissions });
        if let Some(until) = until_date {
            extra["until_date"] = Value::from(until);
        }
        let body = member_body(chat_id.into(), user_id, &extra)?;
        let data = self.raw("restrictChatMember", body).await?;
        expect_true("restrictChatMember", &data)
    }

    /// Removes every permission of `user_id` until lifted.
    pub async fn mute_chat_member(
        &self,
        chat_id: impl Into<ChatId> + Send,
        user_id: i64,
    ) -> ApiResult<()> {
        self.restrict_chat_member(chat_id, user_id, ChatPermissions::default(), None)
            .await
    }

    pub async fn promote_chat_member(
        &self,
        chat_id: impl Into<ChatId> + Send,
        user_id: i64,
        rights: AdministratorRights,
    ) -> ApiResult<()> {
        let body = member_body(chat_id.into(), user_id, &rights)?;
        let data = self.raw("promoteChatMember", body).await?;
        expect_true("promoteChatMember", &data)
    }

    pub async fn set_chat_administrator_custom_title(
        &self,
        chat_id: impl Into<ChatId> + Send,
        user_id: i64,
        custom_title: impl Into<String> + Send,
    ) -> ApiResult<()> {
        let body = member_body(
            chat_id.into(),
            user_id,
            &json!({ "custom_title": custom_title.into() }),
        )?;
        let data = self.raw("setChatAdministratorCustomTitle", body).await?;
        expect_true("setChatAdministratorCustomTitle", &data)
    }
}
