//! Typed Bot API helpers.
//!
//! The helpers are inherent methods on `dyn Bot`, so every [`BoxedBot`]
//! gets them without the transport having to implement anything beyond
//! [`Bot::raw`] and [`Bot::raw_file`].
//!
//! ```rust,ignore
//! let me = bot.get_me().await?;
//! bot.send_message(&SendMessageParams::new(chat.id, "hello")).await?;
//! ```
//!
//! [`BoxedBot`]: crate::BoxedBot

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{trace, warn};

use crate::bot::{Bot, Files, Params, parse_chat_id, parse_result};
use crate::error::{ApiError, ApiResult};
use crate::types::{
    ChatMember, InputFile, Message, MessageEntity, ReplyMarkup, User, WebhookInfo,
};
use crate::update::{Update, UpdateType, decode_update};

mod media;
mod members;

pub use media::{
    InputMedia, MediaKind, SendAudioParams, SendMediaGroupParams, SendPhotoParams,
    SendVideoParams,
};
pub use members::{AdministratorRights, BanChatMemberParams, ChatPermissions};

// =============================================================================
// Parameter types
// =============================================================================

/// Target chat of a request: numeric id or `@username`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChatId {
    Id(i64),
    Username(String),
}

impl From<i64> for ChatId {
    fn from(id: i64) -> Self {
        Self::Id(id)
    }
}

impl From<&str> for ChatId {
    fn from(value: &str) -> Self {
        match value.parse::<i64>() {
            Ok(id) => Self::Id(id),
            Err(_) => Self::Username(parse_chat_id(value)),
        }
    }
}

impl From<String> for ChatId {
    fn from(value: String) -> Self {
        Self::from(value.as_str())
    }
}

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(f, "{id}"),
            Self::Username(name) => f.write_str(name),
        }
    }
}

/// Text formatting mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParseMode {
    MarkdownV2,
    #[serde(rename = "HTML")]
    Html,
    Markdown,
}

/// Describes the message a new message replies to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyParameters {
    pub message_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chat_id: Option<ChatId>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub allow_sending_without_reply: bool,
}

impl ReplyParameters {
    pub fn new(message_id: i64) -> Self {
        Self {
            message_id,
            chat_id: None,
            allow_sending_without_reply: false,
        }
    }
}

/// Parameters of `sendMessage`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SendMessageParams {
    pub chat_id: ChatId,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub business_connection_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_thread_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parse_mode: Option<ParseMode>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub entities: Vec<MessageEntity>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub disable_notification: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub protect_content: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_parameters: Option<ReplyParameters>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_markup: Option<ReplyMarkup>,
}

impl SendMessageParams {
    pub fn new(chat_id: impl Into<ChatId>, text: impl Into<String>) -> Self {
        Self {
            chat_id: chat_id.into(),
            text: text.into(),
            business_connection_id: None,
            message_thread_id: None,
            parse_mode: None,
            entities: Vec::new(),
            disable_notification: false,
            protect_content: false,
            reply_parameters: None,
            reply_markup: None,
        }
    }

    pub fn parse_mode(mut self, mode: ParseMode) -> Self {
        self.parse_mode = Some(mode);
        self
    }

    pub fn reply_to(mut self, message_id: i64) -> Self {
        self.reply_parameters = Some(ReplyParameters::new(message_id));
        self
    }

    pub fn thread(mut self, message_thread_id: i64) -> Self {
        self.message_thread_id = Some(message_thread_id);
        self
    }

    pub fn reply_markup(mut self, markup: impl Into<ReplyMarkup>) -> Self {
        self.reply_markup = Some(markup.into());
        self
    }
}

/// Parameters of `sendDocument`, apart from the document itself.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SendDocumentParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parse_mode: Option<ParseMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_thread_id: Option<i64>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub disable_notification: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_parameters: Option<ReplyParameters>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_markup: Option<ReplyMarkup>,
    #[serde(skip)]
    pub thumbnail: Option<InputFile>,
}

/// Parameters of `answerCallbackQuery`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnswerCallbackQueryParams {
    pub callback_query_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub show_alert: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_time: Option<u32>,
}

impl AnswerCallbackQueryParams {
    pub fn new(callback_query_id: impl Into<String>) -> Self {
        Self {
            callback_query_id: callback_query_id.into(),
            text: None,
            show_alert: false,
            url: None,
            cache_time: None,
        }
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn alert(mut self) -> Self {
        self.show_alert = true;
        self
    }
}

/// Parameters of `getUpdates`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GetUpdatesParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u8>,
    /// Long-poll timeout in seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub allowed_updates: Vec<UpdateType>,
}

/// Parameters of `setWebhook`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SetWebhookParams {
    pub url: String,
    /// Public key certificate, uploaded as a multipart part when present.
    #[serde(skip)]
    pub certificate: Option<InputFile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_connections: Option<u32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub allowed_updates: Vec<UpdateType>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub drop_pending_updates: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret_token: Option<String>,
}

/// Flattens a serializable record into multipart form fields.
///
/// Strings are sent verbatim, everything else JSON encoded. Null fields are
/// dropped.
pub fn to_params<T: Serialize>(value: &T) -> ApiResult<Params> {
    let Value::Object(map) = serde_json::to_value(value)? else {
        return Err(ApiError::Serialization(
            "parameters must serialize to an object".to_string(),
        ));
    };

    let mut params = Params::with_capacity(map.len());
    for (key, value) in map {
        match value {
            Value::Null => {}
            Value::String(s) => params.push((key, s)),
            other => params.push((key, other.to_string())),
        }
    }
    Ok(params)
}

pub(crate) fn expect_true(method: &'static str, data: &[u8]) -> ApiResult<()> {
    if parse_result::<bool>(data)? {
        Ok(())
    } else {
        Err(ApiError::ExpectedTrue(method))
    }
}

// =============================================================================
// Helpers
// =============================================================================

impl dyn Bot {
    /// Returns basic information about the bot.
    pub async fn get_me(&self) -> ApiResult<User> {
        let data = self.raw("getMe", json!({})).await?;
        parse_result(&data)
    }

    /// Long-polls for new updates.
    ///
    /// Entries that fail to decode are logged and left out. Use
    /// [`get_raw_updates`](Self::get_raw_updates) when their ids matter.
    pub async fn get_updates(&self, params: &GetUpdatesParams) -> ApiResult<Vec<Update>> {
        let raw = self.get_raw_updates(params).await?;
        Ok(raw
            .into_iter()
            .filter_map(|value| {
                decode_update(value)
                    .inspect_err(|e| warn!(error = %e, "skipping undecodable update"))
                    .ok()
            })
            .collect())
    }

    /// Long-polls for new updates without decoding the entries.
    pub async fn get_raw_updates(&self, params: &GetUpdatesParams) -> ApiResult<Vec<Value>> {
        let data = self
            .raw("getUpdates", serde_json::to_value(params)?)
            .await?;
        parse_result(&data)
    }

    pub async fn send_message(&self, params: &SendMessageParams) -> ApiResult<Message> {
        trace!(chat_id = %params.chat_id, "sendMessage");
        let data = self
            .raw("sendMessage", serde_json::to_value(params)?)
            .await?;
        parse_result(&data)
    }

    pub async fn edit_message_text(
        &self,
        chat_id: impl Into<ChatId> + Send,
        message_id: i64,
        text: impl Into<String> + Send,
    ) -> ApiResult<Message> {
        let params = json!({
            "chat_id": chat_id.into(),
            "message_id": message_id,
            "text": text.into(),
        });
        let data = self.raw("editMessageText", params).await?;
        parse_result(&data)
    }

    pub async fn delete_message(
        &self,
        chat_id: impl Into<ChatId> + Send,
        message_id: i64,
    ) -> ApiResult<()> {
        let params = json!({ "chat_id": chat_id.into(), "message_id": message_id });
        let data = self.raw("deleteMessage", params).await?;
        expect_true("deleteMessage", &data)
    }

    pub async fn answer_callback_query(&self, params: &AnswerCallbackQueryParams) -> ApiResult<()> {
        let data = self
            .raw("answerCallbackQuery", serde_json::to_value(params)?)
            .await?;
        expect_true("answerCallbackQuery", &data)
    }

    /// Looks up one member of a chat.
    pub async fn get_chat_member(
        &self,
        chat_id: impl Into<ChatId> + Send,
        user_id: i64,
    ) -> ApiResult<ChatMember> {
        let params = json!({ "chat_id": chat_id.into(), "user_id": user_id });
        let data = self.raw("getChatMember", params).await?;
        parse_result(&data)
    }

    /// Deletes several messages of one chat at once.
    pub async fn delete_messages(
        &self,
        chat_id: impl Into<ChatId> + Send,
        message_ids: &[i64],
    ) -> ApiResult<()> {
        let params = json!({ "chat_id": chat_id.into(), "message_ids": message_ids });
        let data = self.raw("deleteMessages", params).await?;
        expect_true("deleteMessages", &data)
    }

    /// Sends a general file. Always uses a multipart body.
    pub async fn send_document(
        &self,
        chat_id: impl Into<ChatId> + Send,
        document: InputFile,
        mut params: SendDocumentParams,
    ) -> ApiResult<Message> {
        let thumbnail = params.thumbnail.take();
        self.send_upload("sendDocument", "document", chat_id.into(), document, thumbnail, &params)
            .await
    }

    /// Uploads `file` under `field` with `params` as the remaining form
    /// fields. Always multipart, so the platform sees one request shape.
    pub(crate) async fn send_upload<P: Serialize + Sync>(
        &self,
        method: &'static str,
        field: &str,
        chat_id: ChatId,
        file: InputFile,
        thumbnail: Option<InputFile>,
        params: &P,
    ) -> ApiResult<Message> {
        trace!(%chat_id, method, "upload");
        let mut form = to_params(params)?;
        form.push(("chat_id".to_string(), chat_id.to_string()));

        let mut files: Files = vec![(field.to_string(), file)];
        if let Some(thumbnail) = thumbnail {
            files.push(("thumbnail".to_string(), thumbnail));
        }

        let data = self.raw_file(method, form, files).await?;
        parse_result(&data)
    }

    /// Registers a webhook URL.
    ///
    /// Uses a multipart body only when a certificate has to be uploaded.
    pub async fn set_webhook(&self, params: &SetWebhookParams) -> ApiResult<()> {
        let data = match &params.certificate {
            Some(certificate) => {
                let files = vec![("certificate".to_string(), certificate.clone())];
                self.raw_file("setWebhook", to_params(params)?, files)
                    .await?
            }
            None => {
                self.raw("setWebhook", serde_json::to_value(params)?)
                    .await?
            }
        };
        expect_true("setWebhook", &data)
    }

    pub async fn delete_webhook(&self, drop_pending_updates: bool) -> ApiResult<()> {
        let params = json!({ "drop_pending_updates": drop_pending_updates });
        let data = self.raw("deleteWebhook", params).await?;
        expect_true("deleteWebhook", &data)
    }

    pub async fn get_webhook_info(&self) -> ApiResult<WebhookInfo> {
        let data = self.raw("getWebhookInfo", json!({})).await?;
        parse_result(&data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BoxedBot;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[derive(Debug, Clone, PartialEq)]
    pub(crate) enum Call {
        Json(String, Value),
        Multipart(String, Params, Vec<String>),
    }

    pub(crate) struct RecordingBot {
        pub(crate) calls: Mutex<Vec<Call>>,
        response: &'static str,
    }

    #[async_trait]
    impl Bot for RecordingBot {
        fn id(&self) -> &str {
            "recording"
        }

        async fn raw(&self, method: &str, params: Value) -> ApiResult<Vec<u8>> {
            self.calls.lock().push(Call::Json(method.to_string(), params));
            Ok(self.response.as_bytes().to_vec())
        }

        async fn raw_file(&self, method: &str, params: Params, files: Files) -> ApiResult<Vec<u8>> {
            let names = files.into_iter().map(|(name, _)| name).collect();
            self.calls
                .lock()
                .push(Call::Multipart(method.to_string(), params, names));
            Ok(self.response.as_bytes().to_vec())
        }
    }

    pub(crate) fn bot(response: &'static str) -> (Arc<RecordingBot>, BoxedBot) {
        let inner = Arc::new(RecordingBot {
            calls: Mutex::new(Vec::new()),
            response,
        });
        (Arc::clone(&inner), inner)
    }

    const MESSAGE: &str =
        r#"{"ok": true, "result": {"message_id": 5, "date": 1, "chat": {"id": 9, "type": "private"}, "text": "hi"}}"#;

    #[tokio::test]
    async fn test_send_message_body() {
        let (inner, bot) = bot(MESSAGE);
        let params = SendMessageParams::new(9i64, "hi")
            .parse_mode(ParseMode::Html)
            .reply_to(3);
        let message = bot.send_message(&params).await.unwrap();
        assert_eq!(message.message_id, 5);

        let calls = inner.calls.lock();
        assert_eq!(
            calls[0],
            Call::Json(
                "sendMessage".into(),
                json!({
                    "chat_id": 9,
                    "text": "hi",
                    "parse_mode": "HTML",
                    "reply_parameters": { "message_id": 3 },
                })
            )
        );
    }

    #[tokio::test]
    async fn test_delete_message_requires_true() {
        let (_, bot) = bot(r#"{"ok": true, "result": false}"#);
        let err = bot.delete_message(1i64, 2).await.unwrap_err();
        assert!(matches!(err, ApiError::ExpectedTrue("deleteMessage")));
    }

    #[tokio::test]
    async fn test_set_webhook_without_certificate_is_json() {
        let (inner, bot) = bot(r#"{"ok": true, "result": true}"#);
        let params = SetWebhookParams {
            url: "https://example.com/hook".into(),
            secret_token: Some("s3cret".into()),
            ..Default::default()
        };
        bot.set_webhook(&params).await.unwrap();
        assert!(matches!(&inner.calls.lock()[0], Call::Json(m, _) if m == "setWebhook"));
    }

    #[tokio::test]
    async fn test_set_webhook_with_certificate_is_multipart() {
        let (inner, bot) = bot(r#"{"ok": true, "result": true}"#);
        let params = SetWebhookParams {
            url: "https://example.com/hook".into(),
            certificate: Some(InputFile::bytes("cert.pem", b"---".to_vec())),
            allowed_updates: vec![UpdateType::Message, UpdateType::CallbackQuery],
            ..Default::default()
        };
        bot.set_webhook(&params).await.unwrap();

        let calls = inner.calls.lock();
        let Call::Multipart(method, form, files) = &calls[0] else {
            panic!("expected multipart call");
        };
        assert_eq!(method, "setWebhook");
        assert_eq!(files, &vec!["certificate".to_string()]);
        assert!(form.contains(&("url".into(), "https://example.com/hook".into())));
        assert!(form.contains(&(
            "allowed_updates".into(),
            r#"["message","callback_query"]"#.into()
        )));
    }

    #[tokio::test]
    async fn test_send_document_adds_chat_id() {
        let (inner, bot) = bot(MESSAGE);
        let params = SendDocumentParams {
            caption: Some("report".into()),
            ..Default::default()
        };
        bot.send_document("news", InputFile::file_id("abc"), params)
            .await
            .unwrap();

        let calls = inner.calls.lock();
        let Call::Multipart(_, form, files) = &calls[0] else {
            panic!("expected multipart call");
        };
        assert!(form.contains(&("chat_id".into(), "@news".into())));
        assert!(form.contains(&("caption".into(), "report".into())));
        assert_eq!(files, &vec!["document".to_string()]);
    }

    #[tokio::test]
    async fn test_send_message_with_keyboard() {
        let (inner, bot) = bot(MESSAGE);
        let keyboard = crate::types::InlineKeyboardMarkup::default()
            .row([crate::types::InlineKeyboardButton::callback("Up", "vote:up")]);
        let params = SendMessageParams::new(9i64, "vote").reply_markup(keyboard);
        bot.send_message(&params).await.unwrap();

        let calls = inner.calls.lock();
        let Call::Json(_, body) = &calls[0] else {
            panic!("expected json call");
        };
        assert_eq!(
            body["reply_markup"],
            json!({ "inline_keyboard": [[{ "text": "Up", "callback_data": "vote:up" }]] })
        );
    }

    #[tokio::test]
    async fn test_delete_messages_body() {
        let (inner, bot) = bot(r#"{"ok": true, "result": true}"#);
        bot.delete_messages(-100i64, &[3, 4]).await.unwrap();
        assert_eq!(
            inner.calls.lock()[0],
            Call::Json(
                "deleteMessages".into(),
                json!({ "chat_id": -100, "message_ids": [3, 4] })
            )
        );
    }

    #[tokio::test]
    async fn test_get_updates_skips_undecodable_entries() {
        let (_, bot) = bot(
            r#"{"ok": true, "result": [
                {"update_id": 1},
                {"update_id": 2, "message": {"message_id": 1, "date": "soon", "chat": {"id": 1, "type": "private"}}},
                {"update_id": 3}
            ]}"#,
        );
        let updates = bot.get_updates(&GetUpdatesParams::default()).await.unwrap();
        let ids: Vec<i64> = updates.iter().map(|u| u.update_id).collect();
        assert_eq!(ids, vec![1, 3]);

        let raw = bot
            .get_raw_updates(&GetUpdatesParams::default())
            .await
            .unwrap();
        assert_eq!(raw.len(), 3);
    }

    #[test]
    fn test_chat_id_conversions() {
        assert_eq!(ChatId::from("-100"), ChatId::Id(-100));
        assert_eq!(ChatId::from("news"), ChatId::Username("@news".into()));
        assert_eq!(ChatId::from(5i64).to_string(), "5");
    }
}
