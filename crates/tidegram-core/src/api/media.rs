//! Photo, audio, video and album sends.
//!
//! Single-file sends always go out as multipart bodies. An album only
//! switches to multipart when at least one item needs an upload; items
//! referenced by file id or URL are sent inline.

use serde::Serialize;
use serde_json::{Map, Value};

use super::{ChatId, ParseMode, ReplyParameters, to_params};
use crate::bot::{Bot, Files, parse_result};
use crate::error::{ApiError, ApiResult};
use crate::types::{InputFile, Message, MessageEntity, ReplyMarkup};

/// Parameters of `sendPhoto`, apart from the photo itself.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SendPhotoParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parse_mode: Option<ParseMode>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub caption_entities: Vec<MessageEntity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_thread_id: Option<i64>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub show_caption_above_media: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub has_spoiler: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub disable_notification: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub protect_content: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_parameters: Option<ReplyParameters>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_markup: Option<ReplyMarkup>,
}

/// Parameters of `sendAudio`, apart from the audio itself.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SendAudioParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parse_mode: Option<ParseMode>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub caption_entities: Vec<MessageEntity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_thread_id: Option<i64>,
    /// Duration in seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub performer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub disable_notification: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub protect_content: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_parameters: Option<ReplyParameters>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_markup: Option<ReplyMarkup>,
    #[serde(skip)]
    pub thumbnail: Option<InputFile>,
}

/// Parameters of `sendVideo`, apart from the video itself.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SendVideoParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parse_mode: Option<ParseMode>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub caption_entities: Vec<MessageEntity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_thread_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub supports_streaming: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub has_spoiler: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub disable_notification: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub protect_content: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_parameters: Option<ReplyParameters>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_markup: Option<ReplyMarkup>,
    #[serde(skip)]
    pub thumbnail: Option<InputFile>,
}

// =============================================================================
// Albums
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Animation,
    Audio,
    Document,
    Photo,
    Video,
}

/// One item of an album.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InputMedia {
    #[serde(rename = "type")]
    pub kind: MediaKind,
    #[serde(skip)]
    pub media: InputFile,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parse_mode: Option<ParseMode>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub caption_entities: Vec<MessageEntity>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub has_spoiler: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub performer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub supports_streaming: bool,
}

impl InputMedia {
    pub fn new(kind: MediaKind, media: InputFile) -> Self {
        Self {
            kind,
            media,
            caption: None,
            parse_mode: None,
            caption_entities: Vec::new(),
            has_spoiler: false,
            width: None,
            height: None,
            duration: None,
            performer: None,
            title: None,
            supports_streaming: false,
        }
    }

    pub fn photo(media: InputFile) -> Self {
        Self::new(MediaKind::Photo, media)
    }

    pub fn video(media: InputFile) -> Self {
        Self::new(MediaKind::Video, media)
    }

    pub fn audio(media: InputFile) -> Self {
        Self::new(MediaKind::Audio, media)
    }

    pub fn document(media: InputFile) -> Self {
        Self::new(MediaKind::Document, media)
    }

    pub fn animation(media: InputFile) -> Self {
        Self::new(MediaKind::Animation, media)
    }

    pub fn caption(mut self, caption: impl Into<String>) -> Self {
        self.caption = Some(caption.into());
        self
    }

    pub fn parse_mode(mut self, mode: ParseMode) -> Self {
        self.parse_mode = Some(mode);
        self
    }

    pub fn spoiler(mut self) -> Self {
        self.has_spoiler = true;
        self
    }
}

/// Parameters of `sendMediaGroup`, apart from the items.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SendMediaGroupParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_thread_id: Option<i64>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub disable_notification: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub protect_content: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_parameters: Option<ReplyParameters>,
}

fn object(value: &impl Serialize) -> ApiResult<Map<String, Value>> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        _ => Err(ApiError::Serialization(
            "parameters must serialize to an object".to_string(),
        )),
    }
}

/// Builds the `media` array, moving uploads into `files` under
/// `attach://` names.
fn album_items(media: Vec<InputMedia>, files: &mut Files) -> ApiResult<Vec<Value>> {
    media
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            let mut entry = object(&item)?;
            let reference = match item.media.as_field() {
                Some(field) => field.to_string(),
                None => {
                    let name = format!("file{index}");
                    let reference = format!("attach://{name}");
                    files.push((name, item.media));
                    reference
                }
            };
            entry.insert("media".to_string(), Value::String(reference));
            Ok(Value::Object(entry))
        })
        .collect()
}

impl dyn Bot {
    pub async fn send_photo(
        &self,
        chat_id: impl Into<ChatId> + Send,
        photo: InputFile,
        params: SendPhotoParams,
    ) -> ApiResult<Message> {
        self.send_upload("sendPhoto", "photo", chat_id.into(), photo, None, &params)
            .await
    }

    pub async fn send_audio(
        &self,
        chat_id: impl Into<ChatId> + Send,
        audio: InputFile,
        mut params: SendAudioParams,
    ) -> ApiResult<Message> {
        let thumbnail = params.thumbnail.take();
        self.send_upload("sendAudio", "audio", chat_id.into(), audio, thumbnail, &params)
            .await
    }

    pub async fn send_video(
        &self,
        chat_id: impl Into<ChatId> + Send,
        video: InputFile,
        mut params: SendVideoParams,
    ) -> ApiResult<Message> {
        let thumbnail = params.thumbnail.take();
        self.send_upload("sendVideo", "video", chat_id.into(), video, thumbnail, &params)
            .await
    }

    /// Sends 2-10 items as one album.
    pub async fn send_media_group(
        &self,
        chat_id: impl Into<ChatId> + Send,
        media: Vec<InputMedia>,
        params: SendMediaGroupParams,
    ) -> ApiResult<Vec<Message>> {
        let mut files = Files::new();
        let items = album_items(media, &mut files)?;

        let mut body = object(&params)?;
        body.insert("chat_id".to_string(), serde_json::to_value(chat_id.into())?);
        body.insert("media".to_string(), Value::Array(items));
        let body = Value::Object(body);

        let data = if files.is_empty() {
            self.raw("sendMediaGroup", body).await?
        } else {
            self.raw_file("sendMediaGroup", to_params(&body)?, files)
                .await?
        };
        parse_result(&data)
    }
}
