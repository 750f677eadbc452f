use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// The contents of a file to be uploaded.
///
/// File ids and URLs are sent as plain form fields; paths and bytes are
/// attached as multipart file parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputFile {
    /// A file already stored on the Telegram servers.
    FileId(String),
    /// An HTTP URL the platform downloads by itself.
    Url(String),
    /// A local file read at upload time.
    Path(PathBuf),
    /// In-memory contents with the file name to report.
    Bytes { name: String, data: Vec<u8> },
}

impl InputFile {
    pub fn file_id(id: impl Into<String>) -> Self {
        Self::FileId(id.into())
    }

    pub fn url(url: impl Into<String>) -> Self {
        Self::Url(url.into())
    }

    pub fn path(path: impl Into<PathBuf>) -> Self {
        Self::Path(path.into())
    }

    pub fn bytes(name: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self::Bytes {
            name: name.into(),
            data: data.into(),
        }
    }

    /// The value to send as a form field, for sources that need no upload.
    pub fn as_field(&self) -> Option<&str> {
        match self {
            Self::FileId(id) => Some(id),
            Self::Url(url) => Some(url),
            Self::Path(_) | Self::Bytes { .. } => None,
        }
    }
}

/// Current status of the bot's webhook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookInfo {
    pub url: String,
    pub has_custom_certificate: bool,
    pub pending_update_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error_date: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_connections: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_updates: Option<Vec<String>>,
}
