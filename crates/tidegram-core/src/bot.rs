//! The transport contract every bot implements.
//!
//! A [`Bot`] knows how to execute a raw API method and return the response
//! body. Everything typed (envelope parsing, parameter records, helpers such
//! as `send_message`) is layered on top in [`crate::api`], so mock bots in
//! tests only need the two raw calls.

use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::error::{ApiError, ApiResult};
use crate::types::InputFile;

/// String form parameters of a multipart request.
pub type Params = Vec<(String, String)>;

/// File parts of a multipart request, keyed by form field name.
pub type Files = Vec<(String, InputFile)>;

/// An active bot connected to the Bot API.
#[async_trait]
pub trait Bot: Send + Sync + 'static {
    /// A stable identifier for logs; the numeric part of the token for HTTP
    /// bots.
    fn id(&self) -> &str;

    /// Calls `method` with a JSON body and returns the raw response bytes.
    async fn raw(&self, method: &str, params: Value) -> ApiResult<Vec<u8>>;

    /// Calls `method` with a multipart body and returns the raw response
    /// bytes.
    async fn raw_file(&self, method: &str, params: Params, files: Files) -> ApiResult<Vec<u8>>;
}

/// A type-erased, shareable bot handle.
pub type BoxedBot = Arc<dyn Bot>;

#[derive(Deserialize)]
struct Envelope<T> {
    ok: bool,
    result: Option<T>,
    #[serde(default)]
    error_code: Option<i64>,
    #[serde(default)]
    description: Option<String>,
}

/// Decodes the `{ok, result, error_code, description}` response envelope.
///
/// `ok == false` becomes [`ApiError::Telegram`] when an error code is present
/// and [`ApiError::UnexpectedResponse`] otherwise.
pub fn parse_result<T: DeserializeOwned>(data: &[u8]) -> ApiResult<T> {
    let envelope: Envelope<T> = serde_json::from_slice(data)?;

    if !envelope.ok {
        return Err(match envelope.error_code {
            Some(code) if code != 0 => ApiError::Telegram {
                code,
                description: envelope.description.unwrap_or_default(),
            },
            _ => ApiError::UnexpectedResponse(String::from_utf8_lossy(data).into_owned()),
        });
    }

    envelope
        .result
        .ok_or_else(|| ApiError::UnexpectedResponse("missing result".to_string()))
}

/// Normalizes a chat identifier.
///
/// Numeric ids and `@usernames` pass through; any other string is treated as
/// a public username and gets a leading `@`.
pub fn parse_chat_id(chat_id: &str) -> String {
    if chat_id.starts_with('@') || chat_id.parse::<i64>().is_ok() {
        chat_id.to_string()
    } else {
        format!("@{chat_id}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ok_result() {
        let n: i64 = parse_result(br#"{"ok": true, "result": 5}"#).unwrap();
        assert_eq!(n, 5);
    }

    #[test]
    fn test_parse_result_without_default_impl() {
        #[derive(Debug, Deserialize)]
        struct Me {
            id: i64,
        }

        let me: Me = parse_result(br#"{"ok": true, "result": {"id": 42}}"#).unwrap();
        assert_eq!(me.id, 42);

        let err = parse_result::<Me>(br#"{"ok": true}"#).unwrap_err();
        assert!(matches!(err, ApiError::UnexpectedResponse(_)));
    }

    #[test]
    fn test_parse_telegram_error() {
        let err = parse_result::<bool>(
            br#"{"ok": false, "error_code": 400, "description": "Bad Request: chat not found"}"#,
        )
        .unwrap_err();
        assert_eq!(err.code(), Some(400));
        assert!(err.to_string().contains("chat not found"));
    }

    #[test]
    fn test_parse_error_without_code() {
        let err = parse_result::<bool>(br#"{"ok": false}"#).unwrap_err();
        assert!(matches!(err, ApiError::UnexpectedResponse(_)));
    }

    #[test]
    fn test_parse_garbage() {
        let err = parse_result::<bool>(b"<html>").unwrap_err();
        assert!(matches!(err, ApiError::Serialization(_)));
    }

    #[test]
    fn test_parse_chat_id() {
        assert_eq!(parse_chat_id("-1001234"), "-1001234");
        assert_eq!(parse_chat_id("@channel"), "@channel");
        assert_eq!(parse_chat_id("channel"), "@channel");
    }
}
