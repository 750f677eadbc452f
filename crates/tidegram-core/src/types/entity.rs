//! Message entities and UTF-16 aware slicing.

use serde::{Deserialize, Serialize};

use super::User;

/// Kind of a [`MessageEntity`].
///
/// Unknown kinds sent by newer API versions deserialize into
/// [`EntityType::Unknown`] instead of failing the whole update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Mention,
    Hashtag,
    Cashtag,
    BotCommand,
    Url,
    Email,
    PhoneNumber,
    Bold,
    Italic,
    Underline,
    Strikethrough,
    Spoiler,
    Blockquote,
    ExpandableBlockquote,
    Code,
    Pre,
    TextLink,
    TextMention,
    CustomEmoji,
    #[serde(other)]
    Unknown,
}

/// A special span inside message text or caption.
///
/// `offset` and `length` are counted in UTF-16 code units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageEntity {
    #[serde(rename = "type")]
    pub kind: EntityType,
    pub offset: usize,
    pub length: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_emoji_id: Option<String>,
}

impl MessageEntity {
    /// Creates an entity with no auxiliary data.
    pub fn new(kind: EntityType, offset: usize, length: usize) -> Self {
        Self {
            kind,
            offset,
            length,
            url: None,
            user: None,
            language: None,
            custom_emoji_id: None,
        }
    }

    /// Returns the slice of `text` this entity covers.
    ///
    /// Returns `None` when the span falls outside `text` or splits a
    /// surrogate pair.
    pub fn extract<'a>(&self, text: &'a str) -> Option<&'a str> {
        utf16_slice(text, self.offset, self.offset.checked_add(self.length)?)
    }
}

/// Slices `text` by UTF-16 code unit positions `[start, end)`.
pub fn utf16_slice(text: &str, start: usize, end: usize) -> Option<&str> {
    if start > end {
        return None;
    }

    let mut units = 0;
    let mut start_byte = None;
    let mut end_byte = None;

    for (byte, ch) in text.char_indices() {
        if units == start {
            start_byte = Some(byte);
        }
        if units == end {
            end_byte = Some(byte);
            break;
        }
        units += ch.len_utf16();
        // A position landing inside a surrogate pair never matches above.
        if units > end {
            return None;
        }
    }

    if units == start && start_byte.is_none() {
        start_byte = Some(text.len());
    }
    if units == end && end_byte.is_none() {
        end_byte = Some(text.len());
    }

    text.get(start_byte?..end_byte?)
}
