use serde::{Deserialize, Serialize};

/// One button of an inline keyboard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineKeyboardButton {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Sent back in the callback query, 1-64 bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub callback_data: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub switch_inline_query: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub switch_inline_query_current_chat: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub pay: bool,
}

impl InlineKeyboardButton {
    /// A button that produces a callback query carrying `data`.
    pub fn callback(text: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            callback_data: Some(data.into()),
            ..Default::default()
        }
    }

    pub fn url(text: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            url: Some(url.into()),
            ..Default::default()
        }
    }
}

/// A keyboard attached to the message itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineKeyboardMarkup {
    pub inline_keyboard: Vec<Vec<InlineKeyboardButton>>,
}

impl InlineKeyboardMarkup {
    pub fn new(rows: impl IntoIterator<Item = Vec<InlineKeyboardButton>>) -> Self {
        Self {
            inline_keyboard: rows.into_iter().collect(),
        }
    }

    /// Appends one row.
    pub fn row(mut self, buttons: impl IntoIterator<Item = InlineKeyboardButton>) -> Self {
        self.inline_keyboard.push(buttons.into_iter().collect());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyboardButton {
    pub text: String,
}

impl KeyboardButton {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// A custom keyboard replacing the user's input keyboard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyKeyboardMarkup {
    pub keyboard: Vec<Vec<KeyboardButton>>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_persistent: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub resize_keyboard: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub one_time_keyboard: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_field_placeholder: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub selective: bool,
}

impl ReplyKeyboardMarkup {
    pub fn new(rows: impl IntoIterator<Item = Vec<KeyboardButton>>) -> Self {
        Self {
            keyboard: rows.into_iter().collect(),
            ..Default::default()
        }
    }

    pub fn resized(mut self) -> Self {
        self.resize_keyboard = true;
        self
    }

    pub fn one_time(mut self) -> Self {
        self.one_time_keyboard = true;
        self
    }
}

/// Hides the current custom keyboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyKeyboardRemove {
    pub remove_keyboard: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub selective: bool,
}

impl Default for ReplyKeyboardRemove {
    fn default() -> Self {
        Self {
            remove_keyboard: true,
            selective: false,
        }
    }
}

/// Asks the client to open a reply interface for the sent message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForceReply {
    pub force_reply: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_field_placeholder: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub selective: bool,
}

impl Default for ForceReply {
    fn default() -> Self {
        Self {
            force_reply: true,
            input_field_placeholder: None,
            selective: false,
        }
    }
}

/// Any of the `reply_markup` shapes a send accepts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ReplyMarkup {
    Inline(InlineKeyboardMarkup),
    Keyboard(ReplyKeyboardMarkup),
    Remove(ReplyKeyboardRemove),
    ForceReply(ForceReply),
}

impl From<InlineKeyboardMarkup> for ReplyMarkup {
    fn from(markup: InlineKeyboardMarkup) -> Self {
        Self::Inline(markup)
    }
}

impl From<ReplyKeyboardMarkup> for ReplyMarkup {
    fn from(markup: ReplyKeyboardMarkup) -> Self {
        Self::Keyboard(markup)
    }
}

impl From<ReplyKeyboardRemove> for ReplyMarkup {
    fn from(markup: ReplyKeyboardRemove) -> Self {
        Self::Remove(markup)
    }
}

impl From<ForceReply> for ReplyMarkup {
    fn from(markup: ForceReply) -> Self {
        Self::ForceReply(markup)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_inline_keyboard_shape() {
        let markup: ReplyMarkup = InlineKeyboardMarkup::default()
            .row([
                InlineKeyboardButton::callback("Yes", "vote:up"),
                InlineKeyboardButton::url("Docs", "https://example.com"),
            ])
            .into();

        assert_eq!(
            serde_json::to_value(&markup).unwrap(),
            json!({
                "inline_keyboard": [[
                    { "text": "Yes", "callback_data": "vote:up" },
                    { "text": "Docs", "url": "https://example.com" },
                ]]
            })
        );
    }

    #[test]
    fn test_remove_and_force_reply_defaults() {
        let remove = serde_json::to_value(ReplyMarkup::from(ReplyKeyboardRemove::default())).unwrap();
        assert_eq!(remove, json!({ "remove_keyboard": true }));

        let force = serde_json::to_value(ReplyMarkup::from(ForceReply::default())).unwrap();
        assert_eq!(force, json!({ "force_reply": true }));
    }

    #[test]
    fn test_reply_keyboard_flags() {
        let markup = ReplyKeyboardMarkup::new([vec![KeyboardButton::new("A")]])
            .resized()
            .one_time();
        assert_eq!(
            serde_json::to_value(&markup).unwrap(),
            json!({ "keyboard": [[{ "text": "A" }]], "resize_keyboard": true, "one_time_keyboard": true })
        );
    }
}
