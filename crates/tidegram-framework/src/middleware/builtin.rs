//! Middleware counterparts of the built-in filters.

use regex::Regex;
use tidegram_core::ChatId;

use super::Middleware;
use crate::filters;

pub use crate::filters::{IdSet, id_set};

/// Runs the chain only for the given command. See [`filters::command`].
pub fn command(command: impl Into<String>) -> Middleware {
    Middleware::from_filter(filters::command(command))
}

/// See [`filters::callback_query`].
pub fn callback_query(data: impl Into<String>, strict: bool) -> Middleware {
    Middleware::from_filter(filters::callback_query(data, strict))
}

/// See [`filters::text`].
pub fn text(text: impl Into<String>, strict: bool, case_sensitive: bool) -> Middleware {
    Middleware::from_filter(filters::text(text, strict, case_sensitive))
}

/// See [`filters::regex`].
pub fn regex(re: Regex, case_sensitive: bool) -> Middleware {
    Middleware::from_filter(filters::regex(re, case_sensitive))
}

/// See [`filters::chat_member`].
pub fn chat_member(chat_id: impl Into<ChatId>) -> Middleware {
    Middleware::from_filter(filters::chat_member(chat_id))
}

/// See [`filters::whitelist`].
pub fn whitelist(ids: IdSet) -> Middleware {
    Middleware::from_filter(filters::whitelist(ids))
}

/// See [`filters::blacklist`].
pub fn blacklist(ids: IdSet) -> Middleware {
    Middleware::from_filter(filters::blacklist(ids))
}
