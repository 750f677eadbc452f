//! Built-in filters.
//!
//! Each filter is a non-match (never an error) when the event lacks the data
//! it inspects, except [`chat_member`], which surfaces Bot API failures.

use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::RwLock;
use regex::{Regex, RegexBuilder};
use tidegram_core::ChatId;
use tracing::trace;

use crate::filter::Filter;

/// A live, shared set of user ids for [`whitelist`] and [`blacklist`].
///
/// Updates made through any clone are visible to filters immediately.
pub type IdSet = Arc<RwLock<HashSet<i64>>>;

/// Builds an [`IdSet`] from ids.
pub fn id_set(ids: impl IntoIterator<Item = i64>) -> IdSet {
    Arc::new(RwLock::new(ids.into_iter().collect()))
}

/// Matches messages starting with `/command`.
///
/// The command must be tagged by a `bot_command` entity at offset 0. A
/// trailing `@botname` is ignored. The comparison is case-sensitive, and a
/// missing leading `/` in `command` is added.
pub fn command(command: impl Into<String>) -> Filter {
    let command = command.into();
    let expected = if command.starts_with('/') {
        command
    } else {
        format!("/{command}")
    };

    Filter::sync(move |ctx| {
        let Some(token) = ctx.message().and_then(|m| m.leading_command()) else {
            return false;
        };
        let name = token.split('@').next().unwrap_or(token);
        trace!(command = name, expected = %expected, "command filter");
        name == expected
    })
}

/// Matches callback queries by their data.
///
/// `strict` requires equality; otherwise `data` must be a prefix.
pub fn callback_query(data: impl Into<String>, strict: bool) -> Filter {
    let expected = data.into();
    Filter::sync(move |ctx| {
        let Some(data) = ctx.callback_query().and_then(|q| q.data.as_deref()) else {
            return false;
        };
        if strict {
            data == expected
        } else {
            data.starts_with(&expected)
        }
    })
}

/// Matches message text.
///
/// `strict` requires equality; otherwise `text` must be a substring. Without
/// `case_sensitive` both sides are lower-cased first.
pub fn text(text: impl Into<String>, strict: bool, case_sensitive: bool) -> Filter {
    let text = text.into();
    let expected = if case_sensitive {
        text
    } else {
        text.to_lowercase()
    };

    Filter::sync(move |ctx| {
        let Some(actual) = ctx.message().and_then(|m| m.text.as_deref()) else {
            return false;
        };
        let actual = if case_sensitive {
            actual.to_string()
        } else {
            actual.to_lowercase()
        };
        if strict {
            actual == expected
        } else {
            actual.contains(&expected)
        }
    })
}

/// Matches message text against a compiled regex.
///
/// Without `case_sensitive` the pattern is recompiled case-insensitively.
pub fn regex(re: Regex, case_sensitive: bool) -> Filter {
    let re = if case_sensitive {
        re
    } else {
        RegexBuilder::new(re.as_str())
            .case_insensitive(true)
            .build()
            .unwrap_or(re)
    };
    Filter::sync(move |ctx| {
        ctx.message()
            .and_then(|m| m.text.as_deref())
            .is_some_and(|text| re.is_match(text))
    })
}

/// Compiles `pattern` and matches message text against it.
pub fn regex_pattern(pattern: &str, case_sensitive: bool) -> Result<Filter, regex::Error> {
    let re = RegexBuilder::new(pattern)
        .case_insensitive(!case_sensitive)
        .build()?;
    Ok(regex(re, true))
}

/// Matches senders who are currently members of `chat_id`.
///
/// Calls `getChatMember` on every evaluation. Owners, administrators, members
/// and restricted users match; users who left or were kicked do not.
pub fn chat_member(chat_id: impl Into<ChatId>) -> Filter {
    let chat_id = chat_id.into();
    Filter::new(move |ctx| {
        let chat_id = chat_id.clone();
        async move {
            let Some(user_id) = ctx.from().map(|u| u.id) else {
                return Ok(false);
            };
            let member = ctx.bot().get_chat_member(chat_id, user_id).await?;
            Ok(member.is_owner() || member.is_admin() || member.is_present())
        }
    })
}

/// Matches senders whose id is in `ids`.
pub fn whitelist(ids: IdSet) -> Filter {
    Filter::sync(move |ctx| ctx.from().is_some_and(|u| ids.read().contains(&u.id)))
}

/// Matches senders whose id is not in `ids`. Events without a sender never
/// match.
pub fn blacklist(ids: IdSet) -> Filter {
    Filter::sync(move |ctx| ctx.from().is_some_and(|u| !ids.read().contains(&u.id)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HandlerError;
    use crate::testing::{
        MockBot, callback, callback_ctx, command_message, ctx, ctx_with, text_message,
    };
    use std::sync::Arc;
    use tidegram_core::{ApiError, Event, MessageEntity};

    async fn matches(filter: &Filter, ctx: Arc<crate::Context>) -> bool {
        filter.check(ctx).await.unwrap()
    }

    #[tokio::test]
    async fn test_command_matches() {
        let start = command("start");
        assert!(matches(&start, ctx(command_message("/start"))).await);
        assert!(matches(&start, ctx(command_message("/start@anybot"))).await);
        assert!(matches(&start, ctx(command_message("/start now"))).await);
        assert!(matches(&command("/start"), ctx(command_message("/start"))).await);
    }

    #[tokio::test]
    async fn test_command_rejects() {
        let start = command("start");
        // no entity
        assert!(!matches(&start, ctx(text_message("/start"))).await);
        // no slash
        assert!(!matches(&start, ctx(text_message("start"))).await);
        // case-sensitive
        assert!(!matches(&start, ctx(command_message("/START"))).await);
        // prefix only
        assert!(!matches(&start, ctx(command_message("/started"))).await);
        // not a message
        assert!(!matches(&start, callback_ctx(callback("/start"))).await);
    }

    #[tokio::test]
    async fn test_command_entity_not_at_start() {
        let mut message = text_message("hey /start");
        message.entities.push(MessageEntity::new(
            tidegram_core::EntityType::BotCommand,
            4,
            6,
        ));
        assert!(!matches(&command("start"), ctx(message)).await);
    }

    #[tokio::test]
    async fn test_callback_query_strict_and_prefix() {
        let strict = callback_query("vote:", true);
        let prefix = callback_query("vote:", false);

        assert!(!matches(&strict, callback_ctx(callback("vote:yes"))).await);
        assert!(matches(&strict, callback_ctx(callback("vote:"))).await);
        assert!(matches(&prefix, callback_ctx(callback("vote:yes"))).await);
        assert!(!matches(&prefix, callback_ctx(callback("poll:yes"))).await);
        assert!(!matches(&prefix, ctx(text_message("vote:yes"))).await);
    }

    #[tokio::test]
    async fn test_text_modes() {
        assert!(matches(&text("hello", false, false), ctx(text_message("Oh HELLO there"))).await);
        assert!(!matches(&text("hello", false, true), ctx(text_message("Oh HELLO there"))).await);
        assert!(!matches(&text("hello", true, false), ctx(text_message("hello there"))).await);
        assert!(matches(&text("Hello", true, false), ctx(text_message("hELLo"))).await);
        assert!(!matches(&text("x", false, false), callback_ctx(callback("x"))).await);
    }

    #[tokio::test]
    async fn test_regex() {
        let re = regex(Regex::new(r"^\d{3}$").unwrap(), true);
        assert!(matches(&re, ctx(text_message("123"))).await);
        assert!(!matches(&re, ctx(text_message("1234"))).await);

        let folded = regex(Regex::new("^abc").unwrap(), false);
        assert!(matches(&folded, ctx(text_message("ABCdef"))).await);
        let strict = regex(Regex::new("^abc").unwrap(), true);
        assert!(!matches(&strict, ctx(text_message("ABCdef"))).await);

        let ci = regex_pattern("^hello", false).unwrap();
        assert!(matches(&ci, ctx(text_message("HeLLo world"))).await);
        assert!(regex_pattern("(", true).is_err());
    }

    #[tokio::test]
    async fn test_white_and_blacklist_are_live() {
        let ids = id_set([2]);
        let white = whitelist(Arc::clone(&ids));
        let black = blacklist(Arc::clone(&ids));

        assert!(!matches(&white, ctx(text_message("hi"))).await);
        assert!(matches(&black, ctx(text_message("hi"))).await);

        ids.write().insert(1);

        assert!(matches(&white, ctx(text_message("hi"))).await);
        assert!(!matches(&black, ctx(text_message("hi"))).await);
    }

    #[tokio::test]
    async fn test_lists_without_sender() {
        let mut message = text_message("hi");
        message.from = None;
        let ids = id_set([]);
        assert!(!matches(&whitelist(Arc::clone(&ids)), ctx(message.clone())).await);
        assert!(!matches(&blacklist(ids), ctx(message)).await);
    }

    fn member_bot(status: &'static str) -> Arc<MockBot> {
        MockBot::responding(move |method, _| {
            assert_eq!(method, "getChatMember");
            format!(
                r#"{{"ok": true, "result": {{"status": "{status}",
                    "user": {{"id": 1, "is_bot": false, "first_name": "u"}}}}}}"#
            )
            .into_bytes()
        })
    }

    #[tokio::test]
    async fn test_chat_member_statuses() {
        for (status, expected) in [
            ("creator", true),
            ("administrator", true),
            ("member", true),
            ("restricted", true),
            ("left", false),
            ("kicked", false),
        ] {
            let bot = member_bot(status);
            let ctx = ctx_with(bot.clone(), Event::Message(Arc::new(text_message("hi"))));
            assert_eq!(
                matches(&chat_member("@club"), ctx).await,
                expected,
                "status {status}"
            );
            assert_eq!(bot.calls.lock()[0].1["chat_id"], "@club");
            assert_eq!(bot.calls.lock()[0].1["user_id"], 1);
        }
    }

    #[tokio::test]
    async fn test_chat_member_surfaces_api_errors() {
        let bot = MockBot::responding(|_, _| {
            br#"{"ok": false, "error_code": 400, "description": "chat not found"}"#.to_vec()
        });
        let ctx = ctx_with(bot, Event::Message(Arc::new(text_message("hi"))));
        let result = chat_member(-100i64).check(ctx).await;
        assert!(matches!(
            result,
            Err(HandlerError::Api(ApiError::Telegram { code: 400, .. }))
        ));
    }

    #[tokio::test]
    async fn test_chat_member_without_sender_skips_lookup() {
        let bot = MockBot::new();
        let mut message = text_message("hi");
        message.from = None;
        let ctx = ctx_with(bot.clone(), Event::Message(Arc::new(message)));
        assert!(!matches(&chat_member(-100i64), ctx).await);
        assert!(bot.calls.lock().is_empty());
    }
}
