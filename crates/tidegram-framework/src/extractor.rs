//! Parameter injection for handler callbacks.
//!
//! Every callback parameter implements [`FromContext`]. When any parameter
//! fails to extract, the callback is not called and the chain fails with
//! [`HandlerError::Extract`](crate::HandlerError::Extract).
//!
//! ```rust,ignore
//! async fn greet(user: User, chat: Chat) -> String {
//!     format!("hello {} in {}", user.first_name, chat.id)
//! }
//!
//! // Never fails; `None` when the event has no sender.
//! async fn maybe(user: Option<User>) {}
//! ```

use std::sync::Arc;

use tidegram_core::{BoxedBot, CallbackQuery, Chat, Event, Message, UpdateType, User};

use crate::context::Context;
use crate::error::{ExtractError, ExtractResult};

/// A type that can be extracted from a dispatch [`Context`].
pub trait FromContext: Sized {
    /// Attempts to extract this type from the given context.
    fn from_context(ctx: &Arc<Context>) -> ExtractResult<Self>;
}

/// The whole context, for handlers that need more than one piece.
impl FromContext for Arc<Context> {
    fn from_context(ctx: &Arc<Context>) -> ExtractResult<Self> {
        Ok(Arc::clone(ctx))
    }
}

/// The bot that received the update.
///
/// ```rust,ignore
/// async fn handler(bot: BoxedBot, message: Arc<Message>) -> HandlerResult {
///     bot.delete_message(message.chat.id, message.message_id).await?;
///     Ok(())
/// }
/// ```
impl FromContext for BoxedBot {
    fn from_context(ctx: &Arc<Context>) -> ExtractResult<Self> {
        Ok(ctx.bot_arc())
    }
}

impl FromContext for Event {
    fn from_context(ctx: &Arc<Context>) -> ExtractResult<Self> {
        Ok(ctx.event().clone())
    }
}

impl FromContext for UpdateType {
    fn from_context(ctx: &Arc<Context>) -> ExtractResult<Self> {
        Ok(ctx.update_type())
    }
}

/// The message of any message-carrying event, edits and channel posts
/// included.
impl FromContext for Arc<Message> {
    fn from_context(ctx: &Arc<Context>) -> ExtractResult<Self> {
        ctx.event()
            .message_arc()
            .ok_or_else(|| ExtractError::missing("message", ctx.update_type()))
    }
}

impl FromContext for Message {
    fn from_context(ctx: &Arc<Context>) -> ExtractResult<Self> {
        ctx.message()
            .cloned()
            .ok_or_else(|| ExtractError::missing("message", ctx.update_type()))
    }
}

impl FromContext for Arc<CallbackQuery> {
    fn from_context(ctx: &Arc<Context>) -> ExtractResult<Self> {
        match ctx.event() {
            Event::CallbackQuery(query) => Ok(Arc::clone(query)),
            _ => Err(ExtractError::missing("callback query", ctx.update_type())),
        }
    }
}

impl FromContext for CallbackQuery {
    fn from_context(ctx: &Arc<Context>) -> ExtractResult<Self> {
        ctx.callback_query()
            .cloned()
            .ok_or_else(|| ExtractError::missing("callback query", ctx.update_type()))
    }
}

/// The sender. Missing for anonymous channel posts.
impl FromContext for User {
    fn from_context(ctx: &Arc<Context>) -> ExtractResult<Self> {
        ctx.from()
            .cloned()
            .ok_or_else(|| ExtractError::missing("sender", ctx.update_type()))
    }
}

impl FromContext for Chat {
    fn from_context(ctx: &Arc<Context>) -> ExtractResult<Self> {
        ctx.chat()
            .cloned()
            .ok_or_else(|| ExtractError::missing("chat", ctx.update_type()))
    }
}

/// Optional parameters never fail.
impl<T: FromContext> FromContext for Option<T> {
    fn from_context(ctx: &Arc<Context>) -> ExtractResult<Self> {
        Ok(T::from_context(ctx).ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{callback, callback_ctx, ctx, text_message};
    use tidegram_core::Bot;

    #[test]
    fn test_message_extractors() {
        let ctx = ctx(text_message("hi"));
        let message = Arc::<Message>::from_context(&ctx).unwrap();
        assert_eq!(message.text.as_deref(), Some("hi"));
        assert_eq!(User::from_context(&ctx).unwrap().id, 1);
        assert_eq!(Chat::from_context(&ctx).unwrap().id, -100);
        assert_eq!(UpdateType::from_context(&ctx).unwrap(), UpdateType::Message);
        assert!(CallbackQuery::from_context(&ctx).is_err());
    }

    #[test]
    fn test_callback_extractors() {
        let ctx = callback_ctx(callback("vote:yes"));
        let query = Arc::<CallbackQuery>::from_context(&ctx).unwrap();
        assert_eq!(query.data.as_deref(), Some("vote:yes"));
        assert_eq!(User::from_context(&ctx).unwrap().id, 1);

        let err = Message::from_context(&ctx).unwrap_err();
        assert_eq!(
            err.to_string(),
            "message is not available on 'callback_query' updates"
        );
        // no attached message, so no chat either
        assert!(Chat::from_context(&ctx).is_err());
    }

    #[test]
    fn test_option_never_fails() {
        let ctx = callback_ctx(callback("x"));
        assert!(Option::<Message>::from_context(&ctx).unwrap().is_none());
        assert!(Option::<User>::from_context(&ctx).unwrap().is_some());
    }

    #[test]
    fn test_bot_and_context() {
        let ctx = ctx(text_message("hi"));
        assert_eq!(BoxedBot::from_context(&ctx).unwrap().id(), "mock");
        let same = Arc::<Context>::from_context(&ctx).unwrap();
        assert!(Arc::ptr_eq(&same, &ctx));
    }
}
