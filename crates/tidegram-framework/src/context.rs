//! Per-activation dispatch context.

use std::fmt;
use std::sync::Arc;

use tidegram_core::{
    Bot, BoxedBot, CallbackQuery, Chat, Event, Message, SendMessageParams, UpdateType, User,
};

use crate::error::{ExtractError, HandlerResult};

/// Links the owning bot and the update metadata to one activated event.
///
/// Filters, middleware and callbacks all receive the same `Arc<Context>`
/// for a given activation, so callback queries reach the bot exactly the
/// way messages do.
pub struct Context {
    bot: BoxedBot,
    event: Event,
    update_id: i64,
    update_type: UpdateType,
}

impl Context {
    pub fn new(bot: BoxedBot, update_id: i64, update_type: UpdateType, event: Event) -> Self {
        Self {
            bot,
            event,
            update_id,
            update_type,
        }
    }

    /// The bot that received the update.
    pub fn bot(&self) -> &dyn Bot {
        self.bot.as_ref()
    }

    /// Returns a cloned handle to the bot.
    pub fn bot_arc(&self) -> BoxedBot {
        Arc::clone(&self.bot)
    }

    pub fn event(&self) -> &Event {
        &self.event
    }

    pub fn update_id(&self) -> i64 {
        self.update_id
    }

    /// The key this activation was routed under.
    ///
    /// Differs from `event().kind()` for media activations.
    pub fn update_type(&self) -> UpdateType {
        self.update_type
    }

    pub fn message(&self) -> Option<&Message> {
        self.event.message()
    }

    pub fn callback_query(&self) -> Option<&CallbackQuery> {
        self.event.callback_query()
    }

    pub fn from(&self) -> Option<&User> {
        self.event.from()
    }

    pub fn chat(&self) -> Option<&Chat> {
        self.event.chat()
    }

    /// Sends `text` to the chat of the event.
    pub async fn send(&self, text: impl Into<String>) -> HandlerResult<Message> {
        let params = SendMessageParams::new(self.chat_id()?, text);
        Ok(self.bot.send_message(&params).await?)
    }

    /// Sends `text` as a reply to the event's message.
    ///
    /// Falls back to a plain send when there is no message to reply to.
    pub async fn reply(&self, text: impl Into<String>) -> HandlerResult<Message> {
        let mut params = SendMessageParams::new(self.chat_id()?, text);
        if let Some(message) = self.message() {
            params = params.reply_to(message.message_id);
            params.message_thread_id = message.message_thread_id;
        }
        Ok(self.bot.send_message(&params).await?)
    }

    /// Replaces the text of the event's message.
    ///
    /// For callback queries this edits the message carrying the button.
    pub async fn edit_text(&self, text: impl Into<String> + Send) -> HandlerResult<Message> {
        let (chat_id, message_id) = self.target_message()?;
        Ok(self
            .bot
            .edit_message_text(chat_id, message_id, text)
            .await?)
    }

    /// Deletes the event's message.
    pub async fn delete(&self) -> HandlerResult {
        let (chat_id, message_id) = self.target_message()?;
        Ok(self.bot.delete_message(chat_id, message_id).await?)
    }

    /// `(chat_id, message_id)` of the message the event refers to.
    fn target_message(&self) -> Result<(i64, i64), ExtractError> {
        if let Some(message) = self.message() {
            return Ok((message.chat.id, message.message_id));
        }
        self.callback_query()
            .and_then(|query| query.message.as_ref())
            .map(|message| (message.chat().id, message.message_id()))
            .ok_or_else(|| ExtractError::missing("message", self.update_type))
    }

    fn chat_id(&self) -> Result<i64, ExtractError> {
        self.chat()
            .map(|c| c.id)
            .ok_or_else(|| ExtractError::missing("chat", self.update_type))
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("bot", &self.bot.id())
            .field("update_id", &self.update_id)
            .field("update_type", &self.update_type)
            .finish_non_exhaustive()
    }
}
