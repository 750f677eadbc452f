//! Shared fixtures for unit tests.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{Value, json};
use tidegram_core::{
    ApiResult, Bot, BoxedBot, CallbackQuery, Chat, ChatType, EntityType, Event, Files, Message,
    MessageEntity, Params, User,
};

use crate::context::Context;

type Responder = Box<dyn Fn(&str, &Value) -> Vec<u8> + Send + Sync>;

/// Records every call and answers with a canned response.
pub struct MockBot {
    pub calls: Mutex<Vec<(String, Value)>>,
    responder: Responder,
}

impl MockBot {
    pub fn new() -> Arc<Self> {
        Self::responding(|_, _| br#"{"ok": true, "result": true}"#.to_vec())
    }

    pub fn responding<F>(responder: F) -> Arc<Self>
    where
        F: Fn(&str, &Value) -> Vec<u8> + Send + Sync + 'static,
    {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            responder: Box::new(responder),
        })
    }

    /// Answers `sendMessage` with the sent message and anything else with
    /// `true`.
    pub fn sending() -> Arc<Self> {
        Self::responding(|method, params| {
            let result = if method == "sendMessage" {
                json!({
                    "message_id": 2,
                    "date": 0,
                    "chat": { "id": params["chat_id"], "type": "supergroup" },
                    "text": params["text"],
                })
            } else {
                json!(true)
            };
            serde_json::to_vec(&json!({ "ok": true, "result": result })).unwrap()
        })
    }

    pub fn methods(&self) -> Vec<String> {
        self.calls.lock().iter().map(|(m, _)| m.clone()).collect()
    }
}

#[async_trait]
impl Bot for MockBot {
    fn id(&self) -> &str {
        "mock"
    }

    async fn raw(&self, method: &str, params: Value) -> ApiResult<Vec<u8>> {
        let response = (self.responder)(method, &params);
        self.calls.lock().push((method.to_string(), params));
        Ok(response)
    }

    async fn raw_file(&self, method: &str, _params: Params, _files: Files) -> ApiResult<Vec<u8>> {
        self.calls.lock().push((method.to_string(), Value::Null));
        Ok((self.responder)(method, &Value::Null))
    }
}

pub fn user(id: i64) -> User {
    User {
        id,
        is_bot: false,
        first_name: format!("user{id}"),
        last_name: None,
        username: None,
        language_code: None,
        is_premium: None,
        can_join_groups: None,
        can_read_all_group_messages: None,
        supports_inline_queries: None,
    }
}

pub fn chat() -> Chat {
    Chat {
        id: -100,
        kind: ChatType::Supergroup,
        title: Some("test".into()),
        username: None,
        first_name: None,
        last_name: None,
        is_forum: None,
    }
}

/// A message from user 1 with no entities.
pub fn text_message(text: &str) -> Message {
    let mut message = Message::plain(1, chat(), text);
    message.from = Some(user(1));
    message
}

/// A message whose leading word is tagged as a bot command.
pub fn command_message(text: &str) -> Message {
    let mut message = text_message(text);
    let len = text.split(' ').next().unwrap_or("").encode_utf16().count();
    message
        .entities
        .push(MessageEntity::new(EntityType::BotCommand, 0, len));
    message
}

pub fn callback(data: &str) -> CallbackQuery {
    CallbackQuery {
        id: "cb".into(),
        from: user(1),
        message: None,
        inline_message_id: None,
        chat_instance: "ci".into(),
        data: Some(data.into()),
        game_short_name: None,
    }
}

pub fn ctx_with(bot: BoxedBot, event: Event) -> Arc<Context> {
    let kind = event.kind();
    Arc::new(Context::new(bot, 1, kind, event))
}

pub fn ctx(message: Message) -> Arc<Context> {
    ctx_with(MockBot::new(), Event::Message(Arc::new(message)))
}

pub fn callback_ctx(query: CallbackQuery) -> Arc<Context> {
    ctx_with(MockBot::new(), Event::CallbackQuery(Arc::new(query)))
}
