//! Long polling update source.

use std::sync::Arc;
use std::time::Duration;

use tidegram_core::{
    ApiError, Bot, BoxedBot, GetUpdatesParams, UpdateType, decode_update, raw_update_id,
};
use tidegram_framework::Dispatcher;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Default wait before retrying a failed `getUpdates`.
pub const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_secs(1);

/// Fetches updates with `getUpdates` and dispatches them one at a time.
///
/// Updates of one batch are dispatched strictly in order, and a batch is
/// fully handled before the next one is requested. The offset always moves
/// to the highest seen id plus one, so every update is acknowledged exactly
/// once. Entries that do not decode are logged, acknowledged and skipped.
pub struct Poller {
    bot: BoxedBot,
    dispatcher: Arc<Dispatcher>,
    timeout_secs: u64,
    limit: Option<u8>,
    allowed_updates: Vec<UpdateType>,
    retry_interval: Duration,
    cancel: CancellationToken,
}

impl Poller {
    pub fn new(bot: BoxedBot, dispatcher: Arc<Dispatcher>) -> Self {
        Self {
            bot,
            dispatcher,
            timeout_secs: 30,
            limit: None,
            allowed_updates: Vec::new(),
            retry_interval: DEFAULT_RETRY_INTERVAL,
            cancel: CancellationToken::new(),
        }
    }

    /// Long-poll timeout in seconds. Zero means short polling.
    pub fn timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Maximum updates per batch (1-100).
    pub fn limit(mut self, limit: u8) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn allowed_updates(mut self, kinds: impl IntoIterator<Item = UpdateType>) -> Self {
        self.allowed_updates = kinds.into_iter().collect();
        self
    }

    pub fn retry_interval(mut self, interval: Duration) -> Self {
        self.retry_interval = interval;
        self
    }

    /// Stops the loop between batches once `token` is cancelled.
    pub fn cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Polls until cancelled.
    pub async fn run(self) {
        info!(bot_id = %self.bot.id(), timeout = self.timeout_secs, "polling started");

        let mut offset: Option<i64> = None;
        while !self.cancel.is_cancelled() {
            let params = GetUpdatesParams {
                offset,
                limit: self.limit,
                timeout: Some(self.timeout_secs),
                allowed_updates: self.allowed_updates.clone(),
            };

            let result = tokio::select! {
                biased;
                () = self.cancel.cancelled() => break,
                result = self.bot.get_raw_updates(&params) => result,
            };

            match result {
                Ok(entries) => {
                    if !entries.is_empty() {
                        debug!(count = entries.len(), ?offset, "received updates");
                    }
                    for entry in entries {
                        if let Some(id) = raw_update_id(&entry) {
                            let next = id + 1;
                            offset = Some(offset.map_or(next, |current| current.max(next)));
                        }
                        match decode_update(entry) {
                            Ok(update) => {
                                self.dispatcher
                                    .dispatch(Arc::clone(&self.bot), update)
                                    .await;
                            }
                            Err(e) => warn!(error = %e, ?offset, "skipping undecodable update"),
                        }
                    }
                }
                Err(ApiError::Cancelled) => break,
                Err(e) => {
                    warn!(
                        error = %e,
                        retry_in = ?self.retry_interval,
                        "getUpdates failed"
                    );
                    tokio::select! {
                        () = self.cancel.cancelled() => break,
                        () = tokio::time::sleep(self.retry_interval) => {}
                    }
                }
            }
        }

        info!(bot_id = %self.bot.id(), "polling stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use serde_json::{Value, json};
    use std::collections::VecDeque;
    use tidegram_core::{ApiResult, Files, Params, TransportError};

    /// Serves scripted `getUpdates` responses, then cancels the poller.
    struct ScriptedBot {
        script: Mutex<VecDeque<ApiResult<Value>>>,
        offsets: Mutex<Vec<Value>>,
        sent: Mutex<Vec<String>>,
        cancel: CancellationToken,
    }

    impl ScriptedBot {
        fn new(script: Vec<ApiResult<Value>>, cancel: CancellationToken) -> Arc<Self> {
            Arc::new(Self {
                script: Mutex::new(script.into()),
                offsets: Mutex::new(Vec::new()),
                sent: Mutex::new(Vec::new()),
                cancel,
            })
        }
    }

    #[async_trait]
    impl Bot for ScriptedBot {
        fn id(&self) -> &str {
            "scripted"
        }

        async fn raw(&self, method: &str, params: Value) -> ApiResult<Vec<u8>> {
            if method == "sendMessage" {
                self.sent.lock().push(params["text"].as_str().unwrap_or_default().to_string());
                return Ok(br#"{"ok": true, "result": {"message_id": 5, "date": 1, "chat": {"id": 1, "type": "private"}}}"#.to_vec());
            }

            self.offsets.lock().push(params["offset"].clone());
            let next = self.script.lock().pop_front();
            match next {
                Some(Ok(result)) => Ok(serde_json::to_vec(&json!({ "ok": true, "result": result }))?),
                Some(Err(e)) => Err(e),
                None => {
                    self.cancel.cancel();
                    Err(ApiError::Cancelled)
                }
            }
        }

        async fn raw_file(&self, _: &str, _: Params, _: Files) -> ApiResult<Vec<u8>> {
            unreachable!("no uploads while polling")
        }
    }

    fn update(id: i64, text: &str) -> Value {
        json!({
            "update_id": id,
            "message": {
                "message_id": id,
                "date": 1,
                "chat": { "id": 1, "type": "private" },
                "text": text,
            }
        })
    }

    fn echo_dispatcher() -> Arc<Dispatcher> {
        let mut dispatcher = Dispatcher::new();
        dispatcher.on_message(|message: Arc<tidegram_core::Message>| async move {
            message.text.clone()
        });
        Arc::new(dispatcher)
    }

    #[tokio::test]
    async fn test_offsets_advance_and_order_is_kept() {
        let cancel = CancellationToken::new();
        let bot = ScriptedBot::new(
            vec![
                Ok(json!([update(10, "a"), update(11, "b")])),
                Ok(json!([])),
                Ok(json!([update(12, "c")])),
            ],
            cancel.clone(),
        );

        Poller::new(bot.clone(), echo_dispatcher())
            .timeout(0)
            .cancellation(cancel)
            .run()
            .await;

        assert_eq!(*bot.sent.lock(), vec!["a", "b", "c"]);
        assert_eq!(
            *bot.offsets.lock(),
            vec![Value::Null, json!(12), json!(12), json!(13)]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_fetch_is_retried() {
        let cancel = CancellationToken::new();
        let bot = ScriptedBot::new(
            vec![
                Err(TransportError::Request("connection reset".into()).into()),
                Ok(json!([update(1, "after retry")])),
            ],
            cancel.clone(),
        );

        Poller::new(bot.clone(), echo_dispatcher())
            .retry_interval(Duration::from_secs(5))
            .cancellation(cancel)
            .run()
            .await;

        assert_eq!(*bot.sent.lock(), vec!["after retry"]);
        assert_eq!(bot.offsets.lock().len(), 3);
    }

    #[tokio::test]
    async fn test_undecodable_update_is_skipped_and_acknowledged() {
        let cancel = CancellationToken::new();
        let broken = json!({
            "update_id": 2,
            "message": { "message_id": 2, "date": "yesterday", "chat": { "id": 1, "type": "private" } }
        });
        let bot = ScriptedBot::new(
            vec![
                Ok(json!([update(1, "good"), broken, update(3, "after")])),
                Ok(json!([update(4, "next batch")])),
            ],
            cancel.clone(),
        );

        Poller::new(bot.clone(), echo_dispatcher())
            .timeout(0)
            .cancellation(cancel)
            .run()
            .await;

        assert_eq!(*bot.sent.lock(), vec!["good", "after", "next batch"]);
        assert_eq!(
            *bot.offsets.lock(),
            vec![Value::Null, json!(4), json!(5)]
        );
    }

    #[tokio::test]
    async fn test_unknown_chat_type_still_dispatches() {
        let cancel = CancellationToken::new();
        let forum = json!({
            "update_id": 2,
            "message": { "message_id": 2, "date": 1, "chat": { "id": 1, "type": "forum" }, "text": "forum" }
        });
        let bot = ScriptedBot::new(vec![Ok(json!([update(1, "good"), forum]))], cancel.clone());

        Poller::new(bot.clone(), echo_dispatcher())
            .timeout(0)
            .cancellation(cancel)
            .run()
            .await;

        assert_eq!(*bot.sent.lock(), vec!["good", "forum"]);
        assert_eq!(*bot.offsets.lock(), vec![Value::Null, json!(3)]);
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let bot = ScriptedBot::new(vec![Ok(json!([update(1, "x")]))], cancel.clone());

        Poller::new(bot.clone(), echo_dispatcher())
            .cancellation(cancel)
            .run()
            .await;

        assert!(bot.offsets.lock().is_empty());
    }
}
