//! Bootstrapping and shutdown.
//!
//! ```rust,ignore
//! use tidegram_framework::Dispatcher;
//! use tidegram_runtime::Runtime;
//!
//! let mut dispatcher = Dispatcher::new();
//! dispatcher.on_command("ping", || async { "pong" });
//!
//! Runtime::builder()
//!     .config_file("tidegram.toml")
//!     .build()?
//!     .run(dispatcher)
//!     .await?;
//! ```

use std::future::Future;
use std::path::Path;
use std::sync::Arc;

use futures::future::BoxFuture;
use tidegram_core::{Bot, BoxedBot, SetWebhookParams, User};
use tidegram_framework::Dispatcher;
use tidegram_transport::{HttpBot, Poller, WebhookServer};
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::config::{
    ConfigLoader, ConfigResult, PollingConfig, TidegramConfig, WebhookConfig, validate_config,
};
use crate::error::RuntimeResult;
use crate::logging;

type StartHook = Arc<dyn Fn(BoxedBot, User) -> BoxFuture<'static, ()> + Send + Sync>;

/// Runs one bot: connects, then feeds updates from the configured source
/// into a [`Dispatcher`] until shutdown.
///
/// Webhook mode is used when the configuration has a `webhook` section,
/// long polling otherwise.
pub struct Runtime {
    config: TidegramConfig,
    bot: Option<BoxedBot>,
    on_start: Option<StartHook>,
    cancel: CancellationToken,
}

impl Runtime {
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    /// Creates a runtime from an already loaded configuration and installs
    /// the logging subscriber it describes.
    pub fn from_config(config: TidegramConfig) -> ConfigResult<Self> {
        validate_config(&config)?;
        logging::init_for(&config);

        info!(
            log_level = %config.logging.level,
            log_format = ?config.logging.format,
            "Runtime initialized from configuration"
        );

        Ok(Self {
            config,
            bot: None,
            on_start: None,
            cancel: CancellationToken::new(),
        })
    }

    pub fn config(&self) -> &TidegramConfig {
        &self.config
    }

    /// Token cancelled on shutdown. It also cancels in-flight API calls of
    /// the bot the runtime creates.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Requests shutdown of a running [`run`](Self::run).
    pub fn stop(&self) {
        info!("Stop requested");
        self.cancel.cancel();
    }

    /// Runs until Ctrl+C, SIGTERM or [`stop`](Self::stop).
    pub async fn run(&self, dispatcher: Dispatcher) -> RuntimeResult<()> {
        self.run_until(dispatcher, wait_for_shutdown()).await
    }

    /// Runs until `shutdown` completes or [`stop`](Self::stop) is called.
    pub async fn run_until<F>(&self, dispatcher: Dispatcher, shutdown: F) -> RuntimeResult<()>
    where
        F: Future<Output = ()>,
    {
        let bot = self.connect()?;

        let me = tokio::select! {
            biased;
            () = self.cancel.cancelled() => return Ok(()),
            me = bot.get_me() => me?,
        };
        info!(
            bot_id = %bot.id(),
            username = me.username.as_deref().unwrap_or_default(),
            "Connected to Bot API"
        );

        if let Some(hook) = &self.on_start {
            hook(Arc::clone(&bot), me).await;
        }

        let dispatcher = Arc::new(dispatcher);
        let source = serve(&self.config, bot, dispatcher, self.cancel.clone());
        tokio::pin!(source);

        let result = tokio::select! {
            result = &mut source => result,
            () = shutdown => {
                info!("Shutting down");
                self.cancel.cancel();
                source.await
            }
        };

        // Any exit ends in-flight calls of the shared bot.
        self.cancel.cancel();
        info!("Runtime stopped");
        result
    }

    fn connect(&self) -> RuntimeResult<BoxedBot> {
        if let Some(bot) = &self.bot {
            return Ok(Arc::clone(bot));
        }

        let bot = HttpBot::builder(&self.config.bot.token)
            .api_url(&self.config.bot.api_url)
            .timeout(self.config.bot.request_timeout())
            .cancellation(self.cancel.clone())
            .build()?;
        Ok(Arc::new(bot))
    }
}

/// Runs the configured update source until `cancel` fires.
async fn serve(
    config: &TidegramConfig,
    bot: BoxedBot,
    dispatcher: Arc<Dispatcher>,
    cancel: CancellationToken,
) -> RuntimeResult<()> {
    match &config.webhook {
        Some(webhook) => serve_webhook(webhook, &config.polling, bot, dispatcher, cancel).await,
        None => serve_polling(&config.polling, bot, dispatcher, cancel).await,
    }
}

async fn serve_webhook(
    webhook: &WebhookConfig,
    polling: &PollingConfig,
    bot: BoxedBot,
    dispatcher: Arc<Dispatcher>,
    cancel: CancellationToken,
) -> RuntimeResult<()> {
    if let Some(url) = &webhook.url {
        let params = SetWebhookParams {
            url: url.clone(),
            allowed_updates: polling.allowed_updates.clone(),
            drop_pending_updates: webhook.drop_pending_updates,
            secret_token: webhook.secret_token.clone(),
            ..Default::default()
        };
        bot.set_webhook(&params).await?;
        info!(url = %url, "Webhook registered");
    }

    let mut server = WebhookServer::new(bot, dispatcher, webhook.listen.clone())
        .path(webhook.path.clone())
        .cancellation(cancel);
    if let Some(secret) = &webhook.secret_token {
        server = server.secret_token(secret.clone());
    }

    server.serve().await?;
    Ok(())
}

async fn serve_polling(
    polling: &PollingConfig,
    bot: BoxedBot,
    dispatcher: Arc<Dispatcher>,
    cancel: CancellationToken,
) -> RuntimeResult<()> {
    // getUpdates is refused while a webhook is registered.
    bot.delete_webhook(false).await?;

    Poller::new(bot, dispatcher)
        .timeout(polling.timeout_secs)
        .limit(polling.limit)
        .allowed_updates(polling.allowed_updates.iter().copied())
        .retry_interval(polling.retry_interval())
        .cancellation(cancel)
        .run()
        .await;
    Ok(())
}

/// Waits for Ctrl+C or SIGTERM.
async fn wait_for_shutdown() {
    #[cfg(unix)]
    {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    () = ctrl_c() => info!("Received Ctrl+C, shutting down"),
                    _ = sigterm.recv() => info!("Received SIGTERM, shutting down"),
                }
            }
            Err(e) => {
                warn!(error = %e, "Failed to register SIGTERM handler");
                ctrl_c().await;
                info!("Received Ctrl+C, shutting down");
            }
        }
    }

    #[cfg(not(unix))]
    {
        ctrl_c().await;
        info!("Received Ctrl+C, shutting down");
    }
}

/// Resolves on Ctrl+C. Never resolves when the handler cannot be installed.
async fn ctrl_c() {
    if let Err(e) = signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
}

// =============================================================================
// RuntimeBuilder
// =============================================================================

/// Builder for a [`Runtime`] with custom configuration sources.
pub struct RuntimeBuilder {
    config_loader: ConfigLoader,
    bot: Option<BoxedBot>,
    on_start: Option<StartHook>,
}

impl RuntimeBuilder {
    pub fn new() -> Self {
        Self {
            config_loader: ConfigLoader::new().with_current_dir(),
            bot: None,
            on_start: None,
        }
    }

    pub fn config_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.file(path);
        self
    }

    /// Sets the configuration profile (e.g. "development", "production").
    pub fn profile(mut self, profile: impl Into<String>) -> Self {
        self.config_loader = self.config_loader.profile(profile);
        self
    }

    pub fn search_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.search_path(path);
        self
    }

    /// Enables loading environment variables (enabled by default).
    pub fn with_env(mut self) -> Self {
        self.config_loader = self.config_loader.with_env();
        self
    }

    pub fn without_env(mut self) -> Self {
        self.config_loader = self.config_loader.without_env();
        self
    }

    pub fn merge(mut self, config: TidegramConfig) -> Self {
        self.config_loader = self.config_loader.merge(config);
        self
    }

    /// Uses `bot` instead of an [`HttpBot`] built from `bot.token`.
    pub fn bot(mut self, bot: BoxedBot) -> Self {
        self.bot = Some(bot);
        self
    }

    /// Called once after `getMe` succeeds, before updates are received.
    pub fn on_start<F, Fut>(mut self, hook: F) -> Self
    where
        F: Fn(BoxedBot, User) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.on_start = Some(Arc::new(move |bot, me| Box::pin(hook(bot, me))));
        self
    }

    /// Loads and validates the configuration.
    pub fn build(self) -> ConfigResult<Runtime> {
        let config = self.config_loader.load()?;
        let mut runtime = Runtime::from_config(config)?;
        runtime.bot = self.bot;
        runtime.on_start = self.on_start;
        Ok(runtime)
    }
}

impl Default for RuntimeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConfigError, WebhookConfig};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use serde_json::{Value, json};
    use std::time::Duration;
    use tidegram_core::{ApiError, ApiResult, Files, Params};
    use tidegram_framework::Context;

    /// Answers `getMe` and returns empty update batches after a short wait.
    #[derive(Default)]
    struct StubBot {
        calls: Mutex<Vec<(String, Value)>>,
    }

    impl StubBot {
        fn methods(&self) -> Vec<String> {
            self.calls.lock().iter().map(|(m, _)| m.clone()).collect()
        }
    }

    #[async_trait]
    impl Bot for StubBot {
        fn id(&self) -> &str {
            "7"
        }

        async fn raw(&self, method: &str, params: Value) -> ApiResult<Vec<u8>> {
            self.calls.lock().push((method.to_string(), params));
            let result = match method {
                "getMe" => json!({ "id": 7, "is_bot": true, "first_name": "Stub", "username": "stub_bot" }),
                "getUpdates" => {
                    tokio::time::sleep(Duration::from_millis(5)).await;
                    json!([])
                }
                _ => json!(true),
            };
            Ok(serde_json::to_vec(&json!({ "ok": true, "result": result }))?)
        }

        async fn raw_file(&self, method: &str, _: Params, _: Files) -> ApiResult<Vec<u8>> {
            self.calls.lock().push((method.to_string(), Value::Null));
            Ok(br#"{"ok": true, "result": true}"#.to_vec())
        }
    }

    fn config() -> TidegramConfig {
        let mut config = TidegramConfig::default();
        config.bot.token = "7:stub".to_string();
        config.polling.timeout_secs = 0;
        config
    }

    fn runtime(config: TidegramConfig, bot: &Arc<StubBot>) -> Runtime {
        let mut runtime = Runtime::from_config(config).unwrap();
        runtime.bot = Some(bot.clone());
        runtime
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let result = Runtime::from_config(TidegramConfig::default());
        assert!(matches!(result, Err(ConfigError::MissingField { .. })));
    }

    #[tokio::test]
    async fn test_polling_startup_sequence() {
        let bot = Arc::new(StubBot::default());
        let runtime = runtime(config(), &bot);

        runtime
            .run_until(Dispatcher::new(), tokio::time::sleep(Duration::from_millis(30)))
            .await
            .unwrap();

        let methods = bot.methods();
        assert_eq!(methods[0], "getMe");
        assert_eq!(methods[1], "deleteWebhook");
        assert!(methods[2..].iter().all(|m| m == "getUpdates"));
        assert!(runtime.cancellation_token().is_cancelled());
    }

    #[tokio::test]
    async fn test_on_start_receives_identity() {
        let bot = Arc::new(StubBot::default());
        let seen = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&seen);

        let mut runtime = runtime(config(), &bot);
        runtime.on_start = Some(Arc::new(
            move |_bot: BoxedBot, me: User| -> BoxFuture<'static, ()> {
                let sink = Arc::clone(&sink);
                Box::pin(async move {
                    *sink.lock() = me.username;
                })
            },
        ));

        runtime
            .run_until(Dispatcher::new(), std::future::ready(()))
            .await
            .unwrap();

        assert_eq!(seen.lock().as_deref(), Some("stub_bot"));
    }

    #[tokio::test]
    async fn test_stop_ends_run() {
        let bot = Arc::new(StubBot::default());
        let runtime = Arc::new(runtime(config(), &bot));

        let task = {
            let runtime = Arc::clone(&runtime);
            tokio::spawn(async move {
                runtime
                    .run_until(Dispatcher::new(), std::future::pending())
                    .await
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        runtime.stop();

        assert!(task.await.unwrap().is_ok());
    }

    #[tokio::test]
    async fn test_webhook_is_registered_then_served() {
        let bot = Arc::new(StubBot::default());
        let mut config = config();
        config.webhook = Some(WebhookConfig {
            listen: "127.0.0.1:0".to_string(),
            path: "/hook".to_string(),
            url: Some("https://bot.example.com/hook".to_string()),
            secret_token: Some("s3cret".to_string()),
            drop_pending_updates: true,
        });
        let runtime = runtime(config, &bot);

        runtime
            .run_until(Dispatcher::new(), tokio::time::sleep(Duration::from_millis(20)))
            .await
            .unwrap();

        let calls = bot.calls.lock();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[1].0, "setWebhook");
        assert_eq!(calls[1].1["url"], "https://bot.example.com/hook");
        assert_eq!(calls[1].1["secret_token"], "s3cret");
        assert_eq!(calls[1].1["drop_pending_updates"], true);
    }

    #[tokio::test]
    async fn test_failed_get_me_aborts_startup() {
        struct Unauthorized;

        #[async_trait]
        impl Bot for Unauthorized {
            fn id(&self) -> &str {
                "0"
            }

            async fn raw(&self, _: &str, _: Value) -> ApiResult<Vec<u8>> {
                Ok(br#"{"ok": false, "error_code": 401, "description": "Unauthorized"}"#.to_vec())
            }

            async fn raw_file(&self, _: &str, _: Params, _: Files) -> ApiResult<Vec<u8>> {
                unreachable!()
            }
        }

        let mut runtime = Runtime::from_config(config()).unwrap();
        runtime.bot = Some(Arc::new(Unauthorized));

        let result = runtime
            .run_until(Dispatcher::new(), std::future::pending())
            .await;

        assert!(matches!(
            result,
            Err(crate::RuntimeError::Api(ApiError::Telegram { code: 401, .. }))
        ));
    }

    #[tokio::test]
    async fn test_updates_reach_the_dispatcher() {
        /// Serves one update, then empty batches.
        struct OneUpdate {
            served: Mutex<bool>,
        }

        #[async_trait]
        impl Bot for OneUpdate {
            fn id(&self) -> &str {
                "1"
            }

            async fn raw(&self, method: &str, _: Value) -> ApiResult<Vec<u8>> {
                let result = match method {
                    "getMe" => json!({ "id": 1, "is_bot": true, "first_name": "One" }),
                    "getUpdates" => {
                        let first = !std::mem::replace(&mut *self.served.lock(), true);
                        if first {
                            json!([{
                                "update_id": 1,
                                "message": {
                                    "message_id": 1,
                                    "date": 1,
                                    "chat": { "id": 1, "type": "private" },
                                    "text": "hello",
                                }
                            }])
                        } else {
                            tokio::time::sleep(Duration::from_millis(5)).await;
                            json!([])
                        }
                    }
                    _ => json!(true),
                };
                Ok(serde_json::to_vec(&json!({ "ok": true, "result": result }))?)
            }

            async fn raw_file(&self, _: &str, _: Params, _: Files) -> ApiResult<Vec<u8>> {
                unreachable!()
            }
        }

        let texts = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&texts);
        let mut dispatcher = Dispatcher::new();
        dispatcher.on_message(move |ctx: Arc<Context>| {
            let sink = Arc::clone(&sink);
            async move {
                if let Some(text) = ctx.message().and_then(|m| m.text.clone()) {
                    sink.lock().push(text);
                }
            }
        });

        let mut runtime = Runtime::from_config(config()).unwrap();
        runtime.bot = Some(Arc::new(OneUpdate {
            served: Mutex::new(false),
        }));

        runtime
            .run_until(dispatcher, tokio::time::sleep(Duration::from_millis(30)))
            .await
            .unwrap();

        assert_eq!(*texts.lock(), vec!["hello"]);
    }
}
