//! Webhook update source.
//!
//! An axum server accepts `POST {path}` requests carrying one JSON update
//! each:
//!
//! | Condition | Status |
//! |-----------|--------|
//! | `X-Telegram-Bot-Api-Secret-Token` mismatch | 401 |
//! | Body is not an update | 400 |
//! | Update id already seen | 200, not dispatched |
//! | Otherwise | 200 after dispatch |

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use axum::{
    Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::post,
};
use tidegram_core::{Bot, BoxedBot, Update};
use tidegram_framework::Dispatcher;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::error::ServerError;

/// Header carrying the secret configured with `setWebhook`.
pub const SECRET_HEADER: &str = "x-telegram-bot-api-secret-token";

/// Shared state for the webhook route.
struct WebhookState {
    bot: BoxedBot,
    dispatcher: Arc<Dispatcher>,
    secret_token: Option<String>,
    /// Highest update id accepted so far.
    last_update_id: AtomicI64,
}

/// Receives updates pushed by the Bot API.
pub struct WebhookServer {
    listen: String,
    path: String,
    secret_token: Option<String>,
    bot: BoxedBot,
    dispatcher: Arc<Dispatcher>,
    cancel: CancellationToken,
}

impl WebhookServer {
    pub fn new(bot: BoxedBot, dispatcher: Arc<Dispatcher>, listen: impl Into<String>) -> Self {
        Self {
            listen: listen.into(),
            path: "/".to_string(),
            secret_token: None,
            bot,
            dispatcher,
            cancel: CancellationToken::new(),
        }
    }

    /// Route path; a missing leading `/` is added.
    pub fn path(mut self, path: impl Into<String>) -> Self {
        let path = path.into();
        self.path = if path.starts_with('/') {
            path
        } else {
            format!("/{path}")
        };
        self
    }

    /// Rejects requests whose secret header differs from `secret`.
    pub fn secret_token(mut self, secret: impl Into<String>) -> Self {
        self.secret_token = Some(secret.into());
        self
    }

    /// Shuts the server down gracefully once `token` is cancelled.
    pub fn cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Builds the router without binding a socket.
    pub fn router(&self) -> Router {
        let state = Arc::new(WebhookState {
            bot: Arc::clone(&self.bot),
            dispatcher: Arc::clone(&self.dispatcher),
            secret_token: self.secret_token.clone(),
            last_update_id: AtomicI64::new(i64::MIN),
        });

        Router::new()
            .route(&self.path, post(receive_update))
            .with_state(state)
    }

    /// Binds the listen address and serves until cancelled.
    pub async fn serve(self) -> Result<(), ServerError> {
        let listener = TcpListener::bind(&self.listen)
            .await
            .map_err(|source| ServerError::Bind {
                addr: self.listen.clone(),
                source,
            })?;
        let local_addr: Option<SocketAddr> = listener.local_addr().ok();

        info!(
            bot_id = %self.bot.id(),
            addr = ?local_addr,
            path = %self.path,
            "webhook server listening"
        );

        let router = self.router();
        axum::serve(listener, router)
            .with_graceful_shutdown(self.cancel.cancelled_owned())
            .await
            .map_err(ServerError::Serve)?;

        info!("webhook server stopped");
        Ok(())
    }
}

/// Axum handler for one pushed update.
async fn receive_update(
    State(state): State<Arc<WebhookState>>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    if let Some(expected) = &state.secret_token {
        let provided = headers.get(SECRET_HEADER).and_then(|v| v.to_str().ok());
        if provided != Some(expected.as_str()) {
            warn!("webhook request with invalid secret token");
            return StatusCode::UNAUTHORIZED;
        }
    }

    let update: Update = match serde_json::from_slice(&body) {
        Ok(update) => update,
        Err(e) => {
            debug!(error = %e, len = body.len(), "malformed webhook body");
            return StatusCode::BAD_REQUEST;
        }
    };

    let id = update.update_id;
    let previous = state.last_update_id.fetch_max(id, Ordering::SeqCst);
    if previous >= id {
        trace!(update_id = id, last = previous, "duplicate update dropped");
        return StatusCode::OK;
    }

    state
        .dispatcher
        .dispatch(Arc::clone(&state.bot), update)
        .await;
    StatusCode::OK
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use parking_lot::Mutex;
    use serde_json::{Value, json};
    use tidegram_core::{ApiResult, Files, Params};
    use tower::ServiceExt;

    struct NullBot;

    #[async_trait]
    impl Bot for NullBot {
        fn id(&self) -> &str {
            "null"
        }

        async fn raw(&self, _: &str, _: Value) -> ApiResult<Vec<u8>> {
            Ok(br#"{"ok": true, "result": true}"#.to_vec())
        }

        async fn raw_file(&self, _: &str, _: Params, _: Files) -> ApiResult<Vec<u8>> {
            Ok(br#"{"ok": true, "result": true}"#.to_vec())
        }
    }

    fn server(seen: &Arc<Mutex<Vec<i64>>>) -> WebhookServer {
        let sink = Arc::clone(seen);
        let mut dispatcher = Dispatcher::new();
        dispatcher.on_message(move |ctx: Arc<tidegram_framework::Context>| {
            let sink = Arc::clone(&sink);
            async move {
                sink.lock().push(ctx.update_id());
            }
        });
        WebhookServer::new(Arc::new(NullBot), Arc::new(dispatcher), "127.0.0.1:0")
            .path("hook")
            .secret_token("s3cret")
    }

    fn request(body: String, secret: Option<&str>) -> Request<Body> {
        let mut builder = Request::post("/hook").header("content-type", "application/json");
        if let Some(secret) = secret {
            builder = builder.header(SECRET_HEADER, secret);
        }
        builder.body(Body::from(body)).unwrap()
    }

    fn update(id: i64) -> String {
        json!({
            "update_id": id,
            "message": {
                "message_id": 1,
                "date": 1,
                "chat": { "id": 1, "type": "private" },
                "text": "hi",
            }
        })
        .to_string()
    }

    #[tokio::test]
    async fn test_secret_mismatch_is_unauthorized() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let router = server(&seen).router();

        let response = router
            .clone()
            .oneshot(request(update(1), Some("wrong")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = router.oneshot(request(update(1), None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(seen.lock().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_body_is_bad_request() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let router = server(&seen).router();

        let response = router
            .oneshot(request("{not json".to_string(), Some("s3cret")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_duplicates_are_acknowledged_not_dispatched() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let router = server(&seen).router();

        for id in [5, 5, 4, 6] {
            let response = router
                .clone()
                .oneshot(request(update(id), Some("s3cret")))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }

        assert_eq!(*seen.lock(), vec![5, 6]);
    }

    #[tokio::test]
    async fn test_serve_stops_on_cancel() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let cancel = CancellationToken::new();
        let server = server(&seen).cancellation(cancel.clone());

        let task = tokio::spawn(server.serve());
        cancel.cancel();
        assert!(task.await.unwrap().is_ok());
    }

    #[tokio::test]
    async fn test_bind_failure_is_reported() {
        let server = WebhookServer::new(
            Arc::new(NullBot),
            Arc::new(Dispatcher::new()),
            "not an address",
        );
        assert!(matches!(server.serve().await, Err(ServerError::Bind { .. })));
    }
}
