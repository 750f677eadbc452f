//! Bot API client over HTTPS.

use std::fmt;
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, ClientBuilder, RequestBuilder};
use serde_json::Value;
use tidegram_core::{ApiError, ApiResult, Bot, Files, InputFile, Params, TransportError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

/// Public Bot API endpoint.
pub const DEFAULT_API_URL: &str = "https://api.telegram.org";

/// Default per-request timeout. Must exceed the long-poll timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// A [`Bot`] that talks to the Bot API with `reqwest`.
///
/// Requests go to `{api_url}/bot{token}/{method}`. JSON calls are sent as
/// `application/json`, uploads as `multipart/form-data`. Every in-flight call
/// resolves to [`ApiError::Cancelled`] once the cancellation token fires.
pub struct HttpBot {
    id: String,
    token: String,
    api_url: String,
    client: Client,
    cancel: CancellationToken,
}

impl HttpBot {
    /// Creates a client with default settings.
    pub fn new(token: impl Into<String>) -> ApiResult<Self> {
        Self::builder(token).build()
    }

    pub fn builder(token: impl Into<String>) -> HttpBotBuilder {
        HttpBotBuilder {
            token: token.into(),
            api_url: DEFAULT_API_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            cancel: None,
        }
    }

    /// The token that cancels in-flight calls.
    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    fn endpoint(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_url, self.token, method)
    }

    async fn execute(&self, method: &str, request: RequestBuilder) -> ApiResult<Vec<u8>> {
        trace!(bot_id = %self.id, method, "calling Bot API");

        tokio::select! {
            biased;
            () = self.cancel.cancelled() => {
                debug!(bot_id = %self.id, method, "Bot API call cancelled");
                Err(ApiError::Cancelled)
            }
            result = send(request) => result.map_err(ApiError::from),
        }
    }
}

impl fmt::Debug for HttpBot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpBot")
            .field("id", &self.id)
            .field("api_url", &self.api_url)
            .finish_non_exhaustive()
    }
}

/// Builder for [`HttpBot`].
#[derive(Debug)]
pub struct HttpBotBuilder {
    token: String,
    api_url: String,
    timeout: Duration,
    cancel: Option<CancellationToken>,
}

impl HttpBotBuilder {
    /// Overrides the API base URL (a local Bot API server, or a mock).
    pub fn api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Shares a cancellation token, usually the runtime's.
    pub fn cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn build(self) -> ApiResult<HttpBot> {
        let token = self.token.trim().to_string();
        if token.is_empty() {
            return Err(ApiError::EmptyToken);
        }

        let client = ClientBuilder::new()
            .timeout(self.timeout)
            .build()
            .map_err(|e| TransportError::Request(e.to_string()))?;

        Ok(HttpBot {
            id: bot_id(&token),
            token,
            api_url: self.api_url,
            client,
            cancel: self.cancel.unwrap_or_default(),
        })
    }
}

#[async_trait]
impl Bot for HttpBot {
    fn id(&self) -> &str {
        &self.id
    }

    async fn raw(&self, method: &str, params: Value) -> ApiResult<Vec<u8>> {
        let request = self.client.post(self.endpoint(method)).json(&params);
        self.execute(method, request).await
    }

    async fn raw_file(&self, method: &str, params: Params, files: Files) -> ApiResult<Vec<u8>> {
        let mut form = Form::new();
        for (key, value) in params {
            form = form.text(key, value);
        }
        for (field, file) in files {
            form = match file {
                InputFile::FileId(value) | InputFile::Url(value) => form.text(field, value),
                InputFile::Path(path) => {
                    let data = tokio::fs::read(&path).await.map_err(TransportError::from)?;
                    form.part(field, Part::bytes(data).file_name(file_name(&path)))
                }
                InputFile::Bytes { name, data } => form.part(field, Part::bytes(data).file_name(name)),
            };
        }

        let request = self.client.post(self.endpoint(method)).multipart(form);
        self.execute(method, request).await
    }
}

/// The numeric bot id prefix of a token, which is safe to log.
fn bot_id(token: &str) -> String {
    token.split(':').next().unwrap_or(token).to_string()
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "file".to_string())
}

/// Sends the request and returns the raw body.
///
/// Error statuses are passed through when the body is an API envelope, so
/// `parse_result` can report the platform error. Anything else becomes
/// [`TransportError::Status`].
async fn send(request: RequestBuilder) -> Result<Vec<u8>, TransportError> {
    // Errors carry the URL, which embeds the token.
    let response = request
        .send()
        .await
        .map_err(|e| TransportError::Request(e.without_url().to_string()))?;

    let status = response.status();
    let body = response
        .bytes()
        .await
        .map_err(|e| TransportError::Request(e.without_url().to_string()))?;

    if !status.is_success() && !is_envelope(&body) {
        return Err(TransportError::Status {
            status: status.as_u16(),
            body: String::from_utf8_lossy(&body).into_owned(),
        });
    }

    Ok(body.to_vec())
}

fn is_envelope(body: &[u8]) -> bool {
    serde_json::from_slice::<Value>(body)
        .map(|value| value.get("ok").is_some())
        .unwrap_or(false)
}
