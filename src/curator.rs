//! Curator API client.
//!
//! HTTP client for the Curator document-chat backend. The streaming chat
//! endpoint returns a [`ChatStream`] that the caller drives with a
//! [`ChatCallbacks`](crate::sse::ChatCallbacks) set; the sibling endpoints
//! (single-shot chat, search, health) are plain request/response calls.

use std::sync::Arc;
use thiserror::Error;

use crate::adapters::ReqwestHttpClient;
use crate::models::{ChatRequest, ChatResponse, SearchResponse};
use crate::stream::ChatStream;
use crate::traits::{Headers, HttpClient, HttpError};

/// Default backend base URL, overridable per client or via
/// [`Config`](crate::config::Config).
pub const CURATOR_BASE_URL: &str = "http://localhost:8000";

/// Errors from client operations.
#[derive(Debug, Error)]
pub enum CuratorError {
    /// The transport failed.
    #[error("http error: {0}")]
    Http(#[from] HttpError),
    /// A request or response body could not be (de)serialized.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    /// The server answered with a non-success status.
    #[error("server error ({status}): {message}")]
    Server { status: u16, message: String },
}

/// Client for the Curator backend API.
pub struct CuratorClient {
    base_url: String,
    http: Arc<dyn HttpClient>,
}

impl CuratorClient {
    /// Create a client against the default base URL.
    pub fn new() -> Self {
        Self::with_base_url(CURATOR_BASE_URL)
    }

    /// Create a client against a custom base URL.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: trim_base_url(base_url.into()),
            http: Arc::new(ReqwestHttpClient::new()),
        }
    }

    /// Create a client with an injected transport, for tests.
    pub fn with_http_client(base_url: impl Into<String>, http: Arc<dyn HttpClient>) -> Self {
        Self {
            base_url: trim_base_url(base_url.into()),
            http,
        }
    }

    /// The configured base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Open a streaming chat turn.
    ///
    /// Issues `POST /api/v1/chat/stream` and hands back the response body
    /// as a [`ChatStream`], together with the responsibility for reading it
    /// to completion or dropping it.
    pub async fn stream_chat(&self, request: &ChatRequest) -> Result<ChatStream, CuratorError> {
        let url = format!("{}/api/v1/chat/stream", self.base_url);
        let body = serde_json::to_string(request)?;

        let mut headers = json_headers();
        headers.insert("Accept".to_string(), "text/event-stream".to_string());

        tracing::debug!(%url, query = %request.query, "opening chat stream");
        let bytes = self.http.post_stream(&url, &body, &headers).await?;
        Ok(ChatStream::new(bytes))
    }

    /// Single-shot chat request (non-streaming sibling of
    /// [`stream_chat`](Self::stream_chat)).
    pub async fn send_chat(&self, request: &ChatRequest) -> Result<ChatResponse, CuratorError> {
        let url = format!("{}/api/v1/chat", self.base_url);
        self.post_json(&url, request).await
    }

    /// Search without generating an answer.
    pub async fn search(&self, request: &ChatRequest) -> Result<SearchResponse, CuratorError> {
        let url = format!("{}/api/v1/search", self.base_url);
        self.post_json(&url, request).await
    }

    /// Liveness probe against `GET /health`.
    ///
    /// Returns `true` iff the endpoint answers with a success status; any
    /// transport failure maps to `false`.
    pub async fn health_check(&self) -> bool {
        let url = format!("{}/health", self.base_url);
        match self.http.get(&url, &Headers::new()).await {
            Ok(response) => response.is_success(),
            Err(error) => {
                tracing::debug!(%error, "health check failed");
                false
            }
        }
    }

    async fn post_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        request: &ChatRequest,
    ) -> Result<T, CuratorError> {
        let body = serde_json::to_string(request)?;
        let response = self.http.post(url, &body, &json_headers()).await?;

        if !response.is_success() {
            return Err(CuratorError::Server {
                status: response.status,
                message: response.text(),
            });
        }
        Ok(response.json()?)
    }
}

impl Default for CuratorClient {
    fn default() -> Self {
        Self::new()
    }
}

fn json_headers() -> Headers {
    let mut headers = Headers::new();
    headers.insert("Content-Type".to_string(), "application/json".to_string());
    headers
}

fn trim_base_url(mut base_url: String) -> String {
    while base_url.ends_with('/') {
        base_url.pop();
    }
    base_url
}
