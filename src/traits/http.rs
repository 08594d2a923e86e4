//! HTTP client trait abstraction.
//!
//! The streaming core never opens connections itself; it is handed an
//! already-open byte stream by an implementation of [`HttpClient`]. The
//! trait exists so the production reqwest adapter and the scripted mock
//! adapter are interchangeable in tests.

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use std::collections::HashMap;
use std::pin::Pin;
use thiserror::Error;

/// HTTP headers represented as a key-value map.
pub type Headers = HashMap<String, String>;

/// A byte stream handed over together with responsibility for reading it
/// to completion or dropping it.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, HttpError>> + Send>>;

/// Transport-level errors.
#[derive(Debug, Clone, Error)]
pub enum HttpError {
    /// Connection could not be established.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),
    /// The request or a stream read timed out.
    #[error("request timed out: {0}")]
    Timeout(String),
    /// The server answered with a non-success status.
    #[error("server error ({status}): {message}")]
    ServerError { status: u16, message: String },
    /// A read from the response body failed.
    #[error("read error: {0}")]
    Io(String),
    /// Anything else the transport reports.
    #[error("http error: {0}")]
    Other(String),
}

/// A buffered HTTP response.
#[derive(Debug, Clone)]
pub struct Response {
    /// HTTP status code.
    pub status: u16,
    /// Response body.
    pub body: Bytes,
}

impl Response {
    /// Create a response from a status code and body.
    pub fn new(status: u16, body: Bytes) -> Self {
        Self { status, body }
    }

    /// Whether the status is in the 2xx range.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Response body as text.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Parse the response body as JSON.
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }
}

/// Trait for HTTP operations against the backend.
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Perform a GET request and buffer the response.
    async fn get(&self, url: &str, headers: &Headers) -> Result<Response, HttpError>;

    /// Perform a POST request and buffer the response.
    async fn post(&self, url: &str, body: &str, headers: &Headers) -> Result<Response, HttpError>;

    /// Perform a POST request and return the response body incrementally.
    ///
    /// Used for the event-stream endpoint, where the body arrives over the
    /// lifetime of the conversation turn. A non-success status is reported
    /// as [`HttpError::ServerError`] before any stream is handed out.
    async fn post_stream(
        &self,
        url: &str,
        body: &str,
        headers: &Headers,
    ) -> Result<ByteStream, HttpError>;
}
