//! Mock HTTP client for tests.
//!
//! Replays configured responses and scripted chunk sequences without any
//! network access, and records every request for verification. Scripted
//! chunks make it possible to exercise the full streaming pipeline with
//! exact control over where chunk boundaries fall.

use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::traits::{ByteStream, Headers, HttpClient, HttpError, Response};

/// A request the mock client received.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    /// HTTP method.
    pub method: String,
    /// Request URL.
    pub url: String,
    /// Request body, for POST requests.
    pub body: Option<String>,
}

/// What the mock should answer for a URL.
#[derive(Debug, Clone)]
pub enum MockResponse {
    /// A buffered response.
    Success(Response),
    /// A request-level error.
    Error(HttpError),
    /// A streaming body delivered as these exact chunks.
    Stream(Vec<Bytes>),
    /// A streaming body that yields these chunks, then fails.
    StreamThenError(Vec<Bytes>, HttpError),
}

/// Scripted [`HttpClient`] for tests.
#[derive(Debug, Clone, Default)]
pub struct MockHttpClient {
    responses: Arc<Mutex<HashMap<String, MockResponse>>>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockHttpClient {
    /// Create an empty mock client.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure the answer for a URL (matched exactly, then by prefix).
    pub fn set_response(&self, url: &str, response: MockResponse) {
        self.responses
            .lock()
            .unwrap()
            .insert(url.to_string(), response);
    }

    /// Every request received so far, in order.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn record(&self, method: &str, url: &str, body: Option<String>) {
        self.requests.lock().unwrap().push(RecordedRequest {
            method: method.to_string(),
            url: url.to_string(),
            body,
        });
    }

    fn lookup(&self, url: &str) -> Option<MockResponse> {
        let responses = self.responses.lock().unwrap();
        if let Some(response) = responses.get(url) {
            return Some(response.clone());
        }
        responses
            .iter()
            .find(|(pattern, _)| url.starts_with(pattern.as_str()))
            .map(|(_, response)| response.clone())
    }

    fn buffered(&self, url: &str) -> Result<Response, HttpError> {
        match self.lookup(url) {
            Some(MockResponse::Success(response)) => Ok(response),
            Some(MockResponse::Error(error)) => Err(error),
            Some(_) => Err(HttpError::Other(
                "mock configured for streaming, not a buffered request".to_string(),
            )),
            None => Err(HttpError::Other(format!("no mock response for {url}"))),
        }
    }
}

#[async_trait]
impl HttpClient for MockHttpClient {
    async fn get(&self, url: &str, _headers: &Headers) -> Result<Response, HttpError> {
        self.record("GET", url, None);
        self.buffered(url)
    }

    async fn post(&self, url: &str, body: &str, _headers: &Headers) -> Result<Response, HttpError> {
        self.record("POST", url, Some(body.to_string()));
        self.buffered(url)
    }

    async fn post_stream(
        &self,
        url: &str,
        body: &str,
        _headers: &Headers,
    ) -> Result<ByteStream, HttpError> {
        self.record("POST", url, Some(body.to_string()));
        match self.lookup(url) {
            Some(MockResponse::Stream(chunks)) => {
                let items: Vec<Result<Bytes, HttpError>> = chunks.into_iter().map(Ok).collect();
                Ok(Box::pin(futures::stream::iter(items)))
            }
            Some(MockResponse::StreamThenError(chunks, error)) => {
                let mut items: Vec<Result<Bytes, HttpError>> =
                    chunks.into_iter().map(Ok).collect();
                items.push(Err(error));
                Ok(Box::pin(futures::stream::iter(items)))
            }
            Some(MockResponse::Error(error)) => Err(error),
            Some(MockResponse::Success(_)) => Err(HttpError::Other(
                "mock configured for a buffered request, not streaming".to_string(),
            )),
            None => Err(HttpError::Other(format!("no mock response for {url}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::StreamExt;

    #[tokio::test]
    async fn test_buffered_response_and_recording() {
        let client = MockHttpClient::new();
        client.set_response(
            "http://mock/health",
            MockResponse::Success(Response::new(200, Bytes::from("ok"))),
        );

        let response = client.get("http://mock/health", &Headers::new()).await.unwrap();
        assert_eq!(response.status, 200);

        let requests = client.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, "GET");
        assert_eq!(requests[0].url, "http://mock/health");
    }

    #[tokio::test]
    async fn test_prefix_matching() {
        let client = MockHttpClient::new();
        client.set_response(
            "http://mock/api",
            MockResponse::Success(Response::new(204, Bytes::new())),
        );

        let response = client
            .post("http://mock/api/v1/chat", "{}", &Headers::new())
            .await
            .unwrap();
        assert_eq!(response.status, 204);
    }

    #[tokio::test]
    async fn test_scripted_stream_preserves_chunk_boundaries() {
        let client = MockHttpClient::new();
        client.set_response(
            "http://mock/stream",
            MockResponse::Stream(vec![Bytes::from("ab"), Bytes::from("cd")]),
        );

        let mut stream = client
            .post_stream("http://mock/stream", "{}", &Headers::new())
            .await
            .unwrap();
        assert_eq!(stream.next().await.unwrap().unwrap(), Bytes::from("ab"));
        assert_eq!(stream.next().await.unwrap().unwrap(), Bytes::from("cd"));
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn test_stream_then_error() {
        let client = MockHttpClient::new();
        client.set_response(
            "http://mock/stream",
            MockResponse::StreamThenError(
                vec![Bytes::from("x")],
                HttpError::Io("reset".to_string()),
            ),
        );

        let mut stream = client
            .post_stream("http://mock/stream", "{}", &Headers::new())
            .await
            .unwrap();
        assert!(stream.next().await.unwrap().is_ok());
        assert!(matches!(stream.next().await, Some(Err(HttpError::Io(_)))));
    }

    #[tokio::test]
    async fn test_unconfigured_url_errors() {
        let client = MockHttpClient::new();
        let result = client.get("http://mock/missing", &Headers::new()).await;
        assert!(matches!(result, Err(HttpError::Other(_))));
    }
}
