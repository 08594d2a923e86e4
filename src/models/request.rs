use serde::{Deserialize, Serialize};

/// Request body for the chat and search endpoints.
///
/// The same shape serves `/api/v1/chat/stream`, `/api/v1/chat`, and
/// `/api/v1/search`: a user query plus optional document filters narrowing
/// which collections the backend searches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    /// The user's question.
    pub query: String,
    /// Document filters; empty means search everything.
    #[serde(default)]
    pub filters: Vec<String>,
}

impl ChatRequest {
    /// Create a request with no filters.
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            filters: Vec::new(),
        }
    }

    /// Set the document filters (builder pattern).
    pub fn with_filters(mut self, filters: Vec<String>) -> Self {
        self.filters = filters;
        self
    }
}
