use serde::Deserialize;
use serde_json::Value;

/// Response body of the non-streaming chat endpoint.
///
/// Deliberately lenient: the backend has renamed fields across revisions,
/// so everything is optional and unknown fields are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatResponse {
    /// The generated answer.
    #[serde(default, alias = "response")]
    pub answer: Option<String>,
    /// Documents the answer was grounded on.
    #[serde(default, alias = "searchResults")]
    pub search_results: Option<Value>,
}

/// Response body of the search-only endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchResponse {
    /// Matching documents.
    #[serde(default, alias = "searchResults", alias = "results")]
    pub search_results: Option<Value>,
}
