//! Typed events carried by the chat stream.
//!
//! Every data-frame payload is a JSON envelope `{"type": ..., "data": ...}`.
//! The envelope is classified into [`ChatEvent`], a closed enum over the
//! event kinds the Curator backend emits plus an [`Unrecognized`] variant
//! carrying the raw envelope, so forward-compatible fallback handling stays
//! explicit instead of hiding in a string match.
//!
//! [`Unrecognized`]: ChatEvent::Unrecognized

use serde::Deserialize;
use serde_json::Value;

/// Message used when an `error` envelope carries no usable detail.
pub const DEFAULT_SERVER_ERROR: &str = "The server reported an error without details.";

/// Parsed JSON envelope of a single data-frame.
///
/// `type` selects the handler; the shape of `data` depends on the type and
/// is otherwise opaque. Some backend revisions put chunk text in a
/// top-level `content` field, so that is captured too.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Envelope {
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(default)]
    pub data: Value,
    #[serde(default)]
    pub content: Option<String>,
}

/// One event decoded from the stream.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatEvent {
    /// Incremental answer text.
    ResponseChunk { text: String },
    /// The answer portion of the turn is finished.
    ResponseCompleted,
    /// Documents retrieved for the query.
    SearchResults { results: Value },
    /// The whole turn is finished.
    Completed,
    /// The backend reported a failure.
    Error { message: String },
    /// A progress/status update.
    Status { status: Value },
    /// An event kind this client does not know about.
    Unrecognized { envelope: Envelope },
}

/// The closed set of recognized event kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EventKind {
    Chunk,
    ResponseCompleted,
    SearchResults,
    Completed,
    Error,
    Status,
    Unknown,
}

impl EventKind {
    /// Map a `type` tag to its kind.
    ///
    /// Several aliases map to the same kind because the backend renamed
    /// events across revisions; newer servers send `response_chunk` and
    /// `completed`, older ones sent `chunk`/`delta` and `done`.
    fn of(event_type: &str) -> Self {
        match event_type {
            "response_chunk" | "chunk" | "delta" => EventKind::Chunk,
            "response_completed" => EventKind::ResponseCompleted,
            "search_results" => EventKind::SearchResults,
            "completed" | "done" => EventKind::Completed,
            "error" => EventKind::Error,
            "status" => EventKind::Status,
            _ => EventKind::Unknown,
        }
    }
}

impl ChatEvent {
    /// Classify an envelope against the known event kinds.
    pub fn from_envelope(envelope: Envelope) -> Self {
        match EventKind::of(&envelope.event_type) {
            EventKind::Chunk => ChatEvent::ResponseChunk {
                text: chunk_text(&envelope).unwrap_or_default(),
            },
            EventKind::ResponseCompleted => ChatEvent::ResponseCompleted,
            EventKind::SearchResults => ChatEvent::SearchResults {
                results: search_results(&envelope),
            },
            EventKind::Completed => ChatEvent::Completed,
            EventKind::Error => ChatEvent::Error {
                message: error_message(&envelope),
            },
            EventKind::Status => ChatEvent::Status {
                status: envelope.data,
            },
            EventKind::Unknown => ChatEvent::Unrecognized { envelope },
        }
    }

    /// Event kind name, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            ChatEvent::ResponseChunk { .. } => "response_chunk",
            ChatEvent::ResponseCompleted => "response_completed",
            ChatEvent::SearchResults { .. } => "search_results",
            ChatEvent::Completed => "completed",
            ChatEvent::Error { .. } => "error",
            ChatEvent::Status { .. } => "status",
            ChatEvent::Unrecognized { .. } => "unrecognized",
        }
    }
}

/// Extract answer text from a chunk-shaped envelope.
///
/// Checks, in order: `data.chunk`, `data.content`, top-level `content`.
/// The first non-empty string wins. This is also the fallback applied to
/// unrecognized event kinds, so an envelope that merely resembles a chunk
/// still renders on clients deployed behind the server.
pub fn chunk_text(envelope: &Envelope) -> Option<String> {
    for key in ["chunk", "content"] {
        if let Some(text) = envelope.data.get(key).and_then(Value::as_str) {
            if !text.is_empty() {
                return Some(text.to_string());
            }
        }
    }
    match envelope.content.as_deref() {
        Some(text) if !text.is_empty() => Some(text.to_string()),
        _ => None,
    }
}

fn search_results(envelope: &Envelope) -> Value {
    match envelope.data.get("searchResults") {
        Some(results) => results.clone(),
        None => envelope.data.clone(),
    }
}

fn error_message(envelope: &Envelope) -> String {
    if let Some(detail) = envelope.data.get("error") {
        return value_to_text(detail);
    }
    if !envelope.data.is_null() {
        return value_to_text(&envelope.data);
    }
    DEFAULT_SERVER_ERROR.to_string()
}

/// Render a JSON value as a plain message: strings verbatim, everything
/// else in compact JSON form.
fn value_to_text(value: &Value) -> String {
    match value.as_str() {
        Some(text) => text.to_string(),
        None => value.to_string(),
    }
}
