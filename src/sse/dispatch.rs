//! Event dispatch and the per-turn state machine.
//!
//! One [`EventDispatcher`] handles one logical conversation turn. It parses
//! each surviving data-frame payload, classifies it, and forwards it to the
//! caller's [`ChatCallbacks`] in frame order. A turn that reaches a terminal
//! state stays silent: no callback of any kind fires afterwards, even if the
//! transport keeps producing frames.
//!
//! The backend conventionally emits `response_completed` before
//! `search_results`; the dispatcher does not enforce that order and handles
//! either sequence.

use serde_json::Value;
use std::fmt;

use super::events::{chunk_text, ChatEvent, Envelope};

/// Message delivered to `on_error` when the transport fails mid-stream.
pub const TRANSPORT_FAILURE_MESSAGE: &str = "Connection to the server was lost.";

type Handler<T> = Option<Box<dyn FnMut(T) + Send>>;
type UnitHandler = Option<Box<dyn FnMut() + Send>>;

/// Caller-supplied handlers, one optional slot per event kind.
///
/// Handlers are registered up front with the builder-style setters; a
/// missing handler is a silent no-op, never an error.
///
/// # Example
///
/// ```
/// use docent::sse::ChatCallbacks;
///
/// let mut answer = String::new();
/// let callbacks = ChatCallbacks::new()
///     .on_response_chunk(move |text| answer.push_str(&text))
///     .on_error(|message| eprintln!("stream failed: {message}"));
/// # drop(callbacks);
/// ```
#[derive(Default)]
pub struct ChatCallbacks {
    pub(crate) on_response_chunk: Handler<String>,
    pub(crate) on_response_completed: UnitHandler,
    pub(crate) on_search_results: Handler<Value>,
    pub(crate) on_completed: UnitHandler,
    pub(crate) on_error: Handler<String>,
    pub(crate) on_status_update: Handler<Value>,
}

impl ChatCallbacks {
    /// Create an empty callback set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Handler for incremental answer text.
    pub fn on_response_chunk(mut self, handler: impl FnMut(String) + Send + 'static) -> Self {
        self.on_response_chunk = Some(Box::new(handler));
        self
    }

    /// Handler for the end of the answer portion of a turn.
    pub fn on_response_completed(mut self, handler: impl FnMut() + Send + 'static) -> Self {
        self.on_response_completed = Some(Box::new(handler));
        self
    }

    /// Handler for retrieved documents.
    pub fn on_search_results(mut self, handler: impl FnMut(Value) + Send + 'static) -> Self {
        self.on_search_results = Some(Box::new(handler));
        self
    }

    /// Handler for turn completion. Fires at most once per turn.
    pub fn on_completed(mut self, handler: impl FnMut() + Send + 'static) -> Self {
        self.on_completed = Some(Box::new(handler));
        self
    }

    /// Handler for backend-reported and transport errors.
    pub fn on_error(mut self, handler: impl FnMut(String) + Send + 'static) -> Self {
        self.on_error = Some(Box::new(handler));
        self
    }

    /// Handler for progress/status updates.
    pub fn on_status_update(mut self, handler: impl FnMut(Value) + Send + 'static) -> Self {
        self.on_status_update = Some(Box::new(handler));
        self
    }
}

impl fmt::Debug for ChatCallbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatCallbacks")
            .field("on_response_chunk", &self.on_response_chunk.is_some())
            .field("on_response_completed", &self.on_response_completed.is_some())
            .field("on_search_results", &self.on_search_results.is_some())
            .field("on_completed", &self.on_completed.is_some())
            .field("on_error", &self.on_error.is_some())
            .field("on_status_update", &self.on_status_update.is_some())
            .finish()
    }
}

/// State of one conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnState {
    /// Frames are being consumed and dispatched.
    Streaming,
    /// The turn finished; `on_completed` has fired.
    Completed,
    /// The turn failed; `on_error` has fired.
    Errored,
}

/// Routes parsed events to callbacks and tracks the turn state.
#[derive(Debug)]
pub struct EventDispatcher {
    state: TurnState,
}

impl EventDispatcher {
    /// Create a dispatcher for a fresh turn.
    pub fn new() -> Self {
        Self {
            state: TurnState::Streaming,
        }
    }

    /// Current turn state.
    pub fn state(&self) -> TurnState {
        self.state
    }

    /// Whether the turn has reached `Completed` or `Errored`.
    pub fn is_terminal(&self) -> bool {
        self.state != TurnState::Streaming
    }

    /// Dispatch one data-frame payload.
    ///
    /// Malformed JSON is logged and skipped; a single bad frame never takes
    /// the stream down. Nothing is dispatched once the turn is terminal.
    pub fn dispatch(&mut self, payload: &str, callbacks: &mut ChatCallbacks) {
        if self.is_terminal() {
            tracing::debug!(state = ?self.state, "frame after terminal state ignored");
            return;
        }

        let envelope: Envelope = match serde_json::from_str(payload) {
            Ok(envelope) => envelope,
            Err(error) => {
                tracing::warn!(%error, payload, "skipping malformed stream frame");
                return;
            }
        };

        match ChatEvent::from_envelope(envelope) {
            ChatEvent::ResponseChunk { text } => {
                // Chunk-typed envelopes with no extractable text carry
                // nothing to render.
                if text.is_empty() {
                    return;
                }
                if let Some(handler) = callbacks.on_response_chunk.as_mut() {
                    handler(text);
                }
            }
            ChatEvent::ResponseCompleted => {
                if let Some(handler) = callbacks.on_response_completed.as_mut() {
                    handler();
                }
            }
            ChatEvent::SearchResults { results } => {
                if let Some(handler) = callbacks.on_search_results.as_mut() {
                    handler(results);
                }
            }
            ChatEvent::Completed => {
                self.state = TurnState::Completed;
                if let Some(handler) = callbacks.on_completed.as_mut() {
                    handler();
                }
            }
            ChatEvent::Error { message } => {
                self.state = TurnState::Errored;
                if let Some(handler) = callbacks.on_error.as_mut() {
                    handler(message);
                }
            }
            ChatEvent::Status { status } => {
                if let Some(handler) = callbacks.on_status_update.as_mut() {
                    handler(status);
                }
            }
            ChatEvent::Unrecognized { envelope } => {
                // Forward compatibility: an unknown event that looks like a
                // chunk still renders; control-only unknowns are dropped.
                match chunk_text(&envelope) {
                    Some(text) => {
                        if let Some(handler) = callbacks.on_response_chunk.as_mut() {
                            handler(text);
                        }
                    }
                    None => {
                        tracing::debug!(event_type = %envelope.event_type, "ignoring unknown event kind");
                    }
                }
            }
        }
    }

    /// Signal transport end-of-stream.
    ///
    /// Completes the turn if no in-band `completed`/`done` event already
    /// did, keeping `on_completed` at-most-once. An errored turn stays
    /// errored and fires nothing.
    pub fn finish(&mut self, callbacks: &mut ChatCallbacks) {
        if self.is_terminal() {
            return;
        }
        self.state = TurnState::Completed;
        if let Some(handler) = callbacks.on_completed.as_mut() {
            handler();
        }
    }

    /// Signal a transport failure.
    pub fn fail(&mut self, message: impl Into<String>, callbacks: &mut ChatCallbacks) {
        if self.is_terminal() {
            return;
        }
        self.state = TurnState::Errored;
        if let Some(handler) = callbacks.on_error.as_mut() {
            handler(message.into());
        }
    }
}

impl Default for EventDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Records every callback invocation in order.
    #[derive(Clone, Default)]
    struct Recorder {
        calls: Arc<Mutex<Vec<String>>>,
    }

    impl Recorder {
        fn callbacks(&self) -> ChatCallbacks {
            let chunks = self.calls.clone();
            let response_done = self.calls.clone();
            let results = self.calls.clone();
            let completed = self.calls.clone();
            let errors = self.calls.clone();
            let status = self.calls.clone();
            ChatCallbacks::new()
                .on_response_chunk(move |text| chunks.lock().unwrap().push(format!("chunk:{text}")))
                .on_response_completed(move || {
                    response_done.lock().unwrap().push("response_completed".to_string())
                })
                .on_search_results(move |value| {
                    results.lock().unwrap().push(format!("results:{value}"))
                })
                .on_completed(move || completed.lock().unwrap().push("completed".to_string()))
                .on_error(move |message| errors.lock().unwrap().push(format!("error:{message}")))
                .on_status_update(move |value| {
                    status.lock().unwrap().push(format!("status:{value}"))
                })
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[test]
    fn test_chunks_dispatch_in_order() {
        let recorder = Recorder::default();
        let mut callbacks = recorder.callbacks();
        let mut dispatcher = EventDispatcher::new();

        dispatcher.dispatch(r#"{"type":"response_chunk","data":{"chunk":"He"}}"#, &mut callbacks);
        dispatcher.dispatch(r#"{"type":"response_chunk","data":{"chunk":"llo"}}"#, &mut callbacks);

        assert_eq!(recorder.calls(), vec!["chunk:He", "chunk:llo"]);
        assert_eq!(dispatcher.state(), TurnState::Streaming);
    }

    #[test]
    fn test_malformed_frame_is_skipped() {
        let recorder = Recorder::default();
        let mut callbacks = recorder.callbacks();
        let mut dispatcher = EventDispatcher::new();

        dispatcher.dispatch("not-json", &mut callbacks);
        assert!(recorder.calls().is_empty());
        assert_eq!(dispatcher.state(), TurnState::Streaming);

        // Subsequent valid frames still dispatch.
        dispatcher.dispatch(r#"{"type":"response_chunk","data":{"chunk":"ok"}}"#, &mut callbacks);
        assert_eq!(recorder.calls(), vec!["chunk:ok"]);
    }

    #[test]
    fn test_envelope_without_type_is_skipped() {
        let recorder = Recorder::default();
        let mut callbacks = recorder.callbacks();
        let mut dispatcher = EventDispatcher::new();

        dispatcher.dispatch(r#"{"data":{"chunk":"orphan"}}"#, &mut callbacks);
        assert!(recorder.calls().is_empty());
    }

    #[test]
    fn test_full_turn_sequence() {
        let recorder = Recorder::default();
        let mut callbacks = recorder.callbacks();
        let mut dispatcher = EventDispatcher::new();

        dispatcher.dispatch(r#"{"type":"status","data":{"stage":"retrieving"}}"#, &mut callbacks);
        dispatcher.dispatch(r#"{"type":"response_chunk","data":{"chunk":"answer"}}"#, &mut callbacks);
        dispatcher.dispatch(r#"{"type":"response_completed"}"#, &mut callbacks);
        dispatcher.dispatch(
            r#"{"type":"search_results","data":{"searchResults":["a"]}}"#,
            &mut callbacks,
        );
        dispatcher.dispatch(r#"{"type":"completed"}"#, &mut callbacks);

        assert_eq!(
            recorder.calls(),
            vec![
                r#"status:{"stage":"retrieving"}"#,
                "chunk:answer",
                "response_completed",
                r#"results:["a"]"#,
                "completed",
            ]
        );
        assert_eq!(dispatcher.state(), TurnState::Completed);
    }

    #[test]
    fn test_search_results_before_response_completed_still_dispatches() {
        let recorder = Recorder::default();
        let mut callbacks = recorder.callbacks();
        let mut dispatcher = EventDispatcher::new();

        dispatcher.dispatch(
            r#"{"type":"search_results","data":{"searchResults":["a"]}}"#,
            &mut callbacks,
        );
        dispatcher.dispatch(r#"{"type":"response_completed"}"#, &mut callbacks);

        assert_eq!(recorder.calls(), vec![r#"results:["a"]"#, "response_completed"]);
    }

    #[test]
    fn test_no_callbacks_after_completed() {
        let recorder = Recorder::default();
        let mut callbacks = recorder.callbacks();
        let mut dispatcher = EventDispatcher::new();

        dispatcher.dispatch(r#"{"type":"completed"}"#, &mut callbacks);
        dispatcher.dispatch(r#"{"type":"response_chunk","data":{"chunk":"late"}}"#, &mut callbacks);
        dispatcher.dispatch(r#"{"type":"error","data":{"error":"late"}}"#, &mut callbacks);
        dispatcher.finish(&mut callbacks);

        assert_eq!(recorder.calls(), vec!["completed"]);
    }

    #[test]
    fn test_error_envelope_fires_once_and_silences_turn() {
        let recorder = Recorder::default();
        let mut callbacks = recorder.callbacks();
        let mut dispatcher = EventDispatcher::new();

        dispatcher.dispatch(r#"{"type":"error","data":{"error":"boom"}}"#, &mut callbacks);
        dispatcher.dispatch(r#"{"type":"error","data":{"error":"boom"}}"#, &mut callbacks);
        dispatcher.dispatch(r#"{"type":"response_chunk","data":{"chunk":"late"}}"#, &mut callbacks);
        dispatcher.finish(&mut callbacks);

        assert_eq!(recorder.calls(), vec!["error:boom"]);
        assert_eq!(dispatcher.state(), TurnState::Errored);
    }

    #[test]
    fn test_finish_completes_once() {
        let recorder = Recorder::default();
        let mut callbacks = recorder.callbacks();
        let mut dispatcher = EventDispatcher::new();

        dispatcher.finish(&mut callbacks);
        dispatcher.finish(&mut callbacks);

        assert_eq!(recorder.calls(), vec!["completed"]);
    }

    #[test]
    fn test_finish_after_inband_completed_is_silent() {
        let recorder = Recorder::default();
        let mut callbacks = recorder.callbacks();
        let mut dispatcher = EventDispatcher::new();

        dispatcher.dispatch(r#"{"type":"done"}"#, &mut callbacks);
        dispatcher.finish(&mut callbacks);

        assert_eq!(recorder.calls(), vec!["completed"]);
    }

    #[test]
    fn test_fail_routes_to_on_error() {
        let recorder = Recorder::default();
        let mut callbacks = recorder.callbacks();
        let mut dispatcher = EventDispatcher::new();

        dispatcher.fail(TRANSPORT_FAILURE_MESSAGE, &mut callbacks);
        dispatcher.finish(&mut callbacks);

        assert_eq!(
            recorder.calls(),
            vec![format!("error:{TRANSPORT_FAILURE_MESSAGE}")]
        );
        assert_eq!(dispatcher.state(), TurnState::Errored);
    }

    #[test]
    fn test_unknown_chunk_shaped_event_falls_back() {
        let recorder = Recorder::default();
        let mut callbacks = recorder.callbacks();
        let mut dispatcher = EventDispatcher::new();

        dispatcher.dispatch(r#"{"type":"mystery","data":{"content":"hi"}}"#, &mut callbacks);
        assert_eq!(recorder.calls(), vec!["chunk:hi"]);
    }

    #[test]
    fn test_unknown_control_event_is_ignored() {
        let recorder = Recorder::default();
        let mut callbacks = recorder.callbacks();
        let mut dispatcher = EventDispatcher::new();

        dispatcher.dispatch(r#"{"type":"heartbeat","data":{"uptime":12}}"#, &mut callbacks);
        assert!(recorder.calls().is_empty());
        assert_eq!(dispatcher.state(), TurnState::Streaming);
    }

    #[test]
    fn test_empty_chunk_is_not_dispatched() {
        let recorder = Recorder::default();
        let mut callbacks = recorder.callbacks();
        let mut dispatcher = EventDispatcher::new();

        dispatcher.dispatch(r#"{"type":"response_chunk","data":{}}"#, &mut callbacks);
        assert!(recorder.calls().is_empty());
    }

    #[test]
    fn test_missing_handlers_are_silent() {
        let mut callbacks = ChatCallbacks::new();
        let mut dispatcher = EventDispatcher::new();

        dispatcher.dispatch(r#"{"type":"response_chunk","data":{"chunk":"x"}}"#, &mut callbacks);
        dispatcher.dispatch(r#"{"type":"error","data":{"error":"x"}}"#, &mut callbacks);
        dispatcher.finish(&mut callbacks);

        // Errored is terminal even with nobody listening.
        assert_eq!(dispatcher.state(), TurnState::Errored);
    }

    #[test]
    fn test_callbacks_debug_shows_registered_handlers() {
        let callbacks = ChatCallbacks::new().on_completed(|| {});
        let rendered = format!("{:?}", callbacks);
        assert!(rendered.contains("on_completed: true"));
        assert!(rendered.contains("on_error: false"));
    }
}
