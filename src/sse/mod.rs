//! SSE decoding for the chat stream endpoint.
//!
//! The backend streams one conversation turn as newline-delimited SSE
//! frames; only `data: <json>` lines carry meaning. This module splits the
//! work in two:
//!
//! - `lines` - reassembles lines out of raw byte chunks and classifies them
//! - `events` / `dispatch` - parses data payloads into typed events and
//!   routes them to caller callbacks under the per-turn state machine
//!
//! The processing loop that ties the two together lives in [`crate::stream`].

pub mod dispatch;
pub mod events;
pub mod lines;

pub use dispatch::{ChatCallbacks, EventDispatcher, TurnState, TRANSPORT_FAILURE_MESSAGE};
pub use events::{chunk_text, ChatEvent, Envelope, DEFAULT_SERVER_ERROR};
pub use lines::{classify, LineDecoder, SseLine, DATA_PREFIX, DONE_SENTINEL};
