//! The stream processing loop.
//!
//! [`ChatStream`] owns the byte stream handed over by the HTTP layer and
//! drives it through line reassembly and event dispatch until the upstream
//! closes, the transport fails, or the owner cancels. Chunks are consumed
//! strictly sequentially; the only suspension point is awaiting the next
//! chunk. Every failure inside the loop is translated into a callback or a
//! logged skip, so processing never unwinds into the caller.

use bytes::Bytes;
use futures_util::StreamExt;
use tokio::sync::oneshot;

use crate::sse::{
    classify, ChatCallbacks, EventDispatcher, LineDecoder, SseLine, TurnState, DONE_SENTINEL,
    TRANSPORT_FAILURE_MESSAGE,
};
use crate::traits::{ByteStream, HttpError};

/// How one stream ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamOutcome {
    /// The turn completed; `on_completed` fired exactly once.
    Completed,
    /// The turn failed; `on_error` fired exactly once.
    Errored,
    /// The owner abandoned the stream; no further callbacks fired.
    Cancelled,
}

/// An open chat stream, ready to be processed.
///
/// Each stream owns its own [`LineDecoder`] and [`EventDispatcher`]; running
/// several turns concurrently means several independent `ChatStream`s. The
/// underlying connection is released when the stream is consumed or dropped,
/// whichever comes first.
pub struct ChatStream {
    bytes: ByteStream,
}

impl ChatStream {
    /// Wrap an open byte stream.
    pub fn new(bytes: ByteStream) -> Self {
        Self { bytes }
    }

    /// Process the stream to completion.
    ///
    /// Never fails: transport errors surface through `on_error` and the
    /// returned [`StreamOutcome`].
    pub async fn process(self, callbacks: &mut ChatCallbacks) -> StreamOutcome {
        let mut worker = StreamWorker::new(self.bytes);
        loop {
            match worker.bytes.next().await {
                Some(item) => {
                    if let Some(outcome) = worker.consume(item, callbacks) {
                        return outcome;
                    }
                }
                None => return worker.finish(callbacks),
            }
        }
    }

    /// Process the stream until completion or until `cancel` resolves.
    ///
    /// Cancellation wins immediately: no further callbacks fire and the
    /// byte stream is dropped, which releases the underlying connection.
    /// Dropping the sender half counts as cancellation too, so an owner
    /// that goes away takes its stream down with it.
    pub async fn process_until(
        self,
        callbacks: &mut ChatCallbacks,
        mut cancel: oneshot::Receiver<()>,
    ) -> StreamOutcome {
        let mut worker = StreamWorker::new(self.bytes);
        loop {
            tokio::select! {
                // Cancellation wins over a chunk that became ready in the
                // same poll.
                biased;
                _ = &mut cancel => {
                    tracing::debug!("stream abandoned by owner");
                    return StreamOutcome::Cancelled;
                }
                item = worker.bytes.next() => match item {
                    Some(item) => {
                        if let Some(outcome) = worker.consume(item, callbacks) {
                            return outcome;
                        }
                    }
                    None => return worker.finish(callbacks),
                },
            }
        }
    }
}

/// Decode/dispatch state for one running stream.
struct StreamWorker {
    bytes: ByteStream,
    decoder: LineDecoder,
    dispatcher: EventDispatcher,
}

impl StreamWorker {
    fn new(bytes: ByteStream) -> Self {
        Self {
            bytes,
            decoder: LineDecoder::new(),
            dispatcher: EventDispatcher::new(),
        }
    }

    /// Feed one transport item through decode and dispatch.
    ///
    /// Returns an outcome only when the stream is finished with.
    fn consume(
        &mut self,
        item: Result<Bytes, HttpError>,
        callbacks: &mut ChatCallbacks,
    ) -> Option<StreamOutcome> {
        match item {
            Ok(chunk) => {
                for line in self.decoder.feed(&chunk) {
                    dispatch_line(&mut self.dispatcher, &line, callbacks);
                }
                None
            }
            Err(error) => {
                tracing::warn!(%error, "chat stream read failed");
                self.dispatcher.fail(TRANSPORT_FAILURE_MESSAGE, callbacks);
                Some(StreamOutcome::Errored)
            }
        }
    }

    /// Handle end-of-stream: flush the residual line, then complete.
    fn finish(&mut self, callbacks: &mut ChatCallbacks) -> StreamOutcome {
        if let Some(line) = self.decoder.finish() {
            dispatch_line(&mut self.dispatcher, &line, callbacks);
        }
        self.dispatcher.finish(callbacks);
        match self.dispatcher.state() {
            TurnState::Errored => StreamOutcome::Errored,
            _ => StreamOutcome::Completed,
        }
    }
}

/// Route one reassembled line: only non-empty, non-sentinel data payloads
/// reach the dispatcher.
fn dispatch_line(dispatcher: &mut EventDispatcher, line: &str, callbacks: &mut ChatCallbacks) {
    match classify(line) {
        SseLine::Data(payload) => {
            if payload.is_empty() || payload == DONE_SENTINEL {
                return;
            }
            dispatcher.dispatch(&payload, callbacks);
        }
        SseLine::Blank | SseLine::Comment | SseLine::Field => {}
    }
}
