//! Line reassembly for the SSE byte stream.
//!
//! The backend delivers the event stream as arbitrarily sized byte chunks;
//! chunk boundaries carry no meaning and can fall mid-line or mid-character.
//! [`LineDecoder`] buffers raw bytes and splits on the newline byte, so a
//! multi-byte UTF-8 sequence that straddles a chunk boundary is reassembled
//! intact before any text decoding happens.

use bytes::BytesMut;

/// Payload value the backend sends to mark the end of meaningful data,
/// independent of transport-level stream closure.
pub const DONE_SENTINEL: &str = "[DONE]";

/// Prefix identifying a data-carrying SSE line.
pub const DATA_PREFIX: &str = "data: ";

/// A classified SSE line.
///
/// Only [`SseLine::Data`] carries meaning for us. Blank separator lines,
/// `:` comments (keep-alives), and other SSE fields (`event:`, `id:`,
/// `retry:`) are accepted syntactically but produce no dispatch.
#[derive(Debug, Clone, PartialEq)]
pub enum SseLine {
    /// A `data: ` line, with the prefix stripped.
    Data(String),
    /// An empty (or whitespace-only) line.
    Blank,
    /// A comment line starting with `:`.
    Comment,
    /// Any other `field: value` line.
    Field,
}

/// Classify a single line from the SSE stream.
///
/// A line is a data-frame iff, after trimming surrounding whitespace, it
/// starts with the exact prefix `data: `.
pub fn classify(line: &str) -> SseLine {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return SseLine::Blank;
    }
    if let Some(payload) = trimmed.strip_prefix(DATA_PREFIX) {
        return SseLine::Data(payload.to_string());
    }
    if trimmed.starts_with(':') {
        return SseLine::Comment;
    }
    SseLine::Field
}

/// Reassembles newline-delimited lines out of raw byte chunks.
///
/// One decoder instance belongs to exactly one stream; the internal buffer
/// is created when processing starts and discarded with the decoder. After
/// every [`feed`](LineDecoder::feed) the buffer holds at most the single
/// trailing partial line.
#[derive(Debug, Default)]
pub struct LineDecoder {
    buffer: BytesMut,
}

impl LineDecoder {
    /// Create a decoder with an empty line buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk and return every fully terminated line, in order.
    ///
    /// Trailing `\r` is stripped so `\r\n` streams decode the same as plain
    /// `\n` streams. The final unterminated segment stays buffered for the
    /// next call.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);

        let mut lines = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let mut line = self.buffer.split_to(pos + 1);
            line.truncate(pos);
            if line.last() == Some(&b'\r') {
                line.truncate(line.len() - 1);
            }
            lines.push(String::from_utf8_lossy(&line).into_owned());
        }
        lines
    }

    /// Flush the residual buffer when the upstream signals completion.
    ///
    /// A non-empty remainder is returned as a final line rather than being
    /// silently dropped; it may still be an incomplete frame, in which case
    /// the caller's parse step skips it.
    pub fn finish(&mut self) -> Option<String> {
        if self.buffer.is_empty() {
            return None;
        }
        let mut line = self.buffer.split();
        if line.last() == Some(&b'\r') {
            line.truncate(line.len() - 1);
        }
        Some(String::from_utf8_lossy(&line).into_owned())
    }

    /// Whether an unterminated partial line is currently buffered.
    pub fn has_partial(&self) -> bool {
        !self.buffer.is_empty()
    }
}
