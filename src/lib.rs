//! Docent - streaming client for the Curator document chat backend.
//!
//! The core of this crate consumes the backend's `text/event-stream`
//! response and turns it into typed callbacks: incremental answer text,
//! search results, status updates, completion, and errors. See
//! [`sse`] for the decoding layers and [`stream`] for the processing loop.
//!
//! # Example
//!
//! ```no_run
//! use docent::curator::CuratorClient;
//! use docent::models::ChatRequest;
//! use docent::sse::ChatCallbacks;
//!
//! # async fn run() -> Result<(), docent::curator::CuratorError> {
//! let client = CuratorClient::new();
//! let request = ChatRequest::new("How is the cooling loop specified?");
//!
//! let mut callbacks = ChatCallbacks::new()
//!     .on_response_chunk(|text| print!("{text}"))
//!     .on_error(|message| eprintln!("stream failed: {message}"));
//!
//! let stream = client.stream_chat(&request).await?;
//! stream.process(&mut callbacks).await;
//! # Ok(())
//! # }
//! ```

pub mod adapters;
pub mod config;
pub mod curator;
pub mod models;
pub mod sse;
pub mod stream;
pub mod traits;
