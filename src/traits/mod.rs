//! Trait abstractions for dependency injection.

mod http;

pub use http::{ByteStream, Headers, HttpClient, HttpError, Response};
