//! Request and response models for the backend API.

mod request;
mod response;

pub use request::ChatRequest;
pub use response::{ChatResponse, SearchResponse};
