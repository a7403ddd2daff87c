//! HTTP clients for the services the stack depends on: an OpenAI-compatible
//! embedding endpoint and the Weaviate REST API.

use thiserror::Error;

pub mod openai;
pub mod weaviate;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("request failed: {0}")]
    RequestFailed(String),
    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("malformed response: {0}")]
    Decode(String),
}

impl ProviderError {
    /// True when the remote answered but the payload could not be used.
    pub fn is_decode(&self) -> bool {
        matches!(self, ProviderError::Decode(_))
    }
}
