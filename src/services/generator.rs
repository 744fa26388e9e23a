// src/services/generator.rs
use async_trait::async_trait;

#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    #[error("upstream error: {0}")]
    Upstream(String),

    #[error("could not decode upstream reply: {0}")]
    Decode(String),

    #[error("generator unavailable: {0}")]
    Unavailable(String),
}

/// Produces a reply for one user message. Implementations own whatever
/// conversational memory `thread_id` implies; callers treat it as opaque.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, message: &str, thread_id: &str) -> Result<String, GenerateError>;
}
