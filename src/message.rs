// src/message.rs
use serde::{Deserialize, Serialize};

/// Body of `POST /chat`. Missing fields decode as empty strings so the
/// handler, not the JSON layer, decides they are invalid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: String,
    #[serde(default, rename = "threadId")]
    pub thread_id: String,
}

impl ChatRequest {
    pub fn new(thread_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            thread_id: thread_id.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub message: Option<String>,
}

impl ChatResponse {
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            message: Some(reply.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}
