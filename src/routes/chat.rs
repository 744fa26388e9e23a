// src/routes/chat.rs
use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use tracing::{debug, error, info};

use crate::{
    error::AppError,
    message::{ChatRequest, ChatResponse},
    state::SharedState,
};

const LOG_PREVIEW_CHARS: usize = 80;

pub async fn chat_handler(
    State(state): State<SharedState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, AppError> {
    // An unreadable body is reported the same way as missing fields.
    let Json(payload) = payload.map_err(|rejection| {
        debug!(%rejection, "rejecting chat body");
        AppError::Validation
    })?;

    if payload.message.is_empty() || payload.thread_id.is_empty() {
        return Err(AppError::Validation);
    }

    let thread_id = payload.thread_id.as_str();
    let snippet = preview(&payload.message);
    info!(thread_id, "chat request");

    let generated = tokio::time::timeout(
        state.generate_timeout,
        state.generator.generate(&payload.message, thread_id),
    )
    .await;

    match generated {
        Ok(Ok(reply)) => Ok(Json(ChatResponse::new(reply))),
        Ok(Err(e)) => {
            error!(thread_id, message_preview = %snippet, error = %e, "generator failed");
            Err(AppError::GenerationFailed(e.to_string()))
        }
        Err(_) => {
            error!(thread_id, message_preview = %snippet, timeout = ?state.generate_timeout, "generator timed out");
            Err(AppError::GenerationTimedOut(state.generate_timeout))
        }
    }
}

/// First `LOG_PREVIEW_CHARS` characters of `message`, marked when cut.
pub fn preview(message: &str) -> String {
    match message.char_indices().nth(LOG_PREVIEW_CHARS) {
        Some((idx, _)) => format!("{}...", &message[..idx]),
        None => message.to_string(),
    }
}
