// src/error.rs
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::message::ErrorBody;

pub const FIELDS_REQUIRED: &str = "All fields are required";

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("All fields are required")]
    Validation,

    #[error("generation failed: {0}")]
    GenerationFailed(String),

    #[error("generation timed out after {0:?}")]
    GenerationTimedOut(std::time::Duration),
}

impl AppError {
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Validation => "validation",
            AppError::GenerationFailed(_) => "generation_failed",
            AppError::GenerationTimedOut(_) => "generation_timeout",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Generator detail stays in the logs.
        let (code, body) = match &self {
            AppError::Validation => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    message: FIELDS_REQUIRED.to_string(),
                    kind: None,
                },
            ),
            AppError::GenerationFailed(_) => (
                StatusCode::BAD_GATEWAY,
                ErrorBody {
                    message: "Generation failed".to_string(),
                    kind: Some(self.kind().to_string()),
                },
            ),
            AppError::GenerationTimedOut(_) => (
                StatusCode::GATEWAY_TIMEOUT,
                ErrorBody {
                    message: "Generation timed out".to_string(),
                    kind: Some(self.kind().to_string()),
                },
            ),
        };
        (code, Json(body)).into_response()
    }
}
