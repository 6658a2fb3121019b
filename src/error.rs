//! Error types for the ASR API.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};

#[derive(Error, Debug)]
pub enum AsrError {
    // Session errors
    #[error("Session '{0}' not found or expired")]
    SessionNotFound(String),

    // Storage backend errors (Redis unreachable, etc.)
    #[error("Storage backend error: {0}")]
    Storage(String),

    // Decoder pipeline errors
    #[error("Decoder pipeline unavailable: {0}")]
    PipelineUnavailable(String),

    #[error("Decoder pipeline failed: {0}")]
    Pipeline(String),

    // Request validation errors
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Empty audio file: {0}")]
    EmptyAudio(String),

    #[error("File too large: {size} bytes (limit: {limit} bytes)")]
    FileTooLarge { size: usize, limit: usize },

    #[error("Failed to decode audio: {0}")]
    AudioDecode(String),
}

impl AsrError {
    /// HTTP status code this error maps to at the API boundary.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AsrError::SessionNotFound(_) => StatusCode::NOT_FOUND,
            AsrError::Storage(_) | AsrError::PipelineUnavailable(_) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            AsrError::Pipeline(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AsrError::InvalidRequest(_) | AsrError::EmptyAudio(_) | AsrError::AudioDecode(_) => {
                StatusCode::BAD_REQUEST
            }
            AsrError::FileTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
        }
    }
}

/// JSON error body returned for every failed request.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl IntoResponse for AsrError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!("Request failed: {}", self);
        } else {
            warn!("Request rejected: {}", self);
        }

        (
            status,
            Json(ErrorResponse {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}

// Type alias for convenience
pub type Result<T> = std::result::Result<T, AsrError>;
