use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::extraction::ExtractionError;
use crate::llm_client::LlmError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
/// Every variant renders as a user-facing message; raw parser or transport
/// errors are logged, never returned.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Malformed model response: {0}")]
    MalformedResponse(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Extraction(
                ExtractionError::ServiceUnreachable { .. }
                | ExtractionError::ServiceRejected { .. },
            ) => StatusCode::BAD_GATEWAY,
            AppError::Extraction(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Llm(LlmError::MissingApiKey) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Llm(_) | AppError::MalformedResponse(_) => StatusCode::BAD_GATEWAY,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The message shown to the end user.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Validation(msg) | AppError::Conflict(msg) => msg.clone(),
            AppError::Extraction(e) => e.to_string(),
            AppError::Llm(e) => e.user_message(),
            AppError::MalformedResponse(_) => {
                "Invalid response received from AI model. Please try again.".to_string()
            }
            AppError::Internal(_) => "An internal server error occurred".to_string(),
        }
    }

    fn code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::Conflict(_) => "CONFLICT",
            AppError::Extraction(_) => "EXTRACTION_ERROR",
            AppError::Llm(_) => "LLM_ERROR",
            AppError::MalformedResponse(_) => "MALFORMED_RESPONSE",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            AppError::Extraction(e) => tracing::warn!("Extraction error: {e}"),
            AppError::Llm(e) => tracing::error!("LLM error: {e}"),
            AppError::MalformedResponse(reason) => {
                tracing::error!("Malformed model response: {reason}")
            }
            AppError::Internal(e) => tracing::error!("Internal error: {e:?}"),
            AppError::Validation(_) | AppError::Conflict(_) => {}
        }

        let body = Json(json!({
            "error": {
                "code": self.code(),
                "message": self.user_message()
            }
        }));

        (self.status(), body).into_response()
    }
}
