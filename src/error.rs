/// Unified error types for the Triple Fun persistence API
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for the persistence API
#[derive(Error, Debug)]
pub enum ApiError {
    /// Validation errors (bad key path, bad document shape, bad upload)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Language code outside the supported set
    #[error("Unsupported language: {0}")]
    UnsupportedLanguage(String),

    /// Not found errors
    #[error("Not found: {0}")]
    NotFound(String),

    /// Conflict errors (e.g., generated filename already taken)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Request body over the configured limit
    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    /// JSON or upload storage failures with a message safe to show
    #[error("Storage error: {0}")]
    Storage(String),

    /// Internal server errors
    #[error("Internal error: {0}")]
    Internal(String),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Error body returned by every endpoint
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    pub message: String,
}

impl ApiError {
    /// HTTP status and machine-readable code for this error
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::Validation(_) => (StatusCode::BAD_REQUEST, "InvalidRequest"),
            ApiError::UnsupportedLanguage(_) => (StatusCode::BAD_REQUEST, "UnsupportedLanguage"),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NotFound"),
            ApiError::Conflict(_) => (StatusCode::CONFLICT, "Conflict"),
            ApiError::PayloadTooLarge(_) => (StatusCode::PAYLOAD_TOO_LARGE, "PayloadTooLarge"),
            ApiError::Storage(_)
            | ApiError::Internal(_)
            | ApiError::Serialization(_)
            | ApiError::Io(_) => (StatusCode::INTERNAL_SERVER_ERROR, "InternalServerError"),
        }
    }
}

/// Convert ApiError to HTTP response
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code) = self.status_and_code();

        let message = match &self {
            ApiError::Internal(_) | ApiError::Serialization(_) | ApiError::Io(_) => {
                tracing::error!(error = %self, "request failed");
                "Internal server error".to_string() // Don't leak details
            }
            ApiError::Storage(msg) => {
                tracing::error!(error = %self, "storage failure");
                msg.clone()
            }
            _ => self.to_string(),
        };

        let body = Json(ErrorResponse {
            success: false,
            error: error_code.to_string(),
            message,
        });

        (status, body).into_response()
    }
}

/// Result type alias for API operations
pub type ApiResult<T> = Result<T, ApiError>;
