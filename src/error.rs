// src/error.rs

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::store::StoreError;

/// Global Application Error Enum.
/// Centralizes error handling and mapping to HTTP responses.
///
/// Expected, recoverable conditions (not-found, validation failures,
/// terminal-attempt rejections) are dedicated variants so handlers can
/// branch on them; infrastructure failures are classified as
/// `StorageFailure` and never passed through uninterpreted.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // 400 Bad Request
    #[error("Bad request: {0}")]
    BadRequest(String),

    // 401 Unauthorized
    #[error("Unauthorized: {0}")]
    AuthError(String),

    // 404 Not Found
    #[error("Not found: {0}")]
    NotFound(String),

    // 409 Conflict (e.g., duplicate username or email)
    #[error("Conflict: {0}")]
    Conflict(String),

    // 409 Conflict: operation attempted on a terminal quiz attempt
    #[error("Invalid state: {0}")]
    InvalidState(String),

    // 500 Internal Server Error: classified storage-layer failure
    #[error("Storage failure: {0}")]
    StorageFailure(String),

    // 500 Internal Server Error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Implements `IntoResponse` for `AppError`.
/// Converts the error into a JSON response with appropriate HTTP status code.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::AuthError(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::InvalidState(msg) => (StatusCode::CONFLICT, msg),
            AppError::StorageFailure(msg) => {
                tracing::error!("Storage failure: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
        };
        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

/// Converts store-layer errors into application errors.
/// Uniqueness conflicts keep their message; everything else is a
/// storage failure.
impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(msg) => AppError::Conflict(msg),
            StoreError::Unavailable(msg) => AppError::StorageFailure(msg),
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::BadRequest(err.to_string())
    }
}
