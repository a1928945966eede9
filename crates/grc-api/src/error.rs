//! # Application Error
//!
//! Maps domain errors to structured HTTP responses with proper status
//! codes and error bodies. The mapping implements the user-visible
//! policy: conflicts tell the caller to reload and retry, authorization
//! failures are hard denials that reveal nothing about other tenants.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use grc_core::EngineError;

/// Application-level error type that maps to HTTP responses.
#[derive(Error, Debug)]
pub enum AppError {
    /// Resource not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Request validation failed.
    #[error("validation error: {0}")]
    Validation(String),

    /// A concurrent writer won; reload and retry.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Cross-tenant access attempt.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Authentication headers missing or malformed.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<EngineError> for AppError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::NotFound { .. } => Self::NotFound(err.to_string()),
            EngineError::Conflict { .. } => Self::Conflict(err.to_string()),
            EngineError::Authorization { .. } => Self::Forbidden(err.to_string()),
            // An unknown scope reads as an absent resource over HTTP.
            EngineError::UnknownScope { .. } => Self::NotFound(err.to_string()),
            EngineError::DanglingReference { .. }
            | EngineError::Validation(_)
            | EngineError::Canonicalization(_) => Self::Validation(err.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status == StatusCode::CONFLICT {
            metrics::counter!("grc_api_conflicts_total").increment(1);
        }
        let body = serde_json::json!({
            "error": {
                "code": status.as_u16(),
                "message": self.to_string(),
            }
        });
        (status, axum::Json(body)).into_response()
    }
}
