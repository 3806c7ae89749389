use std::collections::BTreeMap;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::openrouter::OpenRouterError;

/// Per-field validation messages keyed by field name.
/// Surfaced in the 400 response body so clients can highlight inputs.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Validation failed")]
    ValidationFields(FieldErrors),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Generation error: {message}")]
    Generation {
        message: String,
        #[source]
        source: OpenRouterError,
    },

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Short machine-readable code, also recorded in generation error logs.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Validation(_) | AppError::ValidationFields(_) => "VALIDATION_ERROR",
            AppError::Unauthorized => "UNAUTHORIZED",
            AppError::Database(_) => "DATABASE_ERROR",
            AppError::Generation { .. } => "GENERATION_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let code = self.code();

        let (status, body) = match &self {
            AppError::NotFound(msg) => (
                StatusCode::NOT_FOUND,
                json!({ "error": { "code": code, "message": msg } }),
            ),
            AppError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": { "code": code, "message": msg } }),
            ),
            AppError::ValidationFields(fields) => (
                StatusCode::BAD_REQUEST,
                json!({
                    "error": {
                        "code": code,
                        "message": "Validation failed",
                        "details": fields,
                    }
                }),
            ),
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                json!({ "error": { "code": code, "message": "Authentication required" } }),
            ),
            AppError::Database(e) => {
                tracing::error!("Database error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": { "code": code, "message": "A database error occurred" } }),
                )
            }
            AppError::Generation { message, source } => {
                tracing::error!("Generation error ({source}): {message}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": { "code": code, "message": message } }),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": { "code": code, "message": "An internal server error occurred" } }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}
