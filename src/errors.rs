use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use crate::store::StoreError;
use crate::validation::ValidationErrors;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("validation failed")]
    Validation(#[from] ValidationErrors),

    #[error("{resource} {id} not found")]
    NotFound { resource: &'static str, id: i64 },

    #[error("confirmation required: {prompt}")]
    ConfirmationRequired { prompt: String },

    #[error("version conflict: expected {expected}, found {actual}")]
    VersionConflict { expected: u64, actual: u64 },

    #[error("access denied to {endpoint}")]
    AccessDenied { endpoint: String },

    #[error("operation timed out")]
    Timeout,

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound { resource, id } => AppError::NotFound { resource, id },
            StoreError::VersionConflict { expected, actual } => {
                AppError::VersionConflict { expected, actual }
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_type, code, msg) = match &self {
            AppError::Validation(errors) => {
                let body = Json(json!({
                    "error": {
                        "message": "one or more fields are invalid",
                        "type": "invalid_request_error",
                        "code": "validation_failed",
                        "fields": errors,
                    }
                }));
                return (StatusCode::UNPROCESSABLE_ENTITY, body).into_response();
            }
            AppError::NotFound { .. } => (
                StatusCode::NOT_FOUND,
                "invalid_request_error",
                "not_found",
                self.to_string(),
            ),
            AppError::ConfirmationRequired { prompt } => (
                StatusCode::PRECONDITION_REQUIRED,
                "confirmation_error",
                "confirmation_required",
                prompt.clone(),
            ),
            AppError::VersionConflict { .. } => (
                StatusCode::CONFLICT,
                "conflict_error",
                "version_conflict",
                self.to_string(),
            ),
            AppError::AccessDenied { .. } => (
                StatusCode::FORBIDDEN,
                "permission_error",
                "access_denied",
                self.to_string(),
            ),
            AppError::Timeout => (
                StatusCode::GATEWAY_TIMEOUT,
                "timeout_error",
                "save_timeout",
                "operation timed out".to_string(),
            ),
            AppError::Internal(e) => {
                tracing::error!("Internal error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "internal_server_error",
                    "internal server error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "message": msg,
                "type": error_type,
                "code": code,
            }
        }));

        (status, body).into_response()
    }
}
