//! Error types for lsr-review

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::backup::BackupError;
use crate::refiner::RefineError;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// No dataset has been loaded yet (404)
    #[error("No dataset loaded")]
    NoDataset,

    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// External refinement or backup call failed (502)
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),

    /// lsr-common error; status depends on the variant
    #[error(transparent)]
    Common(#[from] lsr_common::Error),
}

impl From<RefineError> for ApiError {
    fn from(err: RefineError) -> Self {
        match err {
            RefineError::NotConfigured => ApiError::BadRequest(err.to_string()),
            other => ApiError::Upstream(other.to_string()),
        }
    }
}

impl From<BackupError> for ApiError {
    fn from(err: BackupError) -> Self {
        match err {
            BackupError::NotConfigured => ApiError::BadRequest(err.to_string()),
            other => ApiError::Upstream(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        use lsr_common::Error as Common;

        let (status, error_code) = match &self {
            ApiError::NoDataset => (StatusCode::NOT_FOUND, "NO_DATASET"),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            ApiError::Upstream(_) => (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
            ApiError::Common(err) => match err {
                Common::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
                Common::InvalidInput(_) => (StatusCode::BAD_REQUEST, "INVALID_INPUT"),
                Common::Parse(_) => (StatusCode::BAD_REQUEST, "PARSE_ERROR"),
                Common::MalformedItem { .. } => (StatusCode::CONFLICT, "MALFORMED_ITEM"),
                Common::Io(_) => (StatusCode::INTERNAL_SERVER_ERROR, "IO_ERROR"),
                Common::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "CONFIG_ERROR"),
            },
        };

        if status.is_server_error() {
            tracing::warn!("{}", self);
        }

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": self.to_string(),
            }
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
