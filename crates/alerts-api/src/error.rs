//! Error types for the alerts API.

use alert_cache::CacheError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

/// Errors returned by route handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Cache operation failed.
    #[error(transparent)]
    Cache(#[from] CacheError),

    /// The requested resource does not exist.
    #[error("Not found: {0}")]
    NotFound(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Cache(err) if err.is_input_error() => StatusCode::BAD_REQUEST,
            ApiError::Cache(CacheError::AllAreasFailed { .. } | CacheError::Fetch(_)) => {
                StatusCode::BAD_GATEWAY
            }
            ApiError::Cache(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %self, "Request failed");
        } else {
            tracing::debug!(error = %self, "Rejected request");
        }

        let body = match &self {
            ApiError::Cache(CacheError::AllAreasFailed { errors, .. }) => serde_json::json!({
                "error": self.to_string(),
                "areas": errors
                    .iter()
                    .map(|(area, error)| serde_json::json!({ "area": area, "error": error }))
                    .collect::<Vec<_>>(),
            }),
            _ => serde_json::json!({
                "error": self.to_string()
            }),
        };

        (status, Json(body)).into_response()
    }
}

/// Result type for route handlers.
pub type Result<T> = std::result::Result<T, ApiError>;
