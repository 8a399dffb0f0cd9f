//! API error type and its HTTP mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The request body failed a field rule.
    #[error("{reason}")]
    Validation { field: &'static str, reason: String },

    /// Something failed after validation.
    #[error("internal error: {reason}")]
    Internal { reason: String },
}

impl ApiError {
    pub fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Validation {
            field,
            reason: reason.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            Self::Validation { field, reason } => json!({ "error": reason, "field": field }),
            Self::Internal { .. } => {
                tracing::error!(error = %self, "request failed");
                json!({ "error": "internal server error" })
            }
        };
        (status, Json(body)).into_response()
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        Self::Internal {
            reason: err.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;
