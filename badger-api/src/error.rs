//! Error types for badger-api
//!
//! Every handler error becomes a JSON `{"error": ...}` body, except
//! [`ApiError::NotAllowed`] which answers with plain text.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    /// Unknown badge type, metadata source or disabled family
    #[error("{0}")]
    NotFound(String),

    /// Malformed query parameter or body
    #[error("{0}")]
    BadRequest(String),

    /// `extended` route segment with an unsupported value
    #[error("not allowed")]
    NotAllowed,

    /// A pipeline step gave up on an upstream service
    #[error("{message}")]
    Upstream { status: StatusCode, message: String },

    /// Image rendering failed
    #[error("{0}")]
    Internal(String),
}

/// Convenience Result type for handlers
pub type ApiResult<T> = Result<T, ApiError>;

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotAllowed => {
                return (StatusCode::NOT_FOUND, "not allowed").into_response();
            }
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Upstream { status, message } => (status, message),
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "Badge rendering failed");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        let body = Json(json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}
