//! HTTP error mapping.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use crate::error::Error;

pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// Errors returned to HTTP callers.
///
/// The body is always `{"error": "<message>"}`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Missing or malformed input. The caller should fix the request.
    #[error("{0}")]
    BadRequest(String),

    /// The model is not loaded yet. The caller should retry later.
    #[error("Model not loaded")]
    ModelUnavailable,

    /// The model failed while computing embeddings.
    #[error("{0}")]
    Internal(String),

    /// The body could not be read at all. Keeps the status axum chose.
    #[error("{1}")]
    Rejected(StatusCode, String),
}

impl ApiError {
    /// HTTP status for this error.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::ModelUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Rejected(status, _) => *status,
        }
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        match err {
            Error::ModelUnavailable => Self::ModelUnavailable,
            Error::InvalidArgument(msg) => Self::BadRequest(msg),
            Error::Embedding(msg) | Error::Other(msg) => Self::Internal(msg),
            other => Self::Internal(other.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::JsonSyntaxError(_)
            | JsonRejection::JsonDataError(_)
            | JsonRejection::MissingJsonContentType(_) => Self::BadRequest(rejection.body_text()),
            // Body buffering failures (too large, connection dropped).
            other => Self::Rejected(other.status(), other.body_text()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() && status != StatusCode::SERVICE_UNAVAILABLE {
            tracing::warn!("Embedding request failed: {self}");
        }

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
