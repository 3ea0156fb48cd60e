use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use crate::domain::error::TrackerError;

/// Body of every error response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody { pub error: String }

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self { status: StatusCode::BAD_REQUEST, message: message.into() }
    }

    /// Failure of a write: unknown ids are 404, everything else is the caller's 400.
    pub fn rejected(err: TrackerError) -> Self {
        tracing::warn!(error = %err, "write rejected");
        match err {
            TrackerError::NotFound { .. } => Self { status: StatusCode::NOT_FOUND, message: err.to_string() },
            other => Self::bad_request(other.to_string()),
        }
    }

    /// Failure of a read, which can only come from storage.
    pub fn read_failure(err: TrackerError) -> Self {
        tracing::error!(error = %err, "read failed");
        Self { status: StatusCode::INTERNAL_SERVER_ERROR, message: err.to_string() }
    }

    pub fn status(&self) -> StatusCode { self.status }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self { Self::bad_request(rejection.body_text()) }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self { Self::bad_request(rejection.body_text()) }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response { (self.status, axum::Json(ErrorBody { error: self.message })).into_response() }
}
