//! JSON error responses.
//!
//! Every API failure is rendered as `{"message": "..."}` with the matching
//! status code. Internal failures are logged here and reported generically.

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};

use crate::services::maps::MapError;
use crate::services::session::SessionError;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    /// A body the extractor refused, with the status it chose (400, 413, 415, 422).
    #[error("{message}")]
    Rejected { status: StatusCode, message: String },
    #[error("authentication required")]
    Unauthorized,
    #[error("not found")]
    NotFound,
    #[error("internal server error")]
    Internal,
}

impl ApiError {
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Rejected { status, .. } => *status,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(serde_json::json!({ "message": self.to_string() }))).into_response()
    }
}

impl From<MapError> for ApiError {
    fn from(err: MapError) -> Self {
        match err {
            MapError::NotFound(_) => Self::NotFound,
            MapError::Validation(message) => Self::BadRequest(message),
            MapError::CorruptCenter(_) | MapError::Database(_) => {
                tracing::error!(error = %err, "map store failure");
                Self::Internal
            }
        }
    }
}

impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        tracing::error!(error = %err, "session store failure");
        Self::Internal
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Rejected { status: rejection.status(), message: rejection.body_text() }
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        tracing::debug!(reason = %rejection.body_text(), "unparseable path parameter");
        Self::NotFound
    }
}

#[cfg(test)]
#[path = "error_test.rs"]
mod tests;
