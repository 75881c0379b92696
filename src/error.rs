use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

/// Error surface of the two API endpoints
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Missing ?url=")]
    MissingUrl,

    #[error("Could not parse video ID.")]
    InvalidReference,

    #[error("Missing transcript or question")]
    MissingField,

    #[error("No transcript available for this video.")]
    NoTranscript,

    /// Upstream provider or network failure, message passed through when available
    #[error("{0}")]
    Provider(String),
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingUrl | ApiError::InvalidReference | ApiError::MissingField => {
                StatusCode::BAD_REQUEST
            }
            ApiError::NoTranscript => StatusCode::NOT_FOUND,
            ApiError::Provider(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Wrap an upstream failure, substituting a fallback message when the
    /// provider gave none
    pub fn provider(err: eyre::Report, fallback: &str) -> Self {
        let msg = err.to_string();
        if msg.trim().is_empty() {
            ApiError::Provider(fallback.to_string())
        } else {
            ApiError::Provider(msg)
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}
