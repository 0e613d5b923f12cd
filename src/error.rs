use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid slug: {0}")]
    InvalidSlug(String),

    #[error("{0}")]
    RateLimitExceeded(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Request failed: {0}")]
    Request(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<redis::RedisError> for Error {
    fn from(err: redis::RedisError) -> Self {
        Error::Store(err.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Request(err.to_string())
    }
}

/// JSON body returned for every error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::InvalidSlug(_) => StatusCode::BAD_REQUEST,
            Error::RateLimitExceeded(_) => StatusCode::TOO_MANY_REQUESTS,
            Error::Request(_) => StatusCode::BAD_GATEWAY,
            Error::Store(_) | Error::Config(_) | Error::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Message that is safe to hand back to a caller. Server-side failures
    /// collapse to a generic string.
    pub fn public_message(&self) -> String {
        match self {
            Error::InvalidSlug(msg) => msg.clone(),
            Error::RateLimitExceeded(msg) => msg.clone(),
            Error::Request(_) => "Upstream request failed".to_string(),
            Error::Store(_) | Error::Config(_) | Error::Internal(_) => {
                "Internal server error".to_string()
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        (status, Json(ErrorResponse::new(self.public_message()))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            Error::InvalidSlug("bad".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            Error::RateLimitExceeded("slow down".into()).status_code(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            Error::Store("connection refused".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_store_errors_do_not_leak_detail() {
        let err = Error::Store("redis://secret-host:6379 refused".into());
        assert_eq!(err.public_message(), "Internal server error");
    }

    #[test]
    fn test_upstream_failure_is_bad_gateway() {
        let err = Error::Request("https://api.internal/views returned 503".into());
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
        assert_eq!(err.public_message(), "Upstream request failed");
    }

    #[test]
    fn test_validation_message_is_passed_through() {
        let err = Error::InvalidSlug("Slug cannot be empty".into());
        assert_eq!(err.public_message(), "Slug cannot be empty");
    }
}
