//! Application error type mapping to HTTP status codes and envelope format.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use interview_ai_types::error::{KeyPoolError, RepositoryError, RouterError};

/// Application-level error that maps to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    /// Generation failed; the message is user-facing.
    Router(RouterError),
    /// Operator action on a key that does not exist.
    KeyPool(KeyPoolError),
    /// Ledger read failed.
    Repository(RepositoryError),
    /// Authentication failure.
    Unauthorized(String),
    /// Validation error.
    Validation(String),
}

impl From<RouterError> for AppError {
    fn from(e: RouterError) -> Self {
        AppError::Router(e)
    }
}

impl From<KeyPoolError> for AppError {
    fn from(e: KeyPoolError) -> Self {
        AppError::KeyPool(e)
    }
}

impl From<RepositoryError> for AppError {
    fn from(e: RepositoryError) -> Self {
        AppError::Repository(e)
    }
}

impl AppError {
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            AppError::Router(e @ RouterError::QuotaExceeded) => {
                (StatusCode::TOO_MANY_REQUESTS, "QUOTA_EXCEEDED", e.to_string())
            }
            AppError::Router(e @ RouterError::Unavailable) => {
                (StatusCode::SERVICE_UNAVAILABLE, "AI_UNAVAILABLE", e.to_string())
            }
            AppError::Router(e @ RouterError::Cancelled) => {
                (StatusCode::REQUEST_TIMEOUT, "CANCELLED", e.to_string())
            }
            AppError::KeyPool(e @ KeyPoolError::KeyNotFound { .. }) => {
                (StatusCode::NOT_FOUND, "KEY_NOT_FOUND", e.to_string())
            }
            AppError::Repository(e) => {
                tracing::error!(error = %e, "Usage ledger query failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "LEDGER_ERROR", e.to_string())
            }
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();

        let body = json!({
            "data": null,
            "meta": {
                "request_id": "",
                "timestamp": chrono::Utc::now().to_rfc3339(),
                "response_time_ms": 0
            },
            "errors": [{
                "code": code,
                "message": message,
            }]
        });

        (
            status,
            [(axum::http::header::CONTENT_TYPE, "application/json")],
            body.to_string(),
        )
            .into_response()
    }
}
