//! # Web API Error Responses
//!
//! Maps the crate error taxonomy onto HTTP. Every failure body is JSON
//! `{error, timestamp}` (plus machine-readable extras where the taxonomy
//! calls for them); exception detail is never echoed beyond the taxonomy's
//! own messages, and the timestamp correlates responses with logs.

use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use serde_json::json;

use crate::error::PrintgateError;

/// Newtype carrying [`PrintgateError`] across the axum boundary
#[derive(Debug)]
pub struct ApiError(pub PrintgateError);

impl From<PrintgateError> for ApiError {
    fn from(err: PrintgateError) -> Self {
        Self(err)
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let timestamp = Utc::now().to_rfc3339();

        let (status, body) = match &self.0 {
            PrintgateError::NotFound { .. } => (
                StatusCode::NOT_FOUND,
                json!({"error": self.0.to_string(), "timestamp": timestamp}),
            ),
            PrintgateError::Validation(_) => (
                StatusCode::BAD_REQUEST,
                json!({"error": self.0.to_string(), "timestamp": timestamp}),
            ),
            // Retryable: the task id lets the caller resume polling
            PrintgateError::Timeout { task_id } => (
                StatusCode::REQUEST_TIMEOUT,
                json!({
                    "error": self.0.to_string(),
                    "task_id": task_id,
                    "retryable": true,
                    "timestamp": timestamp,
                }),
            ),
            PrintgateError::RateLimited {
                limit,
                remaining,
                reset_seconds,
            } => (
                StatusCode::TOO_MANY_REQUESTS,
                json!({
                    "error": self.0.to_string(),
                    "limit": limit,
                    "remaining": remaining,
                    "reset": reset_seconds,
                    "timestamp": timestamp,
                }),
            ),
            PrintgateError::UpstreamUnavailable { status, .. } => {
                let code = status
                    .and_then(|s| StatusCode::from_u16(s).ok())
                    .filter(|s| s.is_client_error() || s.is_server_error())
                    .unwrap_or(StatusCode::BAD_GATEWAY);
                (
                    code,
                    json!({"error": self.0.to_string(), "timestamp": timestamp}),
                )
            }
            PrintgateError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                // Internal detail stays in the logs, not in the response
                json!({"error": "internal error", "timestamp": timestamp}),
            ),
        };

        let mut response = (status, Json(body)).into_response();

        // Back-off headers accompany the 429 body so clients need not parse it
        if let PrintgateError::RateLimited {
            limit,
            remaining,
            reset_seconds,
        } = &self.0
        {
            let headers = response.headers_mut();
            headers.insert("x-ratelimit-limit", header_num(u64::from(*limit)));
            headers.insert("x-ratelimit-remaining", header_num(u64::from(*remaining)));
            headers.insert("x-ratelimit-reset", header_num(*reset_seconds));
        }

        response
    }
}

pub(crate) fn header_num(value: u64) -> HeaderValue {
    HeaderValue::from_str(&value.to_string())
        .unwrap_or_else(|_| HeaderValue::from_static("0"))
}
