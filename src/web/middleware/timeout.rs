//! # Request Deadline Middleware
//!
//! Caps every request at the configured wall-clock budget. A handler that
//! outlives the budget is dropped at its next await point and the caller gets
//! a 408 with the standard `{error, timestamp}` body. The budget is per
//! request; it should exceed the poller's worst case so mockup generation
//! reports its own timeout, with the task key, before this layer fires.

use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use serde_json::json;
use std::time::Duration;
use tracing::warn;

use crate::web::state::AppState;

pub async fn enforce_deadline(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let budget = Duration::from_millis(state.config.web.request_timeout_ms);
    let path = request.uri().path().to_string();

    match tokio::time::timeout(budget, next.run(request)).await {
        Ok(response) => response,
        Err(_) => {
            warn!(path = %path, budget_ms = budget.as_millis() as u64, "request exceeded deadline");
            let body = json!({
                "error": "request timed out",
                "timestamp": Utc::now().to_rfc3339(),
            });
            (StatusCode::REQUEST_TIMEOUT, Json(body)).into_response()
        }
    }
}
