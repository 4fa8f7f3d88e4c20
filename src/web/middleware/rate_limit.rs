//! # Rate-Limit Admission Middleware
//!
//! Applied to every `/v1` route. Resolves the client identity from the
//! `x-client-id` header (anonymous callers share one bucket), maps the route
//! to its configured operation, and asks the limiter for admission. Admitted
//! responses still carry the `x-ratelimit-*` headers so well-behaved clients
//! can pace themselves before ever hitting a 429.

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use tracing::debug;

use crate::error::PrintgateError;
use crate::web::errors::{header_num, ApiError};
use crate::web::state::AppState;

/// Bucket for callers that do not identify themselves
const ANONYMOUS_CLIENT: &str = "anonymous";

pub async fn enforce_rate_limit(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if !state.config.rate_limits.enabled {
        return Ok(next.run(request).await);
    }

    let client_id = request
        .headers()
        .get("x-client-id")
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .unwrap_or(ANONYMOUS_CLIENT)
        .to_string();

    let operation = operation_for_path(request.uri().path());
    let decision = state.limiter.check(&client_id, operation).await;

    debug!(
        client_id = %client_id,
        operation = %operation,
        admitted = decision.admitted,
        remaining = decision.remaining,
        "rate limit admission"
    );

    if !decision.admitted {
        return Err(ApiError(PrintgateError::RateLimited {
            limit: decision.limit,
            remaining: decision.remaining,
            reset_seconds: decision.reset_seconds,
        }));
    }

    let mut response = next.run(request).await;
    let headers = response.headers_mut();
    headers.insert("x-ratelimit-limit", header_num(u64::from(decision.limit)));
    headers.insert(
        "x-ratelimit-remaining",
        header_num(u64::from(decision.remaining)),
    );
    headers.insert("x-ratelimit-reset", header_num(decision.reset_seconds));
    Ok(response)
}

/// Map a request path to its rate-limit operation name
fn operation_for_path(path: &str) -> &'static str {
    if path.starts_with("/v1/mockups") {
        "mockup-generation"
    } else if path.starts_with("/v1/catalog") {
        "catalog"
    } else {
        "default"
    }
}
