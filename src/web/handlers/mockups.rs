//! # Mockup Generation Handler
//!
//! Submits a generation task upstream and awaits its terminal state through
//! the poller. Results are call-scoped: nothing here is cached. A poll-budget
//! timeout surfaces as 408 with the task key so the caller can resume polling
//! rather than resubmit.

use axum::extract::State;
use axum::Json;
use serde::Serialize;
use tracing::info;

use crate::error::PrintgateError;
use crate::provider::{Mockup, MockupRequest};
use crate::web::errors::{ApiError, ApiResult};
use crate::web::extract::Json as JsonBody;
use crate::web::state::AppState;

#[derive(Serialize)]
pub struct MockupResponse {
    pub mockups: Vec<Mockup>,
}

/// POST /v1/mockups
pub async fn generate(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<MockupRequest>,
) -> ApiResult<Json<MockupResponse>> {
    validate(&request)?;

    info!(
        product_id = request.product_id,
        variant_id = request.variant_id,
        placement = %request.placement,
        "mockup generation requested"
    );

    let mockups = state.poller.generate_and_await(&request).await?;
    Ok(Json(MockupResponse { mockups }))
}

fn validate(request: &MockupRequest) -> Result<(), ApiError> {
    if request.product_id <= 0 {
        return Err(invalid("product_id must be a positive integer"));
    }
    if request.variant_id <= 0 {
        return Err(invalid("variant_id must be a positive integer"));
    }
    if request.image_url.is_empty() {
        return Err(invalid("image_url is required"));
    }
    if !request.image_url.starts_with("http://") && !request.image_url.starts_with("https://") {
        return Err(invalid("image_url must be an absolute http(s) url"));
    }
    if request.placement.is_empty() {
        return Err(invalid("placement is required"));
    }
    Ok(())
}

fn invalid(message: &str) -> ApiError {
    ApiError(PrintgateError::validation(message))
}
