//! # Health Check Handler
//!
//! Liveness endpoint for load balancers. Always available; deliberately does
//! not touch the cache store or database so a degraded dependency never makes
//! the process look dead.

use axum::Json;
use chrono::Utc;
use serde::Serialize;

#[derive(Serialize)]
pub struct HealthResponse {
    status: String,
    timestamp: String,
}

/// GET /health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        timestamp: Utc::now().to_rfc3339(),
    })
}
