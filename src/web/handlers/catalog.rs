//! # Catalog Handlers
//!
//! Read-only provider catalog lookups, short-circuited by the process-local
//! response cache. These endpoints are idempotent and side-effect free, which
//! is exactly the population discipline the response cache requires; the
//! cache key is the full upstream URL so distinct products and variants never
//! alias.

use axum::extract::{Path, State};
use axum::Json;
use serde_json::Value;
use tracing::debug;

use super::parse_id;
use crate::web::errors::ApiResult;
use crate::web::state::AppState;

/// GET /v1/catalog/products/{product_id}
pub async fn get_product(
    State(state): State<AppState>,
    Path(product_id): Path<String>,
) -> ApiResult<Json<Value>> {
    let product_id = parse_id(&product_id, "product id")?;

    let request_key = format!("{}/products/{product_id}", state.provider.base_url());
    debug!(product_id = product_id, "catalog product fetch");

    let provider = state.provider.clone();
    let payload = state
        .response_cache
        .fetch_with_cache(&request_key, state.config.response_cache.ttl(), || async move {
            provider.catalog_product(product_id).await
        })
        .await?;
    Ok(Json(payload))
}

/// GET /v1/catalog/products/{product_id}/variants/{variant_id}
pub async fn get_variant(
    State(state): State<AppState>,
    Path((product_id, variant_id)): Path<(String, String)>,
) -> ApiResult<Json<Value>> {
    let product_id = parse_id(&product_id, "product id")?;
    let variant_id = parse_id(&variant_id, "variant id")?;

    let request_key = format!(
        "{}/products/{product_id}/variants/{variant_id}",
        state.provider.base_url()
    );
    debug!(
        product_id = product_id,
        variant_id = variant_id,
        "catalog variant fetch"
    );

    let provider = state.provider.clone();
    let payload = state
        .response_cache
        .fetch_with_cache(&request_key, state.config.response_cache.ttl(), || async move {
            provider.catalog_variant(product_id, variant_id).await
        })
        .await?;
    Ok(Json(payload))
}
