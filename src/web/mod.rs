//! # HTTP Surface
//!
//! axum router for the caller-facing JSON API. The `/v1` routes sit behind
//! the rate-limit admission middleware; `/health` stays outside it so probes
//! are never throttled. Every route shares the request deadline layer.

pub mod errors;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod state;

use axum::middleware::from_fn_with_state;
use axum::routing::get;
use axum::Router;

use self::handlers::{catalog, health, mockups, projects};
use self::state::AppState;

/// Build the full application router
pub fn build_router(state: AppState) -> Router {
    let v1 = Router::new()
        .route("/catalog/products/{product_id}", get(catalog::get_product))
        .route(
            "/catalog/products/{product_id}/variants/{variant_id}",
            get(catalog::get_variant),
        )
        .route("/mockups", axum::routing::post(mockups::generate))
        .route(
            "/projects/{id}",
            get(projects::get_project).put(projects::update_project),
        )
        .route("/users/{user_id}/projects", get(projects::list_user_projects))
        .layer(from_fn_with_state(
            state.clone(),
            middleware::rate_limit::enforce_rate_limit,
        ));

    Router::new()
        .route("/health", get(health::health))
        .nest("/v1", v1)
        .layer(from_fn_with_state(
            state.clone(),
            middleware::timeout::enforce_deadline,
        ))
        .with_state(state)
}
