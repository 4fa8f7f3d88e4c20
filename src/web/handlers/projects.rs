//! # Project Handlers
//!
//! Cache-aside reads and invalidating writes for customization projects.
//! Reads go through the repository's entity and scope keys; the update path
//! names every key that could hold a view of the mutated row, including the
//! owner's aggregate list. Over-invalidation is preferred to a stale read.

use axum::extract::{Path, State};
use axum::Json;
use serde_json::Value;
use tracing::info;

use super::parse_id;
use crate::cache::keys;
use crate::error::PrintgateError;
use crate::repository::{CacheOptions, QueryOptions, SortDirection};
use crate::web::errors::{ApiError, ApiResult};
use crate::web::extract::Json as JsonBody;
use crate::web::state::AppState;

const TABLE: &str = "projects";

/// GET /v1/projects/{id}
pub async fn get_project(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let id = parse_id(&id, "project id")?;
    let project = state
        .repository
        .get_by_id(TABLE, id, CacheOptions::default())
        .await?;
    Ok(Json(project))
}

/// GET /v1/users/{user_id}/projects
///
/// The list is cached whole under the owner's scope key, which is exactly the
/// key project mutations invalidate.
pub async fn list_user_projects(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<Vec<Value>>> {
    let user_id = parse_id(&user_id, "user id")?;

    let query = QueryOptions::default()
        .filter("owner_id", Value::from(user_id))
        .order("updated_at", SortDirection::Desc);

    let projects = state
        .repository
        .query_scoped(
            TABLE,
            &query,
            &keys::user_projects(user_id),
            CacheOptions::default(),
        )
        .await?;
    Ok(Json(projects))
}

/// PUT /v1/projects/{id}
pub async fn update_project(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(changes): JsonBody<Value>,
) -> ApiResult<Json<Value>> {
    let id = parse_id(&id, "project id")?;
    if !changes.is_object() {
        return Err(ApiError(PrintgateError::validation(
            "update payload must be a JSON object",
        )));
    }

    let updated = state.repository.update(TABLE, id, &changes, &[]).await?;

    // The owner's aggregate list could hold a stale view of this project
    if let Some(owner_id) = updated.get("owner_id").and_then(Value::as_i64) {
        state
            .repository
            .invalidate_scope(&keys::user_projects(owner_id))
            .await;
    }

    info!(project_id = id, "project updated, caches invalidated");
    Ok(Json(updated))
}
