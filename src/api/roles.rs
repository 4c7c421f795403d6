use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::json;

use super::handlers::{reject, with_timeout, ConfirmParams};
use crate::errors::AppError;
use crate::models::notification::Notice;
use crate::models::role::{group_by_resource, Role, RoleDraft, AVAILABLE_PERMISSIONS};
use crate::state::AppState;
use crate::validation;

#[derive(Deserialize)]
pub struct RoleQuery {
    pub search: Option<String>,
}

/// GET /api/v1/roles?search=
pub async fn list_roles(
    State(state): State<Arc<AppState>>,
    Query(params): Query<RoleQuery>,
) -> Result<Json<Vec<Role>>, AppError> {
    let search = params.search.as_deref().filter(|s| !s.trim().is_empty());
    let rows = with_timeout(&state, state.roles.list_roles(search)).await?;
    Ok(Json(rows))
}

/// POST /api/v1/roles
pub async fn create_role(
    State(state): State<Arc<AppState>>,
    Json(draft): Json<RoleDraft>,
) -> Result<impl IntoResponse, AppError> {
    let draft = validation::validate_role(&draft).map_err(|e| reject(&state, "Save role", e))?;

    let role = with_timeout(&state, state.roles.create_role(draft)).await?;
    tracing::info!(id = role.id, name = %role.name, "role created");
    state.notifier.publish(Notice::role_saved(&role.name, true));

    Ok((StatusCode::CREATED, Json(role)))
}

/// GET /api/v1/roles/:id
pub async fn get_role(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Role>, AppError> {
    let role = with_timeout(&state, state.roles.get_role(id)).await?;
    Ok(Json(role))
}

/// PUT /api/v1/roles/:id
pub async fn update_role(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(draft): Json<RoleDraft>,
) -> Result<Json<Role>, AppError> {
    let draft = validation::validate_role(&draft).map_err(|e| reject(&state, "Save role", e))?;

    let role = with_timeout(&state, state.roles.update_role(id, draft)).await?;
    tracing::info!(id, "role updated");
    state.notifier.publish(Notice::role_saved(&role.name, false));

    Ok(Json(role))
}

/// DELETE /api/v1/roles/:id?confirm=true
///
/// Services that still select the role keep the dangling id.
pub async fn delete_role(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Query(params): Query<ConfirmParams>,
) -> Result<Json<serde_json::Value>, AppError> {
    if !params.confirm {
        let role = with_timeout(&state, state.roles.get_role(id)).await?;
        return Err(AppError::ConfirmationRequired {
            prompt: format!(
                "Delete role '{}'? This action cannot be undone.",
                role.name
            ),
        });
    }

    let removed = with_timeout(&state, state.roles.delete_role(id)).await?;
    tracing::info!(id, "role deleted");
    state.notifier.publish(Notice::role_deleted(&removed.name));

    Ok(Json(json!({ "id": id, "deleted": true })))
}

/// GET /api/v1/permissions: grantable permissions grouped by resource
pub async fn list_permissions() -> Json<BTreeMap<String, Vec<String>>> {
    Json(group_by_resource(AVAILABLE_PERMISSIONS.iter().copied()))
}
