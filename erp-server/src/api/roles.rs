//! Role API
//!
//! The four seeded roles are system roles: they keep their name and cannot
//! be deleted or disabled, but their permissions may be edited.

use std::collections::BTreeMap;

use axum::{
    Json, Router,
    extract::{Path, State},
    middleware,
    routing::{get, post, put},
};
use serde::Serialize;
use shared::error::{AppError, ApiResponse, ErrorCode};
use shared::models::{Role, RoleCreate, RoleUpdate};

use super::{ApiResult, internal};
use crate::auth::permissions::{
    ADMIN_ONLY_PERMISSIONS, ALL_PERMISSIONS, SYSTEM_ROLES, find_invalid, get_default_permissions,
};
use crate::auth::require_permission;
use crate::db;
use crate::error::write_error;
use crate::state::AppState;
use crate::util::non_blank;

pub fn router() -> Router<AppState> {
    let read_routes = Router::new()
        .route("/", get(list))
        .route("/permissions", get(permissions))
        .route("/{id}", get(get_by_id));

    let manage_routes = Router::new()
        .route("/", post(create))
        .route("/{id}", put(update).delete(delete))
        .layer(middleware::from_fn(require_permission("users:manage")));

    read_routes.merge(manage_routes)
}

/// GET /api/roles
pub async fn list(State(state): State<AppState>) -> ApiResult<Vec<Role>> {
    let roles = db::roles::list(&state.pool).await.map_err(internal)?;
    Ok(Json(roles))
}

/// GET /api/roles/{id}
pub async fn get_by_id(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Role> {
    Ok(Json(load(&state, id).await?))
}

#[derive(Serialize)]
pub struct PermissionCatalog {
    pub permissions: Vec<&'static str>,
    /// Default grants of the system roles
    pub defaults: BTreeMap<&'static str, Vec<String>>,
}

/// GET /api/roles/permissions
pub async fn permissions() -> Json<PermissionCatalog> {
    Json(PermissionCatalog {
        permissions: ALL_PERMISSIONS
            .iter()
            .chain(ADMIN_ONLY_PERMISSIONS)
            .copied()
            .collect(),
        defaults: SYSTEM_ROLES
            .iter()
            .map(|r| (*r, get_default_permissions(r)))
            .collect(),
    })
}

async fn load(state: &AppState, id: i64) -> Result<Role, AppError> {
    db::roles::find_by_id(&state.pool, id)
        .await
        .map_err(internal)?
        .ok_or_else(|| AppError::new(ErrorCode::RoleNotFound))
}

fn check_permissions(permissions: &[String]) -> Result<(), AppError> {
    match find_invalid(permissions) {
        Some(p) => Err(AppError::with_message(
            ErrorCode::InvalidPermission,
            format!("Unknown permission '{p}'"),
        )
        .with_detail("permission", p)),
        None => Ok(()),
    }
}

/// POST /api/roles
pub async fn create(
    State(state): State<AppState>,
    Json(data): Json<RoleCreate>,
) -> ApiResult<Role> {
    non_blank(&data.name).ok_or_else(|| AppError::required("name"))?;
    check_permissions(&data.permissions)?;

    let role = db::roles::create(&state.pool, &data)
        .await
        .map_err(|e| write_error(e, ErrorCode::RoleNameExists))?;

    tracing::info!(role_id = role.id, name = %role.name, "Role created");
    Ok(Json(role))
}

/// PUT /api/roles/{id}
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(data): Json<RoleUpdate>,
) -> ApiResult<Role> {
    let existing = load(&state, id).await?;

    if let Some(name) = data.name.as_deref() {
        let name = non_blank(name).ok_or_else(|| AppError::required("name"))?;
        if existing.is_system && name != existing.name {
            return Err(AppError::with_message(
                ErrorCode::RoleIsSystem,
                "System roles cannot be renamed",
            ));
        }
    }
    if existing.is_system && data.is_active == Some(false) {
        return Err(AppError::with_message(
            ErrorCode::RoleIsSystem,
            "System roles cannot be disabled",
        ));
    }
    if let Some(permissions) = &data.permissions {
        check_permissions(permissions)?;
    }

    let role = db::roles::update(&state.pool, id, &data)
        .await
        .map_err(|e| write_error(e, ErrorCode::RoleNameExists))?
        .ok_or_else(|| AppError::new(ErrorCode::RoleNotFound))?;

    tracing::info!(role_id = id, "Role updated");
    Ok(Json(role))
}

/// DELETE /api/roles/{id}
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<ApiResponse<()>, AppError> {
    let role = load(&state, id).await?;
    if role.is_system {
        return Err(AppError::with_message(
            ErrorCode::RoleIsSystem,
            "System roles cannot be deleted",
        ));
    }

    let users = db::roles::count_users(&state.pool, id)
        .await
        .map_err(internal)?;
    if users > 0 {
        return Err(AppError::new(ErrorCode::RoleInUse).with_detail("users", users));
    }

    if !db::roles::delete(&state.pool, id).await.map_err(internal)? {
        return Err(AppError::new(ErrorCode::RoleNotFound));
    }

    tracing::info!(role_id = id, name = %role.name, "Role deleted");
    Ok(ApiResponse::ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_permission_named_in_error() {
        let err = check_permissions(&["jobs:create".into(), "jobs:teleport".into()]).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidPermission);
        assert_eq!(
            err.details.unwrap().get("permission").unwrap(),
            "jobs:teleport"
        );

        assert!(check_permissions(&["inventory:*".into(), "all".into()]).is_ok());
    }

    #[tokio::test]
    async fn test_permission_catalog_lists_admin_only_entries() {
        let Json(catalog) = permissions().await;
        assert!(catalog.permissions.contains(&"users:manage"));
        assert!(catalog.permissions.contains(&"jobs:advance"));
        assert_eq!(catalog.defaults["admin"], vec!["all".to_string()]);
        assert_eq!(catalog.defaults.len(), SYSTEM_ROLES.len());
    }
}
