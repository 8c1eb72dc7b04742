//! User administration API (`users:manage`)

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    middleware,
    routing::get,
};
use serde::Deserialize;
use shared::error::{AppError, ApiResponse, ErrorCode};
use shared::models::{User, UserCreate, UserUpdate};
use shared::request::like_pattern;
use shared::{PaginatedResponse, PaginationQuery};

use super::{ApiResult, internal};
use crate::auth::{CurrentUser, require_permission};
use crate::db;
use crate::db::users::{NewUser, UserChanges, UserFilter};
use crate::error::write_error;
use crate::state::AppState;
use crate::util::{MIN_PASSWORD_LEN, hash_password, non_blank};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/{id}", get(get_by_id).put(update).delete(deactivate))
        .layer(middleware::from_fn(require_permission("users:manage")))
}

#[derive(Debug, Default, Deserialize)]
pub struct UserListFilter {
    pub department: Option<String>,
    pub role_id: Option<i64>,
    pub is_active: Option<bool>,
    /// Username or full name
    pub q: Option<String>,
}

/// GET /api/users
pub async fn list(
    State(state): State<AppState>,
    Query(page): Query<PaginationQuery>,
    Query(query): Query<UserListFilter>,
) -> ApiResult<PaginatedResponse<User>> {
    let filter = UserFilter {
        department: query.department.as_deref().and_then(non_blank),
        role_id: query.role_id,
        is_active: query.is_active,
        pattern: like_pattern(query.q.as_deref()),
    };

    let items = db::users::list(&state.pool, &filter, page.limit(), page.offset())
        .await
        .map_err(internal)?;
    let total = db::users::count(&state.pool, &filter)
        .await
        .map_err(internal)?;

    Ok(Json(PaginatedResponse::from_query(items, &page, total)))
}

async fn load(state: &AppState, id: i64) -> Result<User, AppError> {
    db::users::find_by_id(&state.pool, id)
        .await
        .map_err(internal)?
        .ok_or_else(|| AppError::new(ErrorCode::UserNotFound))
}

/// GET /api/users/{id}
pub async fn get_by_id(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<User> {
    Ok(Json(load(&state, id).await?))
}

fn check_password(password: &str) -> Result<(), AppError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::new(ErrorCode::PasswordTooShort)
            .with_detail("min_length", MIN_PASSWORD_LEN));
    }
    Ok(())
}

async fn check_role(state: &AppState, role_id: i64) -> Result<(), AppError> {
    db::roles::find_by_id(&state.pool, role_id)
        .await
        .map_err(internal)?
        .ok_or_else(|| AppError::new(ErrorCode::RoleNotFound).with_detail("role_id", role_id))?;
    Ok(())
}

/// POST /api/users
pub async fn create(
    State(state): State<AppState>,
    Json(data): Json<UserCreate>,
) -> ApiResult<User> {
    let username = non_blank(&data.username).ok_or_else(|| AppError::required("username"))?;
    check_password(&data.password)?;
    check_role(&state, data.role_id).await?;

    let password_hash = hash_password(&data.password).map_err(internal)?;
    let full_name = data
        .full_name
        .as_deref()
        .and_then(non_blank)
        .unwrap_or(username);

    let id = db::users::create(
        &state.pool,
        &NewUser {
            username,
            password_hash: &password_hash,
            full_name,
            email: data.email.as_deref().and_then(non_blank),
            role_id: data.role_id,
            department: data.department.as_deref().and_then(non_blank),
        },
    )
    .await
    .map_err(|e| write_error(e, ErrorCode::UsernameExists))?;

    tracing::info!(user_id = id, username = %username, "User created");
    Ok(Json(load(&state, id).await?))
}

/// PUT /api/users/{id}
///
/// A given `password` resets the user's password.
pub async fn update(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<i64>,
    Json(data): Json<UserUpdate>,
) -> ApiResult<User> {
    if id == current.id && data.is_active == Some(false) {
        return Err(AppError::new(ErrorCode::CannotDeactivateSelf));
    }

    let username = match data.username.as_deref() {
        Some(u) => Some(non_blank(u).ok_or_else(|| AppError::required("username"))?),
        None => None,
    };
    let password_hash = match data.password.as_deref() {
        Some(p) => {
            check_password(p)?;
            Some(hash_password(p).map_err(internal)?)
        }
        None => None,
    };
    if let Some(role_id) = data.role_id {
        check_role(&state, role_id).await?;
    }

    let changes = UserChanges {
        username,
        password_hash: password_hash.as_deref(),
        full_name: data.full_name.as_deref().and_then(non_blank),
        email: data.email.as_deref().and_then(non_blank),
        role_id: data.role_id,
        department: data.department.as_deref().and_then(non_blank),
        is_active: data.is_active,
    };

    if !db::users::update(&state.pool, id, &changes)
        .await
        .map_err(|e| write_error(e, ErrorCode::UsernameExists))?
    {
        return Err(AppError::new(ErrorCode::UserNotFound));
    }

    tracing::info!(
        user_id = id,
        password_reset = password_hash.is_some(),
        "User updated"
    );
    Ok(Json(load(&state, id).await?))
}

/// DELETE /api/users/{id}
///
/// Soft delete.
pub async fn deactivate(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<i64>,
) -> Result<ApiResponse<()>, AppError> {
    if id == current.id {
        return Err(AppError::new(ErrorCode::CannotDeactivateSelf));
    }
    if !db::users::deactivate(&state.pool, id)
        .await
        .map_err(internal)?
    {
        return Err(AppError::new(ErrorCode::UserNotFound));
    }

    tracing::info!(user_id = id, "User deactivated");
    Ok(ApiResponse::ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_length_counts_chars() {
        assert!(check_password("12345678").is_ok());
        assert_eq!(
            check_password("1234567").unwrap_err().code,
            ErrorCode::PasswordTooShort
        );
        // Multi-byte characters count once
        assert!(check_password("ääääääää").is_ok());
    }
}
