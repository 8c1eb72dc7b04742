//! Authentication handlers
//!
//! Login, current-user lookup and password change.

use std::sync::LazyLock;
use std::time::Duration;

use axum::routing::{get, post};
use axum::{Json, Router, extract::State};
use serde::{Deserialize, Serialize};
use shared::error::{AppError, ErrorCode};
use shared::models::User;

use super::{ApiResult, internal};
use crate::auth::CurrentUser;
use crate::db;
use crate::db::users::UserCredentials;
use crate::state::AppState;
use crate::util::{MIN_PASSWORD_LEN, hash_password, verify_password};

/// Every login answer takes this long in total, so a missing user and a
/// wrong password look the same from outside
const AUTH_FIXED_DELAY_MS: u64 = 300;

/// Verified against when the username is unknown; both paths pay the
/// argon2 cost
static DUMMY_HASH: LazyLock<Option<String>> =
    LazyLock::new(|| hash_password("erp-server-unknown-user").ok());

/// Authenticated routes; login is mounted separately behind the rate limiter
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/auth/me", get(me))
        .route("/api/auth/change-password", post(change_password))
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub token: String,
    /// Token lifetime in seconds
    pub expires_in: i64,
    pub user: UserInfo,
}

/// User profile plus the effective permission list
#[derive(Serialize)]
pub struct UserInfo {
    #[serde(flatten)]
    pub user: User,
    pub permissions: Vec<String>,
}

/// Check a password against the account found for the username
fn check_credentials(
    credentials: Option<UserCredentials>,
    username: &str,
    password: &str,
) -> Result<UserCredentials, AppError> {
    let Some(credentials) = credentials else {
        if let Some(dummy) = DUMMY_HASH.as_deref() {
            verify_password(password, dummy);
        }
        tracing::warn!(username = %username, "Login failed - user not found");
        return Err(AppError::invalid_credentials());
    };

    if !verify_password(password, &credentials.password_hash) {
        tracing::warn!(username = %credentials.username, "Login failed - invalid credentials");
        return Err(AppError::invalid_credentials());
    }

    if !credentials.is_active || !credentials.role_active {
        tracing::warn!(username = %credentials.username, "Login refused - account disabled");
        return Err(AppError::new(ErrorCode::AccountDisabled));
    }
    Ok(credentials)
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<LoginResponse> {
    let deadline = tokio::time::Instant::now() + Duration::from_millis(AUTH_FIXED_DELAY_MS);
    let result = authenticate_login(&state, &req).await;
    tokio::time::sleep_until(deadline).await;
    result.map(Json)
}

async fn authenticate_login(state: &AppState, req: &LoginRequest) -> Result<LoginResponse, AppError> {
    let username = req.username.trim();
    let credentials = db::users::find_credentials_by_username(&state.pool, username)
        .await
        .map_err(internal)?;
    let current = check_credentials(credentials, username, &req.password)?.into_current_user();

    let token = state.jwt.generate_token(&current).map_err(|e| {
        tracing::error!("JWT creation failed: {e}");
        AppError::new(ErrorCode::InternalError)
    })?;

    db::users::record_login(&state.pool, current.id)
        .await
        .map_err(internal)?;

    let user = db::users::find_by_id(&state.pool, current.id)
        .await
        .map_err(internal)?
        .ok_or_else(|| AppError::new(ErrorCode::UserNotFound))?;

    tracing::info!(
        user_id = current.id,
        username = %current.username,
        role = %current.role,
        "User logged in"
    );

    Ok(LoginResponse {
        token,
        expires_in: state.jwt.expires_in(),
        user: UserInfo {
            user,
            permissions: current.permissions,
        },
    })
}

/// GET /api/auth/me
pub async fn me(State(state): State<AppState>, current: CurrentUser) -> ApiResult<UserInfo> {
    let user = db::users::find_by_id(&state.pool, current.id)
        .await
        .map_err(internal)?
        .ok_or_else(|| AppError::new(ErrorCode::UserNotFound))?;

    Ok(Json(UserInfo {
        user,
        permissions: current.permissions,
    }))
}

#[derive(Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

/// POST /api/auth/change-password
pub async fn change_password(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(req): Json<ChangePasswordRequest>,
) -> ApiResult<serde_json::Value> {
    if req.new_password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::new(ErrorCode::PasswordTooShort)
            .with_detail("min_length", MIN_PASSWORD_LEN));
    }

    let credentials = db::users::find_credentials_by_id(&state.pool, current.id)
        .await
        .map_err(internal)?
        .ok_or_else(|| AppError::new(ErrorCode::UserNotFound))?;

    if !verify_password(&req.current_password, &credentials.password_hash) {
        return Err(AppError::invalid_credentials());
    }

    let hash = hash_password(&req.new_password).map_err(internal)?;
    db::users::set_password(&state.pool, current.id, &hash)
        .await
        .map_err(internal)?;

    tracing::info!(user_id = current.id, "Password changed");
    Ok(Json(serde_json::json!({ "message": "Password changed" })))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(password: &str, is_active: bool) -> UserCredentials {
        UserCredentials {
            id: 3,
            username: "planner".into(),
            password_hash: hash_password(password).unwrap(),
            is_active,
            department: None,
            role_name: "manager".into(),
            role_active: true,
            permissions: sqlx::types::Json(vec!["jobs:manage".into()]),
        }
    }

    #[test]
    fn test_unknown_user_still_verifies_a_hash() {
        assert!(DUMMY_HASH.as_deref().is_some_and(|h| h.starts_with("$argon2")));
        let err = check_credentials(None, "ghost", "whatever").unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidCredentials);
    }

    #[test]
    fn test_credentials_checked_before_account_state() {
        let err = check_credentials(Some(account("right-pass", true)), "planner", "wrong-pass")
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidCredentials);

        // Disabled accounts only say so to someone holding the password
        let err = check_credentials(Some(account("right-pass", false)), "planner", "right-pass")
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::AccountDisabled);

        let ok = check_credentials(Some(account("right-pass", true)), "planner", "right-pass");
        assert_eq!(ok.unwrap().id, 3);
    }
}
