//! Authentication middleware
//!
//! [`require_auth`] validates `Authorization: Bearer <token>` and inserts the
//! [`CurrentUser`] into request extensions. [`require_permission`] runs after
//! it on routers whose every route needs one permission.
//!
//! The token only identifies the user. Role, permissions and department are
//! read from the account on every request, so deactivating a user or editing
//! a role applies to tokens already issued.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use shared::error::{AppError, ErrorCode};

use super::{CurrentUser, JwtError, JwtService};
use crate::db;
use crate::db::users::UserCredentials;
use crate::error::internal;
use crate::state::AppState;

/// Validate the header value and build the caller
pub(crate) fn authenticate(
    jwt: &JwtService,
    header: Option<&str>,
    path: &str,
) -> Result<CurrentUser, AppError> {
    let Some(header) = header else {
        tracing::debug!(path, "Missing authorization header");
        return Err(AppError::not_authenticated());
    };

    let token = JwtService::extract_from_header(header)
        .ok_or_else(|| AppError::invalid_token("Invalid authorization header"))?;

    let claims = jwt.validate_token(token).map_err(|e| {
        tracing::warn!(path, error = %e, "Token rejected");
        match e {
            JwtError::ExpiredToken => AppError::token_expired(),
            _ => AppError::invalid_token("Invalid token"),
        }
    })?;

    CurrentUser::try_from(claims)
        .map_err(|e| AppError::invalid_token(format!("Malformed token claims: {e}")))
}

/// Caller as stored now; `None` means the account no longer exists
pub(crate) fn current_account(
    credentials: Option<UserCredentials>,
) -> Result<CurrentUser, AppError> {
    let Some(credentials) = credentials else {
        return Err(AppError::invalid_token("Unknown user"));
    };
    if !credentials.is_active || !credentials.role_active {
        return Err(AppError::new(ErrorCode::AccountDisabled));
    }
    Ok(credentials.into_current_user())
}

/// Validate the token, then load the caller's account
pub(crate) async fn resolve_caller(
    state: &AppState,
    header: Option<&str>,
    path: &str,
) -> Result<CurrentUser, AppError> {
    let claimed = authenticate(&state.jwt, header, path)?;
    let credentials = db::users::find_credentials_by_id(&state.pool, claimed.id)
        .await
        .map_err(internal)?;
    current_account(credentials).inspect_err(|_| {
        tracing::warn!(user_id = claimed.id, path, "Token of a disabled or removed account");
    })
}

/// Require a valid access token of an active account
///
/// `OPTIONS` requests pass through for CORS preflight.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    if req.method() == http::Method::OPTIONS {
        return Ok(next.run(req).await);
    }

    let header = req
        .headers()
        .get(http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok());
    let user = resolve_caller(&state, header, req.uri().path()).await?;

    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}

/// Require a specific permission
///
/// Must be layered inside [`require_auth`]. Supports the `all` and
/// `module:*` wildcards through [`CurrentUser::has_permission`].
///
/// ```ignore
/// Router::new()
///     .route("/api/companies", post(create))
///     .layer(middleware::from_fn(require_permission("master:manage")));
/// ```
pub fn require_permission(
    permission: &'static str,
) -> impl Fn(
    Request,
    Next,
) -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<Response, AppError>> + Send>>
+ Clone {
    move |req: Request, next: Next| {
        Box::pin(async move {
            let user = req
                .extensions()
                .get::<CurrentUser>()
                .ok_or_else(AppError::not_authenticated)?;

            if !user.has_permission(permission) {
                tracing::warn!(
                    user_id = user.id,
                    username = %user.username,
                    permission,
                    "Permission denied"
                );
                return Err(AppError::missing_permission(permission));
            }

            Ok(next.run(req).await)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> JwtService {
        JwtService::new("middleware-test-secret", 1)
    }

    fn operator() -> CurrentUser {
        CurrentUser {
            id: 11,
            username: "ctp_op".into(),
            role: "operator".into(),
            permissions: vec!["jobs:advance".into()],
            department: Some("CTP".into()),
        }
    }

    #[test]
    fn test_authenticate_missing_header() {
        let err = authenticate(&service(), None, "/api/jobs").unwrap_err();
        assert_eq!(err.code, ErrorCode::NotAuthenticated);
    }

    #[test]
    fn test_authenticate_bad_scheme() {
        let err = authenticate(&service(), Some("Token abc"), "/api/jobs").unwrap_err();
        assert_eq!(err.code, ErrorCode::TokenInvalid);
    }

    #[test]
    fn test_authenticate_valid_token() {
        let jwt = service();
        let token = jwt.generate_token(&operator()).unwrap();
        let header = format!("Bearer {token}");
        let user = authenticate(&jwt, Some(&header), "/api/jobs").unwrap();
        assert_eq!(user.id, 11);
        assert_eq!(user.department.as_deref(), Some("CTP"));
    }

    fn credentials(is_active: bool, role_active: bool) -> UserCredentials {
        UserCredentials {
            id: 11,
            username: "ctp_op".into(),
            password_hash: String::new(),
            is_active,
            department: Some("Cutting".into()),
            role_name: "operator".into(),
            role_active,
            permissions: sqlx::types::Json(vec!["jobs:advance".into(), "reports:view".into()]),
        }
    }

    #[test]
    fn test_account_state_overrides_token() {
        let user = current_account(Some(credentials(true, true))).unwrap();
        // Department moved since the token was issued
        assert_eq!(user.department.as_deref(), Some("Cutting"));
        assert!(user.has_permission("reports:view"));

        let err = current_account(Some(credentials(false, true))).unwrap_err();
        assert_eq!(err.code, ErrorCode::AccountDisabled);
        let err = current_account(Some(credentials(true, false))).unwrap_err();
        assert_eq!(err.code, ErrorCode::AccountDisabled);
        let err = current_account(None).unwrap_err();
        assert_eq!(err.code, ErrorCode::TokenInvalid);
    }

    #[test]
    fn test_authenticate_expired_token() {
        let expired = JwtService::new("middleware-test-secret", -1);
        let token = expired.generate_token(&operator()).unwrap();
        let header = format!("Bearer {token}");
        let err = authenticate(&service(), Some(&header), "/api/jobs").unwrap_err();
        assert_eq!(err.code, ErrorCode::TokenExpired);
    }
}
