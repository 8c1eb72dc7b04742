//! `CurrentUser` extractor
//!
//! Reuses the user inserted by [`super::require_auth`]; otherwise resolves
//! the bearer token itself so handlers outside the guarded router can still
//! take a `CurrentUser` argument.

use axum::{extract::FromRequestParts, http::request::Parts};
use shared::error::AppError;

use super::middleware::resolve_caller;
use super::CurrentUser;
use crate::state::AppState;

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<CurrentUser>() {
            return Ok(user.clone());
        }

        let header = parts
            .headers
            .get(http::header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok());
        let user = resolve_caller(state, header, parts.uri.path()).await?;

        parts.extensions.insert(user.clone());
        Ok(user)
    }
}
