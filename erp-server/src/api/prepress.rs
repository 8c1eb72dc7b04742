//! Prepress desk API

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    middleware,
    routing::{get, post},
};
use serde::Deserialize;
use shared::error::{AppError, ErrorCode};
use shared::models::{PrepressAssign, PrepressJob, PrepressStatus, PrepressStatusUpdate};

use super::{ApiResult, internal};
use crate::auth::{CurrentUser, require_permission};
use crate::db;
use crate::services::prepress;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    let read_routes = Router::new()
        .route("/", get(list))
        .route("/{id}", get(get_by_id));

    let manage_routes = Router::new()
        .route("/{id}/assign", post(assign))
        .route("/{id}/status", post(update_status))
        .layer(middleware::from_fn(require_permission("prepress:manage")));

    read_routes.merge(manage_routes)
}

#[derive(Debug, Default, Deserialize)]
pub struct PrepressListQuery {
    pub status: Option<PrepressStatus>,
    pub designer_id: Option<i64>,
}

/// GET /api/prepress
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<PrepressListQuery>,
) -> ApiResult<Vec<PrepressJob>> {
    let jobs = db::prepress::list(
        &state.pool,
        query.status.map(|s| s.as_db()),
        query.designer_id,
    )
    .await
    .map_err(internal)?;
    Ok(Json(jobs))
}

/// GET /api/prepress/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<PrepressJob> {
    let job = db::prepress::find_by_id(&state.pool, id)
        .await
        .map_err(internal)?
        .ok_or_else(|| AppError::new(ErrorCode::PrepressJobNotFound))?;
    Ok(Json(job))
}

/// POST /api/prepress/{id}/assign
pub async fn assign(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(data): Json<PrepressAssign>,
) -> ApiResult<PrepressJob> {
    Ok(Json(prepress::assign(&state.pool, id, &data).await?))
}

/// POST /api/prepress/{id}/status
///
/// `completed` also advances the job card out of Prepress.
pub async fn update_status(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    Json(data): Json<PrepressStatusUpdate>,
) -> ApiResult<PrepressJob> {
    Ok(Json(prepress::update_status(&state.pool, &user, id, &data).await?))
}
