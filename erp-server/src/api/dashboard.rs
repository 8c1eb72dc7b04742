//! Dashboard API

use axum::{Json, Router, extract::State, middleware, routing::get};
use chrono::Local;
use shared::models::DashboardSummary;

use super::{ApiResult, internal};
use crate::auth::require_permission;
use crate::db;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/summary", get(summary))
        .layer(middleware::from_fn(require_permission("reports:view")))
}

/// GET /api/dashboard/summary
pub async fn summary(State(state): State<AppState>) -> ApiResult<DashboardSummary> {
    let today = Local::now().date_naive();
    let summary = db::dashboard::summary(&state.pool, today)
        .await
        .map_err(internal)?;
    Ok(Json(summary))
}
