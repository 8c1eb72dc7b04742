//! Department views

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};
use shared::models::JobCard;
use shared::models::department::ALL_DEPARTMENTS;

use super::{ApiResult, internal};
use crate::db;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list))
        .route("/{name}/jobs", get(queue))
}

/// GET /api/departments
pub async fn list() -> Json<&'static [&'static str]> {
    Json(ALL_DEPARTMENTS)
}

/// GET /api/departments/{name}/jobs
///
/// Open jobs currently at the department, most urgent first.
pub async fn queue(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ApiResult<Vec<JobCard>> {
    let jobs = db::job_cards::list_department_queue(&state.pool, &name)
        .await
        .map_err(internal)?;
    Ok(Json(jobs))
}
