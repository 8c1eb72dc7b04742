//! Job card API
//!
//! Creation, metadata edits and the floor transitions (start, advance,
//! hold, resume, cancel). Routing rules live in [`crate::services::jobs`].

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    middleware,
    routing::{get, post, put},
};
use serde::Deserialize;
use shared::PaginatedResponse;
use shared::PaginationQuery;
use shared::models::{
    JobCard, JobCardCreate, JobCardDetail, JobCardUpdate, JobPriority, JobStatus,
    JobTransitionRequest,
};
use shared::request::like_pattern;

use super::{ApiResult, internal};
use crate::auth::{CurrentUser, require_permission};
use crate::db;
use crate::db::job_cards::JobFilter;
use crate::services::jobs::{self, Transition};
use crate::state::AppState;
use crate::util::non_blank;

pub fn router() -> Router<AppState> {
    let read_routes = Router::new()
        .route("/", get(list))
        .route("/{id}", get(get_by_id));

    let create_routes = Router::new()
        .route("/", post(create))
        .layer(middleware::from_fn(require_permission("jobs:create")));

    // Department match is checked in the service
    let floor_routes = Router::new()
        .route("/{id}/start", post(start))
        .route("/{id}/advance", post(advance))
        .layer(middleware::from_fn(require_permission("jobs:advance")));

    let manage_routes = Router::new()
        .route("/{id}", put(update))
        .route("/{id}/hold", post(hold))
        .route("/{id}/resume", post(resume))
        .route("/{id}/cancel", post(cancel))
        .layer(middleware::from_fn(require_permission("jobs:manage")));

    read_routes
        .merge(create_routes)
        .merge(floor_routes)
        .merge(manage_routes)
}

/// List filters, read alongside [`PaginationQuery`]
#[derive(Debug, Default, Deserialize)]
pub struct JobListFilter {
    pub status: Option<JobStatus>,
    pub department: Option<String>,
    pub company_id: Option<i64>,
    pub priority: Option<JobPriority>,
    /// Job number or customer PO
    pub q: Option<String>,
}

/// GET /api/jobs
pub async fn list(
    State(state): State<AppState>,
    Query(page): Query<PaginationQuery>,
    Query(query): Query<JobListFilter>,
) -> ApiResult<PaginatedResponse<JobCard>> {
    let filter = JobFilter {
        status: query.status.map(|s| s.as_db()),
        department: query.department.as_deref().and_then(non_blank),
        company_id: query.company_id,
        priority: query.priority.map(|p| p.as_db()),
        pattern: like_pattern(query.q.as_deref()),
    };

    let items = db::job_cards::list(&state.pool, &filter, page.limit(), page.offset())
        .await
        .map_err(internal)?;
    let total = db::job_cards::count(&state.pool, &filter)
        .await
        .map_err(internal)?;

    Ok(Json(PaginatedResponse::from_query(items, &page, total)))
}

/// GET /api/jobs/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<JobCardDetail> {
    Ok(Json(jobs::get(&state.pool, id).await?))
}

/// POST /api/jobs
pub async fn create(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(data): Json<JobCardCreate>,
) -> ApiResult<JobCardDetail> {
    Ok(Json(jobs::create(&state.pool, &user, &data).await?))
}

/// PUT /api/jobs/{id}
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(data): Json<JobCardUpdate>,
) -> ApiResult<JobCard> {
    Ok(Json(jobs::update(&state.pool, id, &data).await?))
}

/// POST /api/jobs/{id}/advance
///
/// Moves the job to the next step of its route, or completes it after the
/// last one.
pub async fn advance(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    Json(req): Json<JobTransitionRequest>,
) -> ApiResult<JobCardDetail> {
    let remarks = req.remarks.as_deref().and_then(non_blank);
    Ok(Json(jobs::advance(&state.pool, &user, id, remarks).await?))
}

async fn apply(
    state: &AppState,
    user: &CurrentUser,
    id: i64,
    transition: Transition,
    req: &JobTransitionRequest,
) -> ApiResult<JobCard> {
    let job = jobs::transition(&state.pool, user, id, transition, req.remarks.as_deref()).await?;
    Ok(Json(job))
}

/// POST /api/jobs/{id}/start
pub async fn start(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    Json(req): Json<JobTransitionRequest>,
) -> ApiResult<JobCard> {
    apply(&state, &user, id, Transition::Start, &req).await
}

/// POST /api/jobs/{id}/hold
pub async fn hold(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    Json(req): Json<JobTransitionRequest>,
) -> ApiResult<JobCard> {
    apply(&state, &user, id, Transition::Hold, &req).await
}

/// POST /api/jobs/{id}/resume
pub async fn resume(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    Json(req): Json<JobTransitionRequest>,
) -> ApiResult<JobCard> {
    apply(&state, &user, id, Transition::Resume, &req).await
}

/// POST /api/jobs/{id}/cancel
pub async fn cancel(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    Json(req): Json<JobTransitionRequest>,
) -> ApiResult<JobCard> {
    apply(&state, &user, id, Transition::Cancel, &req).await
}
