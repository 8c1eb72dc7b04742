//! Company (customer) API

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    middleware,
    routing::{get, post, put},
};
use shared::error::{AppError, ApiResponse, ErrorCode};
use shared::models::{Company, CompanyCreate, CompanyUpdate};
use shared::{PaginatedResponse, SearchQuery};

use super::{ApiResult, internal};
use crate::auth::require_permission;
use crate::db;
use crate::error::write_error;
use crate::state::AppState;
use crate::util::non_blank;

pub fn router() -> Router<AppState> {
    let read_routes = Router::new()
        .route("/", get(list))
        .route("/{id}", get(get_by_id));

    let manage_routes = Router::new()
        .route("/", post(create))
        .route("/{id}", put(update).delete(deactivate))
        .layer(middleware::from_fn(require_permission("master:manage")));

    read_routes.merge(manage_routes)
}

/// GET /api/companies
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> ApiResult<PaginatedResponse<Company>> {
    let page = query.pagination();
    let pattern = query.pattern();

    let items = db::companies::list(
        &state.pool,
        query.active(),
        pattern.as_deref(),
        page.limit(),
        page.offset(),
    )
    .await
    .map_err(internal)?;
    let total = db::companies::count(&state.pool, query.active(), pattern.as_deref())
        .await
        .map_err(internal)?;

    Ok(Json(PaginatedResponse::from_query(items, &page, total)))
}

/// GET /api/companies/{id}
pub async fn get_by_id(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Company> {
    let company = db::companies::find_by_id(&state.pool, id)
        .await
        .map_err(internal)?
        .ok_or_else(|| AppError::new(ErrorCode::CompanyNotFound))?;
    Ok(Json(company))
}

/// POST /api/companies
pub async fn create(
    State(state): State<AppState>,
    Json(data): Json<CompanyCreate>,
) -> ApiResult<Company> {
    non_blank(&data.code).ok_or_else(|| AppError::required("code"))?;
    non_blank(&data.name).ok_or_else(|| AppError::required("name"))?;

    let company = db::companies::create(&state.pool, &data)
        .await
        .map_err(|e| write_error(e, ErrorCode::CompanyCodeExists))?;

    tracing::info!(company_id = company.id, code = %company.code, "Company created");
    Ok(Json(company))
}

/// PUT /api/companies/{id}
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(data): Json<CompanyUpdate>,
) -> ApiResult<Company> {
    if data.code.as_deref().is_some_and(|c| non_blank(c).is_none()) {
        return Err(AppError::required("code"));
    }
    if data.name.as_deref().is_some_and(|n| non_blank(n).is_none()) {
        return Err(AppError::required("name"));
    }

    let company = db::companies::update(&state.pool, id, &data)
        .await
        .map_err(|e| write_error(e, ErrorCode::CompanyCodeExists))?
        .ok_or_else(|| AppError::new(ErrorCode::CompanyNotFound))?;
    Ok(Json(company))
}

/// DELETE /api/companies/{id}
///
/// Soft delete; existing job cards keep their reference.
pub async fn deactivate(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<ApiResponse<()>, AppError> {
    if !db::companies::deactivate(&state.pool, id)
        .await
        .map_err(internal)?
    {
        return Err(AppError::new(ErrorCode::CompanyNotFound));
    }
    tracing::info!(company_id = id, "Company deactivated");
    Ok(ApiResponse::ok())
}
