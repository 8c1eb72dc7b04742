//! Product API
//!
//! A product's `product_type` selects its process sequence; the effective
//! route endpoints live in [`super::process`].

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    middleware,
    routing::{get, post, put},
};
use serde::Deserialize;
use shared::error::{AppError, ApiResponse, ErrorCode};
use shared::models::{Product, ProductCreate, ProductUpdate};
use shared::{PaginatedResponse, SearchQuery};

use super::{ApiResult, internal, process};
use crate::auth::require_permission;
use crate::db;
use crate::db::products::ProductFilter;
use crate::error::write_error;
use crate::state::AppState;
use crate::util::non_blank;

pub fn router() -> Router<AppState> {
    let read_routes = Router::new()
        .route("/", get(list))
        .route("/{id}", get(get_by_id))
        .route("/{id}/route", get(process::get_product_route));

    let manage_routes = Router::new()
        .route("/", post(create))
        .route("/{id}", put(update).delete(deactivate))
        .layer(middleware::from_fn(require_permission("master:manage")));

    let route_routes = Router::new()
        .route("/{id}/route", put(process::set_product_route))
        .layer(middleware::from_fn(require_permission("process:manage")));

    read_routes.merge(manage_routes).merge(route_routes)
}

/// Extra list filters, read alongside [`SearchQuery`]
#[derive(Debug, Default, Deserialize)]
pub struct ProductListFilter {
    pub company_id: Option<i64>,
    pub product_type: Option<String>,
}

/// GET /api/products
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
    Query(filter): Query<ProductListFilter>,
) -> ApiResult<PaginatedResponse<Product>> {
    let page = query.pagination();
    let pattern = query.pattern();
    let filter = ProductFilter {
        company_id: filter.company_id,
        product_type: filter.product_type.as_deref().and_then(non_blank),
    };

    let items = db::products::list(
        &state.pool,
        query.active(),
        pattern.as_deref(),
        &filter,
        page.limit(),
        page.offset(),
    )
    .await
    .map_err(internal)?;
    let total = db::products::count(&state.pool, query.active(), pattern.as_deref(), &filter)
        .await
        .map_err(internal)?;

    Ok(Json(PaginatedResponse::from_query(items, &page, total)))
}

/// GET /api/products/{id}
pub async fn get_by_id(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Product> {
    let product = db::products::find_by_id(&state.pool, id)
        .await
        .map_err(internal)?
        .ok_or_else(|| AppError::new(ErrorCode::ProductNotFound))?;
    Ok(Json(product))
}

/// POST /api/products
pub async fn create(
    State(state): State<AppState>,
    Json(data): Json<ProductCreate>,
) -> ApiResult<Product> {
    non_blank(&data.code).ok_or_else(|| AppError::required("code"))?;
    non_blank(&data.name).ok_or_else(|| AppError::required("name"))?;
    non_blank(&data.product_type).ok_or_else(|| AppError::required("product_type"))?;

    let product = db::products::create(&state.pool, &data)
        .await
        .map_err(|e| write_error(e, ErrorCode::ProductCodeExists))?;

    tracing::info!(
        product_id = product.id,
        code = %product.code,
        product_type = %product.product_type,
        "Product created"
    );
    Ok(Json(product))
}

/// PUT /api/products/{id}
///
/// Changing `product_type` is refused while it would take an open job's
/// current step off the product's route.
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(data): Json<ProductUpdate>,
) -> ApiResult<Product> {
    for (field, value) in [
        ("code", &data.code),
        ("name", &data.name),
        ("product_type", &data.product_type),
    ] {
        if value.as_deref().is_some_and(|v| non_blank(v).is_none()) {
            return Err(AppError::required(field));
        }
    }

    let mut tx = state.pool.begin().await.map_err(internal)?;
    let product = db::products::update(&mut *tx, id, &data)
        .await
        .map_err(|e| write_error(e, ErrorCode::ProductCodeExists))?
        .ok_or_else(|| AppError::new(ErrorCode::ProductNotFound))?;

    if data.product_type.is_some() {
        let stranded = db::process::count_stranded_jobs_for_product(&mut *tx, id)
            .await
            .map_err(internal)?;
        if stranded > 0 {
            return Err(AppError::with_message(
                ErrorCode::ProcessSequenceInUse,
                "Open jobs of this product would leave their route",
            )
            .with_detail("open_jobs", stranded));
        }
    }
    tx.commit().await.map_err(internal)?;

    Ok(Json(product))
}

/// DELETE /api/products/{id}
pub async fn deactivate(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<ApiResponse<()>, AppError> {
    if !db::products::deactivate(&state.pool, id)
        .await
        .map_err(internal)?
    {
        return Err(AppError::new(ErrorCode::ProductNotFound));
    }
    tracing::info!(product_id = id, "Product deactivated");
    Ok(ApiResponse::ok())
}
