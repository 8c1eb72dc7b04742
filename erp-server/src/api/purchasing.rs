//! Purchase order API

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    middleware,
    routing::{get, post, put},
};
use serde::Deserialize;
use shared::models::{
    PurchaseOrder, PurchaseOrderCreate, PurchaseOrderDetail, PurchaseOrderReceive,
    PurchaseOrderStatus, PurchaseOrderUpdate,
};
use shared::request::like_pattern;
use shared::{PaginatedResponse, PaginationQuery};

use super::{ApiResult, internal};
use crate::auth::{CurrentUser, require_permission};
use crate::db;
use crate::services::purchasing::{self, Transition};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    let read_routes = Router::new()
        .route("/", get(list))
        .route("/{id}", get(get_by_id));

    let manage_routes = Router::new()
        .route("/", post(create))
        .route("/{id}", put(update))
        .route("/{id}/submit", post(submit))
        .route("/{id}/cancel", post(cancel))
        .route("/{id}/receive", post(receive))
        .layer(middleware::from_fn(require_permission("purchasing:manage")));

    let approve_routes = Router::new()
        .route("/{id}/approve", post(approve))
        .layer(middleware::from_fn(require_permission("purchasing:approve")));

    read_routes.merge(manage_routes).merge(approve_routes)
}

#[derive(Debug, Default, Deserialize)]
pub struct OrderListFilter {
    pub status: Option<PurchaseOrderStatus>,
    /// Supplier name or PO number
    pub q: Option<String>,
}

/// GET /api/purchase-orders
pub async fn list(
    State(state): State<AppState>,
    Query(page): Query<PaginationQuery>,
    Query(filter): Query<OrderListFilter>,
) -> ApiResult<PaginatedResponse<PurchaseOrder>> {
    let status = filter.status.map(|s| s.as_db());
    let pattern = like_pattern(filter.q.as_deref());

    let items = db::purchasing::list(
        &state.pool,
        status,
        pattern.as_deref(),
        page.limit(),
        page.offset(),
    )
    .await
    .map_err(internal)?;
    let total = db::purchasing::count(&state.pool, status, pattern.as_deref())
        .await
        .map_err(internal)?;

    Ok(Json(PaginatedResponse::from_query(items, &page, total)))
}

/// GET /api/purchase-orders/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<PurchaseOrderDetail> {
    Ok(Json(purchasing::get(&state.pool, id).await?))
}

/// POST /api/purchase-orders
pub async fn create(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(data): Json<PurchaseOrderCreate>,
) -> ApiResult<PurchaseOrderDetail> {
    Ok(Json(purchasing::create(&state.pool, &user, &data).await?))
}

/// PUT /api/purchase-orders/{id}
///
/// Drafts only.
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(data): Json<PurchaseOrderUpdate>,
) -> ApiResult<PurchaseOrderDetail> {
    Ok(Json(purchasing::update(&state.pool, id, &data).await?))
}

/// POST /api/purchase-orders/{id}/submit
pub async fn submit(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> ApiResult<PurchaseOrder> {
    Ok(Json(
        purchasing::transition(&state.pool, &user, id, Transition::Submit).await?,
    ))
}

/// POST /api/purchase-orders/{id}/approve
pub async fn approve(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> ApiResult<PurchaseOrder> {
    Ok(Json(
        purchasing::transition(&state.pool, &user, id, Transition::Approve).await?,
    ))
}

/// POST /api/purchase-orders/{id}/cancel
pub async fn cancel(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> ApiResult<PurchaseOrder> {
    Ok(Json(
        purchasing::transition(&state.pool, &user, id, Transition::Cancel).await?,
    ))
}

/// POST /api/purchase-orders/{id}/receive
pub async fn receive(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    Json(data): Json<PurchaseOrderReceive>,
) -> ApiResult<PurchaseOrderDetail> {
    Ok(Json(purchasing::receive(&state.pool, &user, id, &data).await?))
}
