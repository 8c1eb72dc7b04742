//! Inventory API: stock items and their movement ledger

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    middleware,
    routing::{get, post, put},
};
use rust_decimal::Decimal;
use serde::Deserialize;
use shared::error::{AppError, ApiResponse, ErrorCode};
use shared::models::{
    InventoryItem, InventoryItemCreate, InventoryItemUpdate, StockMovement, StockMovementCreate,
    StockMovementKind,
};
use shared::{PaginatedResponse, PaginationQuery, SearchQuery};

use super::{ApiResult, internal};
use crate::auth::{CurrentUser, require_permission};
use crate::db;
use crate::db::inventory::NewMovement;
use crate::error::write_error;
use crate::services::inventory;
use crate::state::AppState;
use crate::util::non_blank;

pub fn router() -> Router<AppState> {
    let read_routes = Router::new()
        .route("/items", get(list_items))
        .route("/items/{id}", get(get_item))
        .route("/items/{id}/movements", get(list_movements));

    let manage_routes = Router::new()
        .route("/items", post(create_item))
        .route("/items/{id}", put(update_item).delete(deactivate_item))
        .route("/items/{id}/movements", post(record_movement))
        .layer(middleware::from_fn(require_permission("inventory:manage")));

    read_routes.merge(manage_routes)
}

#[derive(Debug, Default, Deserialize)]
pub struct ItemListFilter {
    /// Only items at or below their reorder level
    #[serde(default)]
    pub low_stock: bool,
}

/// GET /api/inventory/items
pub async fn list_items(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
    Query(filter): Query<ItemListFilter>,
) -> ApiResult<PaginatedResponse<InventoryItem>> {
    let page = query.pagination();
    let pattern = query.pattern();

    let items = db::inventory::list_items(
        &state.pool,
        query.active(),
        pattern.as_deref(),
        filter.low_stock,
        page.limit(),
        page.offset(),
    )
    .await
    .map_err(internal)?;
    let total = db::inventory::count_items(
        &state.pool,
        query.active(),
        pattern.as_deref(),
        filter.low_stock,
    )
    .await
    .map_err(internal)?;

    Ok(Json(PaginatedResponse::from_query(items, &page, total)))
}

/// GET /api/inventory/items/{id}
pub async fn get_item(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<InventoryItem> {
    let item = db::inventory::find_item(&state.pool, id)
        .await
        .map_err(internal)?
        .ok_or_else(|| AppError::new(ErrorCode::InventoryItemNotFound))?;
    Ok(Json(item))
}

fn check_non_negative(field: &str, value: Option<Decimal>) -> Result<(), AppError> {
    match value {
        Some(v) if v < Decimal::ZERO => Err(AppError::with_message(
            ErrorCode::ValueOutOfRange,
            format!("{field} cannot be negative"),
        )
        .with_detail("field", field)),
        _ => Ok(()),
    }
}

/// POST /api/inventory/items
///
/// A positive opening quantity is booked as an `adjustment` movement.
pub async fn create_item(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(data): Json<InventoryItemCreate>,
) -> ApiResult<InventoryItem> {
    non_blank(&data.item_code).ok_or_else(|| AppError::required("item_code"))?;
    non_blank(&data.name).ok_or_else(|| AppError::required("name"))?;
    non_blank(&data.unit).ok_or_else(|| AppError::required("unit"))?;
    check_non_negative("quantity", data.quantity)?;
    check_non_negative("reorder_level", data.reorder_level)?;
    check_non_negative("unit_cost", data.unit_cost)?;

    let mut tx = state.pool.begin().await.map_err(internal)?;
    let item = db::inventory::create_item(&mut *tx, &data)
        .await
        .map_err(|e| write_error(e, ErrorCode::ItemCodeExists))?;

    if item.quantity > Decimal::ZERO {
        db::inventory::insert_movement(
            &mut *tx,
            &NewMovement {
                item_id: item.id,
                kind: StockMovementKind::Adjustment.as_db(),
                quantity_change: item.quantity,
                balance_after: item.quantity,
                reference: Some("opening balance"),
                notes: None,
                user_id: user.id,
            },
        )
        .await
        .map_err(internal)?;
    }
    tx.commit().await.map_err(internal)?;

    tracing::info!(item_id = item.id, item_code = %item.item_code, "Inventory item created");
    Ok(Json(item))
}

/// PUT /api/inventory/items/{id}
///
/// Quantity is not editable here; post a movement instead.
pub async fn update_item(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(data): Json<InventoryItemUpdate>,
) -> ApiResult<InventoryItem> {
    for (field, value) in [
        ("item_code", &data.item_code),
        ("name", &data.name),
        ("unit", &data.unit),
    ] {
        if value.as_deref().is_some_and(|v| non_blank(v).is_none()) {
            return Err(AppError::required(field));
        }
    }
    check_non_negative("reorder_level", data.reorder_level)?;
    check_non_negative("unit_cost", data.unit_cost)?;

    let item = db::inventory::update_item(&state.pool, id, &data)
        .await
        .map_err(|e| write_error(e, ErrorCode::ItemCodeExists))?
        .ok_or_else(|| AppError::new(ErrorCode::InventoryItemNotFound))?;
    Ok(Json(item))
}

/// DELETE /api/inventory/items/{id}
pub async fn deactivate_item(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<ApiResponse<()>, AppError> {
    if !db::inventory::deactivate_item(&state.pool, id)
        .await
        .map_err(internal)?
    {
        return Err(AppError::new(ErrorCode::InventoryItemNotFound));
    }
    tracing::info!(item_id = id, "Inventory item deactivated");
    Ok(ApiResponse::ok())
}

/// POST /api/inventory/items/{id}/movements
pub async fn record_movement(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    Json(data): Json<StockMovementCreate>,
) -> ApiResult<StockMovement> {
    Ok(Json(
        inventory::record_movement(&state.pool, &user, id, &data).await?,
    ))
}

/// GET /api/inventory/items/{id}/movements
///
/// Newest first.
pub async fn list_movements(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(page): Query<PaginationQuery>,
) -> ApiResult<PaginatedResponse<StockMovement>> {
    db::inventory::find_item(&state.pool, id)
        .await
        .map_err(internal)?
        .ok_or_else(|| AppError::new(ErrorCode::InventoryItemNotFound))?;

    let items = db::inventory::list_movements(&state.pool, id, page.limit(), page.offset())
        .await
        .map_err(internal)?;
    let total = db::inventory::count_movements(&state.pool, id)
        .await
        .map_err(internal)?;

    Ok(Json(PaginatedResponse::from_query(items, &page, total)))
}
