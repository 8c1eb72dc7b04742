//! Inventory item and stock movement database operations

use rust_decimal::Decimal;
use shared::models::{InventoryItem, InventoryItemCreate, InventoryItemUpdate, StockMovement};
use sqlx::PgExecutor;

use super::BoxError;

const ITEM_COLUMNS: &str = "id, item_code, name, material_id, unit, location, quantity, \
                            reorder_level, unit_cost, is_active, created_at, updated_at";

const MOVEMENT_COLUMNS: &str =
    "id, item_id, kind, quantity_change, balance_after, reference, notes, user_id, created_at";

const SEARCH_WHERE: &str = r#"
    WHERE is_active = $1
      AND ($2::text IS NULL OR item_code ILIKE $2 OR name ILIKE $2)
      AND ($3::boolean IS NOT TRUE OR quantity <= reorder_level)
"#;

pub async fn list_items(
    conn: impl PgExecutor<'_>,
    active: bool,
    pattern: Option<&str>,
    low_stock: bool,
    limit: u32,
    offset: u64,
) -> Result<Vec<InventoryItem>, BoxError> {
    let sql = format!(
        "SELECT {ITEM_COLUMNS} FROM inventory_items {SEARCH_WHERE} ORDER BY item_code LIMIT $4 OFFSET $5"
    );
    let rows = sqlx::query_as::<_, InventoryItem>(&sql)
        .bind(active)
        .bind(pattern)
        .bind(low_stock)
        .bind(limit as i64)
        .bind(offset as i64)
        .fetch_all(conn)
        .await?;
    Ok(rows)
}

pub async fn count_items(
    conn: impl PgExecutor<'_>,
    active: bool,
    pattern: Option<&str>,
    low_stock: bool,
) -> Result<i64, BoxError> {
    let sql = format!("SELECT COUNT(*) FROM inventory_items {SEARCH_WHERE}");
    let (count,): (i64,) = sqlx::query_as(&sql)
        .bind(active)
        .bind(pattern)
        .bind(low_stock)
        .fetch_one(conn)
        .await?;
    Ok(count)
}

pub async fn find_item(
    conn: impl PgExecutor<'_>,
    id: i64,
) -> Result<Option<InventoryItem>, BoxError> {
    let sql = format!("SELECT {ITEM_COLUMNS} FROM inventory_items WHERE id = $1");
    let row = sqlx::query_as::<_, InventoryItem>(&sql)
        .bind(id)
        .fetch_optional(conn)
        .await?;
    Ok(row)
}

/// Locks the item row for the rest of the transaction
pub async fn lock_quantity(
    conn: impl PgExecutor<'_>,
    id: i64,
) -> Result<Option<Decimal>, BoxError> {
    let row: Option<(Decimal,)> =
        sqlx::query_as("SELECT quantity FROM inventory_items WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(conn)
            .await?;
    Ok(row.map(|(q,)| q))
}

pub async fn create_item(
    conn: impl PgExecutor<'_>,
    data: &InventoryItemCreate,
) -> Result<InventoryItem, BoxError> {
    let now = shared::util::now_millis();
    let sql = format!(
        r#"
        INSERT INTO inventory_items (
            item_code, name, material_id, unit, location, quantity,
            reorder_level, unit_cost, is_active, created_at, updated_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, TRUE, $9, $9)
        RETURNING {ITEM_COLUMNS}
        "#
    );
    let row = sqlx::query_as::<_, InventoryItem>(&sql)
        .bind(data.item_code.trim())
        .bind(data.name.trim())
        .bind(data.material_id)
        .bind(data.unit.trim())
        .bind(&data.location)
        .bind(data.quantity.unwrap_or(Decimal::ZERO))
        .bind(data.reorder_level.unwrap_or(Decimal::ZERO))
        .bind(data.unit_cost.unwrap_or(Decimal::ZERO))
        .bind(now)
        .fetch_one(conn)
        .await?;
    Ok(row)
}

/// Quantity is not editable here; it only changes through movements
pub async fn update_item(
    conn: impl PgExecutor<'_>,
    id: i64,
    data: &InventoryItemUpdate,
) -> Result<Option<InventoryItem>, BoxError> {
    let now = shared::util::now_millis();
    let sql = format!(
        r#"
        UPDATE inventory_items SET
            item_code = COALESCE($1, item_code),
            name = COALESCE($2, name),
            material_id = COALESCE($3, material_id),
            unit = COALESCE($4, unit),
            location = COALESCE($5, location),
            reorder_level = COALESCE($6, reorder_level),
            unit_cost = COALESCE($7, unit_cost),
            is_active = COALESCE($8, is_active),
            updated_at = $9
        WHERE id = $10
        RETURNING {ITEM_COLUMNS}
        "#
    );
    let row = sqlx::query_as::<_, InventoryItem>(&sql)
        .bind(data.item_code.as_deref().map(str::trim))
        .bind(data.name.as_deref().map(str::trim))
        .bind(data.material_id)
        .bind(data.unit.as_deref().map(str::trim))
        .bind(&data.location)
        .bind(data.reorder_level)
        .bind(data.unit_cost)
        .bind(data.is_active)
        .bind(now)
        .bind(id)
        .fetch_optional(conn)
        .await?;
    Ok(row)
}

pub async fn deactivate_item(conn: impl PgExecutor<'_>, id: i64) -> Result<bool, BoxError> {
    let result =
        sqlx::query("UPDATE inventory_items SET is_active = FALSE, updated_at = $1 WHERE id = $2")
            .bind(shared::util::now_millis())
            .bind(id)
            .execute(conn)
            .await?;
    Ok(result.rows_affected() > 0)
}

/// Add `delta` (may be negative) to the stock, refusing to go below zero
///
/// Returns the new balance, or `None` when the item is missing or the
/// stock is too low.
pub async fn add_quantity(
    conn: impl PgExecutor<'_>,
    id: i64,
    delta: Decimal,
) -> Result<Option<Decimal>, BoxError> {
    let row: Option<(Decimal,)> = sqlx::query_as(
        r#"
        UPDATE inventory_items SET quantity = quantity + $1, updated_at = $2
        WHERE id = $3 AND quantity + $1 >= 0
        RETURNING quantity
        "#,
    )
    .bind(delta)
    .bind(shared::util::now_millis())
    .bind(id)
    .fetch_optional(conn)
    .await?;
    Ok(row.map(|(q,)| q))
}

pub async fn set_quantity(
    conn: impl PgExecutor<'_>,
    id: i64,
    quantity: Decimal,
) -> Result<(), BoxError> {
    sqlx::query("UPDATE inventory_items SET quantity = $1, updated_at = $2 WHERE id = $3")
        .bind(quantity)
        .bind(shared::util::now_millis())
        .bind(id)
        .execute(conn)
        .await?;
    Ok(())
}

/// Movement row to append
pub struct NewMovement<'a> {
    pub item_id: i64,
    pub kind: &'a str,
    pub quantity_change: Decimal,
    pub balance_after: Decimal,
    pub reference: Option<&'a str>,
    pub notes: Option<&'a str>,
    pub user_id: i64,
}

pub async fn insert_movement(
    conn: impl PgExecutor<'_>,
    movement: &NewMovement<'_>,
) -> Result<StockMovement, BoxError> {
    let sql = format!(
        r#"
        INSERT INTO stock_movements (
            item_id, kind, quantity_change, balance_after, reference, notes,
            user_id, created_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING {MOVEMENT_COLUMNS}
        "#
    );
    let row = sqlx::query_as::<_, StockMovement>(&sql)
        .bind(movement.item_id)
        .bind(movement.kind)
        .bind(movement.quantity_change)
        .bind(movement.balance_after)
        .bind(movement.reference)
        .bind(movement.notes)
        .bind(movement.user_id)
        .bind(shared::util::now_millis())
        .fetch_one(conn)
        .await?;
    Ok(row)
}

pub async fn list_movements(
    conn: impl PgExecutor<'_>,
    item_id: i64,
    limit: u32,
    offset: u64,
) -> Result<Vec<StockMovement>, BoxError> {
    let sql = format!(
        "SELECT {MOVEMENT_COLUMNS} FROM stock_movements WHERE item_id = $1 ORDER BY id DESC LIMIT $2 OFFSET $3"
    );
    let rows = sqlx::query_as::<_, StockMovement>(&sql)
        .bind(item_id)
        .bind(limit as i64)
        .bind(offset as i64)
        .fetch_all(conn)
        .await?;
    Ok(rows)
}

pub async fn count_movements(conn: impl PgExecutor<'_>, item_id: i64) -> Result<i64, BoxError> {
    let (count,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM stock_movements WHERE item_id = $1")
            .bind(item_id)
            .fetch_one(conn)
            .await?;
    Ok(count)
}
