//! Purchase order database operations

use chrono::NaiveDate;
use rust_decimal::Decimal;
use shared::models::{PurchaseOrder, PurchaseOrderLine, PurchaseOrderLineInput};
use sqlx::{PgConnection, PgExecutor};

use super::BoxError;

const ORDER_COLUMNS: &str = "id, po_number, supplier_name, status, order_date, expected_date, \
                             notes, total_amount, created_by, approved_by, created_at, updated_at";

const FILTER_WHERE: &str = r#"
    WHERE ($1::text IS NULL OR status = $1)
      AND ($2::text IS NULL OR supplier_name ILIKE $2 OR po_number ILIKE $2)
"#;

pub async fn list(
    conn: impl PgExecutor<'_>,
    status: Option<&str>,
    pattern: Option<&str>,
    limit: u32,
    offset: u64,
) -> Result<Vec<PurchaseOrder>, BoxError> {
    let sql = format!(
        "SELECT {ORDER_COLUMNS} FROM purchase_orders {FILTER_WHERE} ORDER BY id DESC LIMIT $3 OFFSET $4"
    );
    let rows = sqlx::query_as::<_, PurchaseOrder>(&sql)
        .bind(status)
        .bind(pattern)
        .bind(limit as i64)
        .bind(offset as i64)
        .fetch_all(conn)
        .await?;
    Ok(rows)
}

pub async fn count(
    conn: impl PgExecutor<'_>,
    status: Option<&str>,
    pattern: Option<&str>,
) -> Result<i64, BoxError> {
    let sql = format!("SELECT COUNT(*) FROM purchase_orders {FILTER_WHERE}");
    let (count,): (i64,) = sqlx::query_as(&sql)
        .bind(status)
        .bind(pattern)
        .fetch_one(conn)
        .await?;
    Ok(count)
}

pub async fn find_by_id(
    conn: impl PgExecutor<'_>,
    id: i64,
) -> Result<Option<PurchaseOrder>, BoxError> {
    let sql = format!("SELECT {ORDER_COLUMNS} FROM purchase_orders WHERE id = $1");
    let row = sqlx::query_as::<_, PurchaseOrder>(&sql)
        .bind(id)
        .fetch_optional(conn)
        .await?;
    Ok(row)
}

/// Same as [`find_by_id`] but locks the order row
pub async fn find_for_update(
    conn: impl PgExecutor<'_>,
    id: i64,
) -> Result<Option<PurchaseOrder>, BoxError> {
    let sql = format!("SELECT {ORDER_COLUMNS} FROM purchase_orders WHERE id = $1 FOR UPDATE");
    let row = sqlx::query_as::<_, PurchaseOrder>(&sql)
        .bind(id)
        .fetch_optional(conn)
        .await?;
    Ok(row)
}

pub async fn list_lines(
    conn: impl PgExecutor<'_>,
    purchase_order_id: i64,
) -> Result<Vec<PurchaseOrderLine>, BoxError> {
    let rows = sqlx::query_as::<_, PurchaseOrderLine>(
        r#"
        SELECT l.id, l.purchase_order_id, l.item_id, i.item_code, i.name AS item_name,
               l.quantity, l.unit_price, l.received_quantity
        FROM purchase_order_lines l
        JOIN inventory_items i ON i.id = l.item_id
        WHERE l.purchase_order_id = $1
        ORDER BY l.id
        "#,
    )
    .bind(purchase_order_id)
    .fetch_all(conn)
    .await?;
    Ok(rows)
}

/// Insert values for a new purchase order header
pub struct NewPurchaseOrder<'a> {
    pub po_number: &'a str,
    pub supplier_name: &'a str,
    pub order_date: NaiveDate,
    pub expected_date: Option<NaiveDate>,
    pub notes: Option<&'a str>,
    pub total_amount: Decimal,
    pub created_by: i64,
}

pub async fn insert_order(
    conn: impl PgExecutor<'_>,
    order: &NewPurchaseOrder<'_>,
) -> Result<i64, BoxError> {
    let now = shared::util::now_millis();
    let (id,): (i64,) = sqlx::query_as(
        r#"
        INSERT INTO purchase_orders (
            po_number, supplier_name, status, order_date, expected_date, notes,
            total_amount, created_by, created_at, updated_at
        )
        VALUES ($1, $2, 'draft', $3, $4, $5, $6, $7, $8, $8)
        RETURNING id
        "#,
    )
    .bind(order.po_number)
    .bind(order.supplier_name)
    .bind(order.order_date)
    .bind(order.expected_date)
    .bind(order.notes)
    .bind(order.total_amount)
    .bind(order.created_by)
    .bind(now)
    .fetch_one(conn)
    .await?;
    Ok(id)
}

/// Replace all lines of an order
pub async fn replace_lines(
    conn: &mut PgConnection,
    purchase_order_id: i64,
    lines: &[PurchaseOrderLineInput],
) -> Result<(), BoxError> {
    sqlx::query("DELETE FROM purchase_order_lines WHERE purchase_order_id = $1")
        .bind(purchase_order_id)
        .execute(&mut *conn)
        .await?;

    for line in lines {
        sqlx::query(
            r#"
            INSERT INTO purchase_order_lines (purchase_order_id, item_id, quantity, unit_price)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(purchase_order_id)
        .bind(line.item_id)
        .bind(line.quantity)
        .bind(line.unit_price)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

/// Header changes of a draft order
pub struct OrderChanges<'a> {
    pub supplier_name: Option<&'a str>,
    pub expected_date: Option<NaiveDate>,
    pub notes: Option<&'a str>,
    pub total_amount: Option<Decimal>,
}

pub async fn update_draft(
    conn: impl PgExecutor<'_>,
    id: i64,
    changes: &OrderChanges<'_>,
) -> Result<bool, BoxError> {
    let result = sqlx::query(
        r#"
        UPDATE purchase_orders SET
            supplier_name = COALESCE($1, supplier_name),
            expected_date = COALESCE($2, expected_date),
            notes = COALESCE($3, notes),
            total_amount = COALESCE($4, total_amount),
            updated_at = $5
        WHERE id = $6 AND status = 'draft'
        "#,
    )
    .bind(changes.supplier_name)
    .bind(changes.expected_date)
    .bind(changes.notes)
    .bind(changes.total_amount)
    .bind(shared::util::now_millis())
    .bind(id)
    .execute(conn)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Conditional status change; `approved_by` is recorded when given
pub async fn set_status(
    conn: impl PgExecutor<'_>,
    id: i64,
    from: &[&str],
    to: &str,
    approved_by: Option<i64>,
) -> Result<bool, BoxError> {
    let result = sqlx::query(
        r#"
        UPDATE purchase_orders SET
            status = $1,
            approved_by = COALESCE($2, approved_by),
            updated_at = $3
        WHERE id = $4 AND status = ANY($5)
        "#,
    )
    .bind(to)
    .bind(approved_by)
    .bind(shared::util::now_millis())
    .bind(id)
    .bind(from)
    .execute(conn)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Add to a line's received quantity, refusing to exceed the ordered amount
pub async fn receive_line(
    conn: impl PgExecutor<'_>,
    line_id: i64,
    quantity: Decimal,
) -> Result<bool, BoxError> {
    let result = sqlx::query(
        r#"
        UPDATE purchase_order_lines SET received_quantity = received_quantity + $1
        WHERE id = $2 AND received_quantity + $1 <= quantity
        "#,
    )
    .bind(quantity)
    .bind(line_id)
    .execute(conn)
    .await?;
    Ok(result.rows_affected() > 0)
}
