//! Dashboard aggregates

use chrono::NaiveDate;
use shared::models::{CountByKey, DashboardSummary};
use sqlx::PgPool;

use super::BoxError;

/// Days ahead counted as "due soon"
const DUE_SOON_DAYS: i32 = 7;

pub async fn summary(pool: &PgPool, today: NaiveDate) -> Result<DashboardSummary, BoxError> {
    let jobs_by_status = sqlx::query_as::<_, CountByKey>(
        r#"
        SELECT status AS key, COUNT(*) AS count
        FROM job_cards
        WHERE status NOT IN ('completed', 'cancelled')
        GROUP BY status
        ORDER BY status
        "#,
    )
    .fetch_all(pool)
    .await?;

    let jobs_by_department = sqlx::query_as::<_, CountByKey>(
        r#"
        SELECT current_department AS key, COUNT(*) AS count
        FROM job_cards
        WHERE status NOT IN ('completed', 'cancelled') AND current_department IS NOT NULL
        GROUP BY current_department
        ORDER BY current_department
        "#,
    )
    .fetch_all(pool)
    .await?;

    let (jobs_due_soon, jobs_overdue): (i64, i64) = sqlx::query_as(
        r#"
        SELECT
            COUNT(*) FILTER (WHERE delivery_date >= $1 AND delivery_date <= $1 + $2),
            COUNT(*) FILTER (WHERE delivery_date < $1)
        FROM job_cards
        WHERE status NOT IN ('completed', 'cancelled')
        "#,
    )
    .bind(today)
    .bind(DUE_SOON_DAYS)
    .fetch_one(pool)
    .await?;

    let (low_stock_items,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM inventory_items WHERE is_active AND quantity <= reorder_level",
    )
    .fetch_one(pool)
    .await?;

    let (pending_purchase_orders,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM purchase_orders WHERE status IN ('submitted', 'approved', 'partially_received')",
    )
    .fetch_one(pool)
    .await?;

    Ok(DashboardSummary {
        jobs_by_status,
        jobs_by_department,
        jobs_due_soon,
        jobs_overdue,
        low_stock_items,
        pending_purchase_orders,
    })
}
