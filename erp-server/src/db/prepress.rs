//! Prepress job database operations

use shared::models::PrepressJob;
use sqlx::PgExecutor;

use super::BoxError;

const PREPRESS_SELECT: &str = r#"
    SELECT pj.id, pj.job_card_id, j.job_number, p.name AS product_name,
           c.name AS company_name, pj.assigned_designer_id,
           d.full_name AS designer_name, pj.status, j.priority,
           j.delivery_date AS due_date, pj.remarks, pj.started_at,
           pj.completed_at, pj.created_at, pj.updated_at
    FROM prepress_jobs pj
    JOIN job_cards j ON j.id = pj.job_card_id
    JOIN products p ON p.id = j.product_id
    JOIN companies c ON c.id = j.company_id
    LEFT JOIN users d ON d.id = pj.assigned_designer_id
"#;

pub async fn list(
    conn: impl PgExecutor<'_>,
    status: Option<&str>,
    designer_id: Option<i64>,
) -> Result<Vec<PrepressJob>, BoxError> {
    let sql = format!(
        r#"
        {PREPRESS_SELECT}
        WHERE ($1::text IS NULL OR pj.status = $1)
          AND ($2::bigint IS NULL OR pj.assigned_designer_id = $2)
        ORDER BY j.delivery_date NULLS LAST, pj.id
        "#
    );
    let rows = sqlx::query_as::<_, PrepressJob>(&sql)
        .bind(status)
        .bind(designer_id)
        .fetch_all(conn)
        .await?;
    Ok(rows)
}

pub async fn find_by_id(
    conn: impl PgExecutor<'_>,
    id: i64,
) -> Result<Option<PrepressJob>, BoxError> {
    let sql = format!("{PREPRESS_SELECT} WHERE pj.id = $1");
    let row = sqlx::query_as::<_, PrepressJob>(&sql)
        .bind(id)
        .fetch_optional(conn)
        .await?;
    Ok(row)
}

/// Open the prepress job of a job card entering Prepress
///
/// A job card returning to Prepress reopens its existing row; a designer
/// already on it stays assigned.
pub async fn open_for_job(conn: impl PgExecutor<'_>, job_card_id: i64) -> Result<(), BoxError> {
    let now = shared::util::now_millis();
    sqlx::query(
        r#"
        INSERT INTO prepress_jobs (job_card_id, status, created_at, updated_at)
        VALUES ($1, 'pending', $2, $2)
        ON CONFLICT (job_card_id) DO UPDATE SET
            status = CASE
                WHEN prepress_jobs.assigned_designer_id IS NULL THEN 'pending'
                ELSE 'assigned'
            END,
            completed_at = NULL,
            updated_at = EXCLUDED.updated_at
        "#,
    )
    .bind(job_card_id)
    .bind(now)
    .execute(conn)
    .await?;
    Ok(())
}

/// Close the open prepress job of a job card leaving Prepress
///
/// `status` is `completed` when the job moves on, `cancelled` when it is
/// cancelled. Already closed rows are left alone.
pub async fn close_for_job(
    conn: impl PgExecutor<'_>,
    job_card_id: i64,
    status: &str,
) -> Result<bool, BoxError> {
    let result = sqlx::query(
        r#"
        UPDATE prepress_jobs SET
            status = $1,
            completed_at = $2,
            updated_at = $2
        WHERE job_card_id = $3 AND status NOT IN ('completed', 'cancelled')
        "#,
    )
    .bind(status)
    .bind(shared::util::now_millis())
    .bind(job_card_id)
    .execute(conn)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Set the designer; status becomes `assigned`
///
/// Conditional on the status read by the caller.
pub async fn assign(
    conn: impl PgExecutor<'_>,
    id: i64,
    expected_status: &str,
    designer_id: i64,
    remarks: Option<&str>,
) -> Result<bool, BoxError> {
    let result = sqlx::query(
        r#"
        UPDATE prepress_jobs SET
            assigned_designer_id = $1,
            status = 'assigned',
            remarks = COALESCE($2, remarks),
            updated_at = $3
        WHERE id = $4 AND status = $5
        "#,
    )
    .bind(designer_id)
    .bind(remarks)
    .bind(shared::util::now_millis())
    .bind(id)
    .bind(expected_status)
    .execute(conn)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Conditional status change
///
/// `started_at` is only set the first time work starts; `completed_at` is
/// set when `to` is `completed`.
pub async fn set_status(
    conn: impl PgExecutor<'_>,
    id: i64,
    from: &str,
    to: &str,
    remarks: Option<&str>,
) -> Result<bool, BoxError> {
    let now = shared::util::now_millis();
    let result = sqlx::query(
        r#"
        UPDATE prepress_jobs SET
            status = $1,
            remarks = COALESCE($2, remarks),
            started_at = CASE
                WHEN $1 = 'in_progress' THEN COALESCE(started_at, $3)
                ELSE started_at
            END,
            completed_at = CASE WHEN $1 = 'completed' THEN $3 ELSE completed_at END,
            updated_at = $3
        WHERE id = $4 AND status = $5
        "#,
    )
    .bind(to)
    .bind(remarks)
    .bind(now)
    .bind(id)
    .bind(from)
    .execute(conn)
    .await?;
    Ok(result.rows_affected() > 0)
}
