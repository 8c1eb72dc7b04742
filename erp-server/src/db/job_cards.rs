//! Job card and job history database operations

use chrono::NaiveDate;
use shared::models::{JobCard, JobCardUpdate, JobHistoryEntry};
use sqlx::PgExecutor;

use super::BoxError;

const JOB_SELECT: &str = r#"
    SELECT j.id, j.job_number, j.company_id, c.name AS company_name,
           j.product_id, p.name AS product_name, j.po_number, j.quantity,
           j.delivery_date, j.priority, j.status, j.current_department,
           j.current_step, j.notes, j.created_by, j.created_at, j.updated_at,
           j.completed_at
    FROM job_cards j
    JOIN companies c ON c.id = j.company_id
    JOIN products p ON p.id = j.product_id
"#;

/// List filters
#[derive(Debug, Default)]
pub struct JobFilter<'a> {
    pub status: Option<&'a str>,
    pub department: Option<&'a str>,
    pub company_id: Option<i64>,
    pub priority: Option<&'a str>,
    /// ILIKE pattern over job number and customer PO
    pub pattern: Option<String>,
}

const FILTER_WHERE: &str = r#"
    WHERE ($1::text IS NULL OR j.status = $1)
      AND ($2::text IS NULL OR LOWER(j.current_department) = LOWER($2))
      AND ($3::bigint IS NULL OR j.company_id = $3)
      AND ($4::text IS NULL OR j.priority = $4)
      AND ($5::text IS NULL OR j.job_number ILIKE $5 OR j.po_number ILIKE $5)
"#;

pub async fn list(
    conn: impl PgExecutor<'_>,
    filter: &JobFilter<'_>,
    limit: u32,
    offset: u64,
) -> Result<Vec<JobCard>, BoxError> {
    let sql = format!(
        "{JOB_SELECT} {FILTER_WHERE} ORDER BY j.created_at DESC, j.id DESC LIMIT $6 OFFSET $7"
    );
    let rows = sqlx::query_as::<_, JobCard>(&sql)
        .bind(filter.status)
        .bind(filter.department)
        .bind(filter.company_id)
        .bind(filter.priority)
        .bind(&filter.pattern)
        .bind(limit as i64)
        .bind(offset as i64)
        .fetch_all(conn)
        .await?;
    Ok(rows)
}

pub async fn count(conn: impl PgExecutor<'_>, filter: &JobFilter<'_>) -> Result<i64, BoxError> {
    let sql = format!("SELECT COUNT(*) FROM job_cards j {FILTER_WHERE}");
    let (count,): (i64,) = sqlx::query_as(&sql)
        .bind(filter.status)
        .bind(filter.department)
        .bind(filter.company_id)
        .bind(filter.priority)
        .bind(&filter.pattern)
        .fetch_one(conn)
        .await?;
    Ok(count)
}

/// Open (pending / in progress / on hold) jobs waiting in a department,
/// most urgent and earliest due first
pub async fn list_department_queue(
    conn: impl PgExecutor<'_>,
    department: &str,
) -> Result<Vec<JobCard>, BoxError> {
    let sql = format!(
        r#"
        {JOB_SELECT}
        WHERE LOWER(j.current_department) = LOWER($1)
          AND j.status IN ('pending', 'in_progress', 'on_hold')
        ORDER BY CASE j.priority
                     WHEN 'urgent' THEN 0 WHEN 'high' THEN 1
                     WHEN 'normal' THEN 2 ELSE 3
                 END,
                 j.delivery_date NULLS LAST,
                 j.id
        "#
    );
    let rows = sqlx::query_as::<_, JobCard>(&sql)
        .bind(department.trim())
        .fetch_all(conn)
        .await?;
    Ok(rows)
}

pub async fn find_by_id(conn: impl PgExecutor<'_>, id: i64) -> Result<Option<JobCard>, BoxError> {
    let sql = format!("{JOB_SELECT} WHERE j.id = $1");
    let row = sqlx::query_as::<_, JobCard>(&sql)
        .bind(id)
        .fetch_optional(conn)
        .await?;
    Ok(row)
}

/// Insert values for a new job card
pub struct NewJobCard<'a> {
    pub job_number: &'a str,
    pub company_id: i64,
    pub product_id: i64,
    pub po_number: Option<&'a str>,
    pub quantity: i32,
    pub delivery_date: Option<NaiveDate>,
    pub priority: &'a str,
    pub current_department: &'a str,
    pub current_step: &'a str,
    pub notes: Option<&'a str>,
    pub created_by: i64,
}

pub async fn insert(conn: impl PgExecutor<'_>, job: &NewJobCard<'_>) -> Result<i64, BoxError> {
    let now = shared::util::now_millis();
    let (id,): (i64,) = sqlx::query_as(
        r#"
        INSERT INTO job_cards (
            job_number, company_id, product_id, po_number, quantity, delivery_date,
            priority, status, current_department, current_step, notes, created_by,
            created_at, updated_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, 'pending', $8, $9, $10, $11, $12, $12)
        RETURNING id
        "#,
    )
    .bind(job.job_number)
    .bind(job.company_id)
    .bind(job.product_id)
    .bind(job.po_number)
    .bind(job.quantity)
    .bind(job.delivery_date)
    .bind(job.priority)
    .bind(job.current_department)
    .bind(job.current_step)
    .bind(job.notes)
    .bind(job.created_by)
    .bind(now)
    .fetch_one(conn)
    .await?;
    Ok(id)
}

/// Update metadata of an open job; `false` when the job is closed or missing
pub async fn update_details(
    conn: impl PgExecutor<'_>,
    id: i64,
    data: &JobCardUpdate,
) -> Result<bool, BoxError> {
    let result = sqlx::query(
        r#"
        UPDATE job_cards SET
            po_number = COALESCE($1, po_number),
            quantity = COALESCE($2, quantity),
            delivery_date = COALESCE($3, delivery_date),
            priority = COALESCE($4, priority),
            notes = COALESCE($5, notes),
            updated_at = $6
        WHERE id = $7 AND status NOT IN ('completed', 'cancelled')
        "#,
    )
    .bind(&data.po_number)
    .bind(data.quantity)
    .bind(data.delivery_date)
    .bind(data.priority.map(|p| p.as_db()))
    .bind(&data.notes)
    .bind(shared::util::now_millis())
    .bind(id)
    .execute(conn)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Target of a step move
pub struct StepMove<'a> {
    pub expected_step: &'a str,
    pub next_step: Option<&'a str>,
    pub next_department: Option<&'a str>,
    pub status: &'a str,
}

/// Move the job off `expected_step`
///
/// Returns `false` when the row no longer sits on `expected_step` in an
/// advanceable status, i.e. somebody else moved it first.
pub async fn move_step(
    conn: impl PgExecutor<'_>,
    id: i64,
    step: &StepMove<'_>,
) -> Result<bool, BoxError> {
    let now = shared::util::now_millis();
    let completed_at = step.next_step.is_none().then_some(now);
    let result = sqlx::query(
        r#"
        UPDATE job_cards SET
            current_step = $1,
            current_department = $2,
            status = $3,
            completed_at = COALESCE($4, completed_at),
            updated_at = $5
        WHERE id = $6
          AND current_step = $7
          AND status IN ('pending', 'in_progress')
        "#,
    )
    .bind(step.next_step)
    .bind(step.next_department)
    .bind(step.status)
    .bind(completed_at)
    .bind(now)
    .bind(id)
    .bind(step.expected_step)
    .execute(conn)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Conditional status change; `false` when the current status is not in `from`
pub async fn set_status(
    conn: impl PgExecutor<'_>,
    id: i64,
    from: &[&str],
    to: &str,
) -> Result<bool, BoxError> {
    let result = sqlx::query(
        "UPDATE job_cards SET status = $1, updated_at = $2 WHERE id = $3 AND status = ANY($4)",
    )
    .bind(to)
    .bind(shared::util::now_millis())
    .bind(id)
    .bind(from)
    .execute(conn)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// History row to append
pub struct HistoryRecord<'a> {
    pub job_card_id: i64,
    pub action: &'a str,
    pub from_department: Option<&'a str>,
    pub to_department: Option<&'a str>,
    pub status: &'a str,
    pub remarks: Option<&'a str>,
    pub user_id: i64,
}

pub async fn insert_history(
    conn: impl PgExecutor<'_>,
    record: &HistoryRecord<'_>,
) -> Result<(), BoxError> {
    sqlx::query(
        r#"
        INSERT INTO job_history (
            job_card_id, action, from_department, to_department, status,
            remarks, user_id, created_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        "#,
    )
    .bind(record.job_card_id)
    .bind(record.action)
    .bind(record.from_department)
    .bind(record.to_department)
    .bind(record.status)
    .bind(record.remarks)
    .bind(record.user_id)
    .bind(shared::util::now_millis())
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn list_history(
    conn: impl PgExecutor<'_>,
    job_card_id: i64,
) -> Result<Vec<JobHistoryEntry>, BoxError> {
    let rows = sqlx::query_as::<_, JobHistoryEntry>(
        r#"
        SELECT h.id, h.job_card_id, h.action, h.from_department, h.to_department,
               h.status, h.remarks, h.user_id, u.username, h.created_at
        FROM job_history h
        LEFT JOIN users u ON u.id = h.user_id
        WHERE h.job_card_id = $1
        ORDER BY h.id
        "#,
    )
    .bind(job_card_id)
    .fetch_all(conn)
    .await?;
    Ok(rows)
}
