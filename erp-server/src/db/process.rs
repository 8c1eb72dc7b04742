//! Process sequence database operations

use shared::models::{ProcessSequence, ProcessStep, ProcessStepInput, RouteStep};
use sqlx::{PgConnection, PgExecutor};

use super::BoxError;

const SEQUENCE_COLUMNS: &str = "id, product_type, description, created_at, updated_at";
const STEP_COLUMNS: &str = "id, sequence_id, step_order, step_name, department, is_compulsory";

pub async fn list_sequences(conn: impl PgExecutor<'_>) -> Result<Vec<ProcessSequence>, BoxError> {
    let sql = format!("SELECT {SEQUENCE_COLUMNS} FROM process_sequences ORDER BY product_type");
    let rows = sqlx::query_as::<_, ProcessSequence>(&sql)
        .fetch_all(conn)
        .await?;
    Ok(rows)
}

pub async fn find_sequence(
    conn: impl PgExecutor<'_>,
    id: i64,
) -> Result<Option<ProcessSequence>, BoxError> {
    let sql = format!("SELECT {SEQUENCE_COLUMNS} FROM process_sequences WHERE id = $1");
    let row = sqlx::query_as::<_, ProcessSequence>(&sql)
        .bind(id)
        .fetch_optional(conn)
        .await?;
    Ok(row)
}

/// Steps of every sequence, ordered by sequence then `step_order`
pub async fn list_all_steps(conn: impl PgExecutor<'_>) -> Result<Vec<ProcessStep>, BoxError> {
    let sql = format!("SELECT {STEP_COLUMNS} FROM process_steps ORDER BY sequence_id, step_order");
    let rows = sqlx::query_as::<_, ProcessStep>(&sql).fetch_all(conn).await?;
    Ok(rows)
}

pub async fn list_steps(
    conn: impl PgExecutor<'_>,
    sequence_id: i64,
) -> Result<Vec<ProcessStep>, BoxError> {
    let sql = format!(
        "SELECT {STEP_COLUMNS} FROM process_steps WHERE sequence_id = $1 ORDER BY step_order"
    );
    let rows = sqlx::query_as::<_, ProcessStep>(&sql)
        .bind(sequence_id)
        .fetch_all(conn)
        .await?;
    Ok(rows)
}

pub async fn create_sequence(
    conn: impl PgExecutor<'_>,
    product_type: &str,
    description: Option<&str>,
) -> Result<ProcessSequence, BoxError> {
    let now = shared::util::now_millis();
    let sql = format!(
        r#"
        INSERT INTO process_sequences (product_type, description, created_at, updated_at)
        VALUES ($1, $2, $3, $3)
        RETURNING {SEQUENCE_COLUMNS}
        "#
    );
    let row = sqlx::query_as::<_, ProcessSequence>(&sql)
        .bind(product_type)
        .bind(description)
        .bind(now)
        .fetch_one(conn)
        .await?;
    Ok(row)
}

pub async fn touch_sequence(
    conn: impl PgExecutor<'_>,
    id: i64,
    description: Option<&str>,
) -> Result<bool, BoxError> {
    let result = sqlx::query(
        "UPDATE process_sequences SET description = COALESCE($1, description), updated_at = $2 WHERE id = $3",
    )
    .bind(description)
    .bind(shared::util::now_millis())
    .bind(id)
    .execute(conn)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Replace the steps of a sequence, keeping the ids of steps whose name
/// survives so product selections stay attached.
///
/// `(sequence_id, step_order)` is a deferred constraint, so reordering
/// inside the transaction does not trip it.
pub async fn replace_steps(
    conn: &mut PgConnection,
    sequence_id: i64,
    steps: &[ProcessStepInput],
) -> Result<Vec<ProcessStep>, BoxError> {
    let names: Vec<&str> = steps.iter().map(|s| s.step_name.trim()).collect();
    sqlx::query("DELETE FROM process_steps WHERE sequence_id = $1 AND step_name <> ALL($2)")
        .bind(sequence_id)
        .bind(&names)
        .execute(&mut *conn)
        .await?;

    for (idx, step) in steps.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO process_steps (sequence_id, step_order, step_name, department, is_compulsory)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (sequence_id, step_name) DO UPDATE SET
                step_order = EXCLUDED.step_order,
                department = EXCLUDED.department,
                is_compulsory = EXCLUDED.is_compulsory
            "#,
        )
        .bind(sequence_id)
        .bind(idx as i32 + 1)
        .bind(step.step_name.trim())
        .bind(step.department.trim())
        .bind(step.is_compulsory)
        .execute(&mut *conn)
        .await?;
    }

    list_steps(&mut *conn, sequence_id).await
}

pub async fn delete_sequence(conn: impl PgExecutor<'_>, id: i64) -> Result<bool, BoxError> {
    let result = sqlx::query("DELETE FROM process_sequences WHERE id = $1")
        .bind(id)
        .execute(conn)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Open jobs routed by this sequence
pub async fn count_open_jobs(conn: impl PgExecutor<'_>, sequence_id: i64) -> Result<i64, BoxError> {
    let (count,): (i64,) = sqlx::query_as(
        r#"
        SELECT COUNT(*)
        FROM job_cards j
        JOIN products p ON p.id = j.product_id
        JOIN process_sequences ps ON ps.product_type = p.product_type
        WHERE ps.id = $1
          AND j.status NOT IN ('completed', 'cancelled')
        "#,
    )
    .bind(sequence_id)
    .fetch_one(conn)
    .await?;
    Ok(count)
}

/// Open jobs whose current step is no longer on their product's route
/// (no sequence, step missing, or optional and not selected)
const STRANDED_JOBS: &str = r#"
    SELECT COUNT(*)
    FROM job_cards j
    JOIN products p ON p.id = j.product_id
    LEFT JOIN process_sequences ps ON ps.product_type = p.product_type
    WHERE j.status NOT IN ('completed', 'cancelled')
      AND j.current_step IS NOT NULL
      AND NOT EXISTS (
          SELECT 1
          FROM process_steps s
          LEFT JOIN product_process_selections sel
                 ON sel.product_id = p.id AND sel.step_id = s.id
          WHERE s.sequence_id = ps.id
            AND s.step_name = j.current_step
            AND (s.is_compulsory OR COALESCE(sel.is_selected, FALSE))
      )
"#;

pub async fn count_stranded_jobs_for_sequence(
    conn: impl PgExecutor<'_>,
    sequence_id: i64,
) -> Result<i64, BoxError> {
    let sql = format!("{STRANDED_JOBS} AND ps.id = $1");
    let (count,): (i64,) = sqlx::query_as(&sql)
        .bind(sequence_id)
        .fetch_one(conn)
        .await?;
    Ok(count)
}

pub async fn count_stranded_jobs_for_product(
    conn: impl PgExecutor<'_>,
    product_id: i64,
) -> Result<i64, BoxError> {
    let sql = format!("{STRANDED_JOBS} AND p.id = $1");
    let (count,): (i64,) = sqlx::query_as(&sql)
        .bind(product_id)
        .fetch_one(conn)
        .await?;
    Ok(count)
}

/// All steps of the product's sequence with the product's selection
/// (unfiltered; see `services::workflow::build_route`)
pub async fn product_route_steps(
    conn: impl PgExecutor<'_>,
    product_id: i64,
) -> Result<Vec<RouteStep>, BoxError> {
    let rows = sqlx::query_as::<_, RouteStep>(
        r#"
        SELECT s.id AS step_id, s.step_order, s.step_name, s.department,
               s.is_compulsory, sel.is_selected
        FROM products p
        JOIN process_sequences ps ON ps.product_type = p.product_type
        JOIN process_steps s ON s.sequence_id = ps.id
        LEFT JOIN product_process_selections sel
               ON sel.product_id = p.id AND sel.step_id = s.id
        WHERE p.id = $1
        ORDER BY s.step_order
        "#,
    )
    .bind(product_id)
    .fetch_all(conn)
    .await?;
    Ok(rows)
}

pub async fn upsert_selection(
    conn: impl PgExecutor<'_>,
    product_id: i64,
    step_id: i64,
    is_selected: bool,
) -> Result<(), BoxError> {
    sqlx::query(
        r#"
        INSERT INTO product_process_selections (product_id, step_id, is_selected)
        VALUES ($1, $2, $3)
        ON CONFLICT (product_id, step_id) DO UPDATE SET is_selected = EXCLUDED.is_selected
        "#,
    )
    .bind(product_id)
    .bind(step_id)
    .bind(is_selected)
    .execute(conn)
    .await?;
    Ok(())
}
