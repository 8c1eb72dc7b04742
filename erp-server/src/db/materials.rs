//! Material database operations

use shared::models::{Material, MaterialCreate, MaterialUpdate};
use sqlx::PgExecutor;

use super::BoxError;

const COLUMNS: &str = "id, code, name, material_type, unit, gsm, is_active, created_at, updated_at";

const SEARCH_WHERE: &str = r#"
    WHERE is_active = $1
      AND ($2::text IS NULL OR code ILIKE $2 OR name ILIKE $2)
      AND ($3::text IS NULL OR material_type = $3)
"#;

pub async fn list(
    conn: impl PgExecutor<'_>,
    active: bool,
    pattern: Option<&str>,
    material_type: Option<&str>,
    limit: u32,
    offset: u64,
) -> Result<Vec<Material>, BoxError> {
    let sql = format!("SELECT {COLUMNS} FROM materials {SEARCH_WHERE} ORDER BY name LIMIT $4 OFFSET $5");
    let rows = sqlx::query_as::<_, Material>(&sql)
        .bind(active)
        .bind(pattern)
        .bind(material_type)
        .bind(limit as i64)
        .bind(offset as i64)
        .fetch_all(conn)
        .await?;
    Ok(rows)
}

pub async fn count(
    conn: impl PgExecutor<'_>,
    active: bool,
    pattern: Option<&str>,
    material_type: Option<&str>,
) -> Result<i64, BoxError> {
    let sql = format!("SELECT COUNT(*) FROM materials {SEARCH_WHERE}");
    let (count,): (i64,) = sqlx::query_as(&sql)
        .bind(active)
        .bind(pattern)
        .bind(material_type)
        .fetch_one(conn)
        .await?;
    Ok(count)
}

pub async fn find_by_id(conn: impl PgExecutor<'_>, id: i64) -> Result<Option<Material>, BoxError> {
    let sql = format!("SELECT {COLUMNS} FROM materials WHERE id = $1");
    let row = sqlx::query_as::<_, Material>(&sql)
        .bind(id)
        .fetch_optional(conn)
        .await?;
    Ok(row)
}

pub async fn create(conn: impl PgExecutor<'_>, data: &MaterialCreate) -> Result<Material, BoxError> {
    let now = shared::util::now_millis();
    let sql = format!(
        r#"
        INSERT INTO materials (
            code, name, material_type, unit, gsm, is_active, created_at, updated_at
        )
        VALUES ($1, $2, $3, $4, $5, TRUE, $6, $6)
        RETURNING {COLUMNS}
        "#
    );
    let row = sqlx::query_as::<_, Material>(&sql)
        .bind(data.code.trim())
        .bind(data.name.trim())
        .bind(data.material_type.trim())
        .bind(data.unit.trim())
        .bind(data.gsm)
        .bind(now)
        .fetch_one(conn)
        .await?;
    Ok(row)
}

pub async fn update(
    conn: impl PgExecutor<'_>,
    id: i64,
    data: &MaterialUpdate,
) -> Result<Option<Material>, BoxError> {
    let now = shared::util::now_millis();
    let sql = format!(
        r#"
        UPDATE materials SET
            code = COALESCE($1, code),
            name = COALESCE($2, name),
            material_type = COALESCE($3, material_type),
            unit = COALESCE($4, unit),
            gsm = COALESCE($5, gsm),
            is_active = COALESCE($6, is_active),
            updated_at = $7
        WHERE id = $8
        RETURNING {COLUMNS}
        "#
    );
    let row = sqlx::query_as::<_, Material>(&sql)
        .bind(data.code.as_deref().map(str::trim))
        .bind(data.name.as_deref().map(str::trim))
        .bind(data.material_type.as_deref().map(str::trim))
        .bind(data.unit.as_deref().map(str::trim))
        .bind(data.gsm)
        .bind(data.is_active)
        .bind(now)
        .bind(id)
        .fetch_optional(conn)
        .await?;
    Ok(row)
}

/// Soft delete
pub async fn deactivate(conn: impl PgExecutor<'_>, id: i64) -> Result<bool, BoxError> {
    let result = sqlx::query("UPDATE materials SET is_active = FALSE, updated_at = $1 WHERE id = $2")
        .bind(shared::util::now_millis())
        .bind(id)
        .execute(conn)
        .await?;
    Ok(result.rows_affected() > 0)
}
