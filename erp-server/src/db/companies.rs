//! Company (customer) database operations

use shared::models::{Company, CompanyCreate, CompanyUpdate};
use sqlx::PgExecutor;

use super::BoxError;

const COLUMNS: &str = "id, code, name, contact_person, email, phone, address, \
                       is_active, created_at, updated_at";

const SEARCH_WHERE: &str = "WHERE is_active = $1 AND ($2::text IS NULL OR code ILIKE $2 OR name ILIKE $2)";

pub async fn list(
    conn: impl PgExecutor<'_>,
    active: bool,
    pattern: Option<&str>,
    limit: u32,
    offset: u64,
) -> Result<Vec<Company>, BoxError> {
    let sql = format!("SELECT {COLUMNS} FROM companies {SEARCH_WHERE} ORDER BY name LIMIT $3 OFFSET $4");
    let rows = sqlx::query_as::<_, Company>(&sql)
        .bind(active)
        .bind(pattern)
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
) -> Result<i64, BoxError> {
    let sql = format!("SELECT COUNT(*) FROM companies {SEARCH_WHERE}");
    let (count,): (i64,) = sqlx::query_as(&sql)
        .bind(active)
        .bind(pattern)
        .fetch_one(conn)
        .await?;
    Ok(count)
}

pub async fn find_by_id(conn: impl PgExecutor<'_>, id: i64) -> Result<Option<Company>, BoxError> {
    let sql = format!("SELECT {COLUMNS} FROM companies WHERE id = $1");
    let row = sqlx::query_as::<_, Company>(&sql)
        .bind(id)
        .fetch_optional(conn)
        .await?;
    Ok(row)
}

pub async fn create(conn: impl PgExecutor<'_>, data: &CompanyCreate) -> Result<Company, BoxError> {
    let now = shared::util::now_millis();
    let sql = format!(
        r#"
        INSERT INTO companies (
            code, name, contact_person, email, phone, address,
            is_active, created_at, updated_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, TRUE, $7, $7)
        RETURNING {COLUMNS}
        "#
    );
    let row = sqlx::query_as::<_, Company>(&sql)
        .bind(data.code.trim())
        .bind(data.name.trim())
        .bind(&data.contact_person)
        .bind(&data.email)
        .bind(&data.phone)
        .bind(&data.address)
        .bind(now)
        .fetch_one(conn)
        .await?;
    Ok(row)
}

pub async fn update(
    conn: impl PgExecutor<'_>,
    id: i64,
    data: &CompanyUpdate,
) -> Result<Option<Company>, BoxError> {
    let now = shared::util::now_millis();
    let sql = format!(
        r#"
        UPDATE companies SET
            code = COALESCE($1, code),
            name = COALESCE($2, name),
            contact_person = COALESCE($3, contact_person),
            email = COALESCE($4, email),
            phone = COALESCE($5, phone),
            address = COALESCE($6, address),
            is_active = COALESCE($7, is_active),
            updated_at = $8
        WHERE id = $9
        RETURNING {COLUMNS}
        "#
    );
    let row = sqlx::query_as::<_, Company>(&sql)
        .bind(data.code.as_deref().map(str::trim))
        .bind(data.name.as_deref().map(str::trim))
        .bind(&data.contact_person)
        .bind(&data.email)
        .bind(&data.phone)
        .bind(&data.address)
        .bind(data.is_active)
        .bind(now)
        .bind(id)
        .fetch_optional(conn)
        .await?;
    Ok(row)
}

/// Soft delete
pub async fn deactivate(conn: impl PgExecutor<'_>, id: i64) -> Result<bool, BoxError> {
    let result = sqlx::query("UPDATE companies SET is_active = FALSE, updated_at = $1 WHERE id = $2")
        .bind(shared::util::now_millis())
        .bind(id)
        .execute(conn)
        .await?;
    Ok(result.rows_affected() > 0)
}
