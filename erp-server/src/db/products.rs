//! Product database operations

use shared::models::{Product, ProductCreate, ProductUpdate};
use sqlx::PgExecutor;

use super::BoxError;

const COLUMNS: &str = "id, code, name, product_type, company_id, description, \
                       is_active, created_at, updated_at";

const SEARCH_WHERE: &str = r#"
    WHERE is_active = $1
      AND ($2::text IS NULL OR code ILIKE $2 OR name ILIKE $2)
      AND ($3::bigint IS NULL OR company_id = $3)
      AND ($4::text IS NULL OR product_type = $4)
"#;

/// Product list filters beyond search / active
#[derive(Debug, Default)]
pub struct ProductFilter<'a> {
    pub company_id: Option<i64>,
    pub product_type: Option<&'a str>,
}

pub async fn list(
    conn: impl PgExecutor<'_>,
    active: bool,
    pattern: Option<&str>,
    filter: &ProductFilter<'_>,
    limit: u32,
    offset: u64,
) -> Result<Vec<Product>, BoxError> {
    let sql = format!("SELECT {COLUMNS} FROM products {SEARCH_WHERE} ORDER BY name LIMIT $5 OFFSET $6");
    let rows = sqlx::query_as::<_, Product>(&sql)
        .bind(active)
        .bind(pattern)
        .bind(filter.company_id)
        .bind(filter.product_type)
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
    filter: &ProductFilter<'_>,
) -> Result<i64, BoxError> {
    let sql = format!("SELECT COUNT(*) FROM products {SEARCH_WHERE}");
    let (count,): (i64,) = sqlx::query_as(&sql)
        .bind(active)
        .bind(pattern)
        .bind(filter.company_id)
        .bind(filter.product_type)
        .fetch_one(conn)
        .await?;
    Ok(count)
}

pub async fn find_by_id(conn: impl PgExecutor<'_>, id: i64) -> Result<Option<Product>, BoxError> {
    let sql = format!("SELECT {COLUMNS} FROM products WHERE id = $1");
    let row = sqlx::query_as::<_, Product>(&sql)
        .bind(id)
        .fetch_optional(conn)
        .await?;
    Ok(row)
}

pub async fn create(conn: impl PgExecutor<'_>, data: &ProductCreate) -> Result<Product, BoxError> {
    let now = shared::util::now_millis();
    let sql = format!(
        r#"
        INSERT INTO products (
            code, name, product_type, company_id, description,
            is_active, created_at, updated_at
        )
        VALUES ($1, $2, $3, $4, $5, TRUE, $6, $6)
        RETURNING {COLUMNS}
        "#
    );
    let row = sqlx::query_as::<_, Product>(&sql)
        .bind(data.code.trim())
        .bind(data.name.trim())
        .bind(data.product_type.trim())
        .bind(data.company_id)
        .bind(&data.description)
        .bind(now)
        .fetch_one(conn)
        .await?;
    Ok(row)
}

pub async fn update(
    conn: impl PgExecutor<'_>,
    id: i64,
    data: &ProductUpdate,
) -> Result<Option<Product>, BoxError> {
    let now = shared::util::now_millis();
    let sql = format!(
        r#"
        UPDATE products SET
            code = COALESCE($1, code),
            name = COALESCE($2, name),
            product_type = COALESCE($3, product_type),
            company_id = COALESCE($4, company_id),
            description = COALESCE($5, description),
            is_active = COALESCE($6, is_active),
            updated_at = $7
        WHERE id = $8
        RETURNING {COLUMNS}
        "#
    );
    let row = sqlx::query_as::<_, Product>(&sql)
        .bind(data.code.as_deref().map(str::trim))
        .bind(data.name.as_deref().map(str::trim))
        .bind(data.product_type.as_deref().map(str::trim))
        .bind(data.company_id)
        .bind(&data.description)
        .bind(data.is_active)
        .bind(now)
        .bind(id)
        .fetch_optional(conn)
        .await?;
    Ok(row)
}

/// Soft delete
pub async fn deactivate(conn: impl PgExecutor<'_>, id: i64) -> Result<bool, BoxError> {
    let result = sqlx::query("UPDATE products SET is_active = FALSE, updated_at = $1 WHERE id = $2")
        .bind(shared::util::now_millis())
        .bind(id)
        .execute(conn)
        .await?;
    Ok(result.rows_affected() > 0)
}
