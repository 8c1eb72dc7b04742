//! Role database operations

use shared::models::{Role, RoleCreate, RoleUpdate};
use sqlx::PgExecutor;
use sqlx::types::Json;

use super::BoxError;

const ROLE_COLUMNS: &str =
    "id, name, description, permissions, is_system, is_active, created_at";

pub async fn list(conn: impl PgExecutor<'_>) -> Result<Vec<Role>, BoxError> {
    let sql = format!("SELECT {ROLE_COLUMNS} FROM roles ORDER BY id");
    let rows = sqlx::query_as::<_, Role>(&sql).fetch_all(conn).await?;
    Ok(rows)
}

pub async fn find_by_id(conn: impl PgExecutor<'_>, id: i64) -> Result<Option<Role>, BoxError> {
    let sql = format!("SELECT {ROLE_COLUMNS} FROM roles WHERE id = $1");
    let row = sqlx::query_as::<_, Role>(&sql)
        .bind(id)
        .fetch_optional(conn)
        .await?;
    Ok(row)
}

pub async fn find_by_name(
    conn: impl PgExecutor<'_>,
    name: &str,
) -> Result<Option<Role>, BoxError> {
    let sql = format!("SELECT {ROLE_COLUMNS} FROM roles WHERE name = $1");
    let row = sqlx::query_as::<_, Role>(&sql)
        .bind(name)
        .fetch_optional(conn)
        .await?;
    Ok(row)
}

pub async fn create(conn: impl PgExecutor<'_>, data: &RoleCreate) -> Result<Role, BoxError> {
    let now = shared::util::now_millis();
    let sql = format!(
        r#"
        INSERT INTO roles (name, description, permissions, is_system, is_active, created_at)
        VALUES ($1, $2, $3, FALSE, TRUE, $4)
        RETURNING {ROLE_COLUMNS}
        "#
    );
    let role = sqlx::query_as::<_, Role>(&sql)
        .bind(data.name.trim())
        .bind(&data.description)
        .bind(Json(&data.permissions))
        .bind(now)
        .fetch_one(conn)
        .await?;
    Ok(role)
}

pub async fn update(
    conn: impl PgExecutor<'_>,
    id: i64,
    data: &RoleUpdate,
) -> Result<Option<Role>, BoxError> {
    let sql = format!(
        r#"
        UPDATE roles SET
            name = COALESCE($1, name),
            description = COALESCE($2, description),
            permissions = COALESCE($3, permissions),
            is_active = COALESCE($4, is_active)
        WHERE id = $5
        RETURNING {ROLE_COLUMNS}
        "#
    );
    let role = sqlx::query_as::<_, Role>(&sql)
        .bind(data.name.as_deref().map(str::trim))
        .bind(&data.description)
        .bind(data.permissions.as_ref().map(Json))
        .bind(data.is_active)
        .bind(id)
        .fetch_optional(conn)
        .await?;
    Ok(role)
}

/// Number of users (active or not) holding the role
pub async fn count_users(conn: impl PgExecutor<'_>, id: i64) -> Result<i64, BoxError> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users WHERE role_id = $1")
        .bind(id)
        .fetch_one(conn)
        .await?;
    Ok(count)
}

pub async fn delete(conn: impl PgExecutor<'_>, id: i64) -> Result<bool, BoxError> {
    let result = sqlx::query("DELETE FROM roles WHERE id = $1 AND is_system = FALSE")
        .bind(id)
        .execute(conn)
        .await?;
    Ok(result.rows_affected() > 0)
}
