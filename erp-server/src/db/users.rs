//! User database operations
//!
//! `password_hash` only leaves this module inside [`UserCredentials`].

use shared::models::User;
use sqlx::PgExecutor;
use sqlx::types::Json;

use super::BoxError;
use crate::auth::CurrentUser;

const USER_SELECT: &str = r#"
    SELECT u.id, u.username, u.full_name, u.email, u.role_id, r.name AS role_name,
           u.department, u.is_active, u.last_login_at, u.created_at
    FROM users u
    JOIN roles r ON r.id = u.role_id
"#;

/// Login view of a user: hash plus the role's permissions
#[derive(Debug, sqlx::FromRow)]
pub struct UserCredentials {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
    pub is_active: bool,
    pub department: Option<String>,
    pub role_name: String,
    pub role_active: bool,
    pub permissions: Json<Vec<String>>,
}

impl UserCredentials {
    pub fn into_current_user(self) -> CurrentUser {
        CurrentUser {
            id: self.id,
            username: self.username,
            role: self.role_name,
            permissions: self.permissions.0,
            department: self.department,
        }
    }
}

/// List filters
#[derive(Debug, Default)]
pub struct UserFilter<'a> {
    pub department: Option<&'a str>,
    pub role_id: Option<i64>,
    pub is_active: Option<bool>,
    pub pattern: Option<String>,
}

/// Insert values for a new user
pub struct NewUser<'a> {
    pub username: &'a str,
    pub password_hash: &'a str,
    pub full_name: &'a str,
    pub email: Option<&'a str>,
    pub role_id: i64,
    pub department: Option<&'a str>,
}

/// Changed columns; `None` leaves the column untouched
#[derive(Default)]
pub struct UserChanges<'a> {
    pub username: Option<&'a str>,
    pub password_hash: Option<&'a str>,
    pub full_name: Option<&'a str>,
    pub email: Option<&'a str>,
    pub role_id: Option<i64>,
    pub department: Option<&'a str>,
    pub is_active: Option<bool>,
}

const FILTER_WHERE: &str = r#"
    WHERE ($1::text IS NULL OR LOWER(u.department) = LOWER($1))
      AND ($2::bigint IS NULL OR u.role_id = $2)
      AND ($3::boolean IS NULL OR u.is_active = $3)
      AND ($4::text IS NULL OR u.username ILIKE $4 OR u.full_name ILIKE $4)
"#;

pub async fn list(
    conn: impl PgExecutor<'_>,
    filter: &UserFilter<'_>,
    limit: u32,
    offset: u64,
) -> Result<Vec<User>, BoxError> {
    let sql = format!("{USER_SELECT} {FILTER_WHERE} ORDER BY u.username LIMIT $5 OFFSET $6");
    let rows = sqlx::query_as::<_, User>(&sql)
        .bind(filter.department)
        .bind(filter.role_id)
        .bind(filter.is_active)
        .bind(&filter.pattern)
        .bind(limit as i64)
        .bind(offset as i64)
        .fetch_all(conn)
        .await?;
    Ok(rows)
}

pub async fn count(conn: impl PgExecutor<'_>, filter: &UserFilter<'_>) -> Result<i64, BoxError> {
    let sql = format!("SELECT COUNT(*) FROM users u {FILTER_WHERE}");
    let (count,): (i64,) = sqlx::query_as(&sql)
        .bind(filter.department)
        .bind(filter.role_id)
        .bind(filter.is_active)
        .bind(&filter.pattern)
        .fetch_one(conn)
        .await?;
    Ok(count)
}

pub async fn find_by_id(conn: impl PgExecutor<'_>, id: i64) -> Result<Option<User>, BoxError> {
    let sql = format!("{USER_SELECT} WHERE u.id = $1");
    let row = sqlx::query_as::<_, User>(&sql)
        .bind(id)
        .fetch_optional(conn)
        .await?;
    Ok(row)
}

const CREDENTIALS_SELECT: &str = r#"
    SELECT u.id, u.username, u.password_hash, u.is_active, u.department,
           r.name AS role_name, r.is_active AS role_active, r.permissions
    FROM users u
    JOIN roles r ON r.id = u.role_id
"#;

/// Usernames match case-insensitively
pub async fn find_credentials_by_username(
    conn: impl PgExecutor<'_>,
    username: &str,
) -> Result<Option<UserCredentials>, BoxError> {
    let sql = format!("{CREDENTIALS_SELECT} WHERE LOWER(u.username) = LOWER($1)");
    let row = sqlx::query_as::<_, UserCredentials>(&sql)
        .bind(username.trim())
        .fetch_optional(conn)
        .await?;
    Ok(row)
}

pub async fn find_credentials_by_id(
    conn: impl PgExecutor<'_>,
    id: i64,
) -> Result<Option<UserCredentials>, BoxError> {
    let sql = format!("{CREDENTIALS_SELECT} WHERE u.id = $1");
    let row = sqlx::query_as::<_, UserCredentials>(&sql)
        .bind(id)
        .fetch_optional(conn)
        .await?;
    Ok(row)
}

pub async fn create(conn: impl PgExecutor<'_>, data: &NewUser<'_>) -> Result<i64, BoxError> {
    let now = shared::util::now_millis();
    let (id,): (i64,) = sqlx::query_as(
        r#"
        INSERT INTO users (
            username, password_hash, full_name, email, role_id, department,
            is_active, created_at, updated_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, TRUE, $7, $7)
        RETURNING id
        "#,
    )
    .bind(data.username)
    .bind(data.password_hash)
    .bind(data.full_name)
    .bind(data.email)
    .bind(data.role_id)
    .bind(data.department)
    .bind(now)
    .fetch_one(conn)
    .await?;
    Ok(id)
}

pub async fn update(
    conn: impl PgExecutor<'_>,
    id: i64,
    changes: &UserChanges<'_>,
) -> Result<bool, BoxError> {
    let now = shared::util::now_millis();
    let result = sqlx::query(
        r#"
        UPDATE users SET
            username = COALESCE($1, username),
            password_hash = COALESCE($2, password_hash),
            full_name = COALESCE($3, full_name),
            email = COALESCE($4, email),
            role_id = COALESCE($5, role_id),
            department = COALESCE($6, department),
            is_active = COALESCE($7, is_active),
            updated_at = $8
        WHERE id = $9
        "#,
    )
    .bind(changes.username)
    .bind(changes.password_hash)
    .bind(changes.full_name)
    .bind(changes.email)
    .bind(changes.role_id)
    .bind(changes.department)
    .bind(changes.is_active)
    .bind(now)
    .bind(id)
    .execute(conn)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn set_password(
    conn: impl PgExecutor<'_>,
    id: i64,
    password_hash: &str,
) -> Result<(), BoxError> {
    sqlx::query("UPDATE users SET password_hash = $1, updated_at = $2 WHERE id = $3")
        .bind(password_hash)
        .bind(shared::util::now_millis())
        .bind(id)
        .execute(conn)
        .await?;
    Ok(())
}

pub async fn deactivate(conn: impl PgExecutor<'_>, id: i64) -> Result<bool, BoxError> {
    let result = sqlx::query("UPDATE users SET is_active = FALSE, updated_at = $1 WHERE id = $2")
        .bind(shared::util::now_millis())
        .bind(id)
        .execute(conn)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn record_login(conn: impl PgExecutor<'_>, id: i64) -> Result<(), BoxError> {
    sqlx::query("UPDATE users SET last_login_at = $1 WHERE id = $2")
        .bind(shared::util::now_millis())
        .bind(id)
        .execute(conn)
        .await?;
    Ok(())
}

pub async fn count_all(conn: impl PgExecutor<'_>) -> Result<i64, BoxError> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
        .fetch_one(conn)
        .await?;
    Ok(count)
}
