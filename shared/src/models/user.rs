//! User Model

use serde::{Deserialize, Serialize};

/// User as returned by the API (never carries the password hash)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct User {
    pub id: i64,
    pub username: String,
    pub full_name: String,
    pub email: Option<String>,
    pub role_id: i64,
    pub role_name: String,
    /// Department the user works in (e.g. "Prepress", "CTP"); `None` for office staff
    pub department: Option<String>,
    pub is_active: bool,
    pub last_login_at: Option<i64>,
    pub created_at: i64,
}

/// Create user payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserCreate {
    pub username: String,
    pub password: String,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub role_id: i64,
    pub department: Option<String>,
}

/// Update user payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserUpdate {
    pub username: Option<String>,
    pub password: Option<String>,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub role_id: Option<i64>,
    pub department: Option<String>,
    pub is_active: Option<bool>,
}
