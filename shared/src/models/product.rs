//! Product Model

use serde::{Deserialize, Serialize};

/// Product entity
///
/// `product_type` selects the process sequence that routes job cards for
/// this product (e.g. "Offset Carton", "Digital Label").
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Product {
    pub id: i64,
    pub code: String,
    pub name: String,
    pub product_type: String,
    /// Owning customer, `None` for generic catalogue items
    pub company_id: Option<i64>,
    pub description: Option<String>,
    pub is_active: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Create product payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductCreate {
    pub code: String,
    pub name: String,
    pub product_type: String,
    pub company_id: Option<i64>,
    pub description: Option<String>,
}

/// Update product payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductUpdate {
    pub code: Option<String>,
    pub name: Option<String>,
    pub product_type: Option<String>,
    pub company_id: Option<i64>,
    pub description: Option<String>,
    pub is_active: Option<bool>,
}
