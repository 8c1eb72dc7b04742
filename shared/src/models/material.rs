//! Material Model (board, paper, ink, plates, ...)

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Material {
    pub id: i64,
    pub code: String,
    pub name: String,
    pub material_type: String,
    /// Unit of measure (sheets, kg, ltr, ...)
    pub unit: String,
    /// Grammage for paper and board
    pub gsm: Option<Decimal>,
    pub is_active: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaterialCreate {
    pub code: String,
    pub name: String,
    pub material_type: String,
    pub unit: String,
    pub gsm: Option<Decimal>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MaterialUpdate {
    pub code: Option<String>,
    pub name: Option<String>,
    pub material_type: Option<String>,
    pub unit: Option<String>,
    pub gsm: Option<Decimal>,
    pub is_active: Option<bool>,
}
