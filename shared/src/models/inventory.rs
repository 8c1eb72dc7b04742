//! Inventory Model

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct InventoryItem {
    pub id: i64,
    pub item_code: String,
    pub name: String,
    /// Linked material master record, if any
    pub material_id: Option<i64>,
    pub unit: String,
    pub location: Option<String>,
    pub quantity: Decimal,
    pub reorder_level: Decimal,
    pub unit_cost: Decimal,
    pub is_active: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

impl InventoryItem {
    pub fn is_low_stock(&self) -> bool {
        self.quantity <= self.reorder_level
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryItemCreate {
    pub item_code: String,
    pub name: String,
    pub material_id: Option<i64>,
    pub unit: String,
    pub location: Option<String>,
    pub quantity: Option<Decimal>,
    pub reorder_level: Option<Decimal>,
    pub unit_cost: Option<Decimal>,
}

/// Quantity is only changed through stock movements
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InventoryItemUpdate {
    pub item_code: Option<String>,
    pub name: Option<String>,
    pub material_id: Option<i64>,
    pub unit: Option<String>,
    pub location: Option<String>,
    pub reorder_level: Option<Decimal>,
    pub unit_cost: Option<Decimal>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockMovementKind {
    /// Goods in (adds)
    Receipt,
    /// Goods out to production (subtracts)
    Issue,
    /// Stock count (sets absolute quantity)
    Adjustment,
}

impl StockMovementKind {
    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "receipt" => Some(Self::Receipt),
            "issue" => Some(Self::Issue),
            "adjustment" => Some(Self::Adjustment),
            _ => None,
        }
    }

    pub fn as_db(&self) -> &'static str {
        match self {
            Self::Receipt => "receipt",
            Self::Issue => "issue",
            Self::Adjustment => "adjustment",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct StockMovement {
    pub id: i64,
    pub item_id: i64,
    pub kind: String,
    /// Signed change applied to the item's quantity
    pub quantity_change: Decimal,
    pub balance_after: Decimal,
    pub reference: Option<String>,
    pub notes: Option<String>,
    pub user_id: Option<i64>,
    pub created_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockMovementCreate {
    pub kind: StockMovementKind,
    /// Receipt/issue: amount moved. Adjustment: counted quantity.
    pub quantity: Decimal,
    pub reference: Option<String>,
    pub notes: Option<String>,
}
