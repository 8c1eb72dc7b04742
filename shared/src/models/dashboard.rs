//! Dashboard summary Model

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct CountByKey {
    pub key: String,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardSummary {
    /// Open jobs grouped by status
    pub jobs_by_status: Vec<CountByKey>,
    /// Open jobs grouped by current department
    pub jobs_by_department: Vec<CountByKey>,
    /// Open jobs with delivery in the next 7 days
    pub jobs_due_soon: i64,
    /// Open jobs past their delivery date
    pub jobs_overdue: i64,
    pub low_stock_items: i64,
    /// Purchase orders waiting for approval
    pub pending_purchase_orders: i64,
}
