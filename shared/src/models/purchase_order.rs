//! Purchase order Model

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PurchaseOrderStatus {
    Draft,
    Submitted,
    Approved,
    PartiallyReceived,
    Received,
    Cancelled,
}

impl PurchaseOrderStatus {
    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(Self::Draft),
            "submitted" => Some(Self::Submitted),
            "approved" => Some(Self::Approved),
            "partially_received" => Some(Self::PartiallyReceived),
            "received" => Some(Self::Received),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }

    pub fn as_db(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Submitted => "submitted",
            Self::Approved => "approved",
            Self::PartiallyReceived => "partially_received",
            Self::Received => "received",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn is_editable(&self) -> bool {
        matches!(self, Self::Draft)
    }

    pub fn can_receive(&self) -> bool {
        matches!(self, Self::Approved | Self::PartiallyReceived)
    }

    pub fn can_cancel(&self) -> bool {
        matches!(self, Self::Draft | Self::Submitted | Self::Approved)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct PurchaseOrder {
    pub id: i64,
    pub po_number: String,
    pub supplier_name: String,
    pub status: String,
    pub order_date: NaiveDate,
    pub expected_date: Option<NaiveDate>,
    pub notes: Option<String>,
    pub total_amount: Decimal,
    pub created_by: Option<i64>,
    pub approved_by: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl PurchaseOrder {
    pub fn status(&self) -> Option<PurchaseOrderStatus> {
        PurchaseOrderStatus::from_db(&self.status)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct PurchaseOrderLine {
    pub id: i64,
    pub purchase_order_id: i64,
    pub item_id: i64,
    pub item_code: String,
    pub item_name: String,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub received_quantity: Decimal,
}

impl PurchaseOrderLine {
    pub fn outstanding(&self) -> Decimal {
        self.quantity - self.received_quantity
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseOrderDetail {
    #[serde(flatten)]
    pub order: PurchaseOrder,
    pub lines: Vec<PurchaseOrderLine>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseOrderLineInput {
    pub item_id: i64,
    pub quantity: Decimal,
    pub unit_price: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseOrderCreate {
    pub supplier_name: String,
    pub order_date: Option<NaiveDate>,
    pub expected_date: Option<NaiveDate>,
    pub notes: Option<String>,
    pub lines: Vec<PurchaseOrderLineInput>,
}

/// Header fields are patched; `lines`, when present, replaces all lines
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PurchaseOrderUpdate {
    pub supplier_name: Option<String>,
    pub expected_date: Option<NaiveDate>,
    pub notes: Option<String>,
    pub lines: Option<Vec<PurchaseOrderLineInput>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReceiveLine {
    pub item_id: i64,
    pub quantity: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseOrderReceive {
    pub lines: Vec<ReceiveLine>,
    pub notes: Option<String>,
}

/// Order total: Σ quantity × unit_price
pub fn order_total(lines: &[PurchaseOrderLineInput]) -> Decimal {
    lines.iter().map(|l| l.quantity * l.unit_price).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn test_order_total() {
        let lines = vec![
            PurchaseOrderLineInput {
                item_id: 1,
                quantity: Decimal::new(500, 0),
                unit_price: Decimal::new(1250, 2),
            },
            PurchaseOrderLineInput {
                item_id: 2,
                quantity: Decimal::new(15, 1),
                unit_price: Decimal::new(40, 0),
            },
        ];
        assert_eq!(order_total(&lines), Decimal::new(6310, 0));
        assert_eq!(order_total(&[]), Decimal::ZERO);
    }

    #[test]
    fn test_status_rules() {
        assert!(PurchaseOrderStatus::Draft.is_editable());
        assert!(!PurchaseOrderStatus::Submitted.is_editable());
        assert!(PurchaseOrderStatus::PartiallyReceived.can_receive());
        assert!(!PurchaseOrderStatus::Submitted.can_receive());
        assert!(!PurchaseOrderStatus::Received.can_cancel());
        assert_eq!(
            PurchaseOrderStatus::from_db("partially_received"),
            Some(PurchaseOrderStatus::PartiallyReceived)
        );
    }

    #[test]
    fn test_line_outstanding() {
        let line = PurchaseOrderLine {
            id: 1,
            purchase_order_id: 1,
            item_id: 3,
            item_code: "BRD-300".into(),
            item_name: "Board 300gsm".into(),
            quantity: Decimal::new(100, 0),
            unit_price: Decimal::new(2, 0),
            received_quantity: Decimal::new(40, 0),
        };
        assert_eq!(line.outstanding(), Decimal::new(60, 0));
    }
}
