//! Purchase order lifecycle
//!
//! draft → submitted → approved → partially_received → received, with
//! cancel allowed until goods arrive. Receiving posts stock receipts.

use rust_decimal::Decimal;
use shared::error::{AppError, ErrorCode};
use shared::models::purchase_order::order_total;
use shared::models::{
    PurchaseOrder, PurchaseOrderCreate, PurchaseOrderDetail, PurchaseOrderLineInput,
    PurchaseOrderReceive, PurchaseOrderStatus, PurchaseOrderUpdate, StockMovementKind,
};
use sqlx::PgPool;

use crate::auth::CurrentUser;
use crate::db;
use crate::db::DocumentSequence;
use crate::db::purchasing::{NewPurchaseOrder, OrderChanges};
use crate::error::{ServiceResult, write_error};
use crate::util::non_blank;

pub async fn get(pool: &PgPool, id: i64) -> ServiceResult<PurchaseOrderDetail> {
    let order = db::purchasing::find_by_id(pool, id)
        .await?
        .ok_or(ErrorCode::PurchaseOrderNotFound)?;
    let lines = db::purchasing::list_lines(pool, id).await?;
    Ok(PurchaseOrderDetail { order, lines })
}

/// Validate order lines: at least one, positive quantities, non-negative
/// prices, each item once
pub fn validate_lines(lines: &[PurchaseOrderLineInput]) -> Result<(), AppError> {
    if lines.is_empty() {
        return Err(AppError::new(ErrorCode::PurchaseOrderEmpty));
    }
    for (idx, line) in lines.iter().enumerate() {
        if line.quantity <= Decimal::ZERO {
            return Err(AppError::new(ErrorCode::InvalidQuantity).with_detail("line", idx));
        }
        if line.unit_price < Decimal::ZERO {
            return Err(
                AppError::with_message(ErrorCode::ValueOutOfRange, "Unit price cannot be negative")
                    .with_detail("line", idx),
            );
        }
        if lines[..idx].iter().any(|l| l.item_id == line.item_id) {
            return Err(AppError::validation("Each item may appear only once per order")
                .with_detail("item_id", line.item_id));
        }
    }
    Ok(())
}

pub async fn create(
    pool: &PgPool,
    user: &CurrentUser,
    data: &PurchaseOrderCreate,
) -> ServiceResult<PurchaseOrderDetail> {
    let supplier = non_blank(&data.supplier_name).ok_or_else(|| AppError::required("supplier_name"))?;
    validate_lines(&data.lines)?;

    let order_date = data
        .order_date
        .unwrap_or_else(|| chrono::Utc::now().date_naive());

    let mut tx = pool.begin().await?;
    let po_number = db::next_document_number(&mut *tx, DocumentSequence::PurchaseOrder).await?;
    let id = db::purchasing::insert_order(
        &mut *tx,
        &NewPurchaseOrder {
            po_number: &po_number,
            supplier_name: supplier,
            order_date,
            expected_date: data.expected_date,
            notes: data.notes.as_deref(),
            total_amount: order_total(&data.lines),
            created_by: user.id,
        },
    )
    .await?;
    db::purchasing::replace_lines(&mut *tx, id, &data.lines)
        .await
        .map_err(|e| write_error(e, ErrorCode::InvalidReference))?;
    tx.commit().await?;

    tracing::info!(po_id = id, po_number = %po_number, "Purchase order created");
    get(pool, id).await
}

/// Edit a draft; `lines`, when given, replace all existing lines
pub async fn update(
    pool: &PgPool,
    id: i64,
    data: &PurchaseOrderUpdate,
) -> ServiceResult<PurchaseOrderDetail> {
    if let Some(lines) = &data.lines {
        validate_lines(lines)?;
    }
    let supplier = match data.supplier_name.as_deref() {
        Some(s) => Some(non_blank(s).ok_or_else(|| AppError::required("supplier_name"))?),
        None => None,
    };

    let mut tx = pool.begin().await?;
    let order = db::purchasing::find_for_update(&mut *tx, id)
        .await?
        .ok_or(ErrorCode::PurchaseOrderNotFound)?;
    if !order.status().is_some_and(|s| s.is_editable()) {
        return Err(AppError::new(ErrorCode::PurchaseOrderNotEditable)
            .with_detail("status", order.status.clone())
            .into());
    }

    if let Some(lines) = &data.lines {
        db::purchasing::replace_lines(&mut *tx, id, lines)
            .await
            .map_err(|e| write_error(e, ErrorCode::InvalidReference))?;
    }
    db::purchasing::update_draft(
        &mut *tx,
        id,
        &OrderChanges {
            supplier_name: supplier,
            expected_date: data.expected_date,
            notes: data.notes.as_deref(),
            total_amount: data.lines.as_deref().map(order_total),
        },
    )
    .await?;
    tx.commit().await?;

    get(pool, id).await
}

/// Header-only status moves
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Submit,
    Approve,
    Cancel,
}

impl Transition {
    fn allowed_from(self, status: PurchaseOrderStatus) -> bool {
        match self {
            Self::Submit => status == PurchaseOrderStatus::Draft,
            Self::Approve => status == PurchaseOrderStatus::Submitted,
            Self::Cancel => status.can_cancel(),
        }
    }

    fn target(self) -> PurchaseOrderStatus {
        match self {
            Self::Submit => PurchaseOrderStatus::Submitted,
            Self::Approve => PurchaseOrderStatus::Approved,
            Self::Cancel => PurchaseOrderStatus::Cancelled,
        }
    }
}

pub async fn transition(
    pool: &PgPool,
    user: &CurrentUser,
    id: i64,
    transition: Transition,
) -> ServiceResult<PurchaseOrder> {
    let order = db::purchasing::find_by_id(pool, id)
        .await?
        .ok_or(ErrorCode::PurchaseOrderNotFound)?;
    let status = order
        .status()
        .ok_or(ErrorCode::InvalidPurchaseOrderTransition)?;
    let target = transition.target();
    if !transition.allowed_from(status) {
        return Err(AppError::transition(
            ErrorCode::InvalidPurchaseOrderTransition,
            status.as_db(),
            target.as_db(),
        )
        .into());
    }

    let approved_by = (transition == Transition::Approve).then_some(user.id);
    if !db::purchasing::set_status(pool, id, &[status.as_db()], target.as_db(), approved_by).await? {
        return Err(ErrorCode::InvalidPurchaseOrderTransition.into());
    }

    tracing::info!(po_id = id, from = status.as_db(), to = target.as_db(), "Purchase order status changed");
    Ok(db::purchasing::find_by_id(pool, id)
        .await?
        .ok_or(ErrorCode::PurchaseOrderNotFound)?)
}

/// Book received goods against the order and into stock
pub async fn receive(
    pool: &PgPool,
    user: &CurrentUser,
    id: i64,
    data: &PurchaseOrderReceive,
) -> ServiceResult<PurchaseOrderDetail> {
    if data.lines.is_empty() {
        return Err(AppError::required("lines").into());
    }
    if data.lines.iter().any(|l| l.quantity <= Decimal::ZERO) {
        return Err(ErrorCode::InvalidQuantity.into());
    }
    let notes = data.notes.as_deref().and_then(non_blank);

    let mut tx = pool.begin().await?;
    let order = db::purchasing::find_for_update(&mut *tx, id)
        .await?
        .ok_or(ErrorCode::PurchaseOrderNotFound)?;
    let status = order
        .status()
        .ok_or(ErrorCode::InvalidPurchaseOrderTransition)?;
    if !status.can_receive() {
        return Err(AppError::transition(
            ErrorCode::InvalidPurchaseOrderTransition,
            status.as_db(),
            PurchaseOrderStatus::Received.as_db(),
        )
        .into());
    }

    let lines = db::purchasing::list_lines(&mut *tx, id).await?;
    for receipt in &data.lines {
        let line = lines
            .iter()
            .find(|l| l.item_id == receipt.item_id)
            .ok_or_else(|| {
                AppError::new(ErrorCode::PurchaseOrderLineNotFound)
                    .with_detail("item_id", receipt.item_id)
            })?;

        // Conditional on received + qty <= ordered, so repeated items in one
        // request are checked against the running total
        if !db::purchasing::receive_line(&mut *tx, line.id, receipt.quantity).await? {
            return Err(AppError::new(ErrorCode::ReceiveExceedsOrdered)
                .with_detail("item_id", receipt.item_id)
                .with_detail("outstanding", line.outstanding().to_string())
                .into());
        }

        super::inventory::apply(
            &mut *tx,
            receipt.item_id,
            StockMovementKind::Receipt,
            receipt.quantity,
            Some(&order.po_number),
            notes,
            user.id,
        )
        .await?;
    }

    let lines = db::purchasing::list_lines(&mut *tx, id).await?;
    let target = if lines.iter().all(|l| l.outstanding() <= Decimal::ZERO) {
        PurchaseOrderStatus::Received
    } else {
        PurchaseOrderStatus::PartiallyReceived
    };
    if target != status {
        db::purchasing::set_status(&mut *tx, id, &[status.as_db()], target.as_db(), None).await?;
    }
    tx.commit().await?;

    tracing::info!(po_id = id, po_number = %order.po_number, status = target.as_db(), "Goods received");
    let order = db::purchasing::find_by_id(pool, id)
        .await?
        .ok_or(ErrorCode::PurchaseOrderNotFound)?;
    Ok(PurchaseOrderDetail { order, lines })
}
