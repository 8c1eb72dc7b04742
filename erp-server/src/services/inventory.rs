//! Stock movements

use rust_decimal::Decimal;
use shared::error::{AppError, ErrorCode};
use shared::models::{StockMovement, StockMovementCreate, StockMovementKind};
use sqlx::{PgConnection, PgPool};

use crate::auth::CurrentUser;
use crate::db;
use crate::db::inventory::NewMovement;
use crate::error::ServiceResult;
use crate::util::non_blank;

/// Receipts and issues move a positive amount; an adjustment sets the
/// counted quantity, which may be zero.
pub fn validate_quantity(kind: StockMovementKind, quantity: Decimal) -> Result<(), AppError> {
    let ok = match kind {
        StockMovementKind::Receipt | StockMovementKind::Issue => quantity > Decimal::ZERO,
        StockMovementKind::Adjustment => quantity >= Decimal::ZERO,
    };
    if ok {
        Ok(())
    } else {
        Err(AppError::with_message(
            ErrorCode::InvalidQuantity,
            format!("Invalid quantity {quantity} for {}", kind.as_db()),
        )
        .with_detail("quantity", quantity.to_string()))
    }
}

pub async fn record_movement(
    pool: &PgPool,
    user: &CurrentUser,
    item_id: i64,
    data: &StockMovementCreate,
) -> ServiceResult<StockMovement> {
    validate_quantity(data.kind, data.quantity)?;

    let mut tx = pool.begin().await?;
    let movement = apply(
        &mut *tx,
        item_id,
        data.kind,
        data.quantity,
        data.reference.as_deref().and_then(non_blank),
        data.notes.as_deref().and_then(non_blank),
        user.id,
    )
    .await?;
    tx.commit().await?;

    tracing::info!(
        item_id,
        kind = data.kind.as_db(),
        change = %movement.quantity_change,
        balance = %movement.balance_after,
        "Stock movement recorded"
    );
    Ok(movement)
}

/// Apply a movement inside the caller's transaction
pub(crate) async fn apply(
    conn: &mut PgConnection,
    item_id: i64,
    kind: StockMovementKind,
    quantity: Decimal,
    reference: Option<&str>,
    notes: Option<&str>,
    user_id: i64,
) -> ServiceResult<StockMovement> {
    let on_hand = db::inventory::lock_quantity(&mut *conn, item_id)
        .await?
        .ok_or(ErrorCode::InventoryItemNotFound)?;

    let (change, balance) = match kind {
        StockMovementKind::Receipt => {
            let balance = db::inventory::add_quantity(&mut *conn, item_id, quantity)
                .await?
                .ok_or(ErrorCode::InventoryItemNotFound)?;
            (quantity, balance)
        }
        StockMovementKind::Issue => {
            let balance = db::inventory::add_quantity(&mut *conn, item_id, -quantity)
                .await?
                .ok_or_else(|| {
                    AppError::new(ErrorCode::InsufficientStock)
                        .with_detail("available", on_hand.to_string())
                        .with_detail("requested", quantity.to_string())
                })?;
            (-quantity, balance)
        }
        StockMovementKind::Adjustment => {
            db::inventory::set_quantity(&mut *conn, item_id, quantity).await?;
            (quantity - on_hand, quantity)
        }
    };

    let movement = db::inventory::insert_movement(
        &mut *conn,
        &NewMovement {
            item_id,
            kind: kind.as_db(),
            quantity_change: change,
            balance_after: balance,
            reference,
            notes,
            user_id,
        },
    )
    .await?;
    Ok(movement)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quantity_rules() {
        assert!(validate_quantity(StockMovementKind::Receipt, Decimal::new(5, 0)).is_ok());
        assert!(validate_quantity(StockMovementKind::Issue, Decimal::ZERO).is_err());
        assert!(validate_quantity(StockMovementKind::Receipt, Decimal::new(-1, 0)).is_err());
        assert!(validate_quantity(StockMovementKind::Adjustment, Decimal::ZERO).is_ok());

        let err = validate_quantity(StockMovementKind::Adjustment, Decimal::new(-3, 1)).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidQuantity);
    }
}
