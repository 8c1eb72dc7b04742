use super::*;
use rust_decimal::Decimal;
use shared::models::{
    InventoryItem, InventoryItemCreate, PurchaseOrderCreate, PurchaseOrderLineInput,
    PurchaseOrderReceive, ReceiveLine, StockMovementCreate, StockMovementKind,
};

use crate::services::purchasing::{self, Transition};

fn qty(n: i64) -> Decimal {
    Decimal::new(n, 0)
}

async fn item(state: &AppState, on_hand: i64) -> InventoryItem {
    db::inventory::create_item(
        &state.pool,
        &InventoryItemCreate {
            item_code: unique("BOARD"),
            name: "SBS board 300gsm".to_string(),
            material_id: None,
            unit: "sheet".to_string(),
            location: Some("Rack A".to_string()),
            quantity: Some(qty(on_hand)),
            reorder_level: None,
            unit_cost: None,
        },
    )
    .await
    .unwrap()
}

async fn on_hand(state: &AppState, item_id: i64) -> Decimal {
    db::inventory::find_item(&state.pool, item_id)
        .await
        .unwrap()
        .unwrap()
        .quantity
}

fn movement(kind: StockMovementKind, n: i64) -> StockMovementCreate {
    StockMovementCreate {
        kind,
        quantity: qty(n),
        reference: None,
        notes: None,
    }
}

#[tokio::test]
async fn test_issue_cannot_exceed_stock() {
    let Some(state) = test_state().await else { return };
    let user = admin(&state).await;
    let board = item(&state, 10).await;

    let err = services::inventory::record_movement(
        &state.pool,
        &user,
        board.id,
        &movement(StockMovementKind::Issue, 15),
    )
    .await
    .unwrap_err();
    assert_eq!(code(err), ErrorCode::InsufficientStock);
    assert_eq!(on_hand(&state, board.id).await, qty(10));

    let issued = services::inventory::record_movement(
        &state.pool,
        &user,
        board.id,
        &movement(StockMovementKind::Issue, 4),
    )
    .await
    .unwrap();
    assert_eq!(issued.quantity_change, qty(-4));
    assert_eq!(issued.balance_after, qty(6));

    // Stock count sets the level and records the difference
    let counted = services::inventory::record_movement(
        &state.pool,
        &user,
        board.id,
        &movement(StockMovementKind::Adjustment, 20),
    )
    .await
    .unwrap();
    assert_eq!(counted.quantity_change, qty(14));
    assert_eq!(on_hand(&state, board.id).await, qty(20));
    assert_eq!(
        db::inventory::count_movements(&state.pool, board.id)
            .await
            .unwrap(),
        2
    );
}

#[tokio::test]
async fn test_receiving_goods_against_order() {
    let Some(state) = test_state().await else { return };
    let user = admin(&state).await;
    let board = item(&state, 0).await;

    let order = purchasing::create(
        &state.pool,
        &user,
        &PurchaseOrderCreate {
            supplier_name: "Paper Mill Ltd".to_string(),
            order_date: None,
            expected_date: None,
            notes: None,
            lines: vec![PurchaseOrderLineInput {
                item_id: board.id,
                quantity: qty(100),
                unit_price: qty(2),
            }],
        },
    )
    .await
    .unwrap();
    let id = order.order.id;
    assert_eq!(order.order.status, "draft");

    let receive = |n| PurchaseOrderReceive {
        lines: vec![ReceiveLine {
            item_id: board.id,
            quantity: qty(n),
        }],
        notes: None,
    };

    // Nothing can be booked before approval
    let err = purchasing::receive(&state.pool, &user, id, &receive(10))
        .await
        .unwrap_err();
    assert_eq!(code(err), ErrorCode::InvalidPurchaseOrderTransition);

    purchasing::transition(&state.pool, &user, id, Transition::Submit)
        .await
        .unwrap();
    purchasing::transition(&state.pool, &user, id, Transition::Approve)
        .await
        .unwrap();

    let partial = purchasing::receive(&state.pool, &user, id, &receive(40))
        .await
        .unwrap();
    assert_eq!(partial.order.status, "partially_received");
    assert_eq!(partial.lines[0].received_quantity, qty(40));
    assert_eq!(on_hand(&state, board.id).await, qty(40));

    let err = purchasing::receive(&state.pool, &user, id, &receive(70))
        .await
        .unwrap_err();
    assert_eq!(code(err), ErrorCode::ReceiveExceedsOrdered);
    assert_eq!(on_hand(&state, board.id).await, qty(40));

    let full = purchasing::receive(&state.pool, &user, id, &receive(60))
        .await
        .unwrap();
    assert_eq!(full.order.status, "received");
    assert_eq!(on_hand(&state, board.id).await, qty(100));

    let err = purchasing::receive(&state.pool, &user, id, &receive(1))
        .await
        .unwrap_err();
    assert_eq!(code(err), ErrorCode::InvalidPurchaseOrderTransition);
}
