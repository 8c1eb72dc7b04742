use super::*;
use shared::models::{PrepressAssign, PrepressStatus, PrepressStatusUpdate};

use crate::services::jobs::Transition;
use crate::services::workflow;

#[tokio::test]
async fn test_job_walks_route_to_completion() {
    let Some(state) = test_state().await else { return };
    let user = admin(&state).await;
    let seq = sequence(&state).await;
    let product = product(&state, &seq.sequence.product_type).await;

    let created = job(&state, &user, &product).await;
    assert_eq!(created.current_step.as_deref(), Some("Prepress"));
    assert_eq!(created.status, "pending");
    assert_eq!(prepress_row(&state, created.id).await.status, "pending");

    // Unselected optional Lamination is skipped
    for expected in ["CTP", "Dispatch"] {
        let detail = services::jobs::advance(&state.pool, &user, created.id, None)
            .await
            .unwrap();
        assert_eq!(detail.job.current_step.as_deref(), Some(expected));
        assert_eq!(detail.job.status, "pending");
    }

    let done = services::jobs::advance(&state.pool, &user, created.id, Some("Shipped"))
        .await
        .unwrap();
    assert_eq!(done.job.status, "completed");
    assert!(done.job.current_step.is_none());
    assert!(done.job.completed_at.is_some());
    let actions: Vec<&str> = done.history.iter().map(|h| h.action.as_str()).collect();
    assert_eq!(actions, ["created", "advanced", "advanced", "completed"]);

    let err = services::jobs::advance(&state.pool, &user, created.id, None)
        .await
        .unwrap_err();
    assert_eq!(code(err), ErrorCode::JobClosed);
}

#[tokio::test]
async fn test_stale_advance_does_not_skip_a_step() {
    let Some(state) = test_state().await else { return };
    let user = admin(&state).await;
    let seq = sequence(&state).await;
    let product = product(&state, &seq.sequence.product_type).await;
    let stale = job(&state, &user, &product).await;

    services::jobs::advance(&state.pool, &user, stale.id, None)
        .await
        .unwrap();

    // Second writer still holding the card as read before the first advance
    let mut tx = state.pool.begin().await.unwrap();
    let err = workflow::advance_job(&mut *tx, &stale, &user, None)
        .await
        .unwrap_err();
    drop(tx);
    assert_eq!(code(err), ErrorCode::JobStateChanged);

    let current = reload(&state, stale.id).await;
    assert_eq!(current.current_step.as_deref(), Some("CTP"));
}

#[tokio::test]
async fn test_job_needs_a_route() {
    let Some(state) = test_state().await else { return };
    let user = admin(&state).await;
    let product = product(&state, &unique("unrouted")).await;

    let err = services::jobs::create(
        &state.pool,
        &user,
        &JobCardCreate {
            company_id: product.company_id.unwrap(),
            product_id: product.id,
            po_number: None,
            quantity: 100,
            delivery_date: None,
            priority: None,
            notes: None,
        },
    )
    .await
    .unwrap_err();
    assert_eq!(code(err), ErrorCode::ProcessSequenceMissing);
}

#[tokio::test]
async fn test_cancel_closes_prepress_work() {
    let Some(state) = test_state().await else { return };
    let user = admin(&state).await;
    let seq = sequence(&state).await;
    let product = product(&state, &seq.sequence.product_type).await;
    let card = job(&state, &user, &product).await;

    let cancelled = services::jobs::transition(
        &state.pool,
        &user,
        card.id,
        Transition::Cancel,
        Some("Customer withdrew the order"),
    )
    .await
    .unwrap();
    assert_eq!(cancelled.status, "cancelled");

    let row = prepress_row(&state, card.id).await;
    assert_eq!(row.status, "cancelled");
    assert!(row.completed_at.is_some());
    let pending = db::prepress::list(&state.pool, Some("pending"), None)
        .await
        .unwrap();
    assert!(pending.iter().all(|p| p.job_card_id != card.id));
}

#[tokio::test]
async fn test_manager_advance_out_of_prepress_completes_row() {
    let Some(state) = test_state().await else { return };
    let user = admin(&state).await;
    let seq = sequence(&state).await;
    let product = product(&state, &seq.sequence.product_type).await;
    let card = job(&state, &user, &product).await;

    services::jobs::advance(&state.pool, &user, card.id, None)
        .await
        .unwrap();

    let row = prepress_row(&state, card.id).await;
    assert_eq!(row.status, "completed");
    assert!(row.completed_at.is_some());
}

#[tokio::test]
async fn test_artwork_approval_moves_job_on() {
    let Some(state) = test_state().await else { return };
    let user = admin(&state).await;
    let seq = sequence(&state).await;
    let product = product(&state, &seq.sequence.product_type).await;
    let card = job(&state, &user, &product).await;
    let row = prepress_row(&state, card.id).await;

    let assigned = services::prepress::assign(
        &state.pool,
        row.id,
        &PrepressAssign {
            designer_id: user.id,
            remarks: None,
        },
    )
    .await
    .unwrap();
    assert_eq!(assigned.status, "assigned");

    let set = |status| PrepressStatusUpdate {
        status,
        remarks: None,
    };
    services::prepress::update_status(&state.pool, &user, row.id, &set(PrepressStatus::InProgress))
        .await
        .unwrap();
    assert_eq!(reload(&state, card.id).await.status, "in_progress");

    // Approval cannot be skipped
    let err = services::prepress::update_status(
        &state.pool,
        &user,
        row.id,
        &set(PrepressStatus::Completed),
    )
    .await
    .unwrap_err();
    assert_eq!(code(err), ErrorCode::InvalidPrepressTransition);

    services::prepress::update_status(&state.pool, &user, row.id, &set(PrepressStatus::HodReview))
        .await
        .unwrap();
    let completed = services::prepress::update_status(
        &state.pool,
        &user,
        row.id,
        &set(PrepressStatus::Completed),
    )
    .await
    .unwrap();
    assert_eq!(completed.status, "completed");

    let moved = reload(&state, card.id).await;
    assert_eq!(moved.current_step.as_deref(), Some("CTP"));
    assert_eq!(moved.current_department.as_deref(), Some("CTP"));
    assert_eq!(moved.status, "pending");
}
