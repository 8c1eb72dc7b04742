use super::*;
use axum::extract::Path;
use shared::models::{ProcessStepsReplace, ProductUpdate, StepSelection};

use crate::api::{process, products};
use crate::services::jobs::Transition;

async fn advance_to(state: &AppState, user: &CurrentUser, card: &JobCard, step_name: &str) {
    while reload(state, card.id).await.current_step.as_deref() != Some(step_name) {
        services::jobs::advance(&state.pool, user, card.id, None)
            .await
            .unwrap();
    }
}

async fn replace(
    state: &AppState,
    sequence_id: i64,
    steps: Vec<ProcessStepInput>,
) -> Result<ProcessSequenceDetail, ErrorCode> {
    process::replace_steps(
        State(state.clone()),
        Path(sequence_id),
        Json(ProcessStepsReplace {
            description: None,
            steps,
        }),
    )
    .await
    .map(|Json(detail)| detail)
    .map_err(|e| e.code)
}

#[tokio::test]
async fn test_step_in_use_cannot_be_deselected() {
    let Some(state) = test_state().await else { return };
    let user = admin(&state).await;
    let seq = sequence(&state).await;
    let product = product(&state, &seq.sequence.product_type).await;
    let lamination = step_id(&seq, "Lamination");

    let select = |is_selected| {
        Json(vec![StepSelection {
            step_id: lamination,
            is_selected,
        }])
    };
    process::set_product_route(State(state.clone()), Path(product.id), select(true))
        .await
        .unwrap();

    let card = job(&state, &user, &product).await;
    advance_to(&state, &user, &card, "Lamination").await;

    let err = process::set_product_route(State(state.clone()), Path(product.id), select(false))
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ProcessSequenceInUse);

    let Json(route) = process::get_product_route(State(state.clone()), Path(product.id))
        .await
        .unwrap();
    assert!(route.steps.iter().any(|s| s.step_name == "Lamination"));

    // Once the job has moved past it the step is free again
    advance_to(&state, &user, &card, "Dispatch").await;
    process::set_product_route(State(state.clone()), Path(product.id), select(false))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_replacing_steps_keeps_open_jobs_on_route() {
    let Some(state) = test_state().await else { return };
    let user = admin(&state).await;
    let seq = sequence(&state).await;
    let product = product(&state, &seq.sequence.product_type).await;
    let card = job(&state, &user, &product).await;
    advance_to(&state, &user, &card, "CTP").await;
    let id = seq.sequence.id;

    // CTP turned optional and unselected
    let err = replace(
        &state,
        id,
        vec![step("Prepress", true), step("CTP", false), step("Dispatch", true)],
    )
    .await
    .unwrap_err();
    assert_eq!(err, ErrorCode::ProcessSequenceInUse);

    // CTP removed
    let err = replace(&state, id, vec![step("Prepress", true), step("Dispatch", true)])
        .await
        .unwrap_err();
    assert_eq!(err, ErrorCode::ProcessSequenceInUse);

    // Refusals left the steps untouched
    let Json(detail) = process::get_by_id(State(state.clone()), Path(id)).await.unwrap();
    assert_eq!(detail.steps.len(), 4);
    assert!(
        detail
            .steps
            .iter()
            .any(|s| s.step_name == "CTP" && s.is_compulsory)
    );

    let detail = replace(
        &state,
        id,
        vec![
            step("Prepress", true),
            step("CTP", true),
            step("Varnish", false),
            step("Packing", true),
        ],
    )
    .await
    .unwrap();
    assert_eq!(detail.steps.len(), 4);

    let moved = services::jobs::advance(&state.pool, &user, card.id, None)
        .await
        .unwrap();
    assert_eq!(moved.job.current_step.as_deref(), Some("Packing"));
}

#[tokio::test]
async fn test_sequence_with_open_jobs_cannot_be_deleted() {
    let Some(state) = test_state().await else { return };
    let user = admin(&state).await;
    let seq = sequence(&state).await;
    let product = product(&state, &seq.sequence.product_type).await;
    let card = job(&state, &user, &product).await;
    let id = seq.sequence.id;

    let err = process::delete(State(state.clone()), Path(id))
        .await
        .err()
        .map(|e| e.code);
    assert_eq!(err, Some(ErrorCode::ProcessSequenceInUse));

    services::jobs::transition(&state.pool, &user, card.id, Transition::Cancel, Some("Duplicate"))
        .await
        .unwrap();
    assert!(process::delete(State(state.clone()), Path(id)).await.is_ok());

    let err = process::get_by_id(State(state.clone()), Path(id))
        .await
        .err()
        .map(|e| e.code);
    assert_eq!(err, Some(ErrorCode::ProcessSequenceNotFound));
}

#[tokio::test]
async fn test_product_type_locked_while_jobs_open() {
    let Some(state) = test_state().await else { return };
    let user = admin(&state).await;
    let seq = sequence(&state).await;
    let product = product(&state, &seq.sequence.product_type).await;
    let card = job(&state, &user, &product).await;

    let retype = || {
        Json(ProductUpdate {
            product_type: Some(unique("other")),
            ..Default::default()
        })
    };
    let err = products::update(State(state.clone()), Path(product.id), retype())
        .await
        .err()
        .map(|e| e.code);
    assert_eq!(err, Some(ErrorCode::ProcessSequenceInUse));

    let unchanged = db::products::find_by_id(&state.pool, product.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(unchanged.product_type, seq.sequence.product_type);

    services::jobs::transition(&state.pool, &user, card.id, Transition::Cancel, Some("Duplicate"))
        .await
        .unwrap();
    assert!(
        products::update(State(state.clone()), Path(product.id), retype())
            .await
            .is_ok()
    );
}
