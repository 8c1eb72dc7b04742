//! Process sequence API (workflow configuration)
//!
//! One sequence per product type, holding the ordered department steps.
//! Products pick which optional steps they run through
//! `PUT /api/products/{id}/route`.

use std::collections::HashMap;

use axum::{
    Json, Router,
    extract::{Path, State},
    middleware,
    routing::{get, post, put},
};
use shared::error::{AppError, ApiResponse, ErrorCode};
use shared::models::{
    ProcessSequenceCreate, ProcessSequenceDetail, ProcessStep, ProcessStepsReplace, ProductRoute,
    StepSelection,
};

use super::{ApiResult, internal};
use crate::auth::require_permission;
use crate::db;
use crate::error::write_error;
use crate::services::workflow;
use crate::state::AppState;
use crate::util::non_blank;

pub fn router() -> Router<AppState> {
    let read_routes = Router::new()
        .route("/", get(list))
        .route("/{id}", get(get_by_id));

    let manage_routes = Router::new()
        .route("/", post(create))
        .route("/{id}", axum::routing::delete(delete))
        .route("/{id}/steps", put(replace_steps))
        .layer(middleware::from_fn(require_permission("process:manage")));

    read_routes.merge(manage_routes)
}

/// GET /api/process-sequences
pub async fn list(State(state): State<AppState>) -> ApiResult<Vec<ProcessSequenceDetail>> {
    let sequences = db::process::list_sequences(&state.pool)
        .await
        .map_err(internal)?;
    let steps = db::process::list_all_steps(&state.pool)
        .await
        .map_err(internal)?;

    let mut by_sequence: HashMap<i64, Vec<ProcessStep>> = HashMap::new();
    for step in steps {
        by_sequence.entry(step.sequence_id).or_default().push(step);
    }

    let details = sequences
        .into_iter()
        .map(|sequence| ProcessSequenceDetail {
            steps: by_sequence.remove(&sequence.id).unwrap_or_default(),
            sequence,
        })
        .collect();
    Ok(Json(details))
}

async fn load_detail(state: &AppState, id: i64) -> Result<ProcessSequenceDetail, AppError> {
    let sequence = db::process::find_sequence(&state.pool, id)
        .await
        .map_err(internal)?
        .ok_or_else(|| AppError::new(ErrorCode::ProcessSequenceNotFound))?;
    let steps = db::process::list_steps(&state.pool, id)
        .await
        .map_err(internal)?;
    Ok(ProcessSequenceDetail { sequence, steps })
}

/// GET /api/process-sequences/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<ProcessSequenceDetail> {
    Ok(Json(load_detail(&state, id).await?))
}

/// POST /api/process-sequences
pub async fn create(
    State(state): State<AppState>,
    Json(data): Json<ProcessSequenceCreate>,
) -> ApiResult<ProcessSequenceDetail> {
    let product_type =
        non_blank(&data.product_type).ok_or_else(|| AppError::required("product_type"))?;
    workflow::validate_steps(&data.steps)?;

    let mut tx = state.pool.begin().await.map_err(internal)?;
    let sequence =
        db::process::create_sequence(&mut *tx, product_type, data.description.as_deref())
            .await
            .map_err(|e| write_error(e, ErrorCode::ProcessSequenceExists))?;
    let steps = db::process::replace_steps(&mut *tx, sequence.id, &data.steps)
        .await
        .map_err(|e| write_error(e, ErrorCode::InvalidProcessStep))?;
    tx.commit().await.map_err(internal)?;

    tracing::info!(
        sequence_id = sequence.id,
        product_type = %sequence.product_type,
        steps = steps.len(),
        "Process sequence created"
    );
    Ok(Json(ProcessSequenceDetail { sequence, steps }))
}

/// PUT /api/process-sequences/{id}/steps
///
/// Steps keep their identity by name. Refused while it would leave an open
/// job on a step outside its product's route.
pub async fn replace_steps(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(data): Json<ProcessStepsReplace>,
) -> ApiResult<ProcessSequenceDetail> {
    workflow::validate_steps(&data.steps)?;

    let mut tx = state.pool.begin().await.map_err(internal)?;
    if !db::process::touch_sequence(&mut *tx, id, data.description.as_deref())
        .await
        .map_err(internal)?
    {
        return Err(AppError::new(ErrorCode::ProcessSequenceNotFound));
    }

    db::process::replace_steps(&mut *tx, id, &data.steps)
        .await
        .map_err(|e| write_error(e, ErrorCode::InvalidProcessStep))?;

    // Checked against the new steps; dropping `tx` rolls them back
    let stranded = db::process::count_stranded_jobs_for_sequence(&mut *tx, id)
        .await
        .map_err(internal)?;
    if stranded > 0 {
        return Err(stranded_error(stranded));
    }
    tx.commit().await.map_err(internal)?;

    tracing::info!(sequence_id = id, steps = data.steps.len(), "Process steps replaced");
    Ok(Json(load_detail(&state, id).await?))
}

fn stranded_error(open_jobs: i64) -> AppError {
    AppError::with_message(
        ErrorCode::ProcessSequenceInUse,
        "Open jobs are on a step that would leave the route",
    )
    .with_detail("open_jobs", open_jobs)
}

/// DELETE /api/process-sequences/{id}
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<ApiResponse<()>, AppError> {
    let open = db::process::count_open_jobs(&state.pool, id)
        .await
        .map_err(internal)?;
    if open > 0 {
        return Err(AppError::new(ErrorCode::ProcessSequenceInUse).with_detail("open_jobs", open));
    }

    if !db::process::delete_sequence(&state.pool, id)
        .await
        .map_err(internal)?
    {
        return Err(AppError::new(ErrorCode::ProcessSequenceNotFound));
    }

    tracing::info!(sequence_id = id, "Process sequence deleted");
    Ok(ApiResponse::ok())
}

// ========== Product route ==========

async fn product_route(state: &AppState, product_id: i64) -> Result<ProductRoute, AppError> {
    let product = db::products::find_by_id(&state.pool, product_id)
        .await
        .map_err(internal)?
        .ok_or_else(|| AppError::new(ErrorCode::ProductNotFound))?;
    let steps = db::process::product_route_steps(&state.pool, product_id)
        .await
        .map_err(internal)?;

    Ok(ProductRoute {
        product_id,
        product_type: product.product_type,
        steps: workflow::build_route(steps),
    })
}

/// GET /api/products/{id}/route
///
/// The effective route: compulsory steps plus selected optional steps.
pub async fn get_product_route(
    State(state): State<AppState>,
    Path(product_id): Path<i64>,
) -> ApiResult<ProductRoute> {
    Ok(Json(product_route(&state, product_id).await?))
}

/// PUT /api/products/{id}/route
///
/// Body: `[{step_id, is_selected}]`, optional steps of the product's
/// sequence only. A step an open job of this product is on cannot be
/// deselected.
pub async fn set_product_route(
    State(state): State<AppState>,
    Path(product_id): Path<i64>,
    Json(selections): Json<Vec<StepSelection>>,
) -> ApiResult<ProductRoute> {
    db::products::find_by_id(&state.pool, product_id)
        .await
        .map_err(internal)?
        .ok_or_else(|| AppError::new(ErrorCode::ProductNotFound))?;
    let steps = db::process::product_route_steps(&state.pool, product_id)
        .await
        .map_err(internal)?;
    if steps.is_empty() {
        return Err(AppError::new(ErrorCode::ProcessSequenceMissing));
    }

    for selection in &selections {
        let step = steps
            .iter()
            .find(|s| s.step_id == selection.step_id)
            .ok_or_else(|| {
                AppError::new(ErrorCode::ProcessStepNotFound)
                    .with_detail("step_id", selection.step_id)
            })?;
        if step.is_compulsory {
            return Err(AppError::with_message(
                ErrorCode::InvalidProcessStep,
                format!("Step '{}' is compulsory", step.step_name),
            )
            .with_detail("step_id", step.step_id));
        }
    }

    let mut tx = state.pool.begin().await.map_err(internal)?;
    for selection in &selections {
        db::process::upsert_selection(
            &mut *tx,
            product_id,
            selection.step_id,
            selection.is_selected,
        )
        .await
        .map_err(internal)?;
    }

    let stranded = db::process::count_stranded_jobs_for_product(&mut *tx, product_id)
        .await
        .map_err(internal)?;
    if stranded > 0 {
        return Err(stranded_error(stranded));
    }
    tx.commit().await.map_err(internal)?;

    tracing::info!(product_id, changed = selections.len(), "Product route updated");
    Ok(Json(product_route(&state, product_id).await?))
}
