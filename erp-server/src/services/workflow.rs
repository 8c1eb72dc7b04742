//! Job routing
//!
//! A product's route is the steps of its product-type sequence, ordered by
//! `step_order`, keeping compulsory steps and the optional steps the
//! product selected. A job card walks that route one step at a time.

use shared::error::{AppError, ErrorCode};
use shared::models::department;
use shared::models::{JobCard, JobStatus, PrepressStatus, ProcessStepInput, RouteStep};
use sqlx::PgConnection;

use crate::auth::CurrentUser;
use crate::db;
use crate::db::job_cards::{HistoryRecord, StepMove};
use crate::error::ServiceResult;

/// Filter raw sequence steps down to the product's route
pub fn build_route(mut steps: Vec<RouteStep>) -> Vec<RouteStep> {
    steps.retain(RouteStep::is_active);
    steps.sort_by_key(|s| s.step_order);
    steps
}

/// Where a job goes after its current step
#[derive(Debug, PartialEq, Eq)]
pub enum NextStep<'a> {
    Step(&'a RouteStep),
    /// The current step was the last one
    Finished,
}

/// `None` when `current` is not on the route
pub fn next_step<'a>(route: &'a [RouteStep], current: &str) -> Option<NextStep<'a>> {
    let pos = route.iter().position(|s| s.step_name == current)?;
    Some(match route.get(pos + 1) {
        Some(step) => NextStep::Step(step),
        None => NextStep::Finished,
    })
}

/// Validate the steps of a create / replace payload
pub fn validate_steps(steps: &[ProcessStepInput]) -> Result<(), AppError> {
    if steps.is_empty() {
        return Err(AppError::with_message(
            ErrorCode::InvalidProcessStep,
            "A process sequence needs at least one step",
        ));
    }

    let mut seen: Vec<String> = Vec::with_capacity(steps.len());
    for (idx, step) in steps.iter().enumerate() {
        let name = step.step_name.trim();
        if name.is_empty() || step.department.trim().is_empty() {
            return Err(AppError::with_message(
                ErrorCode::InvalidProcessStep,
                "Step name and department are required",
            )
            .with_detail("index", idx));
        }
        let key = name.to_lowercase();
        if seen.contains(&key) {
            return Err(AppError::with_message(
                ErrorCode::InvalidProcessStep,
                format!("Duplicate step name '{name}'"),
            )
            .with_detail("step_name", name));
        }
        seen.push(key);
    }

    if !steps.iter().any(|s| s.is_compulsory) {
        return Err(AppError::with_message(
            ErrorCode::InvalidProcessStep,
            "At least one step must be compulsory",
        ));
    }
    Ok(())
}

/// Move `job` to the next step of its route inside the caller's transaction
///
/// The update is conditional on the step read into `job`; if another
/// request moved the job in between, this fails with `JobStateChanged`
/// instead of skipping a step. Leaving Prepress closes the prepress job;
/// entering it opens (or reopens) one.
pub async fn advance_job(
    conn: &mut PgConnection,
    job: &JobCard,
    user: &CurrentUser,
    remarks: Option<&str>,
) -> ServiceResult<()> {
    let status = job.status().ok_or(ErrorCode::InvalidJobTransition)?;
    if status.is_closed() {
        return Err(ErrorCode::JobClosed.into());
    }
    if !status.can_advance() {
        return Err(AppError::transition(
            ErrorCode::InvalidJobTransition,
            status.as_db(),
            "advanced",
        )
        .into());
    }
    let current = job
        .current_step
        .as_deref()
        .ok_or(ErrorCode::InvalidJobTransition)?;

    let route = build_route(db::process::product_route_steps(&mut *conn, job.product_id).await?);
    let next = next_step(&route, current).ok_or_else(|| {
        AppError::with_message(
            ErrorCode::InvalidProcessStep,
            format!("Step '{current}' is no longer part of the product route"),
        )
        .with_detail("step_name", current)
    })?;

    let (next_step_name, next_department, new_status) = match next {
        NextStep::Step(step) => (
            Some(step.step_name.as_str()),
            Some(step.department.as_str()),
            JobStatus::Pending,
        ),
        NextStep::Finished => (None, None, JobStatus::Completed),
    };

    let moved = db::job_cards::move_step(
        &mut *conn,
        job.id,
        &StepMove {
            expected_step: current,
            next_step: next_step_name,
            next_department,
            status: new_status.as_db(),
        },
    )
    .await?;
    if !moved {
        return Err(ErrorCode::JobStateChanged.into());
    }

    if job
        .current_department
        .as_deref()
        .is_some_and(department::is_prepress)
    {
        db::prepress::close_for_job(&mut *conn, job.id, PrepressStatus::Completed.as_db()).await?;
    }
    if next_department.is_some_and(department::is_prepress) {
        db::prepress::open_for_job(&mut *conn, job.id).await?;
    }

    let action = match new_status {
        JobStatus::Completed => "completed",
        _ => "advanced",
    };
    db::job_cards::insert_history(
        &mut *conn,
        &HistoryRecord {
            job_card_id: job.id,
            action,
            from_department: job.current_department.as_deref(),
            to_department: next_department,
            status: new_status.as_db(),
            remarks,
            user_id: user.id,
        },
    )
    .await?;

    tracing::info!(
        job_id = job.id,
        job_number = %job.job_number,
        from = ?job.current_department,
        to = ?next_department,
        "Job advanced"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step(id: i64, order: i32, name: &str, compulsory: bool, selected: Option<bool>) -> RouteStep {
        RouteStep {
            step_id: id,
            step_order: order,
            step_name: name.to_string(),
            department: name.to_string(),
            is_compulsory: compulsory,
            is_selected: selected,
        }
    }

    fn carton_steps() -> Vec<RouteStep> {
        vec![
            step(4, 4, "Offset Printing", true, None),
            step(1, 1, "Prepress", true, None),
            step(2, 2, "CTP", true, None),
            step(5, 5, "Lamination", false, None),
            step(3, 3, "Cutting", true, Some(false)),
            step(6, 6, "Die Cutting", true, None),
        ]
    }

    fn names(route: &[RouteStep]) -> Vec<&str> {
        route.iter().map(|s| s.step_name.as_str()).collect()
    }

    #[test]
    fn test_route_orders_and_skips_unselected_optional() {
        let route = build_route(carton_steps());
        assert_eq!(
            names(&route),
            ["Prepress", "CTP", "Cutting", "Offset Printing", "Die Cutting"]
        );
    }

    #[test]
    fn test_route_includes_selected_optional() {
        let mut steps = carton_steps();
        steps[3].is_selected = Some(true);
        let route = build_route(steps);
        assert_eq!(
            names(&route),
            ["Prepress", "CTP", "Cutting", "Offset Printing", "Lamination", "Die Cutting"]
        );
    }

    #[test]
    fn test_compulsory_step_ignores_deselection() {
        let route = build_route(carton_steps());
        assert!(names(&route).contains(&"Cutting"));
    }

    #[test]
    fn test_next_step_walks_route() {
        let route = build_route(carton_steps());
        match next_step(&route, "CTP") {
            Some(NextStep::Step(s)) => assert_eq!(s.step_name, "Cutting"),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(next_step(&route, "Die Cutting"), Some(NextStep::Finished));
        assert_eq!(next_step(&route, "Lamination"), None);
    }

    #[test]
    fn test_empty_route() {
        let route = build_route(vec![step(1, 1, "Lamination", false, None)]);
        assert!(route.is_empty());
    }

    fn input(name: &str, compulsory: bool) -> ProcessStepInput {
        ProcessStepInput {
            step_name: name.to_string(),
            department: "CTP".to_string(),
            is_compulsory: compulsory,
        }
    }

    #[test]
    fn test_validate_steps() {
        assert!(validate_steps(&[input("Plate", true), input("Bake", false)]).is_ok());

        let err = validate_steps(&[]).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidProcessStep);

        let err = validate_steps(&[input("Plate", true), input("plate ", true)]).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidProcessStep);

        assert!(validate_steps(&[input("  ", true)]).is_err());
        assert!(validate_steps(&[input("Bake", false)]).is_err());
    }
}
