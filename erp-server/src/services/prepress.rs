//! Prepress desk: designer assignment and artwork status
//!
//! Completing prepress work advances the job card out of Prepress in the
//! same transaction.

use shared::error::{AppError, ErrorCode};
use shared::models::department;
use shared::models::{JobStatus, PrepressAssign, PrepressJob, PrepressStatus, PrepressStatusUpdate};
use sqlx::PgPool;

use super::workflow;
use crate::auth::CurrentUser;
use crate::db;
use crate::db::job_cards::HistoryRecord;
use crate::error::ServiceResult;
use crate::util::non_blank;

async fn load(pool: &PgPool, id: i64) -> ServiceResult<(PrepressJob, PrepressStatus)> {
    let job = db::prepress::find_by_id(pool, id)
        .await?
        .ok_or(ErrorCode::PrepressJobNotFound)?;
    let status = PrepressStatus::from_db(&job.status).ok_or(ErrorCode::InvalidPrepressTransition)?;
    Ok((job, status))
}

/// Assign (or reassign) the designer
pub async fn assign(pool: &PgPool, id: i64, data: &PrepressAssign) -> ServiceResult<PrepressJob> {
    let (job, status) = load(pool, id).await?;
    if !matches!(status, PrepressStatus::Pending | PrepressStatus::Assigned) {
        return Err(AppError::transition(
            ErrorCode::InvalidPrepressTransition,
            status.as_db(),
            PrepressStatus::Assigned.as_db(),
        )
        .into());
    }

    db::users::find_by_id(pool, data.designer_id)
        .await?
        .filter(|u| u.is_active)
        .ok_or(ErrorCode::DesignerNotFound)?;

    let remarks = data.remarks.as_deref().and_then(non_blank);
    if !db::prepress::assign(pool, job.id, status.as_db(), data.designer_id, remarks).await? {
        return Err(ErrorCode::JobStateChanged.into());
    }

    tracing::info!(prepress_id = id, designer_id = data.designer_id, "Designer assigned");
    Ok(load(pool, id).await?.0)
}

pub async fn update_status(
    pool: &PgPool,
    user: &CurrentUser,
    id: i64,
    data: &PrepressStatusUpdate,
) -> ServiceResult<PrepressJob> {
    let (job, status) = load(pool, id).await?;
    let target = data.status;
    if !status.can_transition_to(target) {
        return Err(AppError::transition(
            ErrorCode::InvalidPrepressTransition,
            status.as_db(),
            target.as_db(),
        )
        .into());
    }
    if target == PrepressStatus::Assigned && job.assigned_designer_id.is_none() {
        return Err(AppError::required("designer_id").into());
    }
    let remarks = data.remarks.as_deref().and_then(non_blank);

    let mut tx = pool.begin().await?;
    if !db::prepress::set_status(&mut *tx, id, status.as_db(), target.as_db(), remarks).await? {
        return Err(ErrorCode::JobStateChanged.into());
    }

    match target {
        PrepressStatus::InProgress => {
            // Artwork work starting also starts the job card
            if db::job_cards::set_status(
                &mut *tx,
                job.job_card_id,
                &[JobStatus::Pending.as_db()],
                JobStatus::InProgress.as_db(),
            )
            .await?
            {
                db::job_cards::insert_history(
                    &mut *tx,
                    &HistoryRecord {
                        job_card_id: job.job_card_id,
                        action: "started",
                        from_department: Some(department::PREPRESS),
                        to_department: Some(department::PREPRESS),
                        status: JobStatus::InProgress.as_db(),
                        remarks,
                        user_id: user.id,
                    },
                )
                .await?;
            }
        }
        PrepressStatus::Completed => {
            let card = db::job_cards::find_by_id(&mut *tx, job.job_card_id)
                .await?
                .ok_or(ErrorCode::JobNotFound)?;
            if !card
                .current_department
                .as_deref()
                .is_some_and(department::is_prepress)
            {
                return Err(AppError::with_message(
                    ErrorCode::InvalidJobTransition,
                    "Job card is not in Prepress",
                )
                .into());
            }
            workflow::advance_job(&mut *tx, &card, user, remarks).await?;
        }
        _ => {}
    }

    tx.commit().await?;

    tracing::info!(
        prepress_id = id,
        from = status.as_db(),
        to = target.as_db(),
        "Prepress status changed"
    );
    Ok(load(pool, id).await?.0)
}
