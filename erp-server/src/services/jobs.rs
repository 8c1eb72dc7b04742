//! Job card lifecycle

use shared::error::{AppError, ErrorCode};
use shared::models::department;
use shared::models::{
    JobCard, JobCardCreate, JobCardDetail, JobCardUpdate, JobPriority, JobStatus, PrepressStatus,
};
use sqlx::PgPool;

use super::workflow;
use crate::auth::CurrentUser;
use crate::db;
use crate::db::DocumentSequence;
use crate::db::job_cards::{HistoryRecord, NewJobCard};
use crate::error::ServiceResult;
use crate::util::non_blank;

pub async fn get(pool: &PgPool, id: i64) -> ServiceResult<JobCardDetail> {
    let job = db::job_cards::find_by_id(pool, id)
        .await?
        .ok_or(ErrorCode::JobNotFound)?;
    let history = db::job_cards::list_history(pool, id).await?;
    Ok(JobCardDetail { job, history })
}

async fn load(pool: &PgPool, id: i64) -> ServiceResult<JobCard> {
    Ok(db::job_cards::find_by_id(pool, id)
        .await?
        .ok_or(ErrorCode::JobNotFound)?)
}

/// Open a job card at the first step of the product's route
pub async fn create(
    pool: &PgPool,
    user: &CurrentUser,
    data: &JobCardCreate,
) -> ServiceResult<JobCardDetail> {
    if data.quantity <= 0 {
        return Err(AppError::with_message(ErrorCode::ValueOutOfRange, "Quantity must be positive")
            .with_detail("field", "quantity")
            .into());
    }

    let company = db::companies::find_by_id(pool, data.company_id)
        .await?
        .filter(|c| c.is_active)
        .ok_or(ErrorCode::CompanyNotFound)?;
    let product = db::products::find_by_id(pool, data.product_id)
        .await?
        .filter(|p| p.is_active)
        .ok_or(ErrorCode::ProductNotFound)?;

    let route = workflow::build_route(db::process::product_route_steps(pool, product.id).await?);
    let first = route.first().ok_or_else(|| {
        AppError::with_message(
            ErrorCode::ProcessSequenceMissing,
            format!("No process route for product type '{}'", product.product_type),
        )
        .with_detail("product_type", product.product_type.clone())
    })?;

    let priority = data.priority.unwrap_or(JobPriority::Normal);
    let mut tx = pool.begin().await?;

    let job_number = db::next_document_number(&mut *tx, DocumentSequence::JobCard).await?;
    let id = db::job_cards::insert(
        &mut *tx,
        &NewJobCard {
            job_number: &job_number,
            company_id: company.id,
            product_id: product.id,
            po_number: data.po_number.as_deref().and_then(non_blank),
            quantity: data.quantity,
            delivery_date: data.delivery_date,
            priority: priority.as_db(),
            current_department: &first.department,
            current_step: &first.step_name,
            notes: data.notes.as_deref(),
            created_by: user.id,
        },
    )
    .await?;

    if department::is_prepress(&first.department) {
        db::prepress::open_for_job(&mut *tx, id).await?;
    }

    db::job_cards::insert_history(
        &mut *tx,
        &HistoryRecord {
            job_card_id: id,
            action: "created",
            from_department: None,
            to_department: Some(&first.department),
            status: JobStatus::Pending.as_db(),
            remarks: data.notes.as_deref(),
            user_id: user.id,
        },
    )
    .await?;

    tx.commit().await?;

    tracing::info!(job_id = id, job_number = %job_number, department = %first.department, "Job card created");
    get(pool, id).await
}

pub async fn update(pool: &PgPool, id: i64, data: &JobCardUpdate) -> ServiceResult<JobCard> {
    if data.quantity.is_some_and(|q| q <= 0) {
        return Err(AppError::with_message(ErrorCode::ValueOutOfRange, "Quantity must be positive")
            .with_detail("field", "quantity")
            .into());
    }

    let job = load(pool, id).await?;
    if job.status().is_some_and(|s| s.is_closed()) {
        return Err(ErrorCode::JobClosed.into());
    }
    if !db::job_cards::update_details(pool, id, data).await? {
        // Closed between the read and the write
        return Err(ErrorCode::JobClosed.into());
    }
    load(pool, id).await
}

/// Caller may act on the job's current step
///
/// `jobs:manage` overrides the department match.
fn check_department(user: &CurrentUser, job: &JobCard) -> Result<(), AppError> {
    if user.has_permission("jobs:manage") {
        return Ok(());
    }
    let Some(current) = job.current_department.as_deref() else {
        return Ok(());
    };
    if user.works_in(current) {
        Ok(())
    } else {
        Err(AppError::with_message(
            ErrorCode::WrongDepartment,
            format!("Job is in {current}"),
        )
        .with_detail("department", current))
    }
}

/// Move the job to the next step of its route, or complete it after the
/// last one
pub async fn advance(
    pool: &PgPool,
    user: &CurrentUser,
    id: i64,
    remarks: Option<&str>,
) -> ServiceResult<JobCardDetail> {
    let job = load(pool, id).await?;
    if job.status().is_some_and(|s| s.is_closed()) {
        return Err(ErrorCode::JobClosed.into());
    }
    check_department(user, &job)?;

    let mut tx = pool.begin().await?;
    workflow::advance_job(&mut *tx, &job, user, remarks).await?;
    tx.commit().await?;
    get(pool, id).await
}

/// Status-only transitions (start, hold, resume, cancel)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Start,
    Hold,
    Resume,
    Cancel,
}

impl Transition {
    fn from_statuses(self) -> &'static [JobStatus] {
        match self {
            Self::Start => &[JobStatus::Pending],
            Self::Hold => &[JobStatus::Pending, JobStatus::InProgress],
            Self::Resume => &[JobStatus::OnHold],
            Self::Cancel => &[JobStatus::Pending, JobStatus::InProgress, JobStatus::OnHold],
        }
    }

    fn target(self) -> JobStatus {
        match self {
            Self::Start | Self::Resume => JobStatus::InProgress,
            Self::Hold => JobStatus::OnHold,
            Self::Cancel => JobStatus::Cancelled,
        }
    }

    fn action(self) -> &'static str {
        match self {
            Self::Start => "started",
            Self::Hold => "held",
            Self::Resume => "resumed",
            Self::Cancel => "cancelled",
        }
    }

    /// Hold and cancel must say why
    fn requires_remarks(self) -> bool {
        matches!(self, Self::Hold | Self::Cancel)
    }

    /// Starting work is a floor action, checked against the department
    fn department_bound(self) -> bool {
        matches!(self, Self::Start)
    }
}

pub async fn transition(
    pool: &PgPool,
    user: &CurrentUser,
    id: i64,
    transition: Transition,
    remarks: Option<&str>,
) -> ServiceResult<JobCard> {
    let remarks = remarks.and_then(non_blank);
    if transition.requires_remarks() && remarks.is_none() {
        return Err(AppError::required("remarks").into());
    }

    let job = load(pool, id).await?;
    let status = job.status().ok_or(ErrorCode::InvalidJobTransition)?;
    let target = transition.target();
    if status.is_closed() {
        return Err(ErrorCode::JobClosed.into());
    }
    if !transition.from_statuses().contains(&status) {
        return Err(AppError::transition(
            ErrorCode::InvalidJobTransition,
            status.as_db(),
            target.as_db(),
        )
        .into());
    }
    if transition.department_bound() {
        check_department(user, &job)?;
    }

    let from: Vec<&str> = transition.from_statuses().iter().map(|s| s.as_db()).collect();
    let mut tx = pool.begin().await?;
    if !db::job_cards::set_status(&mut *tx, id, &from, target.as_db()).await? {
        return Err(ErrorCode::JobStateChanged.into());
    }
    if transition == Transition::Cancel {
        db::prepress::close_for_job(&mut *tx, id, PrepressStatus::Cancelled.as_db()).await?;
    }
    db::job_cards::insert_history(
        &mut *tx,
        &HistoryRecord {
            job_card_id: id,
            action: transition.action(),
            from_department: job.current_department.as_deref(),
            to_department: job.current_department.as_deref(),
            status: target.as_db(),
            remarks,
            user_id: user.id,
        },
    )
    .await?;
    tx.commit().await?;

    tracing::info!(job_id = id, from = status.as_db(), to = target.as_db(), "Job status changed");
    load(pool, id).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(department: Option<&str>) -> JobCard {
        JobCard {
            id: 1,
            job_number: "JC-2026-00001".into(),
            company_id: 1,
            company_name: "Acme Foods".into(),
            product_id: 1,
            product_name: "Cereal carton".into(),
            po_number: None,
            quantity: 10_000,
            delivery_date: None,
            priority: "normal".into(),
            status: "pending".into(),
            current_department: department.map(str::to_string),
            current_step: department.map(str::to_string),
            notes: None,
            created_by: Some(1),
            created_at: 0,
            updated_at: 0,
            completed_at: None,
        }
    }

    fn user(permissions: &[&str], department: Option<&str>) -> CurrentUser {
        CurrentUser {
            id: 5,
            username: "op".into(),
            role: "operator".into(),
            permissions: permissions.iter().map(|s| s.to_string()).collect(),
            department: department.map(str::to_string),
        }
    }

    #[test]
    fn test_department_must_match() {
        let err = check_department(&user(&["jobs:advance"], Some("Cutting")), &job(Some("CTP")))
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::WrongDepartment);

        assert!(check_department(&user(&["jobs:advance"], Some("ctp")), &job(Some("CTP"))).is_ok());
        assert!(check_department(&user(&["jobs:advance"], None), &job(Some("CTP"))).is_err());
    }

    #[test]
    fn test_manager_skips_department_check() {
        assert!(check_department(&user(&["jobs:manage"], None), &job(Some("CTP"))).is_ok());
    }

    #[test]
    fn test_transition_table() {
        assert!(Transition::Start.from_statuses().contains(&JobStatus::Pending));
        assert!(!Transition::Start.from_statuses().contains(&JobStatus::OnHold));
        assert_eq!(Transition::Resume.target(), JobStatus::InProgress);
        assert!(!Transition::Cancel.from_statuses().contains(&JobStatus::Completed));
        assert!(Transition::Hold.requires_remarks());
        assert!(!Transition::Resume.requires_remarks());
    }
}
