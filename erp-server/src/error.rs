//! Unified service-layer error type
//!
//! `ServiceError` bridges DB-layer errors (`sqlx::Error`, `BoxError`) and the
//! API-layer error (`AppError`) so multi-step operations can use `?` on both.

use axum::response::IntoResponse;
use shared::error::{AppError, ErrorCode};

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Service-layer error
///
/// - `Db`: Database/infrastructure errors (auto-logged, mapped to InternalError)
/// - `App`: Business-rule errors (transparent pass-through to client)
#[derive(Debug)]
pub enum ServiceError {
    Db(BoxError),
    App(AppError),
}

impl From<sqlx::Error> for ServiceError {
    fn from(e: sqlx::Error) -> Self {
        ServiceError::Db(e.into())
    }
}

impl From<BoxError> for ServiceError {
    fn from(e: BoxError) -> Self {
        ServiceError::Db(e)
    }
}

impl From<AppError> for ServiceError {
    fn from(e: AppError) -> Self {
        ServiceError::App(e)
    }
}

impl From<ErrorCode> for ServiceError {
    fn from(code: ErrorCode) -> Self {
        ServiceError::App(AppError::new(code))
    }
}

impl From<ServiceError> for AppError {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::App(app_err) => app_err,
            ServiceError::Db(db_err) => internal(db_err),
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> axum::response::Response {
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Log an infrastructure error and hide it behind `InternalError`
pub fn internal(e: impl std::fmt::Display) -> AppError {
    tracing::error!(error = %e, "Database query failed");
    AppError::new(ErrorCode::InternalError)
}

/// Map a write error: unique violation → `conflict`, FK violation →
/// `InvalidReference`, anything else → `InternalError`.
pub fn write_error(e: BoxError, conflict: ErrorCode) -> AppError {
    match constraint_violation(&*e) {
        Some(Violation::Unique(constraint)) => {
            let mut err = AppError::new(conflict);
            if let Some(c) = constraint {
                err = err.with_detail("constraint", c);
            }
            err
        }
        Some(Violation::ForeignKey(constraint)) => {
            let mut err = AppError::new(ErrorCode::InvalidReference);
            if let Some(c) = constraint {
                err = err.with_detail("constraint", c);
            }
            err
        }
        None => internal(e),
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Violation {
    Unique(Option<String>),
    ForeignKey(Option<String>),
}

fn constraint_violation(e: &(dyn std::error::Error + Send + Sync + 'static)) -> Option<Violation> {
    let db_err = e.downcast_ref::<sqlx::Error>()?.as_database_error()?;
    let constraint = db_err.constraint().map(str::to_string);
    if db_err.is_unique_violation() {
        Some(Violation::Unique(constraint))
    } else if db_err.is_foreign_key_violation() {
        Some(Violation::ForeignKey(constraint))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_error_passes_through() {
        let err: AppError = ServiceError::from(ErrorCode::JobClosed).into();
        assert_eq!(err.code, ErrorCode::JobClosed);
    }

    #[test]
    fn test_db_error_becomes_internal() {
        let err: AppError = ServiceError::from(sqlx::Error::RowNotFound).into();
        assert_eq!(err.code, ErrorCode::InternalError);
        assert_eq!(err.message, "Internal server error");
    }

    #[test]
    fn test_write_error_without_constraint_is_internal() {
        let err = write_error(
            Box::new(sqlx::Error::PoolTimedOut),
            ErrorCode::CompanyCodeExists,
        );
        assert_eq!(err.code, ErrorCode::InternalError);

        let err = write_error("plain failure".into(), ErrorCode::CompanyCodeExists);
        assert_eq!(err.code, ErrorCode::InternalError);
    }
}
