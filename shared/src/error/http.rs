//! HTTP status code mapping for error codes

use super::codes::ErrorCode;
use http::StatusCode;

impl ErrorCode {
    /// Get the appropriate HTTP status code for this error code
    pub fn http_status(&self) -> StatusCode {
        match self {
            // Success
            Self::Success => StatusCode::OK,

            // 404 Not Found
            Self::NotFound
            | Self::CompanyNotFound
            | Self::ProductNotFound
            | Self::MaterialNotFound
            | Self::ProcessSequenceNotFound
            | Self::ProcessStepNotFound
            | Self::JobNotFound
            | Self::PrepressJobNotFound
            | Self::DesignerNotFound
            | Self::InventoryItemNotFound
            | Self::PurchaseOrderNotFound
            | Self::PurchaseOrderLineNotFound
            | Self::UserNotFound
            | Self::RoleNotFound => StatusCode::NOT_FOUND,

            // 409 Conflict
            Self::AlreadyExists
            | Self::CompanyCodeExists
            | Self::ProductCodeExists
            | Self::MaterialCodeExists
            | Self::ProcessSequenceExists
            | Self::ProcessSequenceInUse
            | Self::JobClosed
            | Self::JobStateChanged
            | Self::ItemCodeExists
            | Self::InsufficientStock
            | Self::PurchaseOrderNotEditable
            | Self::UsernameExists
            | Self::RoleNameExists
            | Self::RoleInUse => StatusCode::CONFLICT,

            // 401 Unauthorized
            Self::NotAuthenticated
            | Self::InvalidCredentials
            | Self::TokenExpired
            | Self::TokenInvalid
            | Self::AccountDisabled => StatusCode::UNAUTHORIZED,

            // 403 Forbidden
            Self::PermissionDenied
            | Self::AdminRequired
            | Self::WrongDepartment
            | Self::RoleIsSystem
            | Self::CannotDeactivateSelf => StatusCode::FORBIDDEN,

            // 429 Too Many Requests
            Self::TooManyRequests => StatusCode::TOO_MANY_REQUESTS,

            // 500 Internal Server Error
            Self::Unknown | Self::InternalError | Self::DatabaseError | Self::ConfigError => {
                StatusCode::INTERNAL_SERVER_ERROR
            }

            // 400 Bad Request (default for validation/business errors)
            _ => StatusCode::BAD_REQUEST,
        }
    }
}
