//! Unified error codes for the ERP backend
//!
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 1xxx: Authentication errors
//! - 2xxx: Permission errors
//! - 3xxx: Master data errors (companies, products, materials, process sequences)
//! - 4xxx: Job card errors
//! - 5xxx: Prepress errors
//! - 6xxx: Inventory errors
//! - 7xxx: Purchasing errors
//! - 8xxx: User and role errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values so the React frontend can
/// switch on them without parsing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Unknown error
    Unknown = 1,
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Resource already exists
    AlreadyExists = 4,
    /// Invalid request
    InvalidRequest = 5,
    /// Invalid format
    InvalidFormat = 6,
    /// Required field missing
    RequiredField = 7,
    /// Value out of range
    ValueOutOfRange = 8,
    /// Referenced record does not exist
    InvalidReference = 9,

    // ==================== 1xxx: Auth ====================
    /// User is not authenticated
    NotAuthenticated = 1001,
    /// Invalid credentials (username/password)
    InvalidCredentials = 1002,
    /// Token has expired
    TokenExpired = 1003,
    /// Token is invalid
    TokenInvalid = 1004,
    /// Account is disabled
    AccountDisabled = 1005,
    /// Password too short
    PasswordTooShort = 1006,
    /// Too many login attempts
    TooManyRequests = 1007,

    // ==================== 2xxx: Permission ====================
    /// Permission denied
    PermissionDenied = 2001,
    /// Admin role required
    AdminRequired = 2002,
    /// Job is not in the caller's department
    WrongDepartment = 2003,

    // ==================== 3xxx: Master data ====================
    CompanyNotFound = 3001,
    CompanyCodeExists = 3002,
    ProductNotFound = 3101,
    ProductCodeExists = 3102,
    MaterialNotFound = 3201,
    MaterialCodeExists = 3202,
    ProcessSequenceNotFound = 3301,
    ProcessSequenceExists = 3302,
    /// Product has no usable process route
    ProcessSequenceMissing = 3303,
    /// Sequence still drives open jobs
    ProcessSequenceInUse = 3304,
    ProcessStepNotFound = 3305,
    InvalidProcessStep = 3306,

    // ==================== 4xxx: Job card ====================
    JobNotFound = 4001,
    /// Job is completed or cancelled
    JobClosed = 4002,
    /// Job moved while the request was in flight
    JobStateChanged = 4003,
    InvalidJobTransition = 4004,

    // ==================== 5xxx: Prepress ====================
    PrepressJobNotFound = 5001,
    InvalidPrepressTransition = 5002,
    DesignerNotFound = 5003,

    // ==================== 6xxx: Inventory ====================
    InventoryItemNotFound = 6001,
    ItemCodeExists = 6002,
    InsufficientStock = 6003,
    InvalidQuantity = 6004,

    // ==================== 7xxx: Purchasing ====================
    PurchaseOrderNotFound = 7001,
    /// Only draft orders can be edited
    PurchaseOrderNotEditable = 7002,
    InvalidPurchaseOrderTransition = 7003,
    ReceiveExceedsOrdered = 7004,
    PurchaseOrderEmpty = 7005,
    PurchaseOrderLineNotFound = 7006,

    // ==================== 8xxx: Users & roles ====================
    UserNotFound = 8001,
    UsernameExists = 8002,
    CannotDeactivateSelf = 8003,
    RoleNotFound = 8101,
    RoleNameExists = 8102,
    RoleInUse = 8103,
    RoleIsSystem = 8104,
    InvalidPermission = 8105,

    // ==================== 9xxx: System ====================
    InternalError = 9001,
    DatabaseError = 9002,
    ConfigError = 9005,
}

impl ErrorCode {
    /// Numeric value sent over the wire
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    #[inline]
    pub const fn is_success(&self) -> bool {
        matches!(self, ErrorCode::Success)
    }

    /// Default English message for this code
    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::Success => "Operation completed successfully",
            ErrorCode::Unknown => "An unknown error occurred",
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::AlreadyExists => "Resource already exists",
            ErrorCode::InvalidRequest => "Invalid request",
            ErrorCode::InvalidFormat => "Invalid format",
            ErrorCode::RequiredField => "Required field is missing",
            ErrorCode::ValueOutOfRange => "Value is out of range",
            ErrorCode::InvalidReference => "Referenced record does not exist",

            // Auth
            ErrorCode::NotAuthenticated => "User is not authenticated",
            ErrorCode::InvalidCredentials => "Invalid username or password",
            ErrorCode::TokenExpired => "Authentication token has expired",
            ErrorCode::TokenInvalid => "Authentication token is invalid",
            ErrorCode::AccountDisabled => "Account is disabled",
            ErrorCode::PasswordTooShort => "Password must be at least 8 characters",
            ErrorCode::TooManyRequests => "Too many requests, try again later",

            // Permission
            ErrorCode::PermissionDenied => "Permission denied",
            ErrorCode::AdminRequired => "Administrator role is required",
            ErrorCode::WrongDepartment => "Job is not in your department",

            // Master data
            ErrorCode::CompanyNotFound => "Company not found",
            ErrorCode::CompanyCodeExists => "Company code already exists",
            ErrorCode::ProductNotFound => "Product not found",
            ErrorCode::ProductCodeExists => "Product code already exists",
            ErrorCode::MaterialNotFound => "Material not found",
            ErrorCode::MaterialCodeExists => "Material code already exists",
            ErrorCode::ProcessSequenceNotFound => "Process sequence not found",
            ErrorCode::ProcessSequenceExists => {
                "A process sequence already exists for this product type"
            }
            ErrorCode::ProcessSequenceMissing => "Product has no process steps configured",
            ErrorCode::ProcessSequenceInUse => "Process sequence is used by open jobs",
            ErrorCode::ProcessStepNotFound => "Process step not found",
            ErrorCode::InvalidProcessStep => "Invalid process step",

            // Job card
            ErrorCode::JobNotFound => "Job card not found",
            ErrorCode::JobClosed => "Job card is completed or cancelled",
            ErrorCode::JobStateChanged => "Job card was modified by another request",
            ErrorCode::InvalidJobTransition => "Job card cannot make this transition",

            // Prepress
            ErrorCode::PrepressJobNotFound => "Prepress job not found",
            ErrorCode::InvalidPrepressTransition => "Prepress job cannot make this transition",
            ErrorCode::DesignerNotFound => "Designer not found",

            // Inventory
            ErrorCode::InventoryItemNotFound => "Inventory item not found",
            ErrorCode::ItemCodeExists => "Item code already exists",
            ErrorCode::InsufficientStock => "Insufficient stock",
            ErrorCode::InvalidQuantity => "Invalid quantity",

            // Purchasing
            ErrorCode::PurchaseOrderNotFound => "Purchase order not found",
            ErrorCode::PurchaseOrderNotEditable => "Only draft purchase orders can be edited",
            ErrorCode::InvalidPurchaseOrderTransition => {
                "Purchase order cannot make this transition"
            }
            ErrorCode::ReceiveExceedsOrdered => "Received quantity exceeds ordered quantity",
            ErrorCode::PurchaseOrderEmpty => "Purchase order has no lines",
            ErrorCode::PurchaseOrderLineNotFound => "Purchase order line not found",

            // Users & roles
            ErrorCode::UserNotFound => "User not found",
            ErrorCode::UsernameExists => "Username already exists",
            ErrorCode::CannotDeactivateSelf => "Cannot deactivate own account",
            ErrorCode::RoleNotFound => "Role not found",
            ErrorCode::RoleNameExists => "Role name already exists",
            ErrorCode::RoleInUse => "Role is assigned to users",
            ErrorCode::RoleIsSystem => "Cannot modify system role",
            ErrorCode::InvalidPermission => "Unknown permission",

            // System
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::DatabaseError => "Database error",
            ErrorCode::ConfigError => "Configuration error",
        }
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error when converting from an invalid u16 to ErrorCode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            // General
            0 => Ok(ErrorCode::Success),
            1 => Ok(ErrorCode::Unknown),
            2 => Ok(ErrorCode::ValidationFailed),
            3 => Ok(ErrorCode::NotFound),
            4 => Ok(ErrorCode::AlreadyExists),
            5 => Ok(ErrorCode::InvalidRequest),
            6 => Ok(ErrorCode::InvalidFormat),
            7 => Ok(ErrorCode::RequiredField),
            8 => Ok(ErrorCode::ValueOutOfRange),
            9 => Ok(ErrorCode::InvalidReference),

            // Auth
            1001 => Ok(ErrorCode::NotAuthenticated),
            1002 => Ok(ErrorCode::InvalidCredentials),
            1003 => Ok(ErrorCode::TokenExpired),
            1004 => Ok(ErrorCode::TokenInvalid),
            1005 => Ok(ErrorCode::AccountDisabled),
            1006 => Ok(ErrorCode::PasswordTooShort),
            1007 => Ok(ErrorCode::TooManyRequests),

            // Permission
            2001 => Ok(ErrorCode::PermissionDenied),
            2002 => Ok(ErrorCode::AdminRequired),
            2003 => Ok(ErrorCode::WrongDepartment),

            // Master data
            3001 => Ok(ErrorCode::CompanyNotFound),
            3002 => Ok(ErrorCode::CompanyCodeExists),
            3101 => Ok(ErrorCode::ProductNotFound),
            3102 => Ok(ErrorCode::ProductCodeExists),
            3201 => Ok(ErrorCode::MaterialNotFound),
            3202 => Ok(ErrorCode::MaterialCodeExists),
            3301 => Ok(ErrorCode::ProcessSequenceNotFound),
            3302 => Ok(ErrorCode::ProcessSequenceExists),
            3303 => Ok(ErrorCode::ProcessSequenceMissing),
            3304 => Ok(ErrorCode::ProcessSequenceInUse),
            3305 => Ok(ErrorCode::ProcessStepNotFound),
            3306 => Ok(ErrorCode::InvalidProcessStep),

            // Job card
            4001 => Ok(ErrorCode::JobNotFound),
            4002 => Ok(ErrorCode::JobClosed),
            4003 => Ok(ErrorCode::JobStateChanged),
            4004 => Ok(ErrorCode::InvalidJobTransition),

            // Prepress
            5001 => Ok(ErrorCode::PrepressJobNotFound),
            5002 => Ok(ErrorCode::InvalidPrepressTransition),
            5003 => Ok(ErrorCode::DesignerNotFound),

            // Inventory
            6001 => Ok(ErrorCode::InventoryItemNotFound),
            6002 => Ok(ErrorCode::ItemCodeExists),
            6003 => Ok(ErrorCode::InsufficientStock),
            6004 => Ok(ErrorCode::InvalidQuantity),

            // Purchasing
            7001 => Ok(ErrorCode::PurchaseOrderNotFound),
            7002 => Ok(ErrorCode::PurchaseOrderNotEditable),
            7003 => Ok(ErrorCode::InvalidPurchaseOrderTransition),
            7004 => Ok(ErrorCode::ReceiveExceedsOrdered),
            7005 => Ok(ErrorCode::PurchaseOrderEmpty),
            7006 => Ok(ErrorCode::PurchaseOrderLineNotFound),

            // Users & roles
            8001 => Ok(ErrorCode::UserNotFound),
            8002 => Ok(ErrorCode::UsernameExists),
            8003 => Ok(ErrorCode::CannotDeactivateSelf),
            8101 => Ok(ErrorCode::RoleNotFound),
            8102 => Ok(ErrorCode::RoleNameExists),
            8103 => Ok(ErrorCode::RoleInUse),
            8104 => Ok(ErrorCode::RoleIsSystem),
            8105 => Ok(ErrorCode::InvalidPermission),

            // System
            9001 => Ok(ErrorCode::InternalError),
            9002 => Ok(ErrorCode::DatabaseError),
            9005 => Ok(ErrorCode::ConfigError),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_values() {
        assert_eq!(ErrorCode::Success.code(), 0);
        assert_eq!(ErrorCode::NotAuthenticated.code(), 1001);
        assert_eq!(ErrorCode::WrongDepartment.code(), 2003);
        assert_eq!(ErrorCode::ProcessSequenceMissing.code(), 3303);
        assert_eq!(ErrorCode::JobStateChanged.code(), 4003);
        assert_eq!(ErrorCode::InsufficientStock.code(), 6003);
        assert_eq!(ErrorCode::InternalError.code(), 9001);
    }

    #[test]
    fn test_try_from_u16() {
        assert_eq!(ErrorCode::try_from(4001), Ok(ErrorCode::JobNotFound));
        assert_eq!(ErrorCode::try_from(7004), Ok(ErrorCode::ReceiveExceedsOrdered));
        assert_eq!(ErrorCode::try_from(4999), Err(InvalidErrorCode(4999)));
    }

    #[test]
    fn test_serde_as_number() {
        let json = serde_json::to_string(&ErrorCode::JobClosed).unwrap();
        assert_eq!(json, "4002");

        let code: ErrorCode = serde_json::from_str("8103").unwrap();
        assert_eq!(code, ErrorCode::RoleInUse);

        assert!(serde_json::from_str::<ErrorCode>("12345").is_err());
    }

    #[test]
    fn test_message_and_display() {
        assert_eq!(ErrorCode::JobNotFound.message(), "Job card not found");
        assert_eq!(format!("{}", ErrorCode::JobNotFound), "4001");
        assert!(ErrorCode::Success.is_success());
        assert!(!ErrorCode::Unknown.is_success());
    }
}
