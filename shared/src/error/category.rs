//! Error category classification

use super::codes::ErrorCode;
use serde::{Deserialize, Serialize};

/// Error category classification based on error code ranges
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// General errors (0xxx)
    General,
    /// Authentication errors (1xxx)
    Auth,
    /// Permission errors (2xxx)
    Permission,
    /// Companies, products, materials, process sequences (3xxx)
    MasterData,
    /// Job card errors (4xxx)
    Job,
    /// Prepress errors (5xxx)
    Prepress,
    /// Inventory errors (6xxx)
    Inventory,
    /// Purchasing errors (7xxx)
    Purchasing,
    /// User and role errors (8xxx)
    User,
    /// System errors (9xxx)
    System,
}

impl ErrorCategory {
    /// Determine category from error code value
    pub fn from_code(code: u16) -> Self {
        match code {
            0..1000 => Self::General,
            1000..2000 => Self::Auth,
            2000..3000 => Self::Permission,
            3000..4000 => Self::MasterData,
            4000..5000 => Self::Job,
            5000..6000 => Self::Prepress,
            6000..7000 => Self::Inventory,
            7000..8000 => Self::Purchasing,
            8000..9000 => Self::User,
            _ => Self::System,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Auth => "auth",
            Self::Permission => "permission",
            Self::MasterData => "master_data",
            Self::Job => "job",
            Self::Prepress => "prepress",
            Self::Inventory => "inventory",
            Self::Purchasing => "purchasing",
            Self::User => "user",
            Self::System => "system",
        }
    }
}

impl ErrorCode {
    /// Get the category for this error code
    pub fn category(&self) -> ErrorCategory {
        ErrorCategory::from_code(self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_from_code() {
        assert_eq!(ErrorCategory::from_code(0), ErrorCategory::General);
        assert_eq!(ErrorCategory::from_code(999), ErrorCategory::General);
        assert_eq!(ErrorCategory::from_code(1001), ErrorCategory::Auth);
        assert_eq!(ErrorCategory::from_code(2001), ErrorCategory::Permission);
        assert_eq!(ErrorCategory::from_code(3303), ErrorCategory::MasterData);
        assert_eq!(ErrorCategory::from_code(4001), ErrorCategory::Job);
        assert_eq!(ErrorCategory::from_code(5002), ErrorCategory::Prepress);
        assert_eq!(ErrorCategory::from_code(6003), ErrorCategory::Inventory);
        assert_eq!(ErrorCategory::from_code(7001), ErrorCategory::Purchasing);
        assert_eq!(ErrorCategory::from_code(8101), ErrorCategory::User);
        assert_eq!(ErrorCategory::from_code(9001), ErrorCategory::System);
        assert_eq!(ErrorCategory::from_code(10000), ErrorCategory::System);
    }

    #[test]
    fn test_error_code_category() {
        assert_eq!(ErrorCode::JobClosed.category(), ErrorCategory::Job);
        assert_eq!(
            ErrorCode::ReceiveExceedsOrdered.category(),
            ErrorCategory::Purchasing
        );
        assert_eq!(ErrorCode::DatabaseError.category(), ErrorCategory::System);
        assert_eq!(ErrorCategory::MasterData.name(), "master_data");
    }
}
