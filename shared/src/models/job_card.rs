//! Job card Model

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Job card lifecycle status (stored lowercase)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Waiting at the current step
    Pending,
    /// Being worked on at the current step
    InProgress,
    OnHold,
    Completed,
    Cancelled,
}

impl JobStatus {
    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "in_progress" => Some(Self::InProgress),
            "on_hold" => Some(Self::OnHold),
            "completed" => Some(Self::Completed),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }

    pub fn as_db(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::OnHold => "on_hold",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Completed and cancelled jobs never change again
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// Can the job be moved on to its next step?
    pub fn can_advance(&self) -> bool {
        matches!(self, Self::Pending | Self::InProgress)
    }
}

/// Job priority (stored lowercase)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobPriority {
    Low,
    Normal,
    High,
    Urgent,
}

impl JobPriority {
    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "low" => Some(Self::Low),
            "normal" => Some(Self::Normal),
            "high" => Some(Self::High),
            "urgent" => Some(Self::Urgent),
            _ => None,
        }
    }

    pub fn as_db(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Normal => "normal",
            Self::High => "high",
            Self::Urgent => "urgent",
        }
    }
}

/// Job card row joined with company/product names
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct JobCard {
    pub id: i64,
    pub job_number: String,
    pub company_id: i64,
    pub company_name: String,
    pub product_id: i64,
    pub product_name: String,
    pub po_number: Option<String>,
    pub quantity: i32,
    pub delivery_date: Option<NaiveDate>,
    pub priority: String,
    pub status: String,
    /// `None` once the job has left its last step
    pub current_department: Option<String>,
    pub current_step: Option<String>,
    pub notes: Option<String>,
    pub created_by: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
    pub completed_at: Option<i64>,
}

impl JobCard {
    pub fn status(&self) -> Option<JobStatus> {
        JobStatus::from_db(&self.status)
    }
}

/// One entry of a job's audit trail
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct JobHistoryEntry {
    pub id: i64,
    pub job_card_id: i64,
    pub action: String,
    pub from_department: Option<String>,
    pub to_department: Option<String>,
    pub status: String,
    pub remarks: Option<String>,
    pub user_id: Option<i64>,
    pub username: Option<String>,
    pub created_at: i64,
}

/// Job card with its history, newest entry last
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobCardDetail {
    #[serde(flatten)]
    pub job: JobCard,
    pub history: Vec<JobHistoryEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobCardCreate {
    pub company_id: i64,
    pub product_id: i64,
    pub po_number: Option<String>,
    pub quantity: i32,
    pub delivery_date: Option<NaiveDate>,
    pub priority: Option<JobPriority>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobCardUpdate {
    pub po_number: Option<String>,
    pub quantity: Option<i32>,
    pub delivery_date: Option<NaiveDate>,
    pub priority: Option<JobPriority>,
    pub notes: Option<String>,
}

/// Body for advance / hold / resume / cancel
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobTransitionRequest {
    pub remarks: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_db_roundtrip() {
        for s in [
            JobStatus::Pending,
            JobStatus::InProgress,
            JobStatus::OnHold,
            JobStatus::Completed,
            JobStatus::Cancelled,
        ] {
            assert_eq!(JobStatus::from_db(s.as_db()), Some(s));
        }
        assert_eq!(JobStatus::from_db("done"), None);
    }

    #[test]
    fn test_status_rules() {
        assert!(JobStatus::Completed.is_closed());
        assert!(JobStatus::Cancelled.is_closed());
        assert!(!JobStatus::OnHold.is_closed());
        assert!(JobStatus::Pending.can_advance());
        assert!(!JobStatus::OnHold.can_advance());
    }

    #[test]
    fn test_priority_serde() {
        let p: JobPriority = serde_json::from_str("\"urgent\"").unwrap();
        assert_eq!(p, JobPriority::Urgent);
        assert!(JobPriority::Urgent > JobPriority::Normal);
        assert_eq!(JobPriority::from_db("high"), Some(JobPriority::High));
    }
}
