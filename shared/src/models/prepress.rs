//! Prepress job Model
//!
//! Every job card that enters the Prepress department gets one prepress job
//! that tracks the designer's work until the artwork is approved.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrepressStatus {
    Pending,
    Assigned,
    InProgress,
    Paused,
    /// Waiting for head-of-department approval
    HodReview,
    Completed,
    Rejected,
    /// Job card cancelled while in Prepress
    Cancelled,
}

impl PrepressStatus {
    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "assigned" => Some(Self::Assigned),
            "in_progress" => Some(Self::InProgress),
            "paused" => Some(Self::Paused),
            "hod_review" => Some(Self::HodReview),
            "completed" => Some(Self::Completed),
            "rejected" => Some(Self::Rejected),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }

    pub fn as_db(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Assigned => "assigned",
            Self::InProgress => "in_progress",
            Self::Paused => "paused",
            Self::HodReview => "hod_review",
            Self::Completed => "completed",
            Self::Rejected => "rejected",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// Allowed status moves
    pub fn can_transition_to(&self, next: PrepressStatus) -> bool {
        use PrepressStatus::*;
        matches!(
            (self, next),
            (Pending, Assigned)
                | (Assigned, InProgress)
                | (InProgress, Paused)
                | (Paused, InProgress)
                | (InProgress, HodReview)
                | (HodReview, Completed)
                | (HodReview, Rejected)
                | (Rejected, InProgress)
        )
    }
}

/// Prepress job joined with job card and designer
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct PrepressJob {
    pub id: i64,
    pub job_card_id: i64,
    pub job_number: String,
    pub product_name: String,
    pub company_name: String,
    pub assigned_designer_id: Option<i64>,
    pub designer_name: Option<String>,
    pub status: String,
    pub priority: String,
    pub due_date: Option<NaiveDate>,
    pub remarks: Option<String>,
    pub started_at: Option<i64>,
    pub completed_at: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrepressAssign {
    pub designer_id: i64,
    pub remarks: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrepressStatusUpdate {
    pub status: PrepressStatus,
    pub remarks: Option<String>,
}
