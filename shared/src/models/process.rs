//! Process sequence Model
//!
//! A process sequence is the ordered list of department steps a job card of
//! a given product type goes through. Optional steps are switched on per
//! product through [`StepSelection`].

use serde::{Deserialize, Serialize};

/// Process sequence (one per product type)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct ProcessSequence {
    pub id: i64,
    pub product_type: String,
    pub description: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Single step of a process sequence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct ProcessStep {
    pub id: i64,
    pub sequence_id: i64,
    pub step_order: i32,
    /// Unique within the sequence; job cards reference it as `current_step`
    pub step_name: String,
    pub department: String,
    pub is_compulsory: bool,
}

/// Sequence with its steps ordered by `step_order`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessSequenceDetail {
    #[serde(flatten)]
    pub sequence: ProcessSequence,
    pub steps: Vec<ProcessStep>,
}

/// Step definition inside create / replace payloads
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessStepInput {
    pub step_name: String,
    pub department: String,
    #[serde(default = "default_true")]
    pub is_compulsory: bool,
}

fn default_true() -> bool {
    true
}

/// Create sequence payload; steps are ordered as given
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessSequenceCreate {
    pub product_type: String,
    pub description: Option<String>,
    pub steps: Vec<ProcessStepInput>,
}

/// Replace all steps of a sequence
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessStepsReplace {
    pub description: Option<String>,
    pub steps: Vec<ProcessStepInput>,
}

/// Per-product switch for an optional step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepSelection {
    pub step_id: i64,
    pub is_selected: bool,
}

/// Step of a product route, as loaded with the product's selection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct RouteStep {
    pub step_id: i64,
    pub step_order: i32,
    pub step_name: String,
    pub department: String,
    pub is_compulsory: bool,
    /// `None` when the product has no selection row for this step
    pub is_selected: Option<bool>,
}

impl RouteStep {
    /// Whether the step is part of the product's route
    pub fn is_active(&self) -> bool {
        self.is_compulsory || self.is_selected.unwrap_or(false)
    }
}

/// Effective route of a product
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductRoute {
    pub product_id: i64,
    pub product_type: String,
    pub steps: Vec<RouteStep>,
}
