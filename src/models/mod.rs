//! Schema-validated data types.
//!
//! These are the request and response contracts shared by the HTTP API and
//! the model prompts. Shape errors (unknown enum values, missing fields,
//! wrong types) are caught by serde; range constraints are caught by
//! [`Validate`].

mod backlog;
mod feedback;
mod roadmap;

pub use backlog::{BacklogItem, ItemStatus, ItemType, QualityIssue, MAX_QUALITY_SCORE};
pub use feedback::{FeedbackCluster, FeedbackItem, Sentiment};
pub use roadmap::{RiskLevel, RoadmapItem, RoadmapPlan};

/// A field constraint violation found after deserialization.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    /// Path of the offending field, e.g. `quality_score` or `[2].week`.
    pub field: String,

    /// What is wrong with it.
    pub message: String,
}

impl ValidationError {
    /// Create a new validation error.
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self { field: field.into(), message: message.into() }
    }

    fn nested(self, prefix: &str) -> Self {
        Self { field: format!("{prefix}{}", self.field), message: self.message }
    }
}

/// Constraints that serde alone cannot express.
pub trait Validate {
    /// Check field constraints, returning the first violation.
    fn validate(&self) -> Result<(), ValidationError>;
}

impl<T: Validate> Validate for Vec<T> {
    fn validate(&self) -> Result<(), ValidationError> {
        for (index, item) in self.iter().enumerate() {
            item.validate().map_err(|e| e.nested(&format!("[{index}].")))?;
        }
        Ok(())
    }
}
