//! Backlog items and their quality annotations.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::{Validate, ValidationError};

/// Highest quality score a groomed item may carry.
pub const MAX_QUALITY_SCORE: u8 = 100;

/// Kind of work a backlog item represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ItemType {
    Feature,
    Bug,
    Chore,
    Improvement,
}

impl std::fmt::Display for ItemType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Feature => write!(f, "feature"),
            Self::Bug => write!(f, "bug"),
            Self::Chore => write!(f, "chore"),
            Self::Improvement => write!(f, "improvement"),
        }
    }
}

/// Workflow status of a backlog item.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    #[default]
    Backlog,
    Todo,
    InProgress,
    Done,
}

/// A single problem found while grooming an item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct QualityIssue {
    /// Type of issue, e.g. 'clarity', 'missing_criteria', 'vague'
    pub issue_type: String,

    /// Suggestion to fix the issue
    pub suggestion: String,
}

/// A unit of product work, optionally enriched by grooming.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct BacklogItem {
    pub id: String,

    pub title: String,

    pub description: String,

    #[serde(rename = "type")]
    pub item_type: ItemType,

    #[serde(default)]
    pub status: ItemStatus,

    /// Quality score from 0 to 100
    #[serde(default)]
    #[schemars(range(min = 0, max = 100))]
    pub quality_score: Option<u8>,

    #[serde(default)]
    pub quality_issues: Vec<QualityIssue>,

    #[serde(default)]
    pub refined_description: Option<String>,
}

impl BacklogItem {
    /// Create an ungroomed item in the backlog.
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
        item_type: ItemType,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: description.into(),
            item_type,
            status: ItemStatus::default(),
            quality_score: None,
            quality_issues: Vec::new(),
            refined_description: None,
        }
    }
}

impl Validate for BacklogItem {
    fn validate(&self) -> Result<(), ValidationError> {
        match self.quality_score {
            Some(score) if score > MAX_QUALITY_SCORE => Err(ValidationError::new(
                "quality_score",
                format!("must be between 0 and {MAX_QUALITY_SCORE}, got {score}"),
            )),
            _ => Ok(()),
        }
    }
}
