//! Weekly roadmap plans.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::{Validate, ValidationError};

/// Delivery risk attached to a scheduled item.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    #[default]
    Low,
    Medium,
    High,
}

/// A backlog item placed into a specific week.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct RoadmapItem {
    /// Id of the backlog item being scheduled
    pub item_id: String,

    /// Week number the item is scheduled in
    pub week: u32,

    /// Ids of backlog items that must ship first
    #[serde(default)]
    pub dependencies: Vec<String>,

    #[serde(default)]
    pub risk_level: RiskLevel,
}

/// A sequenced roadmap plus anything the planner wants to flag.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct RoadmapPlan {
    pub items: Vec<RoadmapItem>,

    pub warnings: Vec<String>,
}

impl RoadmapPlan {
    /// Number of the last scheduled week, if any.
    pub fn last_week(&self) -> Option<u32> {
        self.items.iter().map(|item| item.week).max()
    }
}

impl Validate for RoadmapPlan {
    fn validate(&self) -> Result<(), ValidationError> {
        Ok(())
    }
}
