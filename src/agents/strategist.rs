//! Roadmap sequencing.

use std::fmt::Write;
use std::sync::Arc;

use super::AgentSettings;
use crate::ai::{self, AgentError, CallSpec, ModelProvider};
use crate::models::{BacklogItem, RoadmapPlan};

const SYSTEM_PROMPT: &str = "You are an expert Head of Product (Roadmap Strategist). \
Your goal is to organize backlog items into a weekly roadmap (e.g., Week 1, Week 2, etc.). \
Infer dependencies based on technical logic (e.g., 'Auth' before 'Profile'). \
Assign weeks ensuring dependencies are met. \
Flag any risks or impossible schedules (e.g., too many high items in one week). \
Return a list of roadmap items with assigned weeks and a list of warnings if any.";

/// Team throughput the planner is told to assume.
const VELOCITY_HINT: &str = "Assume a team velocity of ~3-4 items per week.";

/// Sequences backlog items into weeks.
#[derive(Clone)]
pub struct Strategist {
    provider: Arc<dyn ModelProvider>,
    settings: AgentSettings,
}

impl Strategist {
    pub fn new(provider: Arc<dyn ModelProvider>, settings: AgentSettings) -> Self {
        Self { provider, settings }
    }

    pub fn settings(&self) -> &AgentSettings {
        &self.settings
    }

    /// Render one line per backlog item followed by the velocity hint.
    pub fn render_context(items: &[BacklogItem]) -> String {
        let mut context = String::from("Generate a roadmap for the following items:\n");
        for item in items {
            let quality = item
                .quality_score
                .map_or_else(|| "unscored".to_string(), |score| score.to_string());
            let _ = write!(
                context,
                "\nID: {} | Title: {} | Type: {} | Quality: {}",
                item.id, item.title, item.item_type, quality
            );
        }
        let _ = write!(context, "\n\n{VELOCITY_HINT}");
        context
    }

    /// Plan a roadmap.
    ///
    /// Dependency ids and week assignments are taken from the model as-is;
    /// only the plan's shape is checked.
    pub async fn plan(&self, items: &[BacklogItem]) -> Result<RoadmapPlan, AgentError> {
        let call = CallSpec {
            model: &self.settings.model,
            system: SYSTEM_PROMPT,
            context: Self::render_context(items),
            policy: &self.settings.retry,
        };

        let plan: RoadmapPlan = ai::execute(self.provider.as_ref(), &call).await?;
        tracing::info!(
            items = plan.items.len(),
            weeks = ?plan.last_week(),
            warnings = plan.warnings.len(),
            "Planned roadmap"
        );
        Ok(plan)
    }
}
