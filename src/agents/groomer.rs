//! Backlog grooming.

use std::sync::Arc;

use super::AgentSettings;
use crate::ai::{self, AgentError, CallSpec, ModelProvider};
use crate::models::BacklogItem;

const SYSTEM_PROMPT: &str = "You are an expert Product Manager assistant (Backlog Groomer). \
Your goal is to review backlog items for quality, clarity, and completeness. \
Analyze the title and description. \
If they are vague, missing acceptance criteria, or unclear, flag them as quality issues. \
Provide a concrete suggestion to improve the title and description. \
Assign a quality score from 0-100. \
Also, if the item looks like a bug, label it as such.";

/// Scores a backlog item and suggests improvements.
#[derive(Clone)]
pub struct Groomer {
    provider: Arc<dyn ModelProvider>,
    settings: AgentSettings,
}

impl Groomer {
    pub fn new(provider: Arc<dyn ModelProvider>, settings: AgentSettings) -> Self {
        Self { provider, settings }
    }

    pub fn settings(&self) -> &AgentSettings {
        &self.settings
    }

    /// Render the item as the prompt context.
    pub fn render_context(item: &BacklogItem) -> String {
        format!(
            "Please review this backlog item:\nTitle: {}\nDescription: {}\nCurrent Type: {}",
            item.title, item.description, item.item_type
        )
    }

    /// Groom one item.
    ///
    /// The returned item always carries the input's id, whatever the model
    /// echoed back.
    pub async fn groom(&self, item: &BacklogItem) -> Result<BacklogItem, AgentError> {
        let call = CallSpec {
            model: &self.settings.model,
            system: SYSTEM_PROMPT,
            context: Self::render_context(item),
            policy: &self.settings.retry,
        };

        let mut groomed: BacklogItem = ai::execute(self.provider.as_ref(), &call).await?;
        groomed.id.clone_from(&item.id);

        tracing::info!(
            id = %groomed.id,
            score = ?groomed.quality_score,
            issues = groomed.quality_issues.len(),
            "Groomed backlog item"
        );
        Ok(groomed)
    }
}
