//! Feedback clustering.

use std::fmt::Write;
use std::sync::Arc;

use super::AgentSettings;
use crate::ai::{self, AgentError, CallSpec, ModelProvider};
use crate::models::{FeedbackCluster, FeedbackItem};

const SYSTEM_PROMPT: &str = "You are an expert Product Manager/User Researcher (Feedback Analyst). \
Your goal is to analyze a list of raw feedback items and cluster them into meaningful themes. \
For each cluster, identify the core theme, write a description, and list the IDs of the feedback items that belong to it. \
Also analyze the overall sentiment distribution for the cluster.";

/// Groups feedback into themes.
#[derive(Clone)]
pub struct Analyst {
    provider: Arc<dyn ModelProvider>,
    settings: AgentSettings,
}

impl Analyst {
    pub fn new(provider: Arc<dyn ModelProvider>, settings: AgentSettings) -> Self {
        Self { provider, settings }
    }

    pub fn settings(&self) -> &AgentSettings {
        &self.settings
    }

    /// Render one line per feedback item.
    pub fn render_context(items: &[FeedbackItem]) -> String {
        let mut context =
            String::from("Please analyze and cluster the following feedback items:\n");
        for item in items {
            let _ = write!(
                context,
                "\nID: {} | Content: {} | Source: {}",
                item.id, item.content, item.source
            );
        }
        context
    }

    /// Cluster feedback into themes.
    pub async fn cluster(
        &self,
        items: &[FeedbackItem],
    ) -> Result<Vec<FeedbackCluster>, AgentError> {
        let call = CallSpec {
            model: &self.settings.model,
            system: SYSTEM_PROMPT,
            context: Self::render_context(items),
            policy: &self.settings.retry,
        };

        let clusters: Vec<FeedbackCluster> = ai::execute(self.provider.as_ref(), &call).await?;
        tracing::info!(feedback = items.len(), clusters = clusters.len(), "Clustered feedback");
        Ok(clusters)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::ai::{ProviderError, StubProvider};
    use crate::core::RetryPolicy;

    fn analyst(stub: &Arc<StubProvider>) -> Analyst {
        let retry = RetryPolicy { initial_delay: Duration::from_millis(1), ..RetryPolicy::analyst() };
        Analyst::new(stub.clone(), AgentSettings::new("gemini-test", retry))
    }

    #[test]
    fn test_render_context() {
        let items = vec![
            FeedbackItem::new("f1", "support", "Login is slow"),
            FeedbackItem::new("f2", "twitter", "Love the dark mode"),
        ];
        insta::assert_snapshot!(Analyst::render_context(&items), @r"
        Please analyze and cluster the following feedback items:

        ID: f1 | Content: Login is slow | Source: support
        ID: f2 | Content: Love the dark mode | Source: twitter
        ");
    }

    #[tokio::test]
    async fn test_cluster_fenced_list() {
        let stub = Arc::new(StubProvider::replying(
            "```json\n[{\"theme\":\"Performance\",\"description\":\"Slowness\",\
             \"related_feedback_ids\":[\"f1\"],\"sentiment_distribution\":{\"negative\":1}}]\n```",
        ));
        let items = vec![FeedbackItem::new("f1", "support", "Login is slow")];

        let clusters = analyst(&stub).cluster(&items).await.unwrap();
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].theme, "Performance");
    }

    #[tokio::test]
    async fn test_object_instead_of_list_is_invalid() {
        let stub = Arc::new(StubProvider::replying(r#"{"theme":"x"}"#));

        let err = analyst(&stub).cluster(&[]).await.unwrap_err();
        assert_eq!(err.kind(), "invalid_response");
        assert_eq!(stub.calls(), 1);
    }

    #[tokio::test]
    async fn test_rate_limit_cap_is_three() {
        let stub = Arc::new(StubProvider::failing(ProviderError::Transport(
            "RESOURCE_EXHAUSTED".into(),
        )));

        let err = analyst(&stub).cluster(&[]).await.unwrap_err();
        assert_eq!(err.kind(), "rate_limited");
        assert_eq!(stub.calls(), 3);
    }
}
