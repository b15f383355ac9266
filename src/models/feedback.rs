//! Customer feedback and the themes it clusters into.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};

use super::{Validate, ValidationError};

/// Tone of a piece of feedback.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Sentiment {
    Positive,
    #[default]
    Neutral,
    Negative,
}

/// One piece of raw feedback from a user or channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct FeedbackItem {
    pub id: String,

    /// Where the feedback came from, e.g. 'support', 'twitter', 'survey'
    pub source: String,

    pub content: String,

    #[serde(default = "Utc::now", deserialize_with = "deserialize_timestamp")]
    pub date: DateTime<Utc>,

    #[serde(default)]
    pub sentiment: Sentiment,

    #[serde(default)]
    pub cluster_theme: Option<String>,
}

impl FeedbackItem {
    /// Create neutral feedback stamped with the current time.
    pub fn new(
        id: impl Into<String>,
        source: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            content: content.into(),
            date: Utc::now(),
            sentiment: Sentiment::default(),
            cluster_theme: None,
        }
    }
}

/// Accept RFC 3339 timestamps as well as naive ISO ones, which are read as UTC.
fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;

    if let Ok(parsed) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(parsed.with_timezone(&Utc));
    }

    raw.parse::<NaiveDateTime>()
        .map(|naive| naive.and_utc())
        .map_err(|e| serde::de::Error::custom(format!("invalid timestamp '{raw}': {e}")))
}

/// A theme grouping several feedback items.
///
/// `related_feedback_ids` should reference ids from the request, but that is
/// left to the model and not checked here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FeedbackCluster {
    pub theme: String,

    pub description: String,

    pub related_feedback_ids: Vec<String>,

    /// Sentiment label to count or proportion
    pub sentiment_distribution: BTreeMap<String, serde_json::Value>,
}

impl Validate for FeedbackCluster {
    fn validate(&self) -> Result<(), ValidationError> {
        Ok(())
    }
}
