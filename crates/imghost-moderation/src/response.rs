//! Classifier response shapes and their normalization.
//!
//! Two shapes are accepted:
//!
//! - detection list: `{"details": [{"label"|"class"|"className": .., "score"|"probability": ..}], ...}`
//! - score map: `{"probability": .., "details": {"safe": .., "unsafe": ..}}` (details optional)
//!
//! Either may carry `is_nsfw`, and a `true` there always flags.

use std::collections::BTreeMap;

use imghost_core::{CategoryScore, ModerationVerdict};
use serde::Deserialize;

use crate::policy::ModerationPolicy;

#[derive(Debug, Clone, Deserialize)]
pub struct ClassifierResponse {
    #[serde(default)]
    pub is_nsfw: Option<bool>,
    #[serde(default)]
    pub probability: Option<f64>,
    #[serde(default)]
    pub details: Option<Details>,
    #[serde(default)]
    pub error: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Details {
    Detections(Vec<Detection>),
    Scores(BTreeMap<String, f64>),
}

#[derive(Debug, Clone, Deserialize)]
pub struct Detection {
    #[serde(alias = "class", alias = "className")]
    pub label: String,
    #[serde(alias = "probability")]
    pub score: f64,
}

/// Turn a parsed response into a verdict. `Err` carries a description of why
/// the response is unusable.
pub fn normalize(
    response: ClassifierResponse,
    policy: &ModerationPolicy,
) -> Result<ModerationVerdict, String> {
    if let Some(error) = response.error {
        let message = match error {
            serde_json::Value::String(s) => s,
            other => other.to_string(),
        };
        return Err(format!("classifier reported an error: {}", message));
    }

    let reported_nsfw = response.is_nsfw.unwrap_or(false);

    match response.details {
        Some(Details::Detections(detections)) => {
            let categories = merge_categories(
                detections.into_iter().map(|d| (d.label, d.score)),
                policy,
            );
            let max_score = categories
                .iter()
                .map(|c| c.score)
                .fold(0.0_f64, f64::max);
            let is_flagged = reported_nsfw || max_score > policy.category_threshold;
            let overall = response.probability.unwrap_or(max_score);
            Ok(ModerationVerdict::new(is_flagged, categories, overall))
        }
        details => {
            let probability = response
                .probability
                .ok_or_else(|| "classifier response has no probability".to_string())?;
            let categories = match details {
                Some(Details::Scores(scores)) => merge_categories(scores, policy),
                _ => Vec::new(),
            };
            let is_flagged = reported_nsfw || probability > policy.overall_threshold;
            Ok(ModerationVerdict::new(is_flagged, categories, probability))
        }
    }
}

/// Drop safe labels and keep the highest score per remaining label.
fn merge_categories(
    scores: impl IntoIterator<Item = (String, f64)>,
    policy: &ModerationPolicy,
) -> Vec<CategoryScore> {
    let mut merged: BTreeMap<String, f64> = BTreeMap::new();
    for (label, score) in scores {
        if policy.is_safe_label(&label) {
            continue;
        }
        let entry = merged.entry(label).or_insert(score);
        if score > *entry {
            *entry = score;
        }
    }
    merged
        .into_iter()
        .map(|(label, score)| CategoryScore { label, score })
        .collect()
}
