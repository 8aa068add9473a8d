use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Score for a single violation category reported by the classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CategoryScore {
    pub label: String,
    /// Confidence in [0, 1]
    pub score: f64,
}

/// Normalized classifier verdict for one upload.
///
/// `categories` holds violation categories only (labels the moderation policy
/// treats as safe are dropped during normalization), ordered by score,
/// highest first. Scores are clamped to [0, 1].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ModerationVerdict {
    pub is_flagged: bool,
    pub categories: Vec<CategoryScore>,
    pub overall_probability: f64,
}

impl ModerationVerdict {
    pub fn new(is_flagged: bool, categories: Vec<CategoryScore>, overall_probability: f64) -> Self {
        let mut categories: Vec<CategoryScore> = categories
            .into_iter()
            .map(|c| CategoryScore {
                score: clamp_unit(c.score),
                label: c.label,
            })
            .collect();
        categories.sort_by(|a, b| b.score.total_cmp(&a.score));

        Self {
            is_flagged,
            categories,
            overall_probability: clamp_unit(overall_probability),
        }
    }

    /// Verdict for content the classifier considers clean.
    pub fn clean(overall_probability: f64) -> Self {
        Self::new(false, Vec::new(), overall_probability)
    }

    /// Human-readable rejection text with one-decimal confidence percentages,
    /// e.g. `unsafe 92.0% (overall 92.0%)`.
    pub fn rejection_reasons(&self) -> String {
        let overall = format!("overall {}", percent(self.overall_probability));
        if self.categories.is_empty() {
            return overall;
        }

        let categories = self
            .categories
            .iter()
            .map(|c| format!("{} {}", c.label, percent(c.score)))
            .collect::<Vec<_>>()
            .join(", ");
        format!("{} ({})", categories, overall)
    }
}

fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, 1.0)
}

fn percent(score: f64) -> String {
    format!("{:.1}%", score * 100.0)
}
