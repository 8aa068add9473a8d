/// Thresholds and labels used to turn raw classifier scores into a verdict.
#[derive(Debug, Clone, PartialEq)]
pub struct ModerationPolicy {
    /// A per-category score above this flags the image (detection lists).
    pub category_threshold: f64,
    /// An overall probability above this flags the image (score maps).
    pub overall_threshold: f64,
    /// Labels that never flag and are left out of verdict categories.
    pub safe_labels: Vec<String>,
}

impl Default for ModerationPolicy {
    fn default() -> Self {
        Self {
            category_threshold: 0.5,
            overall_threshold: 0.3,
            safe_labels: vec![
                "safe".to_string(),
                "neutral".to_string(),
                "drawing".to_string(),
            ],
        }
    }
}

impl ModerationPolicy {
    pub fn from_config(config: &imghost_core::Config) -> Self {
        Self {
            category_threshold: config.category_threshold(),
            overall_threshold: config.overall_threshold(),
            safe_labels: config.safe_labels().to_vec(),
        }
    }

    pub fn is_safe_label(&self, label: &str) -> bool {
        self.safe_labels
            .iter()
            .any(|safe| safe.eq_ignore_ascii_case(label.trim()))
    }
}
