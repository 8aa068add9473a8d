use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ModerationVerdict;

/// One record in the violation log, keyed by quarantined filename.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViolationEntry {
    pub details: ModerationVerdict,
    /// Serialized as RFC 3339 (ISO-8601)
    pub timestamp: DateTime<Utc>,
    pub ip: String,
}

impl ViolationEntry {
    pub fn new(details: ModerationVerdict, ip: impl Into<String>) -> Self {
        Self {
            details,
            timestamp: Utc::now(),
            ip: ip.into(),
        }
    }
}
