use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::Context;
use async_trait::async_trait;
use imghost_core::ModerationVerdict;
use serde_json::json;
use thiserror::Error;

use crate::policy::ModerationPolicy;
use crate::response::{normalize, ClassifierResponse};

/// Longest slice of a classifier error body kept in error messages.
const MAX_ERROR_BODY_CHARS: usize = 200;

#[derive(Debug, Error)]
pub enum ModerationError {
    /// Could not get an answer: connection failure, timeout, or a non-success status.
    #[error("Moderation service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Got an answer that reports an error or cannot be understood.
    #[error("Moderation service error: {0}")]
    ServiceError(String),
}

/// A content classifier that can judge a file on local disk.
#[async_trait]
pub trait Classifier: Send + Sync {
    /// Classify the file at `file_path`. The path must be readable by the
    /// classifier process.
    async fn classify(&self, file_path: &Path) -> Result<ModerationVerdict, ModerationError>;

    /// Check that the classifier is reachable.
    async fn ping(&self) -> Result<(), ModerationError>;
}

/// HTTP client for a classifier sidecar exposing `POST /check` and `GET /ping`.
#[derive(Debug, Clone)]
pub struct HttpClassifier {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
    policy: ModerationPolicy,
}

impl HttpClassifier {
    pub fn new(
        base_url: impl Into<String>,
        timeout: Duration,
        policy: ModerationPolicy,
    ) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .build()
            .context("Failed to create HTTP client for classifier")?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout,
            policy,
        })
    }

    async fn request_check(&self, file_path: &Path) -> Result<ClassifierResponse, ModerationError> {
        let url = format!("{}/check", self.base_url);
        let body = json!({ "file_path": file_path.to_string_lossy() });

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                ModerationError::ServiceUnavailable(format!("request to {} failed: {}", url, e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(ModerationError::ServiceUnavailable(format!(
                "classifier returned {}: {}",
                status,
                truncate(&error_text)
            )));
        }

        let bytes = response.bytes().await.map_err(|e| {
            ModerationError::ServiceUnavailable(format!("failed to read classifier response: {}", e))
        })?;

        serde_json::from_slice(&bytes).map_err(|e| {
            ModerationError::ServiceError(format!(
                "unparseable classifier response ({}): {}",
                e,
                truncate(&String::from_utf8_lossy(&bytes))
            ))
        })
    }
}

#[async_trait]
impl Classifier for HttpClassifier {
    async fn classify(&self, file_path: &Path) -> Result<ModerationVerdict, ModerationError> {
        let start = Instant::now();
        tracing::debug!(
            classifier = %self.base_url,
            path = %file_path.display(),
            "Requesting classification"
        );

        let response = match tokio::time::timeout(self.timeout, self.request_check(file_path)).await
        {
            Ok(result) => result,
            Err(_) => Err(ModerationError::ServiceUnavailable(format!(
                "classifier timed out after {} ms",
                self.timeout.as_millis()
            ))),
        };

        let verdict = response
            .and_then(|r| normalize(r, &self.policy).map_err(ModerationError::ServiceError));

        match &verdict {
            Ok(v) => tracing::info!(
                is_flagged = v.is_flagged,
                overall_probability = v.overall_probability,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "Classification completed"
            ),
            Err(e) => tracing::warn!(
                error = %e,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "Classification failed"
            ),
        }

        verdict
    }

    async fn ping(&self) -> Result<(), ModerationError> {
        let url = format!("{}/ping", self.base_url);
        let request = self.client.get(&url).send();

        let response = tokio::time::timeout(self.timeout, request)
            .await
            .map_err(|_| ModerationError::ServiceUnavailable("classifier ping timed out".to_string()))?
            .map_err(|e| {
                ModerationError::ServiceUnavailable(format!("request to {} failed: {}", url, e))
            })?;

        if !response.status().is_success() {
            return Err(ModerationError::ServiceUnavailable(format!(
                "classifier ping returned {}",
                response.status()
            )));
        }
        Ok(())
    }
}

fn truncate(text: &str) -> String {
    text.chars().take(MAX_ERROR_BODY_CHARS).collect()
}
