//! Service initialization

use anyhow::{Context, Result};
use imghost_core::Config;
use imghost_moderation::{HttpClassifier, ModerationPolicy};
use imghost_storage::{AssetStorage, ViolationLog};
use std::sync::Arc;
use std::time::Duration;

use crate::services::staging_sweeper::StagingSweeper;
use crate::state::AppState;

/// Build the classifier client and violation log, start background tasks, and
/// assemble the application state.
pub async fn initialize_services(
    config: &Config,
    storage: Arc<dyn AssetStorage>,
) -> Result<Arc<AppState>> {
    let policy = ModerationPolicy::from_config(config);
    tracing::info!(
        classifier_url = %config.classifier_url(),
        timeout_secs = config.classifier_timeout_secs(),
        category_threshold = policy.category_threshold,
        overall_threshold = policy.overall_threshold,
        safe_labels = %policy.safe_labels.join(","),
        "Moderation classifier configured"
    );
    let classifier = HttpClassifier::new(
        config.classifier_url(),
        Duration::from_secs(config.classifier_timeout_secs()),
        policy,
    )
    .context("Failed to create classifier client")?;

    let violations = Arc::new(ViolationLog::new(config.violation_log_path()));
    tracing::info!(path = %violations.path().display(), "Violation log configured");

    let sweeper = Arc::new(StagingSweeper::new(
        storage.clone(),
        Duration::from_secs(config.staging_sweep_interval_secs()),
        Duration::from_secs(config.staging_max_age_secs()),
    ));
    let _ = sweeper.start();

    Ok(Arc::new(AppState::new(
        config.clone(),
        storage,
        Arc::new(classifier),
        violations,
    )))
}
