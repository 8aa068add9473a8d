//! Background removal of abandoned staging files
//!
//! Staged files are normally removed by their request. Files left behind by a
//! crash, or kept after a failed placement, are swept once they are older than
//! the configured age.

use std::sync::Arc;
use std::time::Duration;

use imghost_storage::AssetStorage;
use tokio::time::interval;

pub struct StagingSweeper {
    storage: Arc<dyn AssetStorage>,
    interval: Duration,
    max_age: Duration,
}

impl StagingSweeper {
    pub fn new(storage: Arc<dyn AssetStorage>, interval: Duration, max_age: Duration) -> Self {
        Self {
            storage,
            interval,
            max_age,
        }
    }

    /// Spawn the sweep loop. The first sweep runs immediately.
    /// Returns `None` when the interval is zero (sweeping disabled).
    pub fn start(self: Arc<Self>) -> Option<tokio::task::JoinHandle<()>> {
        if self.interval.is_zero() {
            tracing::info!("Staging sweep disabled");
            return None;
        }

        tracing::info!(
            interval_secs = self.interval.as_secs(),
            max_age_secs = self.max_age.as_secs(),
            "Starting staging sweeper"
        );

        Some(tokio::spawn(async move {
            let mut sweep_interval = interval(self.interval);

            loop {
                sweep_interval.tick().await;
                self.sweep_once().await;
            }
        }))
    }

    #[tracing::instrument(skip(self), fields(sweep.operation = "staging"))]
    pub async fn sweep_once(&self) -> usize {
        match self.storage.sweep_staging(self.max_age).await {
            Ok(removed) => removed,
            Err(e) => {
                tracing::error!(error = %e, "Staging sweep failed");
                0
            }
        }
    }
}
