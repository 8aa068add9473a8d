//! Storage setup

use anyhow::{Context, Result};
use imghost_core::Config;
use imghost_storage::{AssetStorage, LocalStorage};
use std::sync::Arc;

/// Create the store directories and return the storage backend.
pub async fn setup_storage(config: &Config) -> Result<Arc<dyn AssetStorage>> {
    let storage = LocalStorage::new(
        config.public_path(),
        config.quarantine_path(),
        config.staging_path(),
        config.allowed_extensions().to_vec(),
    )
    .await
    .context("Failed to initialize local storage")?;

    tracing::info!(
        public_dir = %storage.public_dir().display(),
        quarantine_dir = %storage.quarantine_dir().display(),
        staging_dir = %storage.staging_dir().display(),
        "Local storage initialized"
    );

    Ok(Arc::new(storage))
}
