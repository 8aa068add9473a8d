//! Storage abstraction trait

use std::time::Duration;

use async_trait::async_trait;
use imghost_core::{ContentDigest, ModerationVerdict};
use thiserror::Error;

use crate::local::{Placement, StoredAsset};
use crate::staging::StagedFile;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Staging failed: {0}")]
    StagingFailed(String),

    #[error("Placement failed: {0}")]
    PlacementFailed(String),

    #[error("Read failed: {0}")]
    ReadFailed(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Invalid file name: {0}")]
    InvalidKey(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Image stores used by the upload pipeline.
///
/// A blob is first staged, then placed exactly once according to its
/// moderation verdict. Public placement is content-addressed and idempotent:
/// placing the same bytes twice yields the same asset.
#[async_trait]
pub trait AssetStorage: Send + Sync {
    /// Persist `data` in the staging area.
    async fn stage(
        &self,
        data: &[u8],
        digest: ContentDigest,
        extension: &str,
    ) -> StorageResult<StagedFile>;

    /// Move a staged file to the public store (clean) or quarantine (flagged).
    ///
    /// On error the staged file stays at its staging path.
    async fn place(
        &self,
        staged: StagedFile,
        verdict: &ModerationVerdict,
    ) -> StorageResult<Placement>;

    /// Look up a public asset by digest.
    async fn find_by_digest(&self, digest: &ContentDigest) -> StorageResult<Option<StoredAsset>>;

    /// Read a public asset's bytes.
    async fn read_asset(&self, asset: &StoredAsset) -> StorageResult<Vec<u8>>;

    /// Remove staging files older than `max_age`. Returns how many were removed.
    async fn sweep_staging(&self, max_age: Duration) -> StorageResult<usize>;

    /// Verify every store is writable.
    async fn health_check(&self) -> StorageResult<()>;
}
