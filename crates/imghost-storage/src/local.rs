use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use async_trait::async_trait;
use imghost_core::{ContentDigest, ModerationVerdict};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::keys;
use crate::staging::StagedFile;
use crate::traits::{AssetStorage, StorageError, StorageResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlacementKind {
    Stored,
    Quarantined,
}

/// Where a staged file ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    pub kind: PlacementKind,
    pub filename: String,
    pub path: PathBuf,
    /// The public asset already existed; the staged copy was discarded.
    pub deduplicated: bool,
}

/// An image in the public store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredAsset {
    pub filename: String,
    pub extension: String,
    pub path: PathBuf,
}

/// Local filesystem storage with separate staging, public, and quarantine directories
#[derive(Clone)]
pub struct LocalStorage {
    public_dir: PathBuf,
    quarantine_dir: PathBuf,
    staging_dir: PathBuf,
    allowed_extensions: Vec<String>,
}

impl LocalStorage {
    /// Create the store directories if needed.
    ///
    /// `allowed_extensions` bounds the public lookups done by
    /// [`AssetStorage::find_by_digest`].
    pub async fn new(
        public_dir: impl Into<PathBuf>,
        quarantine_dir: impl Into<PathBuf>,
        staging_dir: impl Into<PathBuf>,
        allowed_extensions: Vec<String>,
    ) -> StorageResult<Self> {
        let mut extensions: Vec<String> = Vec::new();
        for ext in allowed_extensions
            .iter()
            .filter_map(|e| keys::canonical_extension(e))
        {
            if !extensions.contains(&ext) {
                extensions.push(ext);
            }
        }

        Ok(LocalStorage {
            public_dir: Self::prepare_dir(public_dir.into()).await?,
            quarantine_dir: Self::prepare_dir(quarantine_dir.into()).await?,
            staging_dir: Self::prepare_dir(staging_dir.into()).await?,
            allowed_extensions: extensions,
        })
    }

    /// Create `dir` and resolve it to an absolute path. Staged paths are handed
    /// to the classifier process, which may not share our working directory.
    async fn prepare_dir(dir: PathBuf) -> StorageResult<PathBuf> {
        let config_err = |e: io::Error| {
            StorageError::ConfigError(format!(
                "Failed to prepare storage directory {}: {}",
                dir.display(),
                e
            ))
        };
        fs::create_dir_all(&dir).await.map_err(config_err)?;
        fs::canonicalize(&dir).await.map_err(config_err)
    }

    pub fn public_dir(&self) -> &Path {
        &self.public_dir
    }

    pub fn quarantine_dir(&self) -> &Path {
        &self.quarantine_dir
    }

    pub fn staging_dir(&self) -> &Path {
        &self.staging_dir
    }

    fn dirs(&self) -> [&PathBuf; 3] {
        [&self.public_dir, &self.quarantine_dir, &self.staging_dir]
    }

    /// Join a generated file name onto a store directory, refusing anything
    /// that could escape it.
    fn name_to_path(dir: &Path, name: &str) -> StorageResult<PathBuf> {
        if name.is_empty()
            || name.contains("..")
            || name.contains('/')
            || name.contains('\\')
        {
            return Err(StorageError::InvalidKey(
                "File name contains invalid characters".to_string(),
            ));
        }
        Ok(dir.join(name))
    }

    async fn place_public(&self, staged: StagedFile) -> StorageResult<Placement> {
        // Same bytes already public under another extension.
        let existing = match self.find_by_digest(staged.digest()).await {
            Ok(existing) => existing,
            Err(e) => {
                staged.keep();
                return Err(e);
            }
        };
        if let Some(asset) = existing {
            return Ok(self.reuse_public(staged, asset).await);
        }

        let filename = keys::public_name(staged.digest(), staged.extension());
        let path = match Self::name_to_path(&self.public_dir, &filename) {
            Ok(path) => path,
            Err(e) => {
                staged.keep();
                return Err(e);
            }
        };
        let start = std::time::Instant::now();

        let deduplicated = match fs::hard_link(staged.path(), &path).await {
            Ok(()) => false,
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => true,
            Err(e) => {
                let staged_path = staged.keep();
                return Err(StorageError::PlacementFailed(format!(
                    "Failed to link {} to {}: {}",
                    staged_path.display(),
                    path.display(),
                    e
                )));
            }
        };

        let staged_path = staged.path().to_path_buf();
        if let Err(e) = staged.discard().await {
            tracing::warn!(
                path = %staged_path.display(),
                error = %e,
                "Failed to remove staging link after placement"
            );
        }

        tracing::info!(
            path = %path.display(),
            filename = %filename,
            deduplicated = deduplicated,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Stored image in public store"
        );

        Ok(Placement {
            kind: PlacementKind::Stored,
            filename,
            path,
            deduplicated,
        })
    }

    async fn reuse_public(&self, staged: StagedFile, asset: StoredAsset) -> Placement {
        let staged_path = staged.path().to_path_buf();
        if let Err(e) = staged.discard().await {
            tracing::warn!(
                path = %staged_path.display(),
                error = %e,
                "Failed to remove staged duplicate"
            );
        }

        tracing::info!(
            path = %asset.path.display(),
            filename = %asset.filename,
            deduplicated = true,
            "Image already in public store"
        );

        Placement {
            kind: PlacementKind::Stored,
            filename: asset.filename,
            path: asset.path,
            deduplicated: true,
        }
    }

    async fn place_quarantine(&self, staged: StagedFile) -> StorageResult<Placement> {
        let filename = keys::quarantine_name(staged.extension());
        let path = match Self::name_to_path(&self.quarantine_dir, &filename) {
            Ok(path) => path,
            Err(e) => {
                staged.keep();
                return Err(e);
            }
        };

        if let Err(e) = fs::rename(staged.path(), &path).await {
            let staged_path = staged.keep();
            return Err(StorageError::PlacementFailed(format!(
                "Failed to move {} to {}: {}",
                staged_path.display(),
                path.display(),
                e
            )));
        }
        let size = staged.size();
        staged.keep();

        tracing::info!(
            path = %path.display(),
            filename = %filename,
            size_bytes = size,
            "Moved flagged image to quarantine"
        );

        Ok(Placement {
            kind: PlacementKind::Quarantined,
            filename,
            path,
            deduplicated: false,
        })
    }

    async fn probe_writable(dir: &Path) -> StorageResult<()> {
        let probe = Self::name_to_path(dir, &format!(".health-{}", keys::unique_token()))?;
        fs::write(&probe, b"ok").await.map_err(|e| {
            StorageError::ConfigError(format!("{} is not writable: {}", dir.display(), e))
        })?;
        fs::remove_file(&probe).await?;
        Ok(())
    }
}

#[async_trait]
impl AssetStorage for LocalStorage {
    async fn stage(
        &self,
        data: &[u8],
        digest: ContentDigest,
        extension: &str,
    ) -> StorageResult<StagedFile> {
        let extension = keys::canonical_extension(extension).ok_or_else(|| {
            StorageError::InvalidKey(format!("Invalid file extension: {}", extension))
        })?;
        let path = Self::name_to_path(&self.staging_dir, &keys::staging_name())?;
        let start = std::time::Instant::now();

        let mut file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
            .map_err(|e| {
                StorageError::StagingFailed(format!(
                    "Failed to create file {}: {}",
                    path.display(),
                    e
                ))
            })?;

        // From here on the guard owns the file and removes it on any early return.
        let staged = StagedFile::new(path, extension, digest, data.len() as u64);

        file.write_all(data).await.map_err(|e| {
            StorageError::StagingFailed(format!(
                "Failed to write file {}: {}",
                staged.path().display(),
                e
            ))
        })?;

        file.sync_all().await.map_err(|e| {
            StorageError::StagingFailed(format!(
                "Failed to sync file {}: {}",
                staged.path().display(),
                e
            ))
        })?;

        tracing::debug!(
            path = %staged.path().display(),
            digest = %staged.digest(),
            size_bytes = staged.size(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Staged upload"
        );

        Ok(staged)
    }

    async fn place(
        &self,
        staged: StagedFile,
        verdict: &ModerationVerdict,
    ) -> StorageResult<Placement> {
        if verdict.is_flagged {
            self.place_quarantine(staged).await
        } else {
            self.place_public(staged).await
        }
    }

    async fn find_by_digest(&self, digest: &ContentDigest) -> StorageResult<Option<StoredAsset>> {
        for extension in &self.allowed_extensions {
            let filename = keys::public_name(digest, extension);
            let path = Self::name_to_path(&self.public_dir, &filename)?;
            if fs::try_exists(&path).await.unwrap_or(false) {
                return Ok(Some(StoredAsset {
                    filename,
                    extension: extension.clone(),
                    path,
                }));
            }
        }
        Ok(None)
    }

    async fn read_asset(&self, asset: &StoredAsset) -> StorageResult<Vec<u8>> {
        let path = Self::name_to_path(&self.public_dir, &asset.filename)?;
        match fs::read(&path).await {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(asset.filename.clone()))
            }
            Err(e) => Err(StorageError::ReadFailed(format!(
                "Failed to read file {}: {}",
                path.display(),
                e
            ))),
        }
    }

    async fn sweep_staging(&self, max_age: Duration) -> StorageResult<usize> {
        let now = SystemTime::now();
        let mut removed = 0;
        let mut entries = fs::read_dir(&self.staging_dir).await?;

        while let Some(entry) = entries.next_entry().await? {
            let metadata = match entry.metadata().await {
                Ok(m) if m.is_file() => m,
                _ => continue,
            };
            let age = metadata
                .modified()
                .ok()
                .and_then(|modified| now.duration_since(modified).ok())
                .unwrap_or(Duration::ZERO);
            if age < max_age {
                continue;
            }

            match fs::remove_file(entry.path()).await {
                Ok(()) => removed += 1,
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => {
                    tracing::warn!(
                        path = %entry.path().display(),
                        error = %e,
                        "Failed to remove stale staging file"
                    );
                }
            }
        }

        if removed > 0 {
            tracing::info!(
                removed = removed,
                max_age_secs = max_age.as_secs(),
                "Swept stale staging files"
            );
        }

        Ok(removed)
    }

    async fn health_check(&self) -> StorageResult<()> {
        for dir in self.dirs() {
            Self::probe_writable(dir).await?;
        }
        Ok(())
    }
}
