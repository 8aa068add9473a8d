//! Violation log
//!
//! A single JSON document mapping each quarantined filename to the verdict,
//! time, and client IP of the upload. Updates are read-modify-write under an
//! async mutex; the new document is written to a sibling temp file and renamed
//! over the old one.

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

use imghost_core::{ModerationVerdict, ViolationEntry};
use thiserror::Error;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::keys;

pub type ViolationDocument = BTreeMap<String, ViolationEntry>;

#[derive(Debug, Error)]
pub enum LogWriteError {
    #[error("Failed to read violation log {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to preserve corrupt violation log {path}: {source}")]
    Preserve {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to serialize violation log: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Failed to write violation log {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

pub struct ViolationLog {
    path: PathBuf,
    lock: Mutex<()>,
}

impl ViolationLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Add or replace the entry for `filename`. Other entries are untouched.
    pub async fn record(
        &self,
        filename: &str,
        verdict: &ModerationVerdict,
        ip: &str,
    ) -> Result<(), LogWriteError> {
        let _guard = self.lock.lock().await;

        let mut document = self.load().await?;
        document.insert(
            filename.to_string(),
            ViolationEntry::new(verdict.clone(), ip),
        );
        self.store(&document).await?;

        tracing::info!(
            path = %self.path.display(),
            filename = %filename,
            ip = %ip,
            entries = document.len(),
            "Recorded violation"
        );

        Ok(())
    }

    /// Current contents of the log.
    pub async fn entries(&self) -> Result<ViolationDocument, LogWriteError> {
        let _guard = self.lock.lock().await;
        self.load().await
    }

    async fn load(&self) -> Result<ViolationDocument, LogWriteError> {
        let raw = match fs::read(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(source) => {
                return Err(LogWriteError::Read {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        if raw.iter().all(u8::is_ascii_whitespace) {
            return Ok(BTreeMap::new());
        }

        match serde_json::from_slice(&raw) {
            Ok(document) => Ok(document),
            Err(e) => {
                let backup = self.corrupt_backup_path();
                fs::rename(&self.path, &backup)
                    .await
                    .map_err(|source| LogWriteError::Preserve {
                        path: backup.clone(),
                        source,
                    })?;
                tracing::warn!(
                    path = %self.path.display(),
                    backup = %backup.display(),
                    error = %e,
                    "Violation log was corrupt; preserved it and started a new log"
                );
                Ok(BTreeMap::new())
            }
        }
    }

    async fn store(&self, document: &ViolationDocument) -> Result<(), LogWriteError> {
        let body = serde_json::to_vec_pretty(document)?;
        let tmp = self.sibling(&format!("tmp-{}", keys::unique_token()));
        let write_err = |source| LogWriteError::Write {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await.map_err(write_err)?;
            }
        }

        let result = async {
            let mut file = fs::File::create(&tmp).await?;
            file.write_all(&body).await?;
            file.sync_all().await?;
            fs::rename(&tmp, &self.path).await
        }
        .await;

        if let Err(e) = result {
            let _ = fs::remove_file(&tmp).await;
            return Err(write_err(e));
        }
        Ok(())
    }

    fn corrupt_backup_path(&self) -> PathBuf {
        self.sibling(&format!(
            "corrupt-{}",
            chrono::Utc::now().timestamp_millis()
        ))
    }

    /// `<log>.<suffix>` in the same directory as the log.
    fn sibling(&self, suffix: &str) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(format!(".{}", suffix));
        self.path.with_file_name(name)
    }
}
