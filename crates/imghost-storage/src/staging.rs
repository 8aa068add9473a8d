//! Staged uploads awaiting a verdict.

use std::io;
use std::path::{Path, PathBuf};

use imghost_core::ContentDigest;

/// An upload persisted in the staging area.
///
/// The file is removed when the value is dropped unless it was placed into a
/// store or explicitly kept with [`StagedFile::keep`]. This covers requests
/// that are cancelled mid-flight.
#[derive(Debug)]
pub struct StagedFile {
    path: PathBuf,
    extension: String,
    digest: ContentDigest,
    size: u64,
    armed: bool,
}

impl StagedFile {
    pub(crate) fn new(path: PathBuf, extension: String, digest: ContentDigest, size: u64) -> Self {
        Self {
            path,
            extension,
            digest,
            size,
            armed: true,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    pub fn digest(&self) -> &ContentDigest {
        &self.digest
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    /// Delete the staged file now.
    pub async fn discard(mut self) -> io::Result<()> {
        self.armed = false;
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// Leave the file where it is and stop tracking it.
    pub fn keep(mut self) -> PathBuf {
        self.armed = false;
        self.path.clone()
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let path = std::mem::take(&mut self.path);
        // Removal blocks, so keep it off the async workers when a runtime is
        // running. Anything missed during runtime shutdown is left to the
        // staging sweep.
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn_blocking(move || remove_abandoned(&path));
            }
            Err(_) => remove_abandoned(&path),
        }
    }
}

fn remove_abandoned(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => {
            tracing::debug!(path = %path.display(), "Removed abandoned staged file");
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "Failed to remove abandoned staged file"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn staged_at(path: PathBuf) -> StagedFile {
        std::fs::write(&path, b"bytes").unwrap();
        StagedFile::new(path, "jpg".to_string(), imghost_core::hash(b"bytes"), 5)
    }

    #[test]
    fn test_drop_removes_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("upload-1");
        drop(staged_at(path.clone()));
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_drop_inside_runtime_removes_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("upload-4");
        drop(staged_at(path.clone()));

        for _ in 0..100 {
            if !path.exists() {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        assert!(!path.exists());
    }

    #[test]
    fn test_keep_leaves_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("upload-2");
        let kept = staged_at(path.clone()).keep();
        assert_eq!(kept, path);
        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_discard_removes_file_and_tolerates_missing() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("upload-3");
        let staged = staged_at(path.clone());
        std::fs::remove_file(&path).unwrap();
        assert!(staged.discard().await.is_ok());

        let staged = staged_at(path.clone());
        staged.discard().await.unwrap();
        assert!(!path.exists());
    }
}
