//! Image upload service
//!
//! Runs one upload through the moderation pipeline. The classifier sees every
//! upload before anything reaches the public store, and any classifier failure
//! rejects the upload (fail closed).

use std::sync::Arc;
use std::time::Instant;

use axum::extract::Multipart;
use chrono::Utc;
use imghost_core::{hash, AppError, ModerationVerdict, UploadedImage};
use imghost_storage::{Placement, PlacementKind, StagedFile};

use crate::error::HttpAppError;
use crate::state::{AppState, MediaConfig};
use crate::utils::upload::{
    extract_multipart_file, validate_content_type, validate_extension_content_type_match,
    validate_file_extension, validate_file_size, ExtractedFile,
};

use super::types::ValidatedFile;

/// Check an extracted file against the upload limits.
///
/// Runs before anything is written or sent to the classifier.
pub fn validate_file(file: ExtractedFile, limits: &MediaConfig) -> Result<ValidatedFile, AppError> {
    validate_file_size(file.data.len(), limits.max_file_size)?;
    let extension = validate_file_extension(&file.original_filename, &limits.allowed_extensions)?;
    validate_content_type(&file.content_type, &limits.allowed_content_types)?;
    validate_extension_content_type_match(&file.original_filename, &file.content_type)?;

    Ok(ValidatedFile {
        data: file.data,
        original_filename: file.original_filename,
        content_type: file.content_type,
        extension,
    })
}

pub struct ImageUploadService {
    state: Arc<AppState>,
}

impl ImageUploadService {
    pub fn new(state: &Arc<AppState>) -> Self {
        Self {
            state: state.clone(),
        }
    }

    /// Complete upload workflow for a multipart request.
    pub async fn upload(
        &self,
        multipart: Multipart,
        client_ip: &str,
    ) -> Result<UploadedImage, HttpAppError> {
        let extracted = extract_multipart_file(multipart).await?;
        let validated = validate_file(extracted, &self.state.media)?;
        self.process(validated, client_ip).await
    }

    /// Hash, stage, classify, and place a validated file.
    ///
    /// Clean images land in the public store under their digest. Flagged images
    /// are quarantined, logged, and reported as a rejection.
    #[tracing::instrument(
        skip(self, file),
        fields(
            filename = %file.original_filename,
            size_bytes = file.data.len(),
            client_ip = %client_ip
        )
    )]
    pub async fn process(
        &self,
        file: ValidatedFile,
        client_ip: &str,
    ) -> Result<UploadedImage, HttpAppError> {
        let start = Instant::now();
        let digest = hash(&file.data);

        let staged = self
            .state
            .media
            .storage
            .stage(&file.data, digest.clone(), &file.extension)
            .await?;
        drop(file);

        let (staged, verdict) = self.classify(staged).await?;

        let placement = self.state.media.storage.place(staged, &verdict).await?;

        match placement.kind {
            PlacementKind::Stored => {
                let timestamp = Utc::now().timestamp_millis();
                tracing::info!(
                    digest = %digest,
                    filename = %placement.filename,
                    deduplicated = placement.deduplicated,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "Upload accepted"
                );
                Ok(UploadedImage {
                    url: format!(
                        "{}/img/{}/{}",
                        self.state.media.public_base_url, timestamp, digest
                    ),
                    timestamp,
                    digest,
                    filename: placement.filename,
                })
            }
            PlacementKind::Quarantined => {
                self.log_violation(&placement, &verdict, client_ip).await;
                tracing::warn!(
                    filename = %placement.filename,
                    overall_probability = verdict.overall_probability,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "Upload rejected by moderation"
                );
                Err(AppError::ContentRejected(verdict.rejection_reasons()).into())
            }
        }
    }

    /// Ask the classifier about a staged file. On failure the staged file is
    /// removed before the error is returned.
    async fn classify(
        &self,
        staged: StagedFile,
    ) -> Result<(StagedFile, ModerationVerdict), HttpAppError> {
        match self
            .state
            .moderation
            .classifier
            .classify(staged.path())
            .await
        {
            Ok(verdict) => Ok((staged, verdict)),
            Err(e) => {
                let path = staged.path().to_path_buf();
                if let Err(discard_err) = staged.discard().await {
                    tracing::warn!(
                        path = %path.display(),
                        error = %discard_err,
                        "Failed to remove staged file after classifier failure"
                    );
                }
                Err(e.into())
            }
        }
    }

    /// The quarantine placement is authoritative; a log failure is reported
    /// and otherwise ignored.
    async fn log_violation(&self, placement: &Placement, verdict: &ModerationVerdict, ip: &str) {
        if let Err(e) = self
            .state
            .moderation
            .violations
            .record(&placement.filename, verdict, ip)
            .await
        {
            tracing::warn!(
                error = %e,
                filename = %placement.filename,
                "Failed to record violation"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use imghost_core::{Config, ImageHostConfig};
    use imghost_moderation::{Classifier, ModerationError};
    use imghost_storage::{LocalStorage, ViolationLog};
    use std::path::Path;
    use tempfile::{tempdir, TempDir};

    struct NeverCalled;

    #[async_trait]
    impl Classifier for NeverCalled {
        async fn classify(&self, _: &Path) -> Result<ModerationVerdict, ModerationError> {
            panic!("classifier must not be called");
        }

        async fn ping(&self) -> Result<(), ModerationError> {
            Ok(())
        }
    }

    async fn limits() -> (TempDir, MediaConfig) {
        let dir = tempdir().unwrap();
        let config = Config::new(ImageHostConfig::for_storage_root(dir.path()));
        let storage = LocalStorage::new(
            config.public_path(),
            config.quarantine_path(),
            config.staging_path(),
            config.allowed_extensions().to_vec(),
        )
        .await
        .unwrap();
        let state = AppState::new(
            config.clone(),
            Arc::new(storage),
            Arc::new(NeverCalled),
            Arc::new(ViolationLog::new(config.violation_log_path())),
        );
        (dir, state.media)
    }

    fn file(name: &str, content_type: &str, data: &[u8]) -> ExtractedFile {
        ExtractedFile {
            data: data.to_vec(),
            original_filename: name.to_string(),
            content_type: content_type.to_string(),
        }
    }

    #[tokio::test]
    async fn test_validate_accepts_matching_image() {
        let (_dir, limits) = limits().await;
        let validated = validate_file(file("Cat.JPG", "image/jpeg", b"\xff\xd8\xff"), &limits)
            .unwrap();
        assert_eq!(validated.extension, "jpg");
        assert_eq!(validated.data, b"\xff\xd8\xff");
    }

    #[tokio::test]
    async fn test_validate_rejects_renamed_text_file() {
        let (_dir, limits) = limits().await;
        let err = validate_file(file("notes.jpg", "text/plain", b"hello"), &limits).unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_validate_rejects_mismatched_type() {
        let (_dir, limits) = limits().await;
        let err = validate_file(file("cat.png", "image/jpeg", b"x"), &limits).unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_validate_rejects_empty_and_oversized() {
        let (_dir, mut limits) = limits().await;
        assert!(matches!(
            validate_file(file("cat.jpg", "image/jpeg", b""), &limits),
            Err(AppError::InvalidInput(_))
        ));

        limits.max_file_size = 4;
        assert!(matches!(
            validate_file(file("cat.jpg", "image/jpeg", b"12345"), &limits),
            Err(AppError::PayloadTooLarge(_))
        ));
    }

    #[tokio::test]
    async fn test_validate_rejects_disallowed_extension() {
        let (_dir, limits) = limits().await;
        let err = validate_file(file("cat.webp", "image/webp", b"x"), &limits).unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_validate_rejects_widened_extension_without_known_type() {
        let (_dir, mut limits) = limits().await;
        limits.allowed_extensions.push("webp".to_string());
        limits.allowed_content_types.push("text/plain".to_string());

        let err = validate_file(file("notes.webp", "text/plain", b"hello"), &limits).unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }
}
