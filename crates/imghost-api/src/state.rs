//! Application state shared by all handlers.
//!
//! Split into sub-states so the upload service and handlers only reach for
//! what they need.

use std::sync::Arc;

use imghost_core::Config;
use imghost_moderation::Classifier;
use imghost_storage::{AssetStorage, ViolationLog};

/// Stores and upload limits.
#[derive(Clone)]
pub struct MediaConfig {
    pub storage: Arc<dyn AssetStorage>,
    pub max_file_size: usize,
    pub allowed_extensions: Vec<String>,
    pub allowed_content_types: Vec<String>,
    pub public_base_url: String,
}

impl MediaConfig {
    pub fn new(config: &Config, storage: Arc<dyn AssetStorage>) -> Self {
        Self {
            storage,
            max_file_size: config.max_file_size_bytes(),
            allowed_extensions: config.allowed_extensions().to_vec(),
            allowed_content_types: config.allowed_content_types().to_vec(),
            public_base_url: config.public_base_url().trim_end_matches('/').to_string(),
        }
    }
}

/// Classifier and the log of rejected uploads.
#[derive(Clone)]
pub struct ModerationState {
    pub classifier: Arc<dyn Classifier>,
    pub violations: Arc<ViolationLog>,
}

pub struct AppState {
    pub config: Config,
    pub media: MediaConfig,
    pub moderation: ModerationState,
}

impl AppState {
    pub fn new(
        config: Config,
        storage: Arc<dyn AssetStorage>,
        classifier: Arc<dyn Classifier>,
        violations: Arc<ViolationLog>,
    ) -> Self {
        let media = MediaConfig::new(&config, storage);
        Self {
            config,
            media,
            moderation: ModerationState {
                classifier,
                violations,
            },
        }
    }
}
