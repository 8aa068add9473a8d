//! Configuration module
//!
//! Server, storage layout, upload limits, and moderation settings. Values are
//! read from the environment (optionally seeded from a `.env` file).

use std::env;
use std::path::{Path, PathBuf};

const DEFAULT_PORT: u16 = 3000;
const MAX_FILE_SIZE_MB: usize = 10;
const CLASSIFIER_TIMEOUT_SECS: u64 = 30;
const CATEGORY_THRESHOLD: f64 = 0.5;
const OVERALL_THRESHOLD: f64 = 0.3;
const STAGING_SWEEP_INTERVAL_SECS: u64 = 300;
const STAGING_MAX_AGE_SECS: u64 = 3600;
const TRUSTED_PROXY_COUNT: usize = 1;

const DEFAULT_EXTENSIONS: &str = "jpg,jpeg,png,gif";
const DEFAULT_CONTENT_TYPES: &str = "image/jpeg,image/png,image/gif";
const DEFAULT_SAFE_LABELS: &str = "safe,neutral,drawing";

/// Server-level settings
#[derive(Clone, Debug)]
pub struct BaseConfig {
    pub server_port: u16,
    pub cors_origins: Vec<String>,
    pub environment: String,
    /// Number of reverse proxies in front of the server whose
    /// `X-Forwarded-For` entries are trusted.
    pub trusted_proxy_count: usize,
}

/// Image host configuration
#[derive(Clone, Debug)]
pub struct ImageHostConfig {
    pub base: BaseConfig,
    pub public_base_url: String,
    // Storage layout
    pub storage_root: PathBuf,
    pub public_dir: String,
    pub quarantine_dir: String,
    pub staging_dir: String,
    pub violation_log_path: String,
    // Upload validation
    pub max_file_size_bytes: usize,
    pub allowed_extensions: Vec<String>,
    pub allowed_content_types: Vec<String>,
    // Moderation
    pub classifier_url: String,
    pub classifier_timeout_secs: u64,
    pub category_threshold: f64,
    pub overall_threshold: f64,
    pub safe_labels: Vec<String>,
    /// Interval between staging sweeps. 0 = disabled.
    pub staging_sweep_interval_secs: u64,
    pub staging_max_age_secs: u64,
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

impl ImageHostConfig {
    /// Defaults rooted at `storage_root`, without consulting the environment.
    pub fn for_storage_root(storage_root: impl Into<PathBuf>) -> Self {
        Self {
            base: BaseConfig {
                server_port: DEFAULT_PORT,
                cors_origins: vec!["*".to_string()],
                environment: "development".to_string(),
                trusted_proxy_count: TRUSTED_PROXY_COUNT,
            },
            public_base_url: format!("http://localhost:{}", DEFAULT_PORT),
            storage_root: storage_root.into(),
            public_dir: "img".to_string(),
            quarantine_dir: "warnimg".to_string(),
            staging_dir: "temp".to_string(),
            violation_log_path: "violations.json".to_string(),
            max_file_size_bytes: MAX_FILE_SIZE_MB * 1024 * 1024,
            allowed_extensions: split_list(DEFAULT_EXTENSIONS),
            allowed_content_types: split_list(DEFAULT_CONTENT_TYPES),
            classifier_url: "http://127.0.0.1:5000".to_string(),
            classifier_timeout_secs: CLASSIFIER_TIMEOUT_SECS,
            category_threshold: CATEGORY_THRESHOLD,
            overall_threshold: OVERALL_THRESHOLD,
            safe_labels: split_list(DEFAULT_SAFE_LABELS),
            staging_sweep_interval_secs: STAGING_SWEEP_INTERVAL_SECS,
            staging_max_age_secs: STAGING_MAX_AGE_SECS,
        }
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let cors_origins: Vec<String> = env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .collect();

        let server_port: u16 = env::var("PORT")
            .unwrap_or_else(|_| DEFAULT_PORT.to_string())
            .parse()
            .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?;

        let max_file_size_mb = env::var("MAX_FILE_SIZE_MB")
            .unwrap_or_else(|_| MAX_FILE_SIZE_MB.to_string())
            .parse::<usize>()
            .unwrap_or(MAX_FILE_SIZE_MB);

        let base = BaseConfig {
            server_port,
            cors_origins,
            environment,
            trusted_proxy_count: env::var("TRUSTED_PROXY_COUNT")
                .unwrap_or_else(|_| TRUSTED_PROXY_COUNT.to_string())
                .parse()
                .unwrap_or(TRUSTED_PROXY_COUNT),
        };

        Ok(Self {
            base,
            public_base_url: env::var("PUBLIC_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|_| format!("http://localhost:{}", server_port)),
            storage_root: PathBuf::from(
                env::var("STORAGE_ROOT").unwrap_or_else(|_| "./data".to_string()),
            ),
            public_dir: env::var("PUBLIC_DIR").unwrap_or_else(|_| "img".to_string()),
            quarantine_dir: env::var("QUARANTINE_DIR").unwrap_or_else(|_| "warnimg".to_string()),
            staging_dir: env::var("STAGING_DIR").unwrap_or_else(|_| "temp".to_string()),
            violation_log_path: env::var("VIOLATION_LOG_PATH")
                .unwrap_or_else(|_| "violations.json".to_string()),
            max_file_size_bytes: max_file_size_mb * 1024 * 1024,
            allowed_extensions: split_list(
                &env::var("ALLOWED_EXTENSIONS").unwrap_or_else(|_| DEFAULT_EXTENSIONS.to_string()),
            ),
            allowed_content_types: split_list(
                &env::var("ALLOWED_CONTENT_TYPES")
                    .unwrap_or_else(|_| DEFAULT_CONTENT_TYPES.to_string()),
            ),
            classifier_url: env::var("CLASSIFIER_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|_| "http://127.0.0.1:5000".to_string()),
            classifier_timeout_secs: env::var("CLASSIFIER_TIMEOUT_SECS")
                .unwrap_or_else(|_| CLASSIFIER_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(CLASSIFIER_TIMEOUT_SECS),
            category_threshold: env::var("MODERATION_CATEGORY_THRESHOLD")
                .unwrap_or_else(|_| CATEGORY_THRESHOLD.to_string())
                .parse()
                .unwrap_or(CATEGORY_THRESHOLD),
            overall_threshold: env::var("MODERATION_OVERALL_THRESHOLD")
                .unwrap_or_else(|_| OVERALL_THRESHOLD.to_string())
                .parse()
                .unwrap_or(OVERALL_THRESHOLD),
            safe_labels: split_list(
                &env::var("MODERATION_SAFE_LABELS")
                    .unwrap_or_else(|_| DEFAULT_SAFE_LABELS.to_string()),
            ),
            staging_sweep_interval_secs: env::var("STAGING_SWEEP_INTERVAL_SECS")
                .unwrap_or_else(|_| STAGING_SWEEP_INTERVAL_SECS.to_string())
                .parse()
                .unwrap_or(STAGING_SWEEP_INTERVAL_SECS),
            staging_max_age_secs: env::var("STAGING_MAX_AGE_SECS")
                .unwrap_or_else(|_| STAGING_MAX_AGE_SECS.to_string())
                .parse()
                .unwrap_or(STAGING_MAX_AGE_SECS),
        })
    }

    fn is_production(&self) -> bool {
        let env = self.base.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.is_production() && self.base.cors_origins.iter().any(|o| o.trim() == "*") {
            return Err(anyhow::anyhow!(
                "CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
            ));
        }

        if self.max_file_size_bytes == 0 {
            return Err(anyhow::anyhow!("MAX_FILE_SIZE_MB must be greater than 0"));
        }

        if self.allowed_extensions.is_empty() || self.allowed_content_types.is_empty() {
            return Err(anyhow::anyhow!(
                "ALLOWED_EXTENSIONS and ALLOWED_CONTENT_TYPES must not be empty"
            ));
        }

        for (name, value) in [
            ("MODERATION_CATEGORY_THRESHOLD", self.category_threshold),
            ("MODERATION_OVERALL_THRESHOLD", self.overall_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(anyhow::anyhow!("{} must be between 0 and 1", name));
            }
        }

        if !self.classifier_url.starts_with("http://") && !self.classifier_url.starts_with("https://")
        {
            return Err(anyhow::anyhow!("CLASSIFIER_URL must be an http(s) URL"));
        }

        if self.staging_max_age_secs <= self.classifier_timeout_secs {
            return Err(anyhow::anyhow!(
                "STAGING_MAX_AGE_SECS must be greater than CLASSIFIER_TIMEOUT_SECS"
            ));
        }

        let dirs = [&self.public_dir, &self.quarantine_dir, &self.staging_dir];
        for (i, a) in dirs.iter().enumerate() {
            if dirs[i + 1..].contains(a) {
                return Err(anyhow::anyhow!(
                    "PUBLIC_DIR, QUARANTINE_DIR and STAGING_DIR must be distinct"
                ));
            }
        }

        Ok(())
    }
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config(pub Box<ImageHostConfig>);

impl Config {
    pub fn new(config: ImageHostConfig) -> Self {
        Config(Box::new(config))
    }

    fn inner(&self) -> &ImageHostConfig {
        &self.0
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        self.inner().is_production()
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        let config = ImageHostConfig::from_env()?;
        Ok(Config::new(config))
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        self.inner().validate()
    }

    pub fn server_port(&self) -> u16 {
        self.inner().base.server_port
    }

    pub fn cors_origins(&self) -> &[String] {
        &self.inner().base.cors_origins
    }

    pub fn environment(&self) -> &str {
        &self.inner().base.environment
    }

    pub fn trusted_proxy_count(&self) -> usize {
        self.inner().base.trusted_proxy_count
    }

    pub fn public_base_url(&self) -> &str {
        &self.inner().public_base_url
    }

    pub fn public_path(&self) -> PathBuf {
        self.resolve(&self.inner().public_dir)
    }

    pub fn quarantine_path(&self) -> PathBuf {
        self.resolve(&self.inner().quarantine_dir)
    }

    pub fn staging_path(&self) -> PathBuf {
        self.resolve(&self.inner().staging_dir)
    }

    pub fn violation_log_path(&self) -> PathBuf {
        self.resolve(&self.inner().violation_log_path)
    }

    pub fn max_file_size_bytes(&self) -> usize {
        self.inner().max_file_size_bytes
    }

    pub fn allowed_extensions(&self) -> &[String] {
        &self.inner().allowed_extensions
    }

    pub fn allowed_content_types(&self) -> &[String] {
        &self.inner().allowed_content_types
    }

    pub fn classifier_url(&self) -> &str {
        &self.inner().classifier_url
    }

    pub fn classifier_timeout_secs(&self) -> u64 {
        self.inner().classifier_timeout_secs
    }

    pub fn category_threshold(&self) -> f64 {
        self.inner().category_threshold
    }

    pub fn overall_threshold(&self) -> f64 {
        self.inner().overall_threshold
    }

    pub fn safe_labels(&self) -> &[String] {
        &self.inner().safe_labels
    }

    pub fn staging_sweep_interval_secs(&self) -> u64 {
        self.inner().staging_sweep_interval_secs
    }

    pub fn staging_max_age_secs(&self) -> u64 {
        self.inner().staging_max_age_secs
    }

    /// Relative paths are resolved against `STORAGE_ROOT`.
    fn resolve(&self, path: &str) -> PathBuf {
        let p = Path::new(path);
        if p.is_absolute() {
            p.to_path_buf()
        } else {
            self.inner().storage_root.join(p)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::new(ImageHostConfig::for_storage_root("/srv/images"));
        assert!(config.validate().is_ok());
        assert_eq!(config.server_port(), 3000);
        assert_eq!(config.max_file_size_bytes(), 10 * 1024 * 1024);
        assert_eq!(config.allowed_extensions(), &["jpg", "jpeg", "png", "gif"]);
        assert_eq!(config.safe_labels(), &["safe", "neutral", "drawing"]);
        assert_eq!(config.category_threshold(), 0.5);
        assert_eq!(config.overall_threshold(), 0.3);
    }

    #[test]
    fn test_paths_resolve_against_storage_root() {
        let mut inner = ImageHostConfig::for_storage_root("/srv/images");
        inner.violation_log_path = "/var/log/violations.json".to_string();
        let config = Config::new(inner);

        assert_eq!(config.public_path(), PathBuf::from("/srv/images/img"));
        assert_eq!(config.quarantine_path(), PathBuf::from("/srv/images/warnimg"));
        assert_eq!(config.staging_path(), PathBuf::from("/srv/images/temp"));
        assert_eq!(
            config.violation_log_path(),
            PathBuf::from("/var/log/violations.json")
        );
    }

    #[test]
    fn test_wildcard_cors_rejected_in_production() {
        let mut inner = ImageHostConfig::for_storage_root("/srv/images");
        inner.base.environment = "production".to_string();
        assert!(Config::new(inner.clone()).validate().is_err());

        inner.base.cors_origins = vec!["https://img.example.com".to_string()];
        let config = Config::new(inner);
        assert!(config.is_production());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_threshold_out_of_range_rejected() {
        let mut inner = ImageHostConfig::for_storage_root("/srv/images");
        inner.category_threshold = 1.5;
        assert!(inner.validate().is_err());
    }

    #[test]
    fn test_staging_max_age_must_outlast_classifier_timeout() {
        let mut inner = ImageHostConfig::for_storage_root("/srv/images");
        inner.classifier_timeout_secs = 30;
        inner.staging_max_age_secs = 30;
        assert!(inner.validate().is_err());

        inner.staging_max_age_secs = 31;
        assert!(inner.validate().is_ok());
    }

    #[test]
    fn test_store_directories_must_differ() {
        let mut inner = ImageHostConfig::for_storage_root("/srv/images");
        inner.quarantine_dir = "img".to_string();
        assert!(inner.validate().is_err());
    }

    #[test]
    fn test_split_list_normalizes() {
        assert_eq!(split_list(" JPG, png ,,gif"), vec!["jpg", "png", "gif"]);
    }
}
