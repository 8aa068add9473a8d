//! Configuration validation
//!
//! Validates configuration at startup to catch misconfigurations early.

use anyhow::Result;
use imghost_core::Config;

/// Validate configuration, failing fast on anything that would break uploads
/// or weaken moderation. Questionable but workable settings are logged.
pub fn validate_config(config: &Config) -> Result<()> {
    config.validate()?;

    if config.trusted_proxy_count() == 0 {
        tracing::info!("TRUSTED_PROXY_COUNT is 0; X-Forwarded-For is ignored");
    }

    if config.is_production() && config.classifier_url().starts_with("http://")
        && !is_loopback_url(config.classifier_url())
    {
        tracing::warn!(
            classifier_url = %config.classifier_url(),
            "Classifier is reached over plain HTTP on a non-loopback address"
        );
    }

    if config.staging_sweep_interval_secs() == 0 {
        tracing::warn!("STAGING_SWEEP_INTERVAL_SECS is 0; abandoned staging files are never removed");
    }

    Ok(())
}

fn is_loopback_url(url: &str) -> bool {
    let host = url
        .split("://")
        .nth(1)
        .unwrap_or(url)
        .split(['/', ':'])
        .next()
        .unwrap_or_default();
    host == "localhost" || host == "127.0.0.1"
}
