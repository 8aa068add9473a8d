//! Application setup and initialization
//!
//! Everything `main` needs to go from a `Config` to a served router. Tests
//! build their app through the same functions.

pub mod routes;
pub mod server;
pub mod services;
pub mod storage;
pub mod validation;

use crate::state::AppState;
use anyhow::{Context, Result};
use imghost_core::Config;
use std::sync::Arc;

/// Initialize the entire application
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    validation::validate_config(&config).context("Configuration validation failed")?;

    crate::telemetry::init_telemetry(config.environment());

    tracing::info!("Configuration loaded and validated successfully");

    let storage = storage::setup_storage(&config).await?;

    let state = services::initialize_services(&config, storage).await?;

    let router = routes::setup_routes(&config, state.clone())?;

    Ok((state, router))
}
