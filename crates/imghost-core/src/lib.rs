//! imghost core library
//!
//! This crate provides the domain models, error types, configuration, and content
//! hashing shared by the storage, moderation, and API crates.

pub mod config;
pub mod digest;
pub mod error;
pub mod models;

// Re-export commonly used types
pub use config::{BaseConfig, Config, ImageHostConfig};
pub use digest::{hash, ContentDigest};
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use models::{
    CategoryScore, ModerationVerdict, UploadResponse, UploadedImage, ViolationEntry,
};
