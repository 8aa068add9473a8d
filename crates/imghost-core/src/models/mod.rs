//! Data models for the application
//!
//! Moderation verdicts, upload responses, and violation-log entries.

mod moderation;
mod upload;
mod violation;

pub use moderation::{CategoryScore, ModerationVerdict};
pub use upload::{UploadResponse, UploadedImage};
pub use violation::ViolationEntry;
