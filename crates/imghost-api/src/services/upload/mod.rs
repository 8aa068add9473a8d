//! Upload pipeline: validate → hash → stage → classify → place → log

mod service;
mod types;

pub use service::{validate_file, ImageUploadService};
pub use types::ValidatedFile;
