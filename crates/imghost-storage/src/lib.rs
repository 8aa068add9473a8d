//! imghost storage library
//!
//! Local filesystem stores for uploaded images and the violation log.
//!
//! # Layout
//!
//! - **staging**: `upload-{millis}-{random}` files awaiting a moderation verdict
//! - **public**: `{digest}.{ext}`, content-addressed, first writer wins
//! - **quarantine**: `{millis}-{random}.{ext}`, flagged content kept for audit
//!
//! File names are generated in the `keys` module. Names must not contain path
//! separators or `..`.

pub(crate) mod keys;
pub mod local;
pub mod staging;
pub mod traits;
pub mod violation_log;

// Re-export commonly used types
pub use local::{LocalStorage, Placement, PlacementKind, StoredAsset};
pub use staging::StagedFile;
pub use traits::{AssetStorage, StorageError, StorageResult};
pub use violation_log::{LogWriteError, ViolationLog};
