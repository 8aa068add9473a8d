//! imghost moderation client
//!
//! Talks to an external NSFW classifier over JSON/HTTP and turns its answer
//! into a [`ModerationVerdict`](imghost_core::ModerationVerdict). Every
//! failure is surfaced as an error so callers can fail closed.

pub mod client;
pub mod policy;
pub mod response;

pub use client::{Classifier, HttpClassifier, ModerationError};
pub use policy::ModerationPolicy;
