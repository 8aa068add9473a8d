//! imghost API library
//!
//! HTTP handlers, middleware, the upload pipeline, and application setup.

// Module declarations
mod api_doc;
mod handlers;
mod middleware;
mod telemetry;
mod validation;

// Public modules
pub mod error;
pub mod services;
pub mod setup;
pub mod state;
pub mod utils;

// Re-exports
pub use api_doc::ApiDoc;
pub use error::{ErrorResponse, HttpAppError};
pub use middleware::REQUEST_ID_HEADER;
pub use state::AppState;
pub use utils::ip_extraction::UNKNOWN_IP;
