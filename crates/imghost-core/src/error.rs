//! Error types module
//!
//! All request-level failures are unified under `AppError`. Each variant
//! describes its own HTTP presentation through `ErrorMetadata`.

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for rejected content and degraded dependencies
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata for error responses - defines how an error should be presented
pub trait ErrorMetadata {
    /// HTTP status code to return
    fn http_status_code(&self) -> u16;

    /// Machine-readable error code (e.g., "CONTENT_REJECTED")
    fn error_code(&self) -> &'static str;

    /// Whether this error is recoverable (can be retried)
    fn is_recoverable(&self) -> bool;

    /// Suggested action for the client
    fn suggested_action(&self) -> Option<&'static str>;

    /// Client-facing message (may differ from internal error message)
    fn client_message(&self) -> String;

    /// Whether details should be hidden in production
    fn is_sensitive(&self) -> bool;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("File too large: {0}")]
    PayloadTooLarge(String),

    /// The classifier flagged the upload. Carries the formatted reasons.
    #[error("Content rejected: {0}")]
    ContentRejected(String),

    /// Classifier unreachable, timed out, or answered with a failure status.
    #[error("Moderation service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Classifier answered but the answer was an error or unreadable.
    #[error("Moderation service error: {0}")]
    ServiceError(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

/// Static metadata for each variant: (http_status, error_code, recoverable, suggested_action, sensitive, log_level).
fn app_error_static_metadata(
    err: &AppError,
) -> (
    u16,
    &'static str,
    bool,
    Option<&'static str>,
    bool,
    LogLevel,
) {
    match err {
        AppError::InvalidInput(_) => (
            400,
            "INVALID_INPUT",
            false,
            Some("Check the file type and try again"),
            false,
            LogLevel::Debug,
        ),
        AppError::NotFound(_) => (
            404,
            "NOT_FOUND",
            false,
            Some("Verify the image URL"),
            false,
            LogLevel::Debug,
        ),
        AppError::PayloadTooLarge(_) => (
            413,
            "PAYLOAD_TOO_LARGE",
            false,
            Some("Reduce file size and try again"),
            false,
            LogLevel::Debug,
        ),
        AppError::ContentRejected(_) => (
            422,
            "CONTENT_REJECTED",
            false,
            None,
            false,
            LogLevel::Warn,
        ),
        AppError::ServiceUnavailable(_) => (
            503,
            "MODERATION_UNAVAILABLE",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
        AppError::ServiceError(_) => (
            502,
            "MODERATION_ERROR",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
        AppError::Storage(_) => (
            500,
            "STORAGE_ERROR",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
    }
}

impl AppError {
    /// Get the error type name for detailed error responses
    pub fn error_type(&self) -> &str {
        match self {
            AppError::InvalidInput(_) => "InvalidInput",
            AppError::NotFound(_) => "NotFound",
            AppError::PayloadTooLarge(_) => "PayloadTooLarge",
            AppError::ContentRejected(_) => "ContentRejected",
            AppError::ServiceUnavailable(_) => "ServiceUnavailable",
            AppError::ServiceError(_) => "ServiceError",
            AppError::Storage(_) => "Storage",
        }
    }

    /// Internal message, including what the client message leaves out.
    pub fn detailed_message(&self) -> String {
        self.to_string()
    }
}

impl ErrorMetadata for AppError {
    fn http_status_code(&self) -> u16 {
        app_error_static_metadata(self).0
    }

    fn error_code(&self) -> &'static str {
        app_error_static_metadata(self).1
    }

    fn is_recoverable(&self) -> bool {
        app_error_static_metadata(self).2
    }

    fn suggested_action(&self) -> Option<&'static str> {
        app_error_static_metadata(self).3
    }

    fn is_sensitive(&self) -> bool {
        app_error_static_metadata(self).4
    }

    fn log_level(&self) -> LogLevel {
        app_error_static_metadata(self).5
    }

    fn client_message(&self) -> String {
        match self {
            AppError::InvalidInput(ref msg)
            | AppError::NotFound(ref msg)
            | AppError::PayloadTooLarge(ref msg) => msg.clone(),
            AppError::ContentRejected(ref reasons) => {
                format!("Image rejected by content moderation: {}", reasons)
            }
            AppError::ServiceUnavailable(_) => {
                "Content moderation service is unavailable".to_string()
            }
            AppError::ServiceError(_) => "Content moderation failed".to_string(),
            AppError::Storage(_) => "Failed to access storage".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_metadata_not_found() {
        let err = AppError::NotFound("Image not found".to_string());
        assert_eq!(err.http_status_code(), 404);
        assert_eq!(err.error_code(), "NOT_FOUND");
        assert!(!err.is_recoverable());
        assert_eq!(err.client_message(), "Image not found");
        assert!(!err.is_sensitive());
        assert_eq!(err.log_level(), LogLevel::Debug);
    }

    #[test]
    fn test_error_metadata_content_rejected() {
        let err = AppError::ContentRejected("unsafe 92.0% (overall 92.0%)".to_string());
        assert_eq!(err.http_status_code(), 422);
        assert_eq!(err.error_code(), "CONTENT_REJECTED");
        assert!(!err.is_recoverable());
        assert!(err.client_message().contains("92.0%"));
        assert!(!err.is_sensitive());
        assert_eq!(err.log_level(), LogLevel::Warn);
    }

    #[test]
    fn test_error_metadata_moderation_failures_are_server_errors() {
        let unavailable = AppError::ServiceUnavailable("connection refused".to_string());
        assert_eq!(unavailable.http_status_code(), 503);
        assert!(unavailable.is_recoverable());
        assert!(unavailable.is_sensitive());
        assert!(!unavailable.client_message().contains("refused"));

        let failed = AppError::ServiceError("model not loaded".to_string());
        assert_eq!(failed.http_status_code(), 502);
        assert_eq!(failed.error_code(), "MODERATION_ERROR");
    }

    #[test]
    fn test_error_metadata_suggested_actions() {
        let err1 = AppError::Storage("disk full".to_string());
        assert_eq!(err1.suggested_action(), Some("Retry after a short delay"));

        let err2 = AppError::PayloadTooLarge("too big".to_string());
        assert_eq!(
            err2.suggested_action(),
            Some("Reduce file size and try again")
        );

        let err3 = AppError::ContentRejected("porn 80.0%".to_string());
        assert_eq!(err3.suggested_action(), None);
    }

    #[test]
    fn test_detailed_message_keeps_internal_cause() {
        let err = AppError::ServiceUnavailable("connection refused".to_string());
        assert!(err.detailed_message().contains("connection refused"));
        assert!(!err.client_message().contains("refused"));
        assert_eq!(err.error_type(), "ServiceUnavailable");
    }
}
