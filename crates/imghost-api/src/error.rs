//! HTTP error response conversion
//!
//! Handlers return `Result<impl IntoResponse, HttpAppError>`. Any `AppError`
//! (or a domain error with a `From` impl below) renders as the JSON error body
//! and is logged at the variant's level.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use imghost_core::{AppError, ErrorMetadata, LogLevel};
use imghost_moderation::ModerationError;
use imghost_storage::StorageError;
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Always `false`
    pub success: bool,
    pub message: String,
    /// Machine-readable error code for programmatic handling
    pub code: String,
    /// Whether this error is recoverable (can be retried)
    pub recoverable: bool,
    /// Suggested action for the client
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_action: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
}

impl ErrorResponse {
    fn from_app_error(app_error: &AppError, include_details: bool) -> Self {
        Self {
            success: false,
            message: app_error.client_message(),
            code: app_error.error_code().to_string(),
            recoverable: app_error.is_recoverable(),
            suggested_action: app_error.suggested_action().map(String::from),
            details: include_details.then(|| app_error.detailed_message()),
            error_type: include_details.then(|| app_error.error_type().to_string()),
        }
    }
}

/// Wrapper type for AppError to implement IntoResponse
/// (orphan rules: `AppError` lives in imghost-core).
#[derive(Debug)]
pub struct HttpAppError(pub AppError);

impl From<AppError> for HttpAppError {
    fn from(err: AppError) -> Self {
        HttpAppError(err)
    }
}

fn log_error(error: &AppError) {
    let error_type = error.error_type();
    match error.log_level() {
        LogLevel::Debug => {
            tracing::debug!(error = %error, error_type = error_type, "Error occurred");
        }
        LogLevel::Warn => {
            tracing::warn!(error = %error, error_type = error_type, "Error occurred");
        }
        LogLevel::Error => {
            tracing::error!(error = %error, error_type = error_type, "Error occurred");
        }
    }
}

fn is_production_env() -> bool {
    std::env::var("ENVIRONMENT")
        .or_else(|_| std::env::var("APP_ENV"))
        .map(|env| env.to_lowercase() == "production" || env.to_lowercase() == "prod")
        .unwrap_or(false)
}

impl IntoResponse for HttpAppError {
    fn into_response(self) -> Response {
        let app_error = &self.0;

        let status = StatusCode::from_u16(app_error.http_status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        log_error(app_error);

        // Details only outside production, and never for sensitive errors.
        let include_details = !is_production_env() && !app_error.is_sensitive();
        let body = ErrorResponse::from_app_error(app_error, include_details);

        (status, Json(body)).into_response()
    }
}

impl From<StorageError> for HttpAppError {
    fn from(err: StorageError) -> Self {
        let app = match err {
            StorageError::NotFound(msg) => AppError::NotFound(msg),
            StorageError::InvalidKey(msg) => AppError::InvalidInput(msg),
            StorageError::StagingFailed(msg)
            | StorageError::PlacementFailed(msg)
            | StorageError::ReadFailed(msg)
            | StorageError::ConfigError(msg) => AppError::Storage(msg),
            StorageError::IoError(err) => AppError::Storage(format!("IO error: {}", err)),
        };
        HttpAppError(app)
    }
}

impl From<ModerationError> for HttpAppError {
    fn from(err: ModerationError) -> Self {
        let app = match err {
            ModerationError::ServiceUnavailable(msg) => AppError::ServiceUnavailable(msg),
            ModerationError::ServiceError(msg) => AppError::ServiceError(msg),
        };
        HttpAppError(app)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_storage_error_not_found() {
        let storage_err = StorageError::NotFound("File not found".to_string());
        let HttpAppError(app_err) = storage_err.into();
        match app_err {
            AppError::NotFound(msg) => assert_eq!(msg, "File not found"),
            _ => panic!("Expected NotFound variant"),
        }
    }

    #[test]
    fn test_from_storage_error_placement_failed() {
        let storage_err = StorageError::PlacementFailed("link failed".to_string());
        let HttpAppError(app_err) = storage_err.into();
        match app_err {
            AppError::Storage(msg) => assert_eq!(msg, "link failed"),
            _ => panic!("Expected Storage variant"),
        }
    }

    #[test]
    fn test_from_storage_error_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::Other, "disk gone");
        let HttpAppError(app_err) = StorageError::IoError(io_err).into();
        match app_err {
            AppError::Storage(msg) => assert!(msg.contains("disk gone")),
            _ => panic!("Expected Storage variant"),
        }
    }

    #[test]
    fn test_from_moderation_errors() {
        let HttpAppError(app_err) =
            ModerationError::ServiceUnavailable("refused".to_string()).into();
        assert_eq!(app_err.http_status_code(), 503);

        let HttpAppError(app_err) = ModerationError::ServiceError("bad body".to_string()).into();
        assert_eq!(app_err.http_status_code(), 502);
    }

    #[test]
    fn test_sensitive_error_hides_details() {
        let err = AppError::Storage("/srv/data/img/abc.jpg: permission denied".to_string());
        let body = ErrorResponse::from_app_error(&err, !err.is_sensitive());
        let json = serde_json::to_value(&body).unwrap();

        assert_eq!(json["success"], false);
        assert_eq!(json["code"], "STORAGE_ERROR");
        assert!(json.get("details").is_none());
        assert!(!json["message"].as_str().unwrap().contains("/srv"));
    }

    #[test]
    fn test_rejection_body_shape() {
        let err = AppError::ContentRejected("unsafe 92.0% (overall 92.0%)".to_string());
        let body = ErrorResponse::from_app_error(&err, false);
        let json = serde_json::to_value(&body).unwrap();

        assert_eq!(json["success"], false);
        assert_eq!(json["code"], "CONTENT_REJECTED");
        assert_eq!(json["recoverable"], false);
        assert!(json.get("suggested_action").is_none());
        assert!(json["message"].as_str().unwrap().contains("92.0%"));
    }
}
