use std::sync::Arc;

use axum::{
    extract::{Multipart, State},
    Json,
};
use imghost_core::UploadResponse;

use crate::error::{ErrorResponse, HttpAppError};
use crate::services::upload::ImageUploadService;
use crate::state::AppState;
use crate::utils::ip_extraction::ClientIp;

/// Upload image handler
///
/// Accepts a single file field named `image` (or `file`). The image is
/// stored only if the classifier judges it clean; flagged images are
/// quarantined and the request is rejected.
///
/// # Errors
/// - `AppError::InvalidInput` - Missing file, bad extension or Content-Type
/// - `AppError::PayloadTooLarge` - File exceeds size limit
/// - `AppError::ContentRejected` - Flagged by moderation
/// - `AppError::ServiceUnavailable` / `AppError::ServiceError` - Classifier failure
/// - `AppError::Storage` - Staging or placement failure
#[utoipa::path(
    post,
    path = "/api/upload",
    tag = "images",
    request_body(content = inline(Object), content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Image uploaded successfully", body = UploadResponse),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 413, description = "File too large", body = ErrorResponse),
        (status = 422, description = "Rejected by content moderation", body = ErrorResponse),
        (status = 502, description = "Classifier returned an unusable answer", body = ErrorResponse),
        (status = 503, description = "Classifier unavailable", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[tracing::instrument(
    skip(state, multipart),
    fields(client_ip = %client_ip, operation = "upload_image")
)]
pub async fn upload_image(
    State(state): State<Arc<AppState>>,
    ClientIp(client_ip): ClientIp,
    multipart: Multipart,
) -> Result<Json<UploadResponse>, HttpAppError> {
    let service = ImageUploadService::new(&state);
    let image = service.upload(multipart, &client_ip).await?;
    Ok(Json(UploadResponse::new(image)))
}
