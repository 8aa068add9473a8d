use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::header,
    response::IntoResponse,
};
use imghost_core::{AppError, ContentDigest};

use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use crate::validation::content_type_for_extension;

/// Stored images never change under a given digest.
const IMMUTABLE_CACHE_CONTROL: &str = "public, max-age=31536000, immutable";

/// Serve a stored image by digest. The timestamp segment is informational.
#[utoipa::path(
    get,
    path = "/img/{timestamp}/{digest}",
    tag = "images",
    params(
        ("timestamp" = String, Path, description = "Upload time in epoch milliseconds (not checked)"),
        ("digest" = String, Path, description = "SHA-256 of the image, 64 hex characters")
    ),
    responses(
        (status = 200, description = "Image bytes", content_type = "image/*"),
        (status = 404, description = "Image not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state), fields(operation = "get_image"))]
pub async fn get_image(
    State(state): State<Arc<AppState>>,
    Path((timestamp, digest)): Path<(String, String)>,
) -> Result<impl IntoResponse, HttpAppError> {
    let digest = ContentDigest::parse(&digest)
        .ok_or_else(|| AppError::NotFound("Image not found".to_string()))?;

    let asset = state
        .media
        .storage
        .find_by_digest(&digest)
        .await?
        .ok_or_else(|| AppError::NotFound("Image not found".to_string()))?;

    let data = state.media.storage.read_asset(&asset).await?;

    Ok((
        [
            (header::CONTENT_TYPE, content_type_for_extension(&asset.extension)),
            (header::CACHE_CONTROL, IMMUTABLE_CACHE_CONTROL),
        ],
        data,
    ))
}
