use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::digest::ContentDigest;

/// Public reference to a stored image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct UploadedImage {
    /// Public URL (`{base}/img/{timestamp}/{digest}`)
    pub url: String,
    /// Upload time in milliseconds since the Unix epoch
    pub timestamp: i64,
    /// SHA-256 of the image bytes
    #[schema(value_type = String)]
    pub digest: ContentDigest,
    /// Name of the file in the public store (`{digest}.{ext}`)
    pub filename: String,
}

/// Successful upload response body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct UploadResponse {
    pub success: bool,
    pub message: String,
    pub data: UploadedImage,
}

impl UploadResponse {
    pub fn new(data: UploadedImage) -> Self {
        Self {
            success: true,
            message: "Upload successful".to_string(),
            data,
        }
    }
}
