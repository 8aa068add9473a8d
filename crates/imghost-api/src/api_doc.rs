//! OpenAPI documentation, served at `/api/openapi.json`.

use utoipa::OpenApi;

use crate::error;
use crate::handlers;
use crate::setup::routes::health;
use imghost_core::models;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "imghost API",
        version = "0.1.0",
        description = "Image hosting with content-addressed storage. Every upload is checked by an NSFW classifier before it is published; flagged images are quarantined and the upload is rejected."
    ),
    paths(
        handlers::image_upload::upload_image,
        handlers::image_get::get_image,
        health::liveness_check,
        health::readiness_check,
    ),
    components(schemas(
        models::UploadResponse,
        models::UploadedImage,
        error::ErrorResponse,
        health::ReadinessResponse,
    )),
    tags(
        (name = "images", description = "Upload and serve images"),
        (name = "health", description = "Liveness and readiness probes")
    )
)]
pub struct ApiDoc;
