//! Common utilities for the upload handler

use std::path::Path;

use axum::extract::multipart::MultipartError;
use axum::extract::Multipart;
use axum::http::StatusCode;
use imghost_core::AppError;

/// Multipart field names accepted for the uploaded image.
pub const FILE_FIELDS: [&str; 2] = ["image", "file"];

/// File part of a multipart upload, before validation.
#[derive(Debug)]
pub struct ExtractedFile {
    pub data: Vec<u8>,
    pub original_filename: String,
    pub content_type: String,
}

/// A body over the request limit surfaces as a multipart read error with a
/// 413 status.
fn map_multipart_error(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge("Request body exceeds the upload size limit".to_string())
    } else {
        AppError::InvalidInput(format!("Failed to read multipart: {}", err.body_text()))
    }
}

/// Extract the single image field (`image` or `file`) from a multipart form.
/// Other fields are ignored; a second file field is rejected.
pub async fn extract_multipart_file(mut multipart: Multipart) -> Result<ExtractedFile, AppError> {
    let mut extracted: Option<ExtractedFile> = None;

    while let Some(field) = multipart.next_field().await.map_err(map_multipart_error)? {
        let is_file_field = field
            .name()
            .map(|name| FILE_FIELDS.contains(&name))
            .unwrap_or(false);
        if !is_file_field {
            continue;
        }

        if extracted.is_some() {
            return Err(AppError::InvalidInput(
                "Multiple files are not allowed; send exactly one field named 'image'".to_string(),
            ));
        }

        let original_filename = field.file_name().unwrap_or("unknown").to_string();
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let data = field.bytes().await.map_err(map_multipart_error)?;

        extracted = Some(ExtractedFile {
            data: data.to_vec(),
            original_filename,
            content_type,
        });
    }

    extracted.ok_or_else(|| AppError::InvalidInput("No file provided".to_string()))
}

/// Validate file size
pub fn validate_file_size(file_size: usize, max_size: usize) -> Result<(), AppError> {
    if file_size == 0 {
        return Err(AppError::InvalidInput("File is empty".to_string()));
    }
    if file_size > max_size {
        return Err(AppError::PayloadTooLarge(format!(
            "File size exceeds maximum allowed size of {} MB",
            max_size / 1024 / 1024
        )));
    }
    Ok(())
}

/// Normalize MIME type by stripping parameters (e.g. "image/jpeg; charset=utf-8" -> "image/jpeg").
fn normalize_mime_type(content_type: &str) -> &str {
    content_type
        .split(';')
        .next()
        .map(|s| s.trim())
        .unwrap_or(content_type)
}

/// Validate content type against allowlist. Compares normalized MIME type only.
pub fn validate_content_type(content_type: &str, allowed_types: &[String]) -> Result<(), AppError> {
    let normalized = normalize_mime_type(content_type).to_lowercase();
    if !allowed_types.iter().any(|ct| normalized == ct.to_lowercase()) {
        return Err(AppError::InvalidInput(format!(
            "Invalid content type. Allowed types: {}",
            allowed_types.join(", ")
        )));
    }
    Ok(())
}

/// Validate the file extension and return it lowercased.
pub fn validate_file_extension(
    filename: &str,
    allowed_extensions: &[String],
) -> Result<String, AppError> {
    let extension = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    if extension.is_empty() || !allowed_extensions.contains(&extension) {
        return Err(AppError::InvalidInput(format!(
            "Invalid file extension. Allowed extensions: {}",
            allowed_extensions.join(", ")
        )));
    }

    Ok(extension)
}

/// Validate Content-Type matches extension (wrapper for validation module)
pub fn validate_extension_content_type_match(
    filename: &str,
    content_type: &str,
) -> Result<(), AppError> {
    crate::validation::validate_extension_content_type_match(filename, content_type)
        .map_err(AppError::InvalidInput)
}
