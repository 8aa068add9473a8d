//! Extension / Content-Type agreement for image uploads

use std::path::Path;

/// MIME types an image extension may legitimately be declared as.
fn expected_content_types(extension: &str) -> Option<&'static [&'static str]> {
    let types: &'static [&'static str] = match extension {
        "jpg" | "jpeg" => &["image/jpeg", "image/pjpeg"],
        "png" => &["image/png"],
        "gif" => &["image/gif"],
        _ => return None,
    };
    Some(types)
}

/// Content-Type to serve a stored image with.
pub fn content_type_for_extension(extension: &str) -> &'static str {
    expected_content_types(&extension.to_lowercase())
        .and_then(|types| types.first().copied())
        .unwrap_or("application/octet-stream")
}

/// Reject uploads whose declared Content-Type does not fit the file extension,
/// e.g. a text file renamed to `.jpg` but still sent as `text/plain`.
pub fn validate_extension_content_type_match(
    filename: &str,
    content_type: &str,
) -> Result<(), String> {
    let extension = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    if extension.is_empty() {
        return Err("File must have an extension".to_string());
    }

    let normalized = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_lowercase();

    let Some(expected) = expected_content_types(&extension) else {
        tracing::debug!(
            extension = %extension,
            content_type = %content_type,
            "No known Content-Type for extension"
        );
        return Err(format!("Unsupported image extension '{}'", extension));
    };

    if !expected.contains(&normalized.as_str()) {
        return Err(format!(
            "Content-Type '{}' does not match extension '{}'. Expected one of: {}",
            content_type,
            extension,
            expected.join(", ")
        ));
    }

    Ok(())
}
