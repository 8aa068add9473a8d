//! File naming for the three stores.

use imghost_core::ContentDigest;

/// `{millis}-{16 hex chars}`; unique per call within a process.
pub fn unique_token() -> String {
    format!(
        "{}-{:016x}",
        chrono::Utc::now().timestamp_millis(),
        rand::random::<u64>()
    )
}

pub fn staging_name() -> String {
    format!("upload-{}", unique_token())
}

pub fn public_name(digest: &ContentDigest, extension: &str) -> String {
    format!("{}.{}", digest, extension)
}

pub fn quarantine_name(extension: &str) -> String {
    format!("{}.{}", unique_token(), extension)
}

/// Lowercase an extension and strip a leading dot. Returns `None` for
/// anything that is not plain ASCII alphanumerics.
pub fn normalize_extension(extension: &str) -> Option<String> {
    let ext = extension.trim().trim_start_matches('.').to_ascii_lowercase();
    if ext.is_empty() || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(ext)
}

/// [`normalize_extension`], with aliases folded onto one spelling so that
/// the same bytes map to one public name.
pub fn canonical_extension(extension: &str) -> Option<String> {
    normalize_extension(extension).map(|ext| match ext.as_str() {
        "jpeg" => "jpg".to_string(),
        _ => ext,
    })
}
