//! Types used by the image upload service

/// Extracted and validated file data
#[derive(Debug)]
pub struct ValidatedFile {
    pub data: Vec<u8>,
    pub original_filename: String,
    pub content_type: String,
    /// Lowercased, without the leading dot
    pub extension: String,
}
