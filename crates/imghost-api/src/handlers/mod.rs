pub mod image_get;
pub mod image_upload;
