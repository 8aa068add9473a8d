pub mod staging_sweeper;
pub mod upload;
