//! Database-backed file storage and reference tracking.

mod references;
mod store;

pub use references::detect_file_references;
pub use store::{FileStore, FileStoreError, file_exists, find_by_hash};

/// Filename extensions accepted by the image upload endpoint.
pub const IMAGE_EXTENSIONS: &[&str] = &["gif", "jpeg", "jpg", "png", "webp"];

/// Sniffed content types accepted by the image upload endpoint.
pub const IMAGE_MIME_TYPES: &[&str] = &["image/gif", "image/jpeg", "image/png", "image/webp"];
