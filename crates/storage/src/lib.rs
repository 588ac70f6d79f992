//! Blob storage abstraction.
//!
//! Uploaded artifacts (single PNGs, batch ZIPs) are addressed by
//! `{channel}/{publisher}/{filename}` keys. The service talks to storage
//! only through [`BlobStore`], so the S3 backend can be swapped for the
//! local-filesystem one in development and tests.

mod local;
mod s3;

use std::path::Path;

pub use local::LocalStore;
pub use s3::S3Store;

/// Errors from blob store operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Upload failed for key '{key}': {message}")]
    Upload { key: String, message: String },

    #[error("Download failed for key '{key}': {message}")]
    Download { key: String, message: String },
}

/// A key-addressed blob store.
#[async_trait::async_trait]
pub trait BlobStore: Send + Sync {
    /// Upload a local file under `key`. Returns the public URL.
    async fn upload(&self, local: &Path, key: &str) -> Result<String, StorageError>;

    /// Download the blob at `key` into `dest`, creating parent directories
    /// as needed.
    async fn download(&self, key: &str, dest: &Path) -> Result<(), StorageError>;
}

/// Blob key for a single rendered image.
pub fn image_key(channel: &str, publisher: &str, filename: &str) -> String {
    format!("{channel}/{publisher}/{filename}.png")
}

/// Blob key for a batch archive.
pub fn archive_key(channel: &str, publisher: &str, process_id: &str) -> String {
    format!("{channel}/{publisher}/{process_id}.zip")
}
