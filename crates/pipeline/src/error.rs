//! Pipeline error type.
//!
//! A per-image failure (QR encoding, raster, upload) is logged by the batch
//! runner and does not abort sibling renders; a step-level failure (zip,
//! archive upload, DB write) aborts the batch and leaves it in Processing
//! for the recovery sweep.

use dialbatch_storage::StorageError;

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("QR encoding failed: {0}")]
    Qr(#[from] qrcode::types::QrError),

    #[error("Image encoding failed: {0}")]
    Image(#[from] image::ImageError),

    #[error("Internal error: {0}")]
    Internal(String),
}
