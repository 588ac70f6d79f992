//! Batch entity model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use dialbatch_core::types::{DbId, Timestamp};

use super::status::StatusId;

/// A row from the `dialcode_batches` table.
///
/// `archive_url` is set if and only if the batch is Completed.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Batch {
    pub id: DbId,
    pub process_id: String,
    pub dialcodes: Vec<String>,
    /// Normalized string→string render config map (JSONB).
    pub config: serde_json::Value,
    pub status_id: StatusId,
    pub channel: String,
    pub publisher: String,
    pub archive_url: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Values for inserting a new batch at intake time.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateBatch {
    pub process_id: String,
    pub dialcodes: Vec<String>,
    pub config: serde_json::Value,
    pub channel: String,
    pub publisher: String,
}
