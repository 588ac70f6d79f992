//! Rendered-image entity model and DTOs.
//!
//! Multiple rows may exist for the same dialcode when it has been rendered
//! under different configs; the `(dialcode, channel, publisher, config)`
//! combination is the effective cache key.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use dialbatch_core::types::{DbId, Timestamp};

use super::status::StatusId;

/// A row from the `dialcode_images` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Image {
    pub id: DbId,
    pub dialcode: String,
    pub channel: String,
    pub publisher: String,
    /// Normalized string→string render config map (JSONB).
    pub config: serde_json::Value,
    pub status_id: StatusId,
    /// Blob filename stem, without the `.png` extension.
    pub filename: String,
    pub url: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Values for inserting a new Pending image row before rendering starts.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateImage {
    pub dialcode: String,
    pub channel: String,
    pub publisher: String,
    pub config: serde_json::Value,
    pub filename: String,
}
