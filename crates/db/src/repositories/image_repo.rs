//! Repository for the `dialcode_images` table.
//!
//! The renderer claims a slot by inserting a Pending row immediately before
//! generation, then flips it to Completed after upload. Only Completed rows
//! participate in cache lookups. Rows are never deleted; a crash between
//! insert and completion leaves an orphaned Pending row behind, which is
//! inert (it can never satisfy a hit).

use sqlx::PgPool;

use dialbatch_core::types::DbId;

use crate::models::image::{CreateImage, Image};
use crate::models::status::ImageStatus;

/// Column list for `dialcode_images` queries.
const COLUMNS: &str = "\
    id, dialcode, channel, publisher, config, status_id, \
    filename, url, created_at, updated_at";

/// Provides CRUD operations for rendered dialcode images.
pub struct ImageRepo;

impl ImageRepo {
    /// Insert a new Pending row claiming a render slot.
    pub async fn insert_pending(
        pool: &PgPool,
        input: &CreateImage,
    ) -> Result<Image, sqlx::Error> {
        let query = format!(
            "INSERT INTO dialcode_images \
                 (dialcode, channel, publisher, config, status_id, filename) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Image>(&query)
            .bind(&input.dialcode)
            .bind(&input.channel)
            .bind(&input.publisher)
            .bind(&input.config)
            .bind(ImageStatus::Pending.id())
            .bind(&input.filename)
            .fetch_one(pool)
            .await
    }

    /// Flip a row to Completed and record the uploaded blob URL.
    pub async fn mark_completed(
        pool: &PgPool,
        id: DbId,
        url: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE dialcode_images \
             SET status_id = $2, url = $3, updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(ImageStatus::Completed.id())
        .bind(url)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// All Completed rows for a `(dialcode, channel, publisher)` key.
    ///
    /// The caller compares each row's config map against the requested one;
    /// structural equality of the normalized maps decides the cache hit.
    pub async fn find_completed(
        pool: &PgPool,
        dialcode: &str,
        channel: &str,
        publisher: &str,
    ) -> Result<Vec<Image>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM dialcode_images \
             WHERE dialcode = $1 AND channel = $2 AND publisher = $3 AND status_id = $4 \
             ORDER BY created_at DESC"
        );
        sqlx::query_as::<_, Image>(&query)
            .bind(dialcode)
            .bind(channel)
            .bind(publisher)
            .bind(ImageStatus::Completed.id())
            .fetch_all(pool)
            .await
    }

    /// Count all rows for a dialcode key regardless of status. Test helper
    /// for asserting the cache never duplicates work.
    pub async fn count_for_key(
        pool: &PgPool,
        dialcode: &str,
        channel: &str,
        publisher: &str,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM dialcode_images \
             WHERE dialcode = $1 AND channel = $2 AND publisher = $3",
        )
        .bind(dialcode)
        .bind(channel)
        .bind(publisher)
        .fetch_one(pool)
        .await
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
