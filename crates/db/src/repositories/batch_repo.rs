//! Repository for the `dialcode_batches` table.
//!
//! Batches are mutated only by intake (insert) and the batch runner
//! (Created → Processing → Completed). Rows are never deleted.

use sqlx::PgPool;

use crate::models::batch::{Batch, CreateBatch};
use crate::models::status::{BatchStatus, StatusId};

/// Column list for `dialcode_batches` queries.
const COLUMNS: &str = "\
    id, process_id, dialcodes, config, status_id, \
    channel, publisher, archive_url, created_at, updated_at";

/// Provides CRUD operations for dialcode batches.
pub struct BatchRepo;

impl BatchRepo {
    /// Insert a new batch with status `Created`. Returns the full row.
    pub async fn create(pool: &PgPool, input: &CreateBatch) -> Result<Batch, sqlx::Error> {
        let query = format!(
            "INSERT INTO dialcode_batches \
                 (process_id, dialcodes, config, status_id, channel, publisher) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Batch>(&query)
            .bind(&input.process_id)
            .bind(&input.dialcodes)
            .bind(&input.config)
            .bind(BatchStatus::Created.id())
            .bind(&input.channel)
            .bind(&input.publisher)
            .fetch_one(pool)
            .await
    }

    /// Find a batch by its process id.
    pub async fn find_by_process_id(
        pool: &PgPool,
        process_id: &str,
    ) -> Result<Option<Batch>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM dialcode_batches WHERE process_id = $1");
        sqlx::query_as::<_, Batch>(&query)
            .bind(process_id)
            .fetch_optional(pool)
            .await
    }

    /// Unconditionally move a batch to `Processing`.
    ///
    /// Idempotent on purpose: re-entering a batch after a crash is
    /// indistinguishable from starting it fresh.
    pub async fn mark_processing(pool: &PgPool, process_id: &str) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE dialcode_batches \
             SET status_id = $2, updated_at = NOW() \
             WHERE process_id = $1",
        )
        .bind(process_id)
        .bind(BatchStatus::Processing.id())
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Move a batch to `Completed` and record its archive URL.
    pub async fn mark_completed(
        pool: &PgPool,
        process_id: &str,
        archive_url: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE dialcode_batches \
             SET status_id = $2, archive_url = $3, updated_at = NOW() \
             WHERE process_id = $1",
        )
        .bind(process_id)
        .bind(BatchStatus::Completed.id())
        .bind(archive_url)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// List process ids in a given status, oldest first, bounded by `limit`.
    ///
    /// Used by the recovery sweep; batches beyond the cap are picked up on
    /// a later run.
    pub async fn list_process_ids_by_status(
        pool: &PgPool,
        status: StatusId,
        limit: i64,
    ) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar::<_, String>(
            "SELECT process_id FROM dialcode_batches \
             WHERE status_id = $1 \
             ORDER BY created_at ASC \
             LIMIT $2",
        )
        .bind(status)
        .bind(limit)
        .fetch_all(pool)
        .await
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
