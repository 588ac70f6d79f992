//! Per-dialcode render-or-reuse orchestration.
//!
//! The image table is the cache: a Completed row whose normalized config
//! map equals the requested one short-circuits rendering, and the cached
//! blob is downloaded into the batch output directory instead.

use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use sqlx::PgPool;

use dialbatch_core::render::RenderConfig;
use dialbatch_db::models::image::CreateImage;
use dialbatch_db::repositories::ImageRepo;
use dialbatch_storage::{image_key, BlobStore};

use crate::error::PipelineError;
use crate::raster::Rasterizer;

/// Result of a single dialcode render request.
#[derive(Debug, Clone)]
pub struct RenderOutcome {
    /// Public URL of the image blob.
    pub url: String,
    /// `false` when the config-keyed cache satisfied the request.
    pub created: bool,
}

/// Renders one dialcode image, or reuses a cached one.
pub struct ImageRenderer {
    pool: PgPool,
    store: Arc<dyn BlobStore>,
    raster: Rasterizer,
}

impl ImageRenderer {
    pub fn new(pool: PgPool, store: Arc<dyn BlobStore>, raster: Rasterizer) -> Self {
        Self { pool, store, raster }
    }

    /// Render-or-reuse one dialcode image into `out_dir`.
    ///
    /// Cache hit: the Completed row's blob is downloaded into `out_dir` so
    /// the batch zip still contains every code. Cache miss: a Pending row
    /// claims the slot first, then raster → upload → Completed. The
    /// timestamped filename keeps repeated attempts for the same code from
    /// colliding in blob storage.
    pub async fn get_image(
        &self,
        dialcode: &str,
        channel: &str,
        publisher: &str,
        cfg: &RenderConfig,
        out_dir: &Path,
    ) -> Result<RenderOutcome, PipelineError> {
        let config_value = cfg.to_config_value();

        let rows = ImageRepo::find_completed(&self.pool, dialcode, channel, publisher).await?;
        let hit = rows
            .iter()
            .find(|row| row.config == config_value && row.url.is_some());
        if let Some(row) = hit {
            let url = row.url.clone().unwrap_or_default();
            let key = image_key(channel, publisher, &row.filename);
            let dest = out_dir.join(format!("{}.png", row.filename));
            self.store.download(&key, &dest).await?;
            tracing::debug!(dialcode, url = %url, "Image cache hit");
            return Ok(RenderOutcome { url, created: false });
        }

        let filename = format!("{dialcode}_{}", Utc::now().timestamp_millis());
        let row = ImageRepo::insert_pending(
            &self.pool,
            &CreateImage {
                dialcode: dialcode.to_string(),
                channel: channel.to_string(),
                publisher: publisher.to_string(),
                config: config_value,
                filename: filename.clone(),
            },
        )
        .await?;

        let local = out_dir.join(format!("{filename}.png"));
        self.raster.render_to_file(dialcode, cfg, &local)?;

        let key = image_key(channel, publisher, &filename);
        let url = self.store.upload(&local, &key).await?;
        ImageRepo::mark_completed(&self.pool, row.id, &url).await?;

        tracing::debug!(dialcode, url = %url, "Image rendered and uploaded");
        Ok(RenderOutcome { url, created: true })
    }
}
