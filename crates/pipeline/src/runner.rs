//! Batch execution: the dispatcher's per-batch work.
//!
//! Steps: load row → mark Processing → bounded render fan-out → zip →
//! upload archive → mark Completed → always clean local temp state. A
//! failure mid-way leaves the batch in Processing; the recovery sweep is
//! the only retry path.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use sqlx::PgPool;

use dialbatch_core::render::RenderConfig;
use dialbatch_db::models::batch::Batch;
use dialbatch_db::repositories::BatchRepo;
use dialbatch_storage::{archive_key, BlobStore};

use crate::dispatcher::BatchRunner;
use crate::error::PipelineError;
use crate::packager;
use crate::renderer::ImageRenderer;

/// Maximum concurrent renders within one batch.
pub const RENDER_CONCURRENCY: usize = 5;

/// Drives one batch from its persisted row to a downloadable archive.
pub struct BatchProcessor {
    pool: PgPool,
    store: Arc<dyn BlobStore>,
    renderer: ImageRenderer,
    /// Root for per-batch scratch directories.
    work_dir: PathBuf,
}

impl BatchProcessor {
    pub fn new(
        pool: PgPool,
        store: Arc<dyn BlobStore>,
        renderer: ImageRenderer,
        work_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            pool,
            store,
            renderer,
            work_dir: work_dir.into(),
        }
    }

    /// Fan out renders, zip the output, upload, mark Completed.
    async fn run_steps(&self, batch: &Batch, out_dir: &Path) -> Result<String, PipelineError> {
        let cfg = RenderConfig::from_value(&batch.config);

        let futs: Vec<_> = batch
            .dialcodes
            .iter()
            .map(|code| {
                let renderer = &self.renderer;
                let cfg = &cfg;
                async move {
                    let result = renderer
                        .get_image(code, &batch.channel, &batch.publisher, cfg, out_dir)
                        .await;
                    (code.as_str(), result)
                }
            })
            .collect();
        let outcomes: Vec<_> = stream::iter(futs)
            .buffer_unordered(RENDER_CONCURRENCY)
            .collect()
            .await;

        // One failing render does not cancel its siblings; the zip simply
        // omits that image.
        let (mut rendered, mut reused, mut failed) = (0u32, 0u32, 0u32);
        for (code, result) in outcomes {
            match result {
                Ok(outcome) if outcome.created => rendered += 1,
                Ok(_) => reused += 1,
                Err(e) => {
                    failed += 1;
                    tracing::error!(dialcode = code, error = %e, "Dialcode render failed");
                }
            }
        }
        tracing::info!(
            process_id = %batch.process_id,
            rendered,
            reused,
            failed,
            "Render fan-out settled",
        );

        let dir = out_dir.to_path_buf();
        let archive = tokio::task::spawn_blocking(move || packager::zip_dir(&dir))
            .await
            .map_err(|e| PipelineError::Internal(format!("zip task panicked: {e}")))??;

        let key = archive_key(&batch.channel, &batch.publisher, &batch.process_id);
        let url = self.store.upload(&archive, &key).await?;

        BatchRepo::mark_completed(&self.pool, &batch.process_id, &url).await?;
        Ok(url)
    }
}

#[async_trait::async_trait]
impl BatchRunner for BatchProcessor {
    async fn process(&self, process_id: &str) -> Result<(), PipelineError> {
        let Some(batch) = BatchRepo::find_by_process_id(&self.pool, process_id).await? else {
            tracing::warn!(process_id, "No batch row for dispatched id; dropping");
            return Ok(());
        };

        // Unconditional: re-entering a batch already in Processing after a
        // crash is indistinguishable from starting fresh.
        BatchRepo::mark_processing(&self.pool, process_id).await?;

        let out_dir = self.work_dir.join(&batch.process_id);
        tokio::fs::create_dir_all(&out_dir).await?;

        let result = self.run_steps(&batch, &out_dir).await;

        // Always drop local temp state, success or failure.
        packager::cleanup(&[out_dir.clone(), out_dir.with_extension("zip")]).await;

        match &result {
            Ok(url) => {
                tracing::info!(process_id, url = %url, "Batch completed");
            }
            Err(e) => {
                tracing::error!(
                    process_id,
                    error = %e,
                    "Batch failed; left in Processing for the recovery sweep",
                );
            }
        }
        result.map(|_| ())
    }
}
