//! Periodic recovery sweep.
//!
//! Re-submits incomplete batches to the dispatcher: batches created but
//! never dispatched, and batches stranded in Processing by a crash or an
//! uncaught mid-batch failure. This is the only retry mechanism in the
//! system; re-renders of already-Completed codes are cache hits, so a
//! re-driven batch mostly re-does packaging, not rendering.

use std::time::Duration;

use sqlx::PgPool;
use tokio_util::sync::CancellationToken;

use dialbatch_db::models::status::BatchStatus;
use dialbatch_db::repositories::BatchRepo;

use crate::dispatcher::DispatchHandle;

/// Default sweep interval: daily.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

/// Default per-status row cap per sweep. Batches beyond the cap are picked
/// up on a later run.
pub const DEFAULT_SCAN_LIMIT: i64 = 100;

/// Explicit service started once at process startup.
pub struct RecoveryScheduler {
    pool: PgPool,
    dispatch: DispatchHandle,
    interval: Duration,
    scan_limit: i64,
}

impl RecoveryScheduler {
    pub fn new(pool: PgPool, dispatch: DispatchHandle) -> Self {
        Self {
            pool,
            dispatch,
            interval: DEFAULT_SWEEP_INTERVAL,
            scan_limit: DEFAULT_SCAN_LIMIT,
        }
    }

    /// Override the sweep interval and per-status scan limit.
    pub fn with_schedule(mut self, interval: Duration, scan_limit: i64) -> Self {
        self.interval = interval;
        self.scan_limit = scan_limit;
        self
    }

    /// Run the sweep loop until cancelled. The first sweep fires
    /// immediately, so batches stranded by a restart are re-driven without
    /// waiting a full interval.
    pub async fn run(self, cancel: CancellationToken) {
        tracing::info!(
            interval_secs = self.interval.as_secs(),
            scan_limit = self.scan_limit,
            "Recovery scheduler started",
        );
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Recovery scheduler stopping");
                    break;
                }
                _ = ticker.tick() => {
                    if let Err(e) = self.sweep().await {
                        tracing::error!(error = %e, "Recovery sweep failed");
                    }
                }
            }
        }
    }

    /// One sweep: two bounded scans (Created, then Processing), each id
    /// re-submitted exactly as intake would. Never touches Completed rows.
    pub async fn sweep(&self) -> Result<usize, sqlx::Error> {
        let mut resubmitted = 0;
        for status in [BatchStatus::Created, BatchStatus::Processing] {
            let ids = BatchRepo::list_process_ids_by_status(
                &self.pool,
                status.id(),
                self.scan_limit,
            )
            .await?;
            for id in &ids {
                self.dispatch.submit(id);
            }
            resubmitted += ids.len();
        }

        if resubmitted > 0 {
            tracing::info!(resubmitted, "Recovery sweep re-submitted incomplete batches");
        } else {
            tracing::debug!("Recovery sweep found nothing to do");
        }
        Ok(resubmitted)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
