//! Single-flight, de-duplicating batch dispatcher.
//!
//! One long-lived task consumes process ids from a channel and runs exactly
//! one batch at a time. Ids are collapsed through a membership set:
//! submitting an id that is already queued (or currently running) is a
//! no-op, so a double submission or an overlapping recovery sweep never
//! causes a second execution. An id submitted after its batch finished is
//! a fresh registration and runs again.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::error::PipelineError;

/// Executes one batch end to end. Seam between the queue and the batch
/// steps, so queue semantics are testable with a fake runner.
#[async_trait::async_trait]
pub trait BatchRunner: Send + Sync + 'static {
    async fn process(&self, process_id: &str) -> Result<(), PipelineError>;
}

/// Cloneable submission side of the dispatcher channel.
///
/// Submission is one-way: there is no reply, and completion is observable
/// only by polling the batch row.
#[derive(Clone)]
pub struct DispatchHandle {
    tx: mpsc::UnboundedSender<String>,
}

impl DispatchHandle {
    /// Create a handle and the receiver the dispatcher consumes.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Hand a batch id to the dispatcher. Never fails the caller; a dropped
    /// dispatcher is logged and the id is swept up after restart.
    pub fn submit(&self, process_id: &str) {
        if self.tx.send(process_id.to_string()).is_err() {
            tracing::error!(process_id, "Dispatcher is gone; submission dropped");
        }
    }
}

/// The single-flight worker queue.
pub struct Dispatcher<R: BatchRunner> {
    rx: mpsc::UnboundedReceiver<String>,
    runner: Arc<R>,
}

impl<R: BatchRunner> Dispatcher<R> {
    pub fn new(runner: Arc<R>) -> (Self, DispatchHandle) {
        let (handle, rx) = DispatchHandle::channel();
        (Self { rx, runner }, handle)
    }

    /// Run until cancelled or all handles are dropped. An in-flight batch
    /// is never interrupted; cancellation takes effect between batches.
    pub async fn run(mut self, cancel: CancellationToken) {
        let mut queue: VecDeque<String> = VecDeque::new();
        let mut queued: HashSet<String> = HashSet::new();
        tracing::info!("Batch dispatcher started");

        loop {
            if queue.is_empty() {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    next = self.rx.recv() => match next {
                        Some(id) => {
                            queued.insert(id.clone());
                            queue.push_back(id);
                        }
                        None => break,
                    }
                }
            }

            drain_into(&mut self.rx, &mut queue, &mut queued);

            let Some(id) = queue.pop_front() else { continue };
            tracing::info!(process_id = %id, pending = queue.len(), "Batch execution started");
            if let Err(e) = self.runner.process(&id).await {
                tracing::error!(process_id = %id, error = %e, "Batch execution failed");
            }

            // Collapse re-registrations that arrived while this batch ran;
            // the id stayed in the membership set the whole time, so they
            // are dropped here. Then defensively purge it from the pending
            // state before moving on.
            drain_into(&mut self.rx, &mut queue, &mut queued);
            queued.remove(&id);
            queue.retain(|pending| pending != &id);

            if cancel.is_cancelled() {
                break;
            }
        }

        tracing::info!("Batch dispatcher stopped");
    }
}

/// Move everything currently sitting in the channel into the queue,
/// skipping ids already queued or running.
fn drain_into(
    rx: &mut mpsc::UnboundedReceiver<String>,
    queue: &mut VecDeque<String>,
    queued: &mut HashSet<String>,
) {
    while let Ok(id) = rx.try_recv() {
        if queued.insert(id.clone()) {
            queue.push_back(id);
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
