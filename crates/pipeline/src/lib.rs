//! The batch engine: QR rasterization, per-code rendering with a
//! config-keyed cache, zip/upload packaging, the single-flight dispatcher,
//! and the periodic recovery sweep.
//!
//! The HTTP layer only hands process ids to [`dispatcher::DispatchHandle`];
//! everything else in here runs on spawned tasks and synchronizes with the
//! outside world exclusively through the batch and image tables.

pub mod dispatcher;
pub mod error;
pub mod packager;
pub mod raster;
pub mod recovery;
pub mod renderer;
pub mod runner;

pub use dispatcher::{BatchRunner, DispatchHandle, Dispatcher};
pub use error::PipelineError;
pub use raster::Rasterizer;
pub use recovery::RecoveryScheduler;
pub use renderer::{ImageRenderer, RenderOutcome};
pub use runner::BatchProcessor;
