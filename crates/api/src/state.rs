//! Shared application state.

use std::sync::Arc;

use dialbatch_db::DbPool;
use dialbatch_pipeline::DispatchHandle;

use crate::allocator::DialcodeAllocator;
use crate::config::ServerConfig;

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub config: Arc<ServerConfig>,
    /// Sends batch process ids to the in-process dispatcher.
    pub dispatch: DispatchHandle,
    pub allocator: Arc<dyn DialcodeAllocator>,
}
