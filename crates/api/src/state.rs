use std::sync::Arc;

use handoff_dispatch::JobQueue;
use handoff_store::StorePool;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable: everything is behind `Arc`. Holds no coordination
/// state of its own; all of that lives in the store.
#[derive(Clone)]
pub struct AppState {
    /// Key-value store handle.
    pub store: StorePool,
    /// Execution queue that analysis jobs are handed to.
    pub job_queue: Arc<dyn JobQueue>,
    /// Server configuration (TTLs and job defaults are read per request).
    pub config: Arc<ServerConfig>,
}
