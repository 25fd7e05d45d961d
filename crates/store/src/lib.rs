//! Ephemeral key-value store adapter and the repositories built on it.
//!
//! [`KvStore`] is the capability every coordination component depends on.
//! Two backends implement it: [`RedisStore`] for shared deployments and
//! [`MemoryStore`] for single-process development and tests.

pub mod error;
pub mod health;
pub mod kv;
pub mod memory;
pub mod redis_store;
pub mod repositories;

use std::sync::Arc;
use std::time::Duration;

pub use error::{StoreError, StoreResult};
pub use health::{health_check, HealthState, StoreHealth};
pub use kv::KvStore;
pub use memory::MemoryStore;
pub use redis_store::RedisStore;

/// Shared handle to whichever backend the process was configured with.
pub type StorePool = Arc<dyn KvStore>;

/// URL scheme selecting the in-process backend.
pub const MEMORY_URL: &str = "memory://";

/// Connect to the store named by `url`.
///
/// `memory://` yields a fresh [`MemoryStore`]; anything else is handed to
/// the Redis client. `op_timeout` bounds connection setup and every later
/// operation.
pub async fn connect(url: &str, op_timeout: Duration) -> StoreResult<StorePool> {
    if url.starts_with(MEMORY_URL) {
        tracing::warn!("Using in-process memory store; state is not shared across instances");
        return Ok(Arc::new(MemoryStore::new()));
    }
    let store = RedisStore::connect(url, op_timeout).await?;
    Ok(Arc::new(store))
}
