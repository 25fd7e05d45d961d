use async_trait::async_trait;
use handoff_core::job::AnalysisJobRequest;
use handoff_core::keys;
use handoff_store::kv::encode_json;
use handoff_store::StorePool;

use crate::error::DispatchError;

/// An external execution queue that accepts analysis jobs.
///
/// `push` returns once the queue has accepted (or refused) the request; it
/// never waits for the job itself.
#[async_trait]
pub trait JobQueue: Send + Sync {
    async fn push(&self, request: &AnalysisJobRequest) -> Result<(), DispatchError>;

    /// Short backend name for logs.
    fn name(&self) -> &'static str;
}

/// Appends JSON requests to the `jobQueue` list in the key-value store.
/// Workers consume from the head.
pub struct StoreJobQueue {
    store: StorePool,
}

impl StoreJobQueue {
    pub fn new(store: StorePool) -> Self {
        Self { store }
    }
}

#[async_trait]
impl JobQueue for StoreJobQueue {
    async fn push(&self, request: &AnalysisJobRequest) -> Result<(), DispatchError> {
        let raw = encode_json(keys::JOB_QUEUE, request)?;
        let length = self.store.list_append(keys::JOB_QUEUE, &raw).await?;
        tracing::debug!(entity_id = %request.entity_id, queue_length = length, "Job appended");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "store"
    }
}
