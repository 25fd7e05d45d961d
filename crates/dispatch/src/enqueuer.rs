//! Job submission with status mirroring.

use handoff_core::error::CoreError;
use handoff_core::job::{validate_entity_id, validate_identifier, AnalysisJobRequest};
use handoff_store::repositories::StatusRepo;
use handoff_store::KvStore;

use crate::queue::JobQueue;

pub struct JobEnqueuer;

impl JobEnqueuer {
    /// Open a new generation for `entity_id` and hand the job to `queue`.
    ///
    /// The entity is `triggering` before the push. If the queue refuses the
    /// job, the entity is marked `failed` for that generation and the call
    /// fails with [`CoreError::UpstreamSubmissionFailed`] (or
    /// [`CoreError::StoreUnavailable`] when a store-backed queue is down). Success only means
    /// the queue accepted the request; the job itself runs elsewhere.
    pub async fn submit(
        store: &dyn KvStore,
        queue: &dyn JobQueue,
        entity_id: &str,
        kind: &str,
        strategy: &str,
    ) -> Result<AnalysisJobRequest, CoreError> {
        validate_entity_id("entityId", entity_id)?;
        validate_identifier("kind", kind)?;
        validate_identifier("strategy", strategy)?;

        let record = StatusRepo::retrigger(store, entity_id).await?;
        let request = AnalysisJobRequest {
            entity_id: entity_id.to_string(),
            kind: kind.to_string(),
            strategy: strategy.to_string(),
            requested_at: chrono::Utc::now(),
            generation: record.generation,
        };

        if let Err(err) = queue.push(&request).await {
            tracing::error!(
                entity_id,
                generation = request.generation,
                queue = queue.name(),
                error = %err,
                "Job submission rejected",
            );
            let reason = err.to_string();
            if let Err(mark_err) =
                StatusRepo::mark_failed(store, entity_id, request.generation, reason).await
            {
                tracing::error!(entity_id, error = %mark_err, "Failed to record submission failure");
            }
            return Err(err.into());
        }

        tracing::info!(
            entity_id,
            kind,
            strategy,
            generation = request.generation,
            queue = queue.name(),
            "Job submitted",
        );
        Ok(request)
    }
}
