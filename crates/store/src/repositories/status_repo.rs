//! Processing-status tracker backed by the key-value store.
//!
//! Status is shared state: workers write child statuses, initiators ask for
//! reconciliation and retriggers, and any instance may serve either. Nothing
//! is cached in-process; every operation starts from a fresh read.
//!
//! Entity records are only ever replaced with compare-and-swap against the
//! exact value that was read, so two concurrent writers cannot silently
//! undo each other (e.g. a late "processing" overwriting "completed").

use futures::future::join_all;
use handoff_core::error::CoreError;
use handoff_core::job::validate_entity_id;
use handoff_core::keys;
use handoff_core::processing_status::{
    reconcile_parent, ChildCounts, ChildStatus, EntityStatus, ProcessingStatus,
};
use handoff_core::types::Generation;
use serde::Serialize;

use crate::kv::{decode_json, encode_json, get_json, set_json, KvStore};

/// Attempts at a compare-and-swap write before giving up with `Conflict`.
const MAX_SWAP_ATTEMPTS: usize = 8;

/// An entity together with a snapshot of its children.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityStatusView {
    #[serde(flatten)]
    pub entity: EntityStatus,
    pub children: Vec<ChildStatus>,
    pub child_counts: ChildCounts,
}

/// What a reconcile call observed and did.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileOutcome {
    pub updated: bool,
    pub previous_status: ProcessingStatus,
    pub new_status: ProcessingStatus,
    pub generation: Generation,
    pub child_counts: ChildCounts,
}

/// Result of a child status write.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChildUpdate {
    /// `false` when the write carried a superseded generation and was dropped.
    pub applied: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub child: Option<ChildStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reconcile: Option<ReconcileOutcome>,
}

/// Entity record as read, plus the raw value needed to swap it.
struct Snapshot {
    raw: Option<String>,
    record: Option<EntityStatus>,
}

impl Snapshot {
    fn record_or_new(&self, entity_id: &str) -> EntityStatus {
        self.record
            .clone()
            .unwrap_or_else(|| EntityStatus::new(entity_id))
    }
}

pub struct StatusRepo;

impl StatusRepo {
    pub async fn find(
        store: &dyn KvStore,
        entity_id: &str,
    ) -> Result<Option<EntityStatus>, CoreError> {
        validate_entity_id("entityId", entity_id)?;
        Ok(get_json(store, &keys::status(entity_id)).await?)
    }

    pub async fn get(store: &dyn KvStore, entity_id: &str) -> Result<EntityStatus, CoreError> {
        Self::find(store, entity_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Entity status", entity_id))
    }

    /// Generation the entity is currently on (0 if it has never been triggered).
    pub async fn current_generation(
        store: &dyn KvStore,
        entity_id: &str,
    ) -> Result<Generation, CoreError> {
        Ok(Self::find(store, entity_id)
            .await?
            .map_or(0, |record| record.generation))
    }

    /// Every child status currently recorded for `entity_id`, ordered by id.
    pub async fn children(
        store: &dyn KvStore,
        entity_id: &str,
    ) -> Result<Vec<ChildStatus>, CoreError> {
        validate_entity_id("entityId", entity_id)?;
        let child_ids = store.set_members(&keys::children(entity_id)).await?;

        let reads = child_ids.iter().map(|child_id| {
            let key = keys::child_status(entity_id, child_id);
            async move { get_json::<ChildStatus>(store, &key).await }
        });

        let mut children = Vec::with_capacity(child_ids.len());
        for child in join_all(reads).await {
            if let Some(child) = child? {
                children.push(child);
            }
        }
        Ok(children)
    }

    pub async fn get_with_children(
        store: &dyn KvStore,
        entity_id: &str,
    ) -> Result<EntityStatusView, CoreError> {
        let entity = Self::find(store, entity_id).await?;
        let children = Self::children(store, entity_id).await?;
        let entity = match entity {
            Some(entity) => entity,
            None if !children.is_empty() => EntityStatus::new(entity_id),
            None => return Err(CoreError::not_found("Entity status", entity_id)),
        };
        let child_counts = ChildCounts::tally(entity.generation, &children);
        Ok(EntityStatusView {
            entity,
            children,
            child_counts,
        })
    }

    /// Declare the children of an entity up front, each as `pending` in the
    /// current generation. Children that already have a record for this
    /// generation keep it. Declaring children first keeps a fast child from
    /// completing the parent before its siblings are known.
    pub async fn register_children(
        store: &dyn KvStore,
        entity_id: &str,
        child_ids: &[String],
    ) -> Result<EntityStatusView, CoreError> {
        validate_entity_id("entityId", entity_id)?;
        for child_id in child_ids {
            validate_entity_id("childId", child_id)?;
        }

        let parent = Self::ensure_exists(store, entity_id).await?;

        for child_id in child_ids {
            let key = keys::child_status(entity_id, child_id);
            let existing = get_json::<ChildStatus>(store, &key).await?;
            if existing.is_some_and(|child| child.generation >= parent.generation) {
                continue;
            }
            let child = ChildStatus {
                child_id: child_id.clone(),
                status: ProcessingStatus::Pending,
                generation: parent.generation,
                updated_at: chrono::Utc::now(),
            };
            set_json(store, &key, &child, None).await?;
            store.set_add(&keys::children(entity_id), child_id).await?;
        }

        tracing::info!(
            entity_id,
            child_count = child_ids.len(),
            generation = parent.generation,
            "Children registered",
        );

        Self::get_with_children(store, entity_id).await
    }

    /// Record one child's status, then reconcile the parent.
    ///
    /// A write stamped with a generation older than the parent's is dropped:
    /// it belongs to an attempt that a retrigger has since superseded. An
    /// unstamped write is attributed to the parent's current generation.
    pub async fn set_child_status(
        store: &dyn KvStore,
        entity_id: &str,
        child_id: &str,
        status: ProcessingStatus,
        generation: Option<Generation>,
    ) -> Result<ChildUpdate, CoreError> {
        validate_entity_id("entityId", entity_id)?;
        validate_entity_id("childId", child_id)?;

        let parent = Self::ensure_exists(store, entity_id).await?;

        if let Some(generation) = generation {
            if generation > parent.generation {
                return Err(CoreError::InvalidArgument(format!(
                    "generation {generation} of child {child_id} is ahead of {entity_id} (generation {})",
                    parent.generation
                )));
            }
            if generation < parent.generation {
                tracing::info!(
                    entity_id,
                    child_id,
                    update_generation = generation,
                    current_generation = parent.generation,
                    "Ignoring child update from superseded generation",
                );
                return Ok(ChildUpdate {
                    applied: false,
                    child: None,
                    reconcile: None,
                });
            }
        }

        let child = ChildStatus {
            child_id: child_id.to_string(),
            status,
            generation: generation.unwrap_or(parent.generation),
            updated_at: chrono::Utc::now(),
        };
        set_json(store, &keys::child_status(entity_id, child_id), &child, None).await?;
        store.set_add(&keys::children(entity_id), child_id).await?;

        tracing::debug!(
            entity_id,
            child_id,
            status = %child.status,
            generation = child.generation,
            "Child status recorded",
        );

        let reconcile = Self::reconcile(store, entity_id).await?;
        Ok(ChildUpdate {
            applied: true,
            child: Some(child),
            reconcile: Some(reconcile),
        })
    }

    /// Write the status of an entity that has no children.
    ///
    /// Entities with children have a derived status and are rejected with
    /// `Conflict`, as are transitions the state machine forbids (which keeps
    /// `completed` and `failed` sticky until a retrigger).
    pub async fn set_entity_status(
        store: &dyn KvStore,
        entity_id: &str,
        status: ProcessingStatus,
    ) -> Result<EntityStatus, CoreError> {
        validate_entity_id("entityId", entity_id)?;

        if !store.set_members(&keys::children(entity_id)).await?.is_empty() {
            return Err(CoreError::Conflict(format!(
                "Status of {entity_id} is derived from its children; use reconcile"
            )));
        }

        for _ in 0..MAX_SWAP_ATTEMPTS {
            let snapshot = Self::snapshot(store, entity_id).await?;
            let mut record = snapshot.record_or_new(entity_id);
            record.status.validate_transition(status)?;
            if record.status == status && snapshot.record.is_some() {
                return Ok(record);
            }

            let previous = record.status;
            record.transition(status, None);
            if Self::swap(store, entity_id, &snapshot, &record).await? {
                tracing::info!(entity_id, from = %previous, to = %status, "Entity status updated");
                return Ok(record);
            }
        }
        Err(Self::contended(entity_id))
    }

    /// Recompute the parent status from a fresh read of all its children.
    ///
    /// Safe under concurrent child updates: nothing is accumulated, every
    /// attempt sees the full current child set, and the write only lands if
    /// the parent record is still the one the decision was based on.
    /// Terminal parents are never moved.
    pub async fn reconcile(
        store: &dyn KvStore,
        entity_id: &str,
    ) -> Result<ReconcileOutcome, CoreError> {
        validate_entity_id("entityId", entity_id)?;

        for _ in 0..MAX_SWAP_ATTEMPTS {
            let snapshot = Self::snapshot(store, entity_id).await?;
            let children = Self::children(store, entity_id).await?;
            if snapshot.record.is_none() && children.is_empty() {
                return Err(CoreError::not_found("Entity status", entity_id));
            }

            let mut record = snapshot.record_or_new(entity_id);
            let previous_status = record.status;
            let decision = reconcile_parent(record.status, record.generation, &children);

            if !decision.changes(previous_status) {
                return Ok(ReconcileOutcome {
                    updated: false,
                    previous_status,
                    new_status: previous_status,
                    generation: record.generation,
                    child_counts: decision.counts,
                });
            }

            record.transition(decision.next, None);
            if Self::swap(store, entity_id, &snapshot, &record).await? {
                tracing::info!(
                    entity_id,
                    from = %previous_status,
                    to = %record.status,
                    generation = record.generation,
                    completed = decision.counts.completed,
                    total = decision.counts.total,
                    "Entity status reconciled",
                );
                return Ok(ReconcileOutcome {
                    updated: true,
                    previous_status,
                    new_status: record.status,
                    generation: record.generation,
                    child_counts: decision.counts,
                });
            }
            tracing::debug!(entity_id, "Entity changed during reconcile; re-reading");
        }
        Err(Self::contended(entity_id))
    }

    /// Start a new generation: `triggering`, failure and completion markers
    /// cleared, every known child back to `pending` on the new generation.
    /// The only way out of `failed` (or `completed`).
    pub async fn retrigger(
        store: &dyn KvStore,
        entity_id: &str,
    ) -> Result<EntityStatus, CoreError> {
        validate_entity_id("entityId", entity_id)?;

        let generation = store.increment(&keys::generation(entity_id)).await?;
        let generation = Generation::try_from(generation).map_err(|_| {
            CoreError::Internal(format!("generation counter of {entity_id} is negative"))
        })?;

        for _ in 0..MAX_SWAP_ATTEMPTS {
            let snapshot = Self::snapshot(store, entity_id).await?;
            let mut record = snapshot.record_or_new(entity_id);
            if record.generation > generation {
                // A concurrent retrigger already published a newer generation.
                return Ok(record);
            }

            let previous = record.status;
            record.retrigger(generation);
            if Self::swap(store, entity_id, &snapshot, &record).await? {
                let reset = Self::reset_children(store, entity_id, generation).await?;
                tracing::info!(
                    entity_id,
                    from = %previous,
                    generation,
                    children_reset = reset,
                    "Entity retriggered",
                );
                return Ok(record);
            }
        }
        Err(Self::contended(entity_id))
    }

    /// Record a synchronous failure for `generation`.
    ///
    /// Returns `None` without writing when the entity has already moved on to
    /// a newer generation.
    pub async fn mark_failed(
        store: &dyn KvStore,
        entity_id: &str,
        generation: Generation,
        reason: impl Into<String>,
    ) -> Result<Option<EntityStatus>, CoreError> {
        validate_entity_id("entityId", entity_id)?;
        let reason = reason.into();

        for _ in 0..MAX_SWAP_ATTEMPTS {
            let snapshot = Self::snapshot(store, entity_id).await?;
            let mut record = snapshot.record_or_new(entity_id);
            if record.generation != generation {
                tracing::warn!(
                    entity_id,
                    failed_generation = generation,
                    current_generation = record.generation,
                    "Not marking entity failed; generation superseded",
                );
                return Ok(None);
            }

            record.transition(ProcessingStatus::Failed, Some(reason.clone()));
            if Self::swap(store, entity_id, &snapshot, &record).await? {
                tracing::warn!(entity_id, generation, reason = %reason, "Entity marked failed");
                return Ok(Some(record));
            }
        }
        Err(Self::contended(entity_id))
    }

    // ---- private helpers ----

    async fn snapshot(store: &dyn KvStore, entity_id: &str) -> Result<Snapshot, CoreError> {
        let key = keys::status(entity_id);
        let raw = store.get(&key).await?;
        let record = raw
            .as_deref()
            .map(|raw| decode_json::<EntityStatus>(&key, raw))
            .transpose()?;
        Ok(Snapshot { raw, record })
    }

    /// Replace the record only if it still holds what `snapshot` read.
    async fn swap(
        store: &dyn KvStore,
        entity_id: &str,
        snapshot: &Snapshot,
        record: &EntityStatus,
    ) -> Result<bool, CoreError> {
        let key = keys::status(entity_id);
        let value = encode_json(&key, record)?;
        Ok(store
            .compare_and_swap(&key, snapshot.raw.as_deref(), &value)
            .await?)
    }

    /// Read the entity record, creating it as `pending` if absent.
    async fn ensure_exists(
        store: &dyn KvStore,
        entity_id: &str,
    ) -> Result<EntityStatus, CoreError> {
        for _ in 0..MAX_SWAP_ATTEMPTS {
            let snapshot = Self::snapshot(store, entity_id).await?;
            if let Some(record) = snapshot.record {
                return Ok(record);
            }
            let record = EntityStatus::new(entity_id);
            if Self::swap(store, entity_id, &snapshot, &record).await? {
                tracing::debug!(entity_id, "Entity status created");
                return Ok(record);
            }
        }
        Err(Self::contended(entity_id))
    }

    /// Move every indexed child still on an older generation to `pending` at
    /// `generation`. Each child is swapped against the value read, so a child
    /// that already reported for the new generation keeps its record.
    async fn reset_children(
        store: &dyn KvStore,
        entity_id: &str,
        generation: Generation,
    ) -> Result<usize, CoreError> {
        let child_ids = store.set_members(&keys::children(entity_id)).await?;
        let mut reset = 0;

        for child_id in &child_ids {
            let key = keys::child_status(entity_id, child_id);
            let mut swapped = false;
            for _ in 0..MAX_SWAP_ATTEMPTS {
                let raw = store.get(&key).await?;
                let current = raw
                    .as_deref()
                    .map(|raw| decode_json::<ChildStatus>(&key, raw))
                    .transpose()?;
                if current.is_some_and(|child| child.generation >= generation) {
                    swapped = true;
                    break;
                }
                let child = ChildStatus {
                    child_id: child_id.clone(),
                    status: ProcessingStatus::Pending,
                    generation,
                    updated_at: chrono::Utc::now(),
                };
                let value = encode_json(&key, &child)?;
                if store.compare_and_swap(&key, raw.as_deref(), &value).await? {
                    reset += 1;
                    swapped = true;
                    break;
                }
            }
            if !swapped {
                return Err(Self::contended(entity_id));
            }
        }
        Ok(reset)
    }

    fn contended(entity_id: &str) -> CoreError {
        CoreError::Conflict(format!(
            "Status of {entity_id} is changing too quickly; retry the request"
        ))
    }
}
