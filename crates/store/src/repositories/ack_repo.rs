//! Acknowledgment registry: one completion record per `(correlation_id, step)`.
//!
//! Acks are a best-effort rendezvous, not a log. Once the TTL elapses the
//! record is gone and a poll reports it as absent; callers that need durable
//! history persist the artifacts themselves when they observe the ack.

use std::time::Duration;

use chrono::Utc;
use handoff_core::ack::{normalize_step, AckPoll, Acknowledgment, Artifacts};
use handoff_core::correlation::validate_correlation_id;
use handoff_core::error::CoreError;
use handoff_core::keys;
use handoff_core::types::Generation;

use crate::kv::{get_json, set_json, KvStore};
use crate::repositories::StatusRepo;

pub struct AckRepo;

impl AckRepo {
    /// Record (or overwrite) the ack for a step. Re-recording the same ack is
    /// harmless, so workers may deliver at least once.
    pub async fn record(
        store: &dyn KvStore,
        correlation_id: &str,
        step: &str,
        artifacts: Artifacts,
        generation: Option<Generation>,
        ttl: Duration,
    ) -> Result<Acknowledgment, CoreError> {
        validate_correlation_id(correlation_id)?;
        let step = normalize_step(step)?;

        let ack = Acknowledgment {
            correlation_id: correlation_id.to_string(),
            step,
            artifacts,
            recorded_at: Utc::now(),
            generation,
        };

        set_json(
            store,
            &keys::ack(&ack.correlation_id, &ack.step),
            &ack,
            Some(ttl),
        )
        .await?;

        tracing::info!(
            correlation_id = %ack.correlation_id,
            step = %ack.step,
            generation = ?ack.generation,
            artifact_count = ack.artifacts.len(),
            "Acknowledgment recorded",
        );

        Ok(ack)
    }

    /// Read the ack for a step. `None` means "not done yet, or expired".
    pub async fn poll(
        store: &dyn KvStore,
        correlation_id: &str,
        step: &str,
    ) -> Result<Option<Acknowledgment>, CoreError> {
        validate_correlation_id(correlation_id)?;
        let step = normalize_step(step)?;
        let ack = get_json(store, &keys::ack(correlation_id, &step)).await?;
        tracing::debug!(correlation_id, step = %step, found = ack.is_some(), "Acknowledgment polled");
        Ok(ack)
    }

    /// Poll on behalf of an entity, flagging acks from a superseded generation.
    pub async fn poll_for_entity(
        store: &dyn KvStore,
        correlation_id: &str,
        step: &str,
        entity_id: &str,
    ) -> Result<AckPoll, CoreError> {
        let ack = Self::poll(store, correlation_id, step).await?;
        if ack.is_none() {
            return Ok(AckPoll::Pending);
        }
        let current = StatusRepo::current_generation(store, entity_id).await?;
        let outcome = AckPoll::classify(ack, current);
        if let AckPoll::Stale(ack) = &outcome {
            tracing::info!(
                correlation_id,
                entity_id,
                ack_generation = ?ack.generation,
                current_generation = current,
                "Ignoring acknowledgment from superseded generation",
            );
        }
        Ok(outcome)
    }

    /// Steps acknowledged so far for a correlation id. Scans the keyspace, so
    /// it is meant for diagnostics rather than polling loops.
    pub async fn list_steps(
        store: &dyn KvStore,
        correlation_id: &str,
    ) -> Result<Vec<String>, CoreError> {
        validate_correlation_id(correlation_id)?;
        let keys = store
            .keys_matching(&keys::ack_pattern(correlation_id))
            .await?;
        Ok(keys
            .iter()
            .filter_map(|key| keys::step_from_ack_key(correlation_id, key))
            .map(str::to_string)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use serde_json::json;

    use super::*;
    use crate::memory::MemoryStore;

    const TTL: Duration = Duration::from_secs(60);

    fn artifacts(value: serde_json::Value) -> Artifacts {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn record_then_poll_returns_artifacts() {
        let store = MemoryStore::new();
        AckRepo::record(&store, "c1", "resize", artifacts(json!({"url": "x"})), None, TTL)
            .await
            .unwrap();

        let ack = AckRepo::poll(&store, "c1", "resize").await.unwrap().unwrap();
        assert_eq!(ack.artifacts["url"], "x");
        assert_eq!(ack.step, "resize");
    }

    #[tokio::test]
    async fn step_matching_is_case_insensitive() {
        let store = MemoryStore::new();
        AckRepo::record(&store, "c1", "resize", artifacts(json!({"url": "x"})), None, TTL)
            .await
            .unwrap();

        let ack = AckRepo::poll(&store, "c1", "RESIZE").await.unwrap();
        assert_eq!(ack.unwrap().artifacts["url"], "x");
    }

    #[tokio::test]
    async fn correlation_id_matching_is_exact() {
        let store = MemoryStore::new();
        AckRepo::record(&store, "c1", "resize", Artifacts::new(), None, TTL)
            .await
            .unwrap();

        assert!(AckRepo::poll(&store, "C1", "resize").await.unwrap().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn ack_expires_after_ttl() {
        let store = MemoryStore::new();
        AckRepo::record(&store, "c1", "resize", Artifacts::new(), None, TTL)
            .await
            .unwrap();

        tokio::time::advance(TTL - Duration::from_secs(1)).await;
        assert!(AckRepo::poll(&store, "c1", "resize").await.unwrap().is_some());

        tokio::time::advance(Duration::from_secs(2)).await;
        assert!(AckRepo::poll(&store, "c1", "resize").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn second_ack_overwrites_first() {
        let store = MemoryStore::new();
        AckRepo::record(&store, "c1", "label", artifacts(json!({"v": 1})), None, TTL)
            .await
            .unwrap();
        AckRepo::record(&store, "c1", "LABEL", artifacts(json!({"v": 2})), None, TTL)
            .await
            .unwrap();

        let ack = AckRepo::poll(&store, "c1", "label").await.unwrap().unwrap();
        assert_eq!(ack.artifacts["v"], 2);
    }

    #[tokio::test]
    async fn empty_inputs_are_invalid() {
        let store = MemoryStore::new();
        assert_matches!(
            AckRepo::record(&store, "", "resize", Artifacts::new(), None, TTL).await,
            Err(CoreError::InvalidArgument(_))
        );
        assert_matches!(
            AckRepo::record(&store, "c1", " ", Artifacts::new(), None, TTL).await,
            Err(CoreError::InvalidArgument(_))
        );
        assert_matches!(
            AckRepo::poll(&store, "", "resize").await,
            Err(CoreError::InvalidArgument(_))
        );
    }

    #[tokio::test]
    async fn correlation_id_with_key_separator_is_invalid() {
        let store = MemoryStore::new();
        assert_matches!(
            AckRepo::record(&store, "c1:resize", "resize", Artifacts::new(), None, TTL).await,
            Err(CoreError::InvalidArgument(_))
        );
        assert!(store.keys_matching("ack:*").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn store_outage_is_surfaced() {
        let store = MemoryStore::new();
        store.set_available(false);
        assert_matches!(
            AckRepo::record(&store, "c1", "resize", Artifacts::new(), None, TTL).await,
            Err(CoreError::StoreUnavailable(_))
        );
        assert_matches!(
            AckRepo::poll(&store, "c1", "resize").await,
            Err(CoreError::StoreUnavailable(_))
        );
    }

    #[tokio::test]
    async fn stale_generation_ack_is_flagged() {
        let store = MemoryStore::new();
        StatusRepo::retrigger(&store, "e1").await.unwrap();
        AckRepo::record(&store, "c1", "label", Artifacts::new(), Some(1), TTL)
            .await
            .unwrap();
        assert_matches!(
            AckRepo::poll_for_entity(&store, "c1", "label", "e1").await,
            Ok(AckPoll::Found(_))
        );

        StatusRepo::retrigger(&store, "e1").await.unwrap();
        assert_matches!(
            AckRepo::poll_for_entity(&store, "c1", "label", "e1").await,
            Ok(AckPoll::Stale(_))
        );
    }

    #[tokio::test]
    async fn poll_for_entity_without_ack_is_pending() {
        let store = MemoryStore::new();
        assert_eq!(
            AckRepo::poll_for_entity(&store, "c1", "label", "e1").await.unwrap(),
            AckPoll::Pending
        );
    }

    #[tokio::test]
    async fn list_steps_for_correlation() {
        let store = MemoryStore::new();
        for step in ["resize", "Label"] {
            AckRepo::record(&store, "c1", step, Artifacts::new(), None, TTL)
                .await
                .unwrap();
        }
        AckRepo::record(&store, "c2", "other", Artifacts::new(), None, TTL)
            .await
            .unwrap();

        let steps = AckRepo::list_steps(&store, "c1").await.unwrap();
        assert_eq!(steps, vec!["label", "resize"]);
    }
}
