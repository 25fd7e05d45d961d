//! Store health probe.

use std::time::Instant;

use serde::Serialize;

use crate::kv::KvStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthState {
    Healthy,
    Unhealthy,
}

/// Result of one round trip to the store. Exactly one of `latency_ms` and
/// `error` is set.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreHealth {
    pub status: HealthState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StoreHealth {
    pub fn is_healthy(&self) -> bool {
        self.status == HealthState::Healthy
    }
}

/// Ping the store once. Never fails: an unreachable store yields an
/// `unhealthy` result carrying the error text.
pub async fn health_check(store: &dyn KvStore) -> StoreHealth {
    let started = Instant::now();
    match store.ping().await {
        Ok(()) => StoreHealth {
            status: HealthState::Healthy,
            latency_ms: Some(started.elapsed().as_millis() as u64),
            error: None,
        },
        Err(err) => {
            tracing::warn!(error = %err, "Store health check failed");
            StoreHealth {
                status: HealthState::Unhealthy,
                latency_ms: None,
                error: Some(err.to_string()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;

    #[tokio::test]
    async fn reachable_store_is_healthy() {
        let store = MemoryStore::new();
        let health = health_check(&store).await;
        assert!(health.is_healthy());
        assert!(health.latency_ms.is_some());
        assert!(health.error.is_none());
    }

    #[tokio::test]
    async fn unreachable_store_is_unhealthy_not_an_error() {
        let store = MemoryStore::new();
        store.set_available(false);
        let health = health_check(&store).await;
        assert_eq!(health.status, HealthState::Unhealthy);
        assert!(health.latency_ms.is_none());
        assert!(health.error.unwrap().contains("unavailable"));
    }

    #[test]
    fn serializes_camel_case() {
        let health = StoreHealth {
            status: HealthState::Healthy,
            latency_ms: Some(3),
            error: None,
        };
        let json = serde_json::to_value(&health).unwrap();
        assert_eq!(json["status"], "healthy");
        assert_eq!(json["latencyMs"], 3);
        assert!(json.get("error").is_none());
    }
}
