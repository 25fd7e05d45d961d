//! The key-value capability the coordination layer is written against.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{StoreError, StoreResult};

/// Generic get/set/list/set-membership store with per-key TTL.
///
/// List indices follow Redis `LRANGE` semantics: both ends inclusive,
/// negative values count from the tail (`-1` is the last element).
#[async_trait]
pub trait KvStore: Send + Sync + fmt::Debug {
    /// Write `value` under `key`, replacing any previous value and TTL.
    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> StoreResult<()>;

    async fn get(&self, key: &str) -> StoreResult<Option<String>>;

    /// Delete `key`. Returns whether it existed.
    async fn remove(&self, key: &str) -> StoreResult<bool>;

    /// Append to the tail of a list. Returns the new length.
    async fn list_append(&self, key: &str, value: &str) -> StoreResult<u64>;

    /// Remove every occurrence of `value`. Returns how many were removed.
    async fn list_remove_value(&self, key: &str, value: &str) -> StoreResult<u64>;

    /// Remove every occurrence of `value` and append it, as one indivisible
    /// step. Returns the new length.
    async fn list_move_to_tail(&self, key: &str, value: &str) -> StoreResult<u64>;

    async fn list_pop_front(&self, key: &str) -> StoreResult<Option<String>>;

    async fn list_range(&self, key: &str, start: i64, stop: i64) -> StoreResult<Vec<String>>;

    async fn list_length(&self, key: &str) -> StoreResult<u64>;

    /// Write `value` only if the key currently holds `expected` (`None`:
    /// the key must be absent). Check and write are one atomic step.
    /// Returns whether the write happened. The key is left without a TTL.
    async fn compare_and_swap(
        &self,
        key: &str,
        expected: Option<&str>,
        value: &str,
    ) -> StoreResult<bool>;

    /// Atomically add one to an integer key (absent counts as 0).
    async fn increment(&self, key: &str) -> StoreResult<i64>;

    /// Add a member to a set. Returns whether it was newly added.
    async fn set_add(&self, key: &str, member: &str) -> StoreResult<bool>;

    async fn set_members(&self, key: &str) -> StoreResult<Vec<String>>;

    /// Glob match over key names (`*`, `?`). Diagnostic use only: cost is
    /// proportional to the whole keyspace.
    async fn keys_matching(&self, pattern: &str) -> StoreResult<Vec<String>>;

    /// One round trip to the backend.
    async fn ping(&self) -> StoreResult<()>;
}

pub fn decode_json<T: DeserializeOwned>(key: &str, raw: &str) -> StoreResult<T> {
    serde_json::from_str(raw).map_err(|source| StoreError::Serialization {
        key: key.to_string(),
        source,
    })
}

pub fn encode_json<T: Serialize>(key: &str, value: &T) -> StoreResult<String> {
    serde_json::to_string(value).map_err(|source| StoreError::Serialization {
        key: key.to_string(),
        source,
    })
}

/// Read and decode a JSON value.
pub async fn get_json<T: DeserializeOwned>(
    store: &dyn KvStore,
    key: &str,
) -> StoreResult<Option<T>> {
    match store.get(key).await? {
        Some(raw) => decode_json(key, &raw).map(Some),
        None => Ok(None),
    }
}

/// Encode and write a JSON value.
pub async fn set_json<T: Serialize>(
    store: &dyn KvStore,
    key: &str,
    value: &T,
    ttl: Option<Duration>,
) -> StoreResult<()> {
    let raw = encode_json(key, value)?;
    store.set(key, &raw, ttl).await
}
