//! Draft queue: a deduplicated FIFO of slugs, each backed by a draft record
//! with its own TTL.
//!
//! The queue holds every slug at most once. Re-submitting a slug overwrites
//! its record and moves it to the tail in a single atomic store operation,
//! so the queue always reads "oldest distinct request first".

use std::time::Duration;

use chrono::Utc;
use handoff_core::draft::{validate_slug, DraftFlags, DraftRecord};
use handoff_core::error::CoreError;
use handoff_core::keys;
use handoff_core::types::Timestamp;

use crate::kv::{get_json, set_json, KvStore};

/// Maximum number of slugs returned by [`DraftRepo::peek_pending`].
pub const MAX_PEEK: usize = 100;

pub struct DraftRepo;

impl DraftRepo {
    /// Store the latest payload for `slug` and place the slug at the queue tail.
    ///
    /// Returns the queue length after the append. If the record write fails
    /// the queue is left untouched; if the queue write fails the error is
    /// returned even though the record was stored, so the caller can retry
    /// the whole submission.
    pub async fn enqueue(
        store: &dyn KvStore,
        slug: &str,
        payload: serde_json::Value,
        flags: DraftFlags,
        ttl: Duration,
    ) -> Result<u64, CoreError> {
        let slug = validate_slug(slug)?;

        let record = DraftRecord {
            slug: slug.to_string(),
            payload,
            flags,
            updated_at: Utc::now(),
        };
        set_json(store, &keys::draft(slug), &record, Some(ttl)).await?;

        let queue_length = store.list_move_to_tail(keys::PENDING_QUEUE, slug).await?;

        tracing::info!(slug, queue_length, "Draft enqueued");
        Ok(queue_length)
    }

    /// Pop the oldest pending slug. The caller reads the record with
    /// [`find`](Self::find) and clears it once consumed.
    pub async fn dequeue_next(store: &dyn KvStore) -> Result<Option<String>, CoreError> {
        let slug = store.list_pop_front(keys::PENDING_QUEUE).await?;
        tracing::debug!(slug = ?slug, "Draft dequeued");
        Ok(slug)
    }

    pub async fn find(store: &dyn KvStore, slug: &str) -> Result<Option<DraftRecord>, CoreError> {
        let slug = validate_slug(slug)?;
        Ok(get_json(store, &keys::draft(slug)).await?)
    }

    /// Pop slugs until one still has a live record and return that record.
    ///
    /// Slugs whose record already expired are void and skipped. The record
    /// itself is left in place for the consumer to [`clear`](Self::clear).
    pub async fn claim_next(store: &dyn KvStore) -> Result<Option<DraftRecord>, CoreError> {
        while let Some(slug) = Self::dequeue_next(store).await? {
            match get_json::<DraftRecord>(store, &keys::draft(&slug)).await? {
                Some(record) => {
                    tracing::info!(slug = %record.slug, "Draft claimed");
                    return Ok(Some(record));
                }
                None => {
                    tracing::debug!(slug = %slug, "Skipping void slug whose draft expired");
                }
            }
        }
        Ok(None)
    }

    /// Remove the record for `slug` after it has been consumed.
    ///
    /// With `consumed_version` set, the record is only removed if its
    /// `updated_at` still matches, so a newer submission that arrived while
    /// the consumer was working survives. Returns whether a record was removed.
    pub async fn clear(
        store: &dyn KvStore,
        slug: &str,
        consumed_version: Option<Timestamp>,
    ) -> Result<bool, CoreError> {
        let slug = validate_slug(slug)?;
        let key = keys::draft(slug);

        if let Some(version) = consumed_version {
            match get_json::<DraftRecord>(store, &key).await? {
                Some(record) if record.updated_at != version => {
                    tracing::info!(slug, "Draft was resubmitted during consumption; keeping newer record");
                    return Ok(false);
                }
                None => return Ok(false),
                Some(_) => {}
            }
        }

        let removed = store.remove(&key).await?;
        tracing::debug!(slug, removed, "Draft cleared");
        Ok(removed)
    }

    /// Up to `n` slugs from the head of the queue, without consuming them.
    pub async fn peek_pending(store: &dyn KvStore, n: usize) -> Result<Vec<String>, CoreError> {
        let n = n.min(MAX_PEEK);
        if n == 0 {
            return Ok(Vec::new());
        }
        Ok(store
            .list_range(keys::PENDING_QUEUE, 0, n as i64 - 1)
            .await?)
    }

    pub async fn queue_length(store: &dyn KvStore) -> Result<u64, CoreError> {
        Ok(store.list_length(keys::PENDING_QUEUE).await?)
    }
}
