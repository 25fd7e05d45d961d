//! Logical key namespace shared by every component that touches the store.
//!
//! ```text
//! ack:{correlation_id}:{step}            acknowledgment (ack TTL)
//! draft:{slug}                           draft record (draft TTL)
//! pendingQueue                           ordered list of pending slugs
//! jobQueue                               submitted analysis jobs (store-backed queue)
//! status:{entity_id}                     entity status record
//! status:{entity_id}:child:{child_id}    child status record
//! status:{entity_id}:children            set of child ids
//! status:{entity_id}:generation          trigger generation counter
//! ```

/// List key holding slugs awaiting consumption.
pub const PENDING_QUEUE: &str = "pendingQueue";

/// List key used by the store-backed job queue.
pub const JOB_QUEUE: &str = "jobQueue";

const ACK_PREFIX: &str = "ack:";

pub fn ack(correlation_id: &str, step: &str) -> String {
    format!("{ACK_PREFIX}{correlation_id}:{step}")
}

/// Glob pattern matching every ack recorded for one correlation id.
pub fn ack_pattern(correlation_id: &str) -> String {
    format!("{ACK_PREFIX}{correlation_id}:*")
}

/// Recover the step from a key produced by [`ack`].
pub fn step_from_ack_key<'a>(correlation_id: &str, key: &'a str) -> Option<&'a str> {
    key.strip_prefix(ACK_PREFIX)?
        .strip_prefix(correlation_id)?
        .strip_prefix(':')
}

pub fn draft(slug: &str) -> String {
    format!("draft:{slug}")
}

pub fn status(entity_id: &str) -> String {
    format!("status:{entity_id}")
}

pub fn child_status(entity_id: &str, child_id: &str) -> String {
    format!("status:{entity_id}:child:{child_id}")
}

pub fn children(entity_id: &str) -> String {
    format!("status:{entity_id}:children")
}

pub fn generation(entity_id: &str) -> String {
    format!("status:{entity_id}:generation")
}
