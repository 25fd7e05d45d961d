use std::time::Duration;

use handoff_core::error::CoreError;

/// Failures of the key-value store collaborator.
///
/// Nothing in this crate retries: every error reaches the caller, which owns
/// the retry policy.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The backing connection could not be established or was lost.
    #[error("store connection failed: {0}")]
    Unavailable(String),

    /// An operation did not complete within the configured bound.
    #[error("store operation {op} timed out after {after:?}")]
    Timeout { op: &'static str, after: Duration },

    /// The store rejected a command (e.g. wrong value type under a key).
    #[error("store command {op} failed: {message}")]
    Command { op: &'static str, message: String },

    /// A stored value could not be encoded or decoded.
    #[error("stored value for {key} is not valid JSON: {source}")]
    Serialization {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

pub type StoreResult<T> = Result<T, StoreError>;

impl From<StoreError> for CoreError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Serialization { .. } => CoreError::Internal(err.to_string()),
            other => CoreError::StoreUnavailable(other.to_string()),
        }
    }
}
