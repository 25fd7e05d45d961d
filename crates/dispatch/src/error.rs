use handoff_core::error::CoreError;
use handoff_store::StoreError;

/// Errors from handing a job to the execution queue.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The queue endpoint answered with a non-2xx status.
    #[error("job queue rejected request ({status}): {body}")]
    Rejected {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// The store-backed queue could not be written.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<DispatchError> for CoreError {
    fn from(err: DispatchError) -> Self {
        match err {
            DispatchError::Store(err) => CoreError::from(err),
            other => CoreError::UpstreamSubmissionFailed(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn queue_failures_are_upstream_failures() {
        let err = DispatchError::Rejected {
            status: 503,
            body: "queue full".into(),
        };
        assert_matches!(
            CoreError::from(err),
            CoreError::UpstreamSubmissionFailed(msg) if msg.contains("503") && msg.contains("queue full")
        );

    }

    #[test]
    fn store_failures_keep_their_own_kind() {
        let err = DispatchError::Store(StoreError::Unavailable("refused".into()));
        assert_matches!(
            CoreError::from(err),
            CoreError::StoreUnavailable(msg) if msg.contains("refused")
        );
    }
}
