//! Acknowledgment records posted by workers when a named step finishes.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{Generation, Timestamp};

/// Default acknowledgment lifetime. Workers have been observed acking within
/// 60s; the extra minute is margin for slow steps and slow pollers.
pub const DEFAULT_ACK_TTL_SECS: u64 = 120;

/// Free-form output of a step (urls, ids, counts...).
pub type Artifacts = serde_json::Map<String, serde_json::Value>;

/// Short-lived rendezvous record keyed by `(correlation_id, step)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Acknowledgment {
    pub correlation_id: String,
    /// Normalized (trimmed, lowercase) step name.
    pub step: String,
    #[serde(default)]
    pub artifacts: Artifacts,
    pub recorded_at: Timestamp,
    /// Trigger generation the worker was serving, when it knows it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generation: Option<Generation>,
}

/// Normalize a step name so lookups are case-insensitive.
pub fn normalize_step(step: &str) -> Result<String, CoreError> {
    let normalized = step.trim().to_lowercase();
    if normalized.is_empty() {
        return Err(CoreError::InvalidArgument(
            "step must not be empty".to_string(),
        ));
    }
    if normalized.contains(char::is_whitespace) || normalized.contains(':') {
        return Err(CoreError::InvalidArgument(format!(
            "step '{normalized}' must not contain whitespace or ':'"
        )));
    }
    Ok(normalized)
}

/// Outcome of polling for an ack on behalf of a specific entity.
#[derive(Debug, Clone, PartialEq)]
pub enum AckPoll {
    /// No ack yet, or it already expired. Not a failure.
    Pending,
    /// The ack belongs to the entity's current generation (or carries none).
    Found(Acknowledgment),
    /// The ack was produced for a generation that has since been superseded.
    Stale(Acknowledgment),
}

impl AckPoll {
    /// Classify an ack against the entity's current generation.
    pub fn classify(ack: Option<Acknowledgment>, current: Generation) -> Self {
        match ack {
            None => Self::Pending,
            Some(ack) => match ack.generation {
                Some(generation) if generation < current => Self::Stale(ack),
                _ => Self::Found(ack),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use chrono::Utc;

    use super::*;

    fn ack_with_generation(generation: Option<Generation>) -> Acknowledgment {
        Acknowledgment {
            correlation_id: "c1".into(),
            step: "resize".into(),
            artifacts: Artifacts::new(),
            recorded_at: Utc::now(),
            generation,
        }
    }

    #[test]
    fn step_is_lowercased_and_trimmed() {
        assert_eq!(normalize_step("  RESIZE ").unwrap(), "resize");
        assert_eq!(normalize_step("Keyframe_Labels").unwrap(), "keyframe_labels");
    }

    #[test]
    fn empty_step_rejected() {
        assert_matches!(normalize_step(""), Err(CoreError::InvalidArgument(_)));
        assert_matches!(normalize_step("  \t"), Err(CoreError::InvalidArgument(_)));
    }

    #[test]
    fn step_with_separator_rejected() {
        assert_matches!(normalize_step("a:b"), Err(CoreError::InvalidArgument(_)));
        assert_matches!(normalize_step("a b"), Err(CoreError::InvalidArgument(_)));
    }

    #[test]
    fn classify_absent_is_pending() {
        assert_eq!(AckPoll::classify(None, 3), AckPoll::Pending);
    }

    #[test]
    fn classify_without_generation_is_found() {
        assert_matches!(AckPoll::classify(Some(ack_with_generation(None)), 3), AckPoll::Found(_));
    }

    #[test]
    fn classify_current_generation_is_found() {
        assert_matches!(
            AckPoll::classify(Some(ack_with_generation(Some(3))), 3),
            AckPoll::Found(_)
        );
    }

    #[test]
    fn classify_older_generation_is_stale() {
        assert_matches!(
            AckPoll::classify(Some(ack_with_generation(Some(2))), 3),
            AckPoll::Stale(_)
        );
    }

    #[test]
    fn ack_serializes_camel_case() {
        let json = serde_json::to_value(ack_with_generation(None)).unwrap();
        assert_eq!(json["correlationId"], "c1");
        assert!(json.get("recordedAt").is_some());
        assert!(json.get("generation").is_none());
    }
}
