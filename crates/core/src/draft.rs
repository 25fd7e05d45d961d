//! Draft records: named, overwritable work items awaiting consumption.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::Timestamp;

/// Default draft lifetime (24 hours).
pub const DEFAULT_DRAFT_TTL_SECS: u64 = 24 * 60 * 60;

/// Longest accepted slug.
pub const MAX_SLUG_LEN: usize = 200;

/// Options that travel with a draft to the worker.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftFlags {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scribe_enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
    /// Any other flag the caller sends is kept verbatim.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// The latest submission for a slug.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftRecord {
    pub slug: String,
    pub payload: serde_json::Value,
    #[serde(default)]
    pub flags: DraftFlags,
    pub updated_at: Timestamp,
}

/// Validate a caller-supplied slug and return its trimmed form.
pub fn validate_slug(slug: &str) -> Result<&str, CoreError> {
    let slug = slug.trim();
    if slug.is_empty() {
        return Err(CoreError::InvalidArgument(
            "slug must not be empty".to_string(),
        ));
    }
    if slug.len() > MAX_SLUG_LEN {
        return Err(CoreError::InvalidArgument(format!(
            "slug must be at most {MAX_SLUG_LEN} characters"
        )));
    }
    if slug.contains(char::is_whitespace) {
        return Err(CoreError::InvalidArgument(format!(
            "slug '{slug}' must not contain whitespace"
        )));
    }
    Ok(slug)
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn slug_trimmed() {
        assert_eq!(validate_slug("  my-post ").unwrap(), "my-post");
    }

    #[test]
    fn empty_slug_rejected() {
        assert_matches!(validate_slug(""), Err(CoreError::InvalidArgument(_)));
        assert_matches!(validate_slug("   "), Err(CoreError::InvalidArgument(_)));
    }

    #[test]
    fn slug_with_inner_space_rejected() {
        assert_matches!(validate_slug("my post"), Err(CoreError::InvalidArgument(_)));
    }

    #[test]
    fn overlong_slug_rejected() {
        let slug = "a".repeat(MAX_SLUG_LEN + 1);
        assert_matches!(validate_slug(&slug), Err(CoreError::InvalidArgument(_)));
        assert!(validate_slug(&"a".repeat(MAX_SLUG_LEN)).is_ok());
    }

    #[test]
    fn unknown_flags_round_trip() {
        let flags: DraftFlags = serde_json::from_value(serde_json::json!({
            "scribeEnabled": true,
            "conversationId": "conv-9",
            "tone": "casual"
        }))
        .unwrap();

        assert_eq!(flags.scribe_enabled, Some(true));
        assert_eq!(flags.conversation_id.as_deref(), Some("conv-9"));
        assert_eq!(flags.extra["tone"], "casual");

        let back = serde_json::to_value(&flags).unwrap();
        assert_eq!(back["tone"], "casual");
    }
}
