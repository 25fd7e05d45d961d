//! Analysis job requests handed to the external execution queue.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{Generation, Timestamp};

/// Job kind used when the caller does not name one.
pub const DEFAULT_JOB_KIND: &str = "analysis";

/// Strategy used when the caller does not name one.
pub const DEFAULT_JOB_STRATEGY: &str = "default";

/// Longest accepted kind or strategy identifier.
pub const MAX_IDENTIFIER_LEN: usize = 64;

/// Longest accepted entity or child id.
pub const MAX_ENTITY_ID_LEN: usize = 200;

/// A unit of work pushed to the execution queue. Fire-and-forget: only the
/// submission outcome is known synchronously.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisJobRequest {
    pub entity_id: String,
    pub kind: String,
    pub strategy: String,
    pub requested_at: Timestamp,
    /// Generation the worker must stamp on its acks and child updates.
    pub generation: Generation,
}

/// Validate an entity (or child) id: non-empty, no whitespace, no `:`.
pub fn validate_entity_id(field: &str, id: &str) -> Result<(), CoreError> {
    if id.is_empty() {
        return Err(CoreError::InvalidArgument(format!(
            "{field} must not be empty"
        )));
    }
    if id.len() > MAX_ENTITY_ID_LEN {
        return Err(CoreError::InvalidArgument(format!(
            "{field} must be at most {MAX_ENTITY_ID_LEN} characters"
        )));
    }
    if id.contains(char::is_whitespace) || id.contains(':') {
        return Err(CoreError::InvalidArgument(format!(
            "{field} '{id}' must not contain whitespace or ':'"
        )));
    }
    Ok(())
}

/// Validate a job kind or strategy: `[a-z0-9_-]{1,64}`.
pub fn validate_identifier(field: &str, value: &str) -> Result<(), CoreError> {
    if value.is_empty() || value.len() > MAX_IDENTIFIER_LEN {
        return Err(CoreError::InvalidArgument(format!(
            "{field} must be 1-{MAX_IDENTIFIER_LEN} characters"
        )));
    }
    let valid = value
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-');
    if !valid {
        return Err(CoreError::InvalidArgument(format!(
            "{field} '{value}' may only contain lowercase letters, digits, '_' and '-'"
        )));
    }
    Ok(())
}
