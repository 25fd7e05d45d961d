//! Correlation id generation.
//!
//! Ids are UUIDv7: a millisecond timestamp prefix followed by random bits.
//! Collisions only cause acknowledgment cross-talk inside one ack window, so
//! generation entropy is the only uniqueness guarantee.

use uuid::Uuid;

use crate::error::CoreError;

/// Generate a fresh correlation id.
pub fn generate_correlation_id() -> String {
    Uuid::now_v7().to_string()
}

/// Reject empty correlation ids and ids that could not be embedded in a key
/// segment (whitespace, `:`). Matching is exact, so no normalization happens.
pub fn validate_correlation_id(correlation_id: &str) -> Result<(), CoreError> {
    if correlation_id.trim().is_empty() {
        return Err(CoreError::InvalidArgument(
            "correlationId must not be empty".to_string(),
        ));
    }
    if correlation_id.contains(char::is_whitespace) {
        return Err(CoreError::InvalidArgument(
            "correlationId must not contain whitespace".to_string(),
        ));
    }
    if correlation_id.contains(':') {
        return Err(CoreError::InvalidArgument(
            "correlationId must not contain ':'".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn generated_ids_are_unique() {
        let ids: HashSet<String> = (0..1000).map(|_| generate_correlation_id()).collect();
        assert_eq!(ids.len(), 1000);
    }

    #[test]
    fn generated_ids_are_time_ordered() {
        let first = generate_correlation_id();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let second = generate_correlation_id();
        assert!(first < second, "{first} should sort before {second}");
    }

    #[test]
    fn generated_id_passes_validation() {
        assert!(validate_correlation_id(&generate_correlation_id()).is_ok());
    }

    #[test]
    fn empty_id_rejected() {
        assert_matches!(validate_correlation_id(""), Err(CoreError::InvalidArgument(_)));
        assert_matches!(validate_correlation_id("   "), Err(CoreError::InvalidArgument(_)));
    }

    #[test]
    fn whitespace_inside_id_rejected() {
        assert_matches!(validate_correlation_id("c 1"), Err(CoreError::InvalidArgument(_)));
    }

    #[test]
    fn key_separator_rejected() {
        assert_matches!(
            validate_correlation_id("c1:gen"),
            Err(CoreError::InvalidArgument(msg)) if msg.contains("':'")
        );
    }
}
