//! Domain layer for the handoff coordination service.
//!
//! Holds everything that does not touch I/O: the error taxonomy, correlation
//! ids, acknowledgment/draft/job records, the processing-status state machine
//! and the reconciliation rule. Both the store and the HTTP layer build on it.

pub mod ack;
pub mod correlation;
pub mod draft;
pub mod error;
pub mod job;
pub mod keys;
pub mod processing_status;
pub mod types;
