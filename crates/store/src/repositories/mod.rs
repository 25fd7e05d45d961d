//! Repositories over the key-value store, one per coordination component.
//!
//! Like the rest of the crate they take the store by reference and hold no
//! state of their own; every call reads what it needs fresh from the store.

pub mod ack_repo;
pub mod draft_repo;
pub mod status_repo;

pub use ack_repo::AckRepo;
pub use draft_repo::DraftRepo;
pub use status_repo::{ChildUpdate, EntityStatusView, ReconcileOutcome, StatusRepo};
