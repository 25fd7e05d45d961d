//! Job submission: hands analysis requests to an external execution queue
//! and mirrors the synchronous outcome into the processing-status tracker.

pub mod enqueuer;
pub mod error;
pub mod http_queue;
pub mod queue;

pub use enqueuer::JobEnqueuer;
pub use error::DispatchError;
pub use http_queue::HttpJobQueue;
pub use queue::{JobQueue, StoreJobQueue};
