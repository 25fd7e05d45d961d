//! Route definitions for the `/acks` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::acks;
use crate::state::AppState;

/// Routes mounted at `/acks`.
///
/// ```text
/// POST   /                          -> record_ack
/// GET    /{correlation_id}          -> list_steps
/// GET    /{correlation_id}/{step}   -> poll_ack
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(acks::record_ack))
        .route("/{correlation_id}", get(acks::list_steps))
        .route("/{correlation_id}/{step}", get(acks::poll_ack))
}
