//! Route definitions for the `/drafts` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::drafts;
use crate::state::AppState;

/// Routes mounted at `/drafts`.
///
/// ```text
/// POST   /                -> enqueue_draft
/// GET    /pending         -> peek_pending
/// GET    /queue           -> queue_length
/// POST   /claim           -> claim_draft
/// GET    /{slug}          -> get_draft
/// DELETE /{slug}          -> clear_draft
/// ```
///
/// The static segments win over `{slug}`, so drafts named `pending`,
/// `queue` or `claim` are not readable through `GET /{slug}`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(drafts::enqueue_draft))
        .route("/pending", get(drafts::peek_pending))
        .route("/queue", get(drafts::queue_length))
        .route("/claim", post(drafts::claim_draft))
        .route("/{slug}", get(drafts::get_draft).delete(drafts::clear_draft))
}
