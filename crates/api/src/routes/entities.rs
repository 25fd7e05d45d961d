//! Route definitions for entity processing status.

use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::entities;
use crate::state::AppState;

/// Routes mounted at `/entities`.
///
/// ```text
/// GET    /{id}/status                       -> get_status
/// PUT    /{id}/status                       -> set_status
/// PUT    /{id}/children                     -> register_children
/// PUT    /{id}/children/{child_id}/status   -> set_child_status
/// POST   /{id}/reconcile                    -> reconcile
/// POST   /{id}/retrigger                    -> retrigger
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/{id}/status",
            get(entities::get_status).put(entities::set_status),
        )
        .route("/{id}/children", put(entities::register_children))
        .route(
            "/{id}/children/{child_id}/status",
            put(entities::set_child_status),
        )
        .route("/{id}/reconcile", post(entities::reconcile))
        .route("/{id}/retrigger", post(entities::retrigger))
}
