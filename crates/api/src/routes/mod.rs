pub mod acks;
pub mod admin;
pub mod correlations;
pub mod drafts;
pub mod entities;
pub mod health;
pub mod jobs;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /correlations                                    new correlation id (POST)
///
/// /drafts                                          enqueue (POST)
/// /drafts/pending                                  peek queue head
/// /drafts/queue                                    queue length
/// /drafts/claim                                    claim next live draft (POST)
/// /drafts/{slug}                                   get, clear (DELETE)
///
/// /acks                                            record (POST)
/// /acks/{correlation_id}                           steps acknowledged so far
/// /acks/{correlation_id}/{step}                    poll
///
/// /jobs                                            submit analysis job (POST)
///
/// /entities/{id}/status                            get, set (PUT, childless only)
/// /entities/{id}/children                          register children (PUT)
/// /entities/{id}/children/{child_id}/status        set child status (PUT)
/// /entities/{id}/reconcile                         reconcile (POST)
/// /entities/{id}/retrigger                         retrigger (POST)
///
/// /admin/keys                                      key listing (diagnostic)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/correlations", correlations::router())
        .nest("/drafts", drafts::router())
        .nest("/acks", acks::router())
        .nest("/jobs", jobs::router())
        .nest("/entities", entities::router())
        .nest("/admin", admin::router())
}
