use axum::routing::get;
use axum::Router;

use crate::handlers::admin;
use crate::state::AppState;

/// Routes mounted at `/admin`.
///
/// ```text
/// GET    /keys?pattern=   -> list_keys
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/keys", get(admin::list_keys))
}
