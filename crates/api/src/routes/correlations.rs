use axum::routing::post;
use axum::Router;

use crate::handlers::correlations;
use crate::state::AppState;

/// Routes mounted at `/correlations`.
///
/// ```text
/// POST   /                -> create_correlation
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/", post(correlations::create_correlation))
}
