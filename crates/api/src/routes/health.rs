use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::{routing::get, Json, Router};
use handoff_core::types::Timestamp;
use handoff_store::StoreHealth;
use serde::Serialize;

use crate::state::AppState;

/// Health check response payload.
#[derive(Serialize)]
pub struct HealthResponse {
    /// Store probe result: `status`, plus `latencyMs` or `error`.
    #[serde(flatten)]
    pub store: StoreHealth,
    pub timestamp: Timestamp,
    /// Crate version from Cargo.toml.
    pub version: &'static str,
}

/// GET /health -- 200 when the store answers a ping, 503 otherwise.
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let store = handoff_store::health_check(state.store.as_ref()).await;
    let status = if store.is_healthy() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(HealthResponse {
            store,
            timestamp: chrono::Utc::now(),
            version: env!("CARGO_PKG_VERSION"),
        }),
    )
}

/// Mount health check routes (intended for root-level, NOT under `/api/v1`).
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
