//! HTTP-level integration tests for `POST /api/v1/jobs`.

mod common;

use std::sync::Arc;

use axum::http::StatusCode;
use common::{body_json, build_app_with, build_test_app, get, post_json, RefusingQueue};
use handoff_store::MemoryStore;
use serde_json::json;

// ---------------------------------------------------------------------------
// Test: accepted job opens a generation and leaves the entity triggering
// ---------------------------------------------------------------------------

#[tokio::test]
async fn accepted_job_returns_generation() {
    let app = build_test_app();

    let response = post_json(
        app.router.clone(),
        "/api/v1/jobs",
        json!({ "entityId": "e1" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let json = body_json(response).await;
    assert_eq!(json["accepted"], true);
    assert_eq!(json["entityId"], "e1");
    assert_eq!(json["generation"], 1);

    {
        let pushed = app.queue.pushed.lock().unwrap();
        assert_eq!(pushed.len(), 1);
        assert_eq!(pushed[0].kind, "analysis");
        assert_eq!(pushed[0].strategy, "default");
    }

    let status = body_json(get(app.router, "/api/v1/entities/e1/status").await).await;
    assert_eq!(status["data"]["status"], "triggering");
    assert_eq!(status["data"]["generation"], 1);
}

// ---------------------------------------------------------------------------
// Test: explicit kind and strategy are passed through
// ---------------------------------------------------------------------------

#[tokio::test]
async fn explicit_kind_and_strategy_are_used() {
    let app = build_test_app();
    let response = post_json(
        app.router,
        "/api/v1/jobs",
        json!({ "entityId": "e1", "kind": "ocr", "strategy": "fast" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    let pushed = app.queue.pushed.lock().unwrap();
    assert_eq!(pushed[0].kind, "ocr");
    assert_eq!(pushed[0].strategy, "fast");
}

// ---------------------------------------------------------------------------
// Test: refused job gives 502 and leaves the entity failed
// ---------------------------------------------------------------------------

#[tokio::test]
async fn refused_job_marks_entity_failed() {
    let store = Arc::new(MemoryStore::new());
    let router = build_app_with(store, Arc::new(RefusingQueue));

    let response = post_json(router.clone(), "/api/v1/jobs", json!({ "entityId": "e1" })).await;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let json = body_json(response).await;
    assert_eq!(json["accepted"], false);
    assert_eq!(json["entityId"], "e1");
    assert!(json["error"].as_str().unwrap().contains("intake paused"));

    let status = body_json(get(router, "/api/v1/entities/e1/status").await).await;
    assert_eq!(status["data"]["status"], "failed");
    assert!(status["data"]["failureReason"].is_string());
}

// ---------------------------------------------------------------------------
// Test: invalid kind is rejected before anything is written
// ---------------------------------------------------------------------------

#[tokio::test]
async fn invalid_kind_is_rejected() {
    let app = build_test_app();
    let response = post_json(
        app.router.clone(),
        "/api/v1/jobs",
        json!({ "entityId": "e1", "kind": "Deep Scan" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(app.queue.pushed.lock().unwrap().is_empty());

    let response = get(app.router, "/api/v1/entities/e1/status").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
