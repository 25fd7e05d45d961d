#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request};
use axum::response::Response;
use axum::Router;
use handoff_api::config::ServerConfig;
use handoff_api::router::build_app_router;
use handoff_api::state::AppState;
use handoff_core::job::AnalysisJobRequest;
use handoff_dispatch::{DispatchError, JobQueue};
use handoff_store::MemoryStore;
use http_body_util::BodyExt;
use tower::ServiceExt;

/// Build a test `ServerConfig`: in-process store, default TTLs, and
/// `http://localhost:5173` as the only CORS origin.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        cors_origins: vec!["http://localhost:5173".to_string()],
        ..ServerConfig::default()
    }
}

/// Job queue that accepts everything and remembers what it was given.
#[derive(Default)]
pub struct RecordingQueue {
    pub pushed: Mutex<Vec<AnalysisJobRequest>>,
}

#[async_trait]
impl JobQueue for RecordingQueue {
    async fn push(&self, request: &AnalysisJobRequest) -> Result<(), DispatchError> {
        self.pushed.lock().unwrap().push(request.clone());
        Ok(())
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}

/// Job queue that refuses every submission.
pub struct RefusingQueue;

#[async_trait]
impl JobQueue for RefusingQueue {
    async fn push(&self, _request: &AnalysisJobRequest) -> Result<(), DispatchError> {
        Err(DispatchError::Rejected {
            status: 503,
            body: "intake paused".to_string(),
        })
    }

    fn name(&self) -> &'static str {
        "refusing"
    }
}

/// Handles a test keeps after building the app, for setup and assertions
/// behind the HTTP surface.
pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
    pub queue: Arc<RecordingQueue>,
}

/// Build the full application router (same middleware stack as `main.rs`)
/// over a fresh memory store and a recording job queue.
pub fn build_test_app() -> TestApp {
    let store = Arc::new(MemoryStore::new());
    let queue = Arc::new(RecordingQueue::default());
    let router = build_app_with(store.clone(), queue.clone());
    TestApp {
        router,
        store,
        queue,
    }
}

/// Build the application over the given store and job queue.
pub fn build_app_with(store: Arc<MemoryStore>, job_queue: Arc<dyn JobQueue>) -> Router {
    let config = test_config();
    let state = AppState {
        store,
        job_queue,
        config: Arc::new(config.clone()),
    };
    build_app_router(state, &config)
}

pub async fn send(app: Router, method: Method, uri: &str, body: Option<serde_json::Value>) -> Response {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&json).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    app.oneshot(request).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response {
    send(app, Method::GET, uri, None).await
}

pub async fn post(app: Router, uri: &str) -> Response {
    send(app, Method::POST, uri, None).await
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response {
    send(app, Method::POST, uri, Some(body)).await
}

/// POST a raw body with no `content-type` header.
pub async fn post_raw(app: Router, uri: &str, body: &str) -> Response {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .body(Body::from(body.to_string()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn put_json(app: Router, uri: &str, body: serde_json::Value) -> Response {
    send(app, Method::PUT, uri, Some(body)).await
}

pub async fn delete(app: Router, uri: &str) -> Response {
    send(app, Method::DELETE, uri, None).await
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
