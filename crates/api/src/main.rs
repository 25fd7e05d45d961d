use std::net::SocketAddr;
use std::sync::Arc;

use handoff_api::config::ServerConfig;
use handoff_api::router::build_app_router;
use handoff_api::state::AppState;
use handoff_dispatch::{HttpJobQueue, JobQueue, StoreJobQueue};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        "handoff_api=debug,handoff_store=debug,handoff_dispatch=debug,tower_http=debug".into()
    });
    let json_logs = std::env::var("LOG_FORMAT").is_ok_and(|format| format == "json");
    if json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Store ---
    let store = handoff_store::connect(&config.store_url, config.store_op_timeout())
        .await
        .expect("Failed to connect to store");
    tracing::info!("Store connection established");

    let health = handoff_store::health_check(store.as_ref()).await;
    if health.is_healthy() {
        tracing::info!(latency_ms = ?health.latency_ms, "Store health check passed");
    } else {
        // Keep serving: /health reports the outage and requests fail with 500.
        tracing::warn!(error = ?health.error, "Store health check failed at startup");
    }

    // --- Job queue ---
    let job_queue: Arc<dyn JobQueue> = match &config.job_queue_url {
        Some(url) => {
            let queue = HttpJobQueue::new(url.clone(), config.job_queue_timeout())
                .expect("Failed to build job queue HTTP client");
            tracing::info!(url = %queue.url(), "Jobs are submitted over HTTP");
            Arc::new(queue)
        }
        None => {
            tracing::info!("Jobs are appended to the store-backed job list");
            Arc::new(StoreJobQueue::new(Arc::clone(&store)))
        }
    };

    // --- App state ---
    let state = AppState {
        store,
        job_queue,
        config: Arc::new(config.clone()),
    };

    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    tracing::info!("Graceful shutdown complete");
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix) so the server
/// shuts down cleanly whether stopped interactively or by a process
/// manager.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
