use std::time::Duration;

use handoff_core::ack::DEFAULT_ACK_TTL_SECS;
use handoff_core::draft::DEFAULT_DRAFT_TTL_SECS;
use handoff_core::job::{DEFAULT_JOB_KIND, DEFAULT_JOB_STRATEGY};

/// Server configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development against a Redis
/// on localhost.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Key-value store URL; `memory://` selects the in-process store.
    pub store_url: String,
    /// Bound on every store operation, in milliseconds (default: `5000`).
    pub store_op_timeout_ms: u64,
    /// Lifetime of an acknowledgment (default: `120`).
    pub ack_ttl_secs: u64,
    /// Lifetime of a draft record (default: `86400`).
    pub draft_ttl_secs: u64,
    /// HTTP job intake endpoint. Unset means jobs go to the store-backed list.
    pub job_queue_url: Option<String>,
    /// Timeout for one HTTP job submission (default: `10`).
    pub job_queue_timeout_secs: u64,
    pub default_job_kind: String,
    pub default_job_strategy: String,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                  | Default                    |
    /// |--------------------------|----------------------------|
    /// | `HOST`                   | `0.0.0.0`                  |
    /// | `PORT`                   | `3000`                     |
    /// | `CORS_ORIGINS`           | (none)                     |
    /// | `REQUEST_TIMEOUT_SECS`   | `30`                       |
    /// | `STORE_URL`              | `redis://127.0.0.1:6379`   |
    /// | `STORE_OP_TIMEOUT_MS`    | `5000`                     |
    /// | `ACK_TTL_SECS`           | `120`                      |
    /// | `DRAFT_TTL_SECS`         | `86400`                    |
    /// | `JOB_QUEUE_URL`          | (unset: store list)        |
    /// | `JOB_QUEUE_TIMEOUT_SECS` | `10`                       |
    /// | `DEFAULT_JOB_KIND`       | `analysis`                 |
    /// | `DEFAULT_JOB_STRATEGY`   | `default`                  |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let job_queue_url = std::env::var("JOB_QUEUE_URL")
            .ok()
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty());

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs: env_u64("REQUEST_TIMEOUT_SECS", 30),
            store_url: std::env::var("STORE_URL")
                .unwrap_or_else(|_| "redis://127.0.0.1:6379".into()),
            store_op_timeout_ms: env_u64("STORE_OP_TIMEOUT_MS", 5000),
            ack_ttl_secs: env_u64("ACK_TTL_SECS", DEFAULT_ACK_TTL_SECS),
            draft_ttl_secs: env_u64("DRAFT_TTL_SECS", DEFAULT_DRAFT_TTL_SECS),
            job_queue_url,
            job_queue_timeout_secs: env_u64("JOB_QUEUE_TIMEOUT_SECS", 10),
            default_job_kind: std::env::var("DEFAULT_JOB_KIND")
                .unwrap_or_else(|_| DEFAULT_JOB_KIND.into()),
            default_job_strategy: std::env::var("DEFAULT_JOB_STRATEGY")
                .unwrap_or_else(|_| DEFAULT_JOB_STRATEGY.into()),
        }
    }

    pub fn store_op_timeout(&self) -> Duration {
        Duration::from_millis(self.store_op_timeout_ms)
    }

    pub fn ack_ttl(&self) -> Duration {
        Duration::from_secs(self.ack_ttl_secs)
    }

    pub fn draft_ttl(&self) -> Duration {
        Duration::from_secs(self.draft_ttl_secs)
    }

    pub fn job_queue_timeout(&self) -> Duration {
        Duration::from_secs(self.job_queue_timeout_secs)
    }
}

impl Default for ServerConfig {
    /// Development defaults with the in-process store; used by tests.
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 0,
            cors_origins: Vec::new(),
            request_timeout_secs: 30,
            store_url: handoff_store::MEMORY_URL.into(),
            store_op_timeout_ms: 5000,
            ack_ttl_secs: DEFAULT_ACK_TTL_SECS,
            draft_ttl_secs: DEFAULT_DRAFT_TTL_SECS,
            job_queue_url: None,
            job_queue_timeout_secs: 10,
            default_job_kind: DEFAULT_JOB_KIND.into(),
            default_job_strategy: DEFAULT_JOB_STRATEGY.into(),
        }
    }
}

fn env_u64(name: &str, default: u64) -> u64 {
    match std::env::var(name) {
        Ok(raw) => raw
            .parse()
            .unwrap_or_else(|_| panic!("{name} must be a valid u64")),
        Err(_) => default,
    }
}
