//! Job queue reached over HTTP.
//!
//! The request body is the JSON-serialized [`AnalysisJobRequest`]; any 2xx
//! response means the job was accepted.

use std::time::Duration;

use async_trait::async_trait;
use handoff_core::job::AnalysisJobRequest;

use crate::error::DispatchError;
use crate::queue::JobQueue;

/// Client for an HTTP job-intake endpoint.
pub struct HttpJobQueue {
    client: reqwest::Client,
    url: String,
}

impl HttpJobQueue {
    /// Create a queue client posting to `url`, bounding every submission by
    /// `timeout`.
    pub fn new(url: String, timeout: Duration) -> Result<Self, DispatchError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, url })
    }

    /// Create a queue client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, url: String) -> Self {
        Self { client, url }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    // ---- private helpers ----

    /// Returns the response unchanged on success, or a
    /// [`DispatchError::Rejected`] carrying the status and body text.
    async fn ensure_success(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, DispatchError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(DispatchError::Rejected {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl JobQueue for HttpJobQueue {
    async fn push(&self, request: &AnalysisJobRequest) -> Result<(), DispatchError> {
        let response = self.client.post(&self.url).json(request).send().await?;
        Self::ensure_success(response).await?;
        tracing::debug!(entity_id = %request.entity_id, url = %self.url, "Job posted");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "http"
    }
}
