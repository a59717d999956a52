//! The persistence boundary of the wizard.
//!
//! A gateway is called at most once per submission and never retried. The
//! wizard treats every outcome, including transport errors, as non-fatal.

use async_trait::async_trait;
use galamsey_watch_report_models::{ReportRecord, StoreOutcome};
use thiserror::Error;

/// Errors raised while talking to a persistence backend.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend answered with something other than a store outcome.
    #[error("Unexpected response (HTTP {status}): {body}")]
    UnexpectedResponse {
        /// HTTP status code.
        status: u16,
        /// Raw response body.
        body: String,
    },
}

/// Stores a completed report.
#[async_trait]
pub trait SubmissionGateway: Send + Sync {
    /// Persists `record`.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError`] if the backend cannot be reached or its
    /// answer cannot be understood.
    async fn store(&self, record: &ReportRecord) -> Result<StoreOutcome, GatewayError>;
}

/// Posts reports to the server's `POST /api/reports` endpoint.
#[derive(Debug, Clone)]
pub struct HttpSubmissionGateway {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpSubmissionGateway {
    /// Creates a gateway for the server at `base_url`.
    #[must_use]
    pub fn new(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            endpoint: format!("{}/api/reports", base_url.trim_end_matches('/')),
        }
    }

    /// The URL reports are posted to.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl SubmissionGateway for HttpSubmissionGateway {
    async fn store(&self, record: &ReportRecord) -> Result<StoreOutcome, GatewayError> {
        let resp = self.client.post(&self.endpoint).json(record).send().await?;
        let status = resp.status().as_u16();
        let body = resp.text().await?;

        // Failed stores still carry a `{success: false, error}` body.
        serde_json::from_str::<StoreOutcome>(&body)
            .map_err(|_| GatewayError::UnexpectedResponse { status, body })
    }
}
