use std::time::Duration;

use claim_flow::{ClaimError, Result};
use reqwest::StatusCode;
use tracing::debug;

use crate::models::{ClaimStatus, ClaimSummary};

const READ_TIMEOUT: Duration = Duration::from_secs(30);

/// Read-only client for the claims API. These are pass-through reads for
/// the dashboard and results views; no intake logic is attached to them.
pub struct ClaimsReadClient {
    http: reqwest::Client,
    base_url: String,
}

impl ClaimsReadClient {
    pub fn new(base_url: impl Into<String>) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder().timeout(READ_TIMEOUT).build()?;
        Ok(Self {
            http,
            base_url: base_url.into(),
        })
    }

    /// Fetch one claim's snapshot. Returns `None` when the upstream API
    /// does not know the claim.
    pub async fn claim_status(&self, claim_id: &str) -> Result<Option<ClaimStatus>> {
        let response = self
            .http
            .get(format!("{}/claim/{}", self.base_url, claim_id))
            .send()
            .await
            .map_err(|e| ClaimError::AgentTransport(e.to_string()))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(ClaimError::AgentTransport(format!(
                "claims API returned {}",
                response.status()
            )));
        }

        let status = response
            .json::<ClaimStatus>()
            .await
            .map_err(|e| ClaimError::AgentTransport(e.to_string()))?;
        debug!(claim_id, "Claim snapshot fetched");
        Ok(Some(status))
    }

    pub async fn list_claims(&self, limit: usize) -> Result<Vec<ClaimSummary>> {
        let response = self
            .http
            .get(format!("{}/claims?limit={}", self.base_url, limit))
            .send()
            .await
            .map_err(|e| ClaimError::AgentTransport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ClaimError::AgentTransport(format!(
                "claims API returned {}",
                response.status()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| ClaimError::AgentTransport(e.to_string()))
    }
}
