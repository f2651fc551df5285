use std::time::Duration;

use async_trait::async_trait;
use claim_flow::{AgentGateway, AgentTurnRequest, AgentTurnResponse, ClaimError, Result};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;

/// Request timeout for agent calls. Turns can run long while the remote
/// agent analyzes uploaded evidence.
const AGENT_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StartSessionReply {
    session_id: String,
}

/// Error body shape of the agent API: `{ "message": "..." }`.
#[derive(Debug, Deserialize)]
struct AgentErrorBody {
    message: Option<String>,
}

/// Reqwest-backed client for the remote conversational agent API.
pub struct HttpAgentGateway {
    http: reqwest::Client,
    base_url: String,
}

impl HttpAgentGateway {
    pub fn new(base_url: impl Into<String>) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder().timeout(AGENT_TIMEOUT).build()?;
        Ok(Self {
            http,
            base_url: base_url.into(),
        })
    }

    async fn parse<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        if !response.status().is_success() {
            let status = response.status();
            let message = response
                .json::<AgentErrorBody>()
                .await
                .ok()
                .and_then(|body| body.message)
                .unwrap_or_else(|| format!("agent API returned {}", status));
            return Err(ClaimError::AgentTransport(message));
        }
        response
            .json()
            .await
            .map_err(|e| ClaimError::AgentTransport(e.to_string()))
    }
}

#[async_trait]
impl AgentGateway for HttpAgentGateway {
    async fn start_session(&self) -> Result<String> {
        let response = self
            .http
            .post(format!("{}/claim/start", self.base_url))
            .send()
            .await
            .map_err(|e| ClaimError::AgentTransport(e.to_string()))?;

        let reply: StartSessionReply = Self::parse(response).await?;
        debug!(session_id = %reply.session_id, "Agent session started");
        Ok(reply.session_id)
    }

    async fn invoke(&self, request: AgentTurnRequest) -> Result<AgentTurnResponse> {
        debug!(
            session_id = %request.session_id,
            input_length = request.input_text.len(),
            "Invoking agent"
        );
        let response = self
            .http
            .post(format!("{}/agent/invoke", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(|e| ClaimError::AgentTransport(e.to_string()))?;

        Self::parse(response).await
    }
}
