use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// One turn of input for the conversational agent. Field names follow the
/// upstream wire contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentTurnRequest {
    pub input_text: String,
    pub session_id: String,
    pub enable_trace: bool,
}

/// The agent's reply for one turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentTurnResponse {
    pub session_id: String,
    pub output: String,
    pub completion: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace: Option<Vec<serde_json::Value>>,
}

/// The remote conversational agent, consumed through a narrow
/// request/response contract. The agent's reasoning is opaque to this crate.
#[async_trait]
pub trait AgentGateway: Send + Sync {
    /// Start a new claim session, returning the remote-assigned session id.
    async fn start_session(&self) -> Result<String>;

    /// Send one turn of user input within an existing session.
    async fn invoke(&self, request: AgentTurnRequest) -> Result<AgentTurnResponse>;
}

/// A file selected for upload, before it has been persisted anywhere.
#[derive(Debug, Clone)]
pub struct EvidenceFile {
    pub file_name: String,
    pub content_type: String,
    pub content: Vec<u8>,
}

/// Blob storage for claim evidence. Returns a stable reference once the
/// object is persisted.
#[async_trait]
pub trait StorageGateway: Send + Sync {
    /// Persist one file under the given category folder and return its URI.
    async fn upload(&self, file: &EvidenceFile, folder: &str) -> Result<String>;
}
