use thiserror::Error;

/// Errors that can occur during claim intake orchestration
#[derive(Error, Debug)]
pub enum ClaimError {
    #[error("Agent call failed: {0}")]
    AgentTransport(String),

    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("Message not found: {0}")]
    MessageNotFound(String),

    #[error("Quick-reply options already used for message: {0}")]
    OptionsConsumed(String),

    #[error("Evidence incomplete: {0}")]
    EvidenceIncomplete(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

/// Result type alias for claim-flow operations
pub type Result<T> = std::result::Result<T, ClaimError>;
