pub mod artifact;
pub mod error;
pub mod gateway;
pub mod phase;
pub mod session;
pub mod storage;
pub mod transcript;
pub mod upload;

// Re-export commonly used types
pub use artifact::{ExtractedMessage, QuickReplyOption, extract};
pub use error::{ClaimError, Result};
pub use gateway::{
    AgentGateway, AgentTurnRequest, AgentTurnResponse, EvidenceFile, StorageGateway,
};
pub use phase::{ClaimPhase, Inference, UploadVisibility, infer};
pub use session::{
    EvidenceSummary, FALLBACK_SESSION_PREFIX, RenderedMessage, SendOutcome, SessionIdentity,
    SessionManager, SessionSnapshot, is_fallback_session_id,
};
pub use storage::SessionRegistry;
pub use transcript::{ConversationLog, Message, MessageRole};
pub use upload::{EvidenceCategory, EvidenceState, submit_batch};
