// HTTP-backed gateway implementations
pub mod agent;
pub mod claims;
pub mod storage;

pub use agent::HttpAgentGateway;
pub use claims::ClaimsReadClient;
pub use storage::HttpStorageGateway;
