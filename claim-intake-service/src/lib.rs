pub mod gateways;
pub mod models;
pub mod service;

pub use gateways::{ClaimsReadClient, HttpAgentGateway, HttpStorageGateway};
pub use service::{AppState, build_router};
