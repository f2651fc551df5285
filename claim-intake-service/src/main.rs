use std::sync::Arc;

use claim_flow::SessionRegistry;
use claim_intake_service::{
    AppState, ClaimsReadClient, HttpAgentGateway, HttpStorageGateway, build_router,
};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize structured JSON tracing based on environment variables
fn init_tracing() {
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "json".to_string());
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "claim_intake_service=debug,claim_flow=debug,tower_http=debug".into());

    match log_format.as_str() {
        "pretty" => {
            // Human-readable logging for development
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        _ => {
            // Structured JSON logging for production
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_target(true)
                        .with_level(true),
                )
                .init();
        }
    }
}

#[tokio::main]
async fn main() {
    init_tracing();

    // The agent API hosts the conversational agent, the session-start
    // operation and the claim reads; the upload API stores evidence files.
    let Ok(agent_api_url) = std::env::var("AGENT_API_URL") else {
        error!("AGENT_API_URL not set");
        std::process::exit(1);
    };
    let Ok(upload_api_url) = std::env::var("UPLOAD_API_URL") else {
        error!("UPLOAD_API_URL not set");
        std::process::exit(1);
    };
    let claims_api_url = std::env::var("CLAIMS_API_URL").unwrap_or_else(|_| agent_api_url.clone());
    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());

    let agent = match HttpAgentGateway::new(&agent_api_url) {
        Ok(gateway) => Arc::new(gateway),
        Err(e) => {
            error!("Failed to build agent gateway client: {}", e);
            std::process::exit(1);
        }
    };
    let storage = match HttpStorageGateway::new(&upload_api_url) {
        Ok(gateway) => Arc::new(gateway),
        Err(e) => {
            error!("Failed to build storage gateway client: {}", e);
            std::process::exit(1);
        }
    };
    let claims = match ClaimsReadClient::new(&claims_api_url) {
        Ok(client) => Arc::new(client),
        Err(e) => {
            error!("Failed to build claims read client: {}", e);
            std::process::exit(1);
        }
    };

    let app_state = AppState {
        sessions: Arc::new(SessionRegistry::new()),
        agent,
        storage,
        claims,
    };

    let app = build_router(app_state);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await.unwrap();
    info!("Server running on http://{}", bind_addr);

    axum::serve(listener, app).await.unwrap();
}
