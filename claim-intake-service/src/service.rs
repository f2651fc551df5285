use axum::{
    Router,
    extract::{Path, Query, State},
    http::{HeaderValue, Request, StatusCode},
    middleware::{Next, from_fn},
    response::Json,
    routing::{get, post},
};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use claim_flow::{
    AgentGateway, ClaimError, EvidenceFile, SendOutcome, SessionManager, SessionRegistry,
    SessionSnapshot, StorageGateway,
};
use serde_json::{Value, json};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{Instrument, error, info};
use uuid::Uuid;

use crate::gateways::ClaimsReadClient;
use crate::models::{
    ClaimStatus, ClaimSummary, ListClaimsQuery, SelectOptionRequest, SendMessageRequest,
    StartSessionResponse, UploadBatchRequest,
};

type ApiError = (StatusCode, Json<Value>);
type ApiResult<T> = Result<Json<T>, ApiError>;

fn bad_request_error(message: &str) -> ApiError {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": message })))
}

fn not_found_error(message: &str, id: &str) -> ApiError {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "error": message,
            "id": id
        })),
    )
}

fn conflict_error(message: &str) -> ApiError {
    (StatusCode::CONFLICT, Json(json!({ "error": message })))
}

fn bad_gateway_error(message: &str) -> ApiError {
    (StatusCode::BAD_GATEWAY, Json(json!({ "error": message })))
}

fn map_claim_error(error: ClaimError) -> ApiError {
    match &error {
        ClaimError::InvalidRequest(_) => bad_request_error(&error.to_string()),
        ClaimError::EvidenceIncomplete(_) | ClaimError::OptionsConsumed(_) => {
            conflict_error(&error.to_string())
        }
        ClaimError::MessageNotFound(_) | ClaimError::SessionNotFound(_) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": error.to_string() })),
        ),
        ClaimError::UploadFailed(_) | ClaimError::AgentTransport(_) => {
            bad_gateway_error(&error.to_string())
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<SessionRegistry>,
    pub agent: Arc<dyn AgentGateway>,
    pub storage: Arc<dyn StorageGateway>,
    pub claims: Arc<ClaimsReadClient>,
}

/// Middleware to add correlation ID to all requests
async fn correlation_id_middleware(
    mut request: Request<axum::body::Body>,
    next: Next,
) -> axum::response::Response {
    let correlation_id = Uuid::new_v4().to_string();

    request.headers_mut().insert(
        "x-correlation-id",
        HeaderValue::from_str(&correlation_id).unwrap(),
    );

    let span = tracing::info_span!("http_request", correlation_id = %correlation_id);
    next.run(request).instrument(span).await
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route("/session", post(start_session))
        .route("/session/{id}", get(get_session))
        .route("/session/{id}/message", post(post_message))
        .route("/session/{id}/evidence", post(upload_evidence))
        .route("/session/{id}/evidence/damage/done", post(damage_done))
        .route(
            "/session/{id}/evidence/documents/done",
            post(documents_done),
        )
        .route("/session/{id}/select", post(select_option))
        .route("/claim/{claim_id}", get(get_claim))
        .route("/claims", get(list_claims))
        .layer(from_fn(correlation_id_middleware))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn root() -> Json<Value> {
    Json(json!({
        "service": "Claim Intake Service",
        "version": "1.0.0",
        "description": "Conversational insurance claim intake with evidence uploads",
        "endpoints": {
            "POST /session": "Start a new claim attempt",
            "GET /session/{id}": "Current session snapshot",
            "POST /session/{id}/message": "Send a chat message to the agent",
            "POST /session/{id}/evidence": "Upload an evidence batch",
            "POST /session/{id}/evidence/damage/done": "Confirm damage photo uploads",
            "POST /session/{id}/evidence/documents/done": "Confirm document uploads",
            "POST /session/{id}/select": "Choose a quick-reply option",
            "GET /claim/{claim_id}": "Claim snapshot (pass-through)",
            "GET /claims": "Claim listing (pass-through)",
            "GET /health": "Health check"
        }
    }))
}

async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

fn lookup_session(state: &AppState, id: &str) -> Result<Arc<SessionManager>, ApiError> {
    state
        .sessions
        .get(id)
        .ok_or_else(|| not_found_error("Session not found", id))
}

fn reply_or_reject(outcome: SendOutcome) -> ApiResult<SessionSnapshot> {
    match outcome {
        SendOutcome::Replied(snapshot) => Ok(Json(snapshot)),
        SendOutcome::IgnoredEmpty => Err(bad_request_error("Message content is empty")),
        SendOutcome::Busy => Err(conflict_error("An agent call is already in flight")),
    }
}

async fn start_session(State(state): State<AppState>) -> ApiResult<StartSessionResponse> {
    let manager = Arc::new(SessionManager::new(
        state.agent.clone(),
        state.storage.clone(),
    ));
    let identity = manager.start().await;
    state.sessions.insert(identity.id.clone(), manager);

    info!(
        session_id = %identity.id,
        degraded = identity.degraded,
        "Claim attempt started"
    );
    Ok(Json(StartSessionResponse {
        session_id: identity.id,
        degraded: identity.degraded,
    }))
}

async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<SessionSnapshot> {
    let manager = lookup_session(&state, &id)?;
    Ok(Json(manager.snapshot()))
}

async fn post_message(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<SendMessageRequest>,
) -> ApiResult<SessionSnapshot> {
    let manager = lookup_session(&state, &id)?;
    reply_or_reject(manager.send_message(&request.content).await)
}

async fn upload_evidence(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UploadBatchRequest>,
) -> ApiResult<SessionSnapshot> {
    let manager = lookup_session(&state, &id)?;

    let mut files = Vec::with_capacity(request.files.len());
    for payload in &request.files {
        let content = STANDARD.decode(&payload.content_base64).map_err(|_| {
            bad_request_error(&format!("File {} is not valid base64", payload.file_name))
        })?;
        files.push(EvidenceFile {
            file_name: payload.file_name.clone(),
            content_type: payload.content_type.clone(),
            content,
        });
    }

    manager
        .upload_evidence(request.category, files)
        .await
        .map(Json)
        .map_err(|e| {
            error!(session_id = %id, error = %e, "Evidence batch failed");
            map_claim_error(e)
        })
}

async fn damage_done(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<SessionSnapshot> {
    let manager = lookup_session(&state, &id)?;
    let outcome = manager
        .confirm_damage_batch()
        .await
        .map_err(map_claim_error)?;
    reply_or_reject(outcome)
}

async fn documents_done(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<SessionSnapshot> {
    let manager = lookup_session(&state, &id)?;
    let outcome = manager
        .confirm_document_batch()
        .await
        .map_err(map_claim_error)?;
    reply_or_reject(outcome)
}

async fn select_option(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<SelectOptionRequest>,
) -> ApiResult<SessionSnapshot> {
    let manager = lookup_session(&state, &id)?;
    let outcome = manager
        .select_option(&request.message_id, request.option)
        .await
        .map_err(map_claim_error)?;
    reply_or_reject(outcome)
}

async fn get_claim(
    State(state): State<AppState>,
    Path(claim_id): Path<String>,
) -> ApiResult<ClaimStatus> {
    match state.claims.claim_status(&claim_id).await {
        Ok(Some(status)) => Ok(Json(status)),
        Ok(None) => Err(not_found_error("Claim not found", &claim_id)),
        Err(e) => {
            error!(claim_id = %claim_id, error = %e, "Failed to fetch claim snapshot");
            Err(bad_gateway_error(&e.to_string()))
        }
    }
}

async fn list_claims(
    State(state): State<AppState>,
    Query(query): Query<ListClaimsQuery>,
) -> ApiResult<Vec<ClaimSummary>> {
    let limit = query.limit.unwrap_or(50);
    state.claims.list_claims(limit).await.map(Json).map_err(|e| {
        error!(error = %e, "Failed to list claims");
        bad_gateway_error(&e.to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UploadFilePayload;
    use async_trait::async_trait;
    use claim_flow::{AgentTurnRequest, AgentTurnResponse, EvidenceCategory, MessageRole, Result};

    struct EchoAgent;

    #[async_trait]
    impl AgentGateway for EchoAgent {
        async fn start_session(&self) -> Result<String> {
            Ok("session-test".to_string())
        }

        async fn invoke(&self, request: AgentTurnRequest) -> Result<AgentTurnResponse> {
            let output = format!("You said: {}", request.input_text);
            Ok(AgentTurnResponse {
                session_id: request.session_id,
                output: output.clone(),
                completion: output,
                trace: None,
            })
        }
    }

    struct SinkStorage;

    #[async_trait]
    impl claim_flow::StorageGateway for SinkStorage {
        async fn upload(&self, file: &EvidenceFile, folder: &str) -> Result<String> {
            Ok(format!("blob://{}/{}", folder, file.file_name))
        }
    }

    fn test_state() -> AppState {
        AppState {
            sessions: Arc::new(SessionRegistry::new()),
            agent: Arc::new(EchoAgent),
            storage: Arc::new(SinkStorage),
            claims: Arc::new(ClaimsReadClient::new("http://127.0.0.1:9").unwrap()),
        }
    }

    #[tokio::test]
    async fn test_start_registers_the_session() {
        let state = test_state();
        let Json(response) = start_session(State(state.clone())).await.unwrap();

        assert_eq!(response.session_id, "session-test");
        assert!(!response.degraded);
        assert!(state.sessions.get(&response.session_id).is_some());
    }

    #[tokio::test]
    async fn test_message_round_trip() {
        let state = test_state();
        let Json(started) = start_session(State(state.clone())).await.unwrap();

        let Json(snapshot) = post_message(
            State(state.clone()),
            Path(started.session_id.clone()),
            Json(SendMessageRequest {
                content: "hello".to_string(),
            }),
        )
        .await
        .unwrap();

        assert_eq!(snapshot.transcript.len(), 2);
        assert_eq!(snapshot.transcript[1].display_text, "You said: hello");
    }

    #[tokio::test]
    async fn test_blank_message_is_rejected() {
        let state = test_state();
        let Json(started) = start_session(State(state.clone())).await.unwrap();

        let result = post_message(
            State(state),
            Path(started.session_id),
            Json(SendMessageRequest {
                content: "   ".to_string(),
            }),
        )
        .await;

        let (status, _) = result.expect_err("blank input must be rejected");
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unknown_session_is_not_found() {
        let state = test_state();
        let result = get_session(State(state), Path("session-missing".to_string())).await;
        let (status, _) = result.expect_err("unknown session must 404");
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_evidence_batch_and_done_flow() {
        let state = test_state();
        let Json(started) = start_session(State(state.clone())).await.unwrap();

        let Json(snapshot) = upload_evidence(
            State(state.clone()),
            Path(started.session_id.clone()),
            Json(UploadBatchRequest {
                category: EvidenceCategory::Damage,
                files: vec![UploadFilePayload {
                    file_name: "dent.jpg".to_string(),
                    content_type: "image/jpeg".to_string(),
                    content_base64: STANDARD.encode(b"not really a jpeg"),
                }],
            }),
        )
        .await
        .unwrap();
        assert_eq!(snapshot.evidence.damage_photo_count, 1);
        assert!(snapshot.evidence.damage_done_enabled);

        let Json(snapshot) = damage_done(State(state), Path(started.session_id))
            .await
            .unwrap();
        // The storage references go to the agent only; the user-facing
        // transcript entry stays free of them.
        let confirm_entry = snapshot
            .transcript
            .iter()
            .find(|m| m.role == MessageRole::User)
            .unwrap();
        assert_eq!(
            confirm_entry.display_text,
            "I have uploaded 1 damage photo(s)."
        );
    }

    #[tokio::test]
    async fn test_invalid_base64_is_rejected() {
        let state = test_state();
        let Json(started) = start_session(State(state.clone())).await.unwrap();

        let result = upload_evidence(
            State(state),
            Path(started.session_id),
            Json(UploadBatchRequest {
                category: EvidenceCategory::Police,
                files: vec![UploadFilePayload {
                    file_name: "report.pdf".to_string(),
                    content_type: "application/pdf".to_string(),
                    content_base64: "!!not-base64!!".to_string(),
                }],
            }),
        )
        .await;

        let (status, _) = result.expect_err("bad base64 must be rejected");
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
