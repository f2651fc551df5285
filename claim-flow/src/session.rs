use std::collections::HashSet;
use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::artifact::{self, QuickReplyOption};
use crate::error::{ClaimError, Result};
use crate::gateway::{AgentGateway, AgentTurnRequest, EvidenceFile, StorageGateway};
use crate::phase::{self, ClaimPhase, UploadVisibility};
use crate::transcript::{ConversationLog, Message, MessageRole};
use crate::upload::{self, EvidenceCategory, EvidenceState};

/// Prefix of a locally synthesized fallback session id, so it is always
/// distinguishable from a remote-assigned one.
pub const FALLBACK_SESSION_PREFIX: &str = "local-session-";

pub fn is_fallback_session_id(id: &str) -> bool {
    id.starts_with(FALLBACK_SESSION_PREFIX)
}

/// Session identity for one claim attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionIdentity {
    pub id: String,
    /// True when the remote session-start call failed and the id was
    /// synthesized locally.
    pub degraded: bool,
}

/// Outcome of a conversational turn.
#[derive(Debug, Clone)]
pub enum SendOutcome {
    /// The turn ran; the agent's reply (or its transport error) has been
    /// appended to the transcript.
    Replied(SessionSnapshot),
    /// The input was empty or whitespace-only; nothing was appended or sent.
    IgnoredEmpty,
    /// An agent call is already in flight; nothing was appended or sent.
    Busy,
}

/// A transcript entry prepared for rendering: artifact markup stripped,
/// extracted artifacts attached.
#[derive(Debug, Clone, Serialize)]
pub struct RenderedMessage {
    pub id: String,
    pub role: MessageRole,
    pub display_text: String,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_url: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<QuickReplyOption>,
    pub options_consumed: bool,
}

/// Published evidence counts and gating flags. Raw storage references are
/// deliberately absent; they are only ever sent to the agent.
#[derive(Debug, Clone, Serialize)]
pub struct EvidenceSummary {
    pub damage_photo_count: usize,
    pub police_report_uploaded: bool,
    pub repair_estimate_uploaded: bool,
    pub damage_done_enabled: bool,
    pub documents_done_enabled: bool,
}

/// Immutable view of the session after an operation.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub session_id: Option<String>,
    pub degraded: bool,
    pub phase: ClaimPhase,
    pub phase_number: u8,
    pub visibility: UploadVisibility,
    pub evidence: EvidenceSummary,
    pub transcript: Vec<RenderedMessage>,
}

#[derive(Debug, Default)]
struct ClaimState {
    identity: Option<SessionIdentity>,
    phase: ClaimPhase,
    visibility: UploadVisibility,
    transcript: ConversationLog,
    evidence: EvidenceState,
    /// Message ids whose quick-reply options have been used up.
    consumed_options: HashSet<String>,
}

/// RAII holder of the single-inflight agent slot. Dropping it releases the
/// slot on every exit path.
struct InFlightGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
            .then_some(Self { flag })
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Orchestrator for one claim attempt.
///
/// Owns the session state exclusively: identity, phase, transcript and
/// published evidence are only ever mutated here, and every mutating
/// operation returns a fresh [`SessionSnapshot`]. The state lock is never
/// held across a gateway await.
pub struct SessionManager {
    agent: Arc<dyn AgentGateway>,
    storage: Arc<dyn StorageGateway>,
    state: RwLock<ClaimState>,
    agent_in_flight: AtomicBool,
}

impl SessionManager {
    pub fn new(agent: Arc<dyn AgentGateway>, storage: Arc<dyn StorageGateway>) -> Self {
        Self {
            agent,
            storage,
            state: RwLock::new(ClaimState::default()),
            agent_in_flight: AtomicBool::new(false),
        }
    }

    /// Acquire the session identity, once.
    ///
    /// The first call asks the agent for a session id; if that fails a
    /// fallback id is synthesized silently and the attempt continues in
    /// degraded mode. Later calls return the stored identity unchanged, so
    /// every agent call in this claim attempt uses the same id.
    pub async fn start(&self) -> SessionIdentity {
        if let Some(identity) = self.state.read().unwrap().identity.clone() {
            return identity;
        }

        let identity = match self.agent.start_session().await {
            Ok(id) => {
                info!(session_id = %id, "Claim session started");
                SessionIdentity {
                    id,
                    degraded: false,
                }
            }
            Err(e) => {
                let id = format!("{}{}", FALLBACK_SESSION_PREFIX, Utc::now().timestamp_millis());
                warn!(
                    error = %e,
                    session_id = %id,
                    "Session start failed, continuing with fallback id"
                );
                SessionIdentity { id, degraded: true }
            }
        };

        let mut state = self.state.write().unwrap();
        // A concurrent start may have stored an identity while the remote
        // call was pending; the first stored one wins.
        state.identity.get_or_insert(identity).clone()
    }

    pub fn session_id(&self) -> Option<String> {
        self.state
            .read()
            .unwrap()
            .identity
            .as_ref()
            .map(|identity| identity.id.clone())
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        Self::snapshot_locked(&self.state.read().unwrap())
    }

    /// Send one typed user message to the agent.
    ///
    /// Blank input and turns raced against an in-flight call are no-ops.
    /// Transport failures are surfaced as an assistant-role transcript
    /// entry, never as an error to the caller.
    pub async fn send_message(&self, text: &str) -> SendOutcome {
        if text.trim().is_empty() {
            return SendOutcome::IgnoredEmpty;
        }
        self.run_turn(text.to_string(), text.to_string()).await
    }

    /// Upload a batch of evidence files and publish their references.
    ///
    /// All-or-nothing: on any failure the error propagates and nothing is
    /// published for this batch. Batches for different categories are
    /// independent of each other and of any in-flight agent call.
    pub async fn upload_evidence(
        &self,
        category: EvidenceCategory,
        files: Vec<EvidenceFile>,
    ) -> Result<SessionSnapshot> {
        if files.is_empty() {
            return Err(ClaimError::InvalidRequest(
                "upload batch contains no files".to_string(),
            ));
        }

        let uris = upload::submit_batch(self.storage.as_ref(), &files, category).await?;

        let mut state = self.state.write().unwrap();
        state.evidence.publish(category, uris);
        Ok(Self::snapshot_locked(&state))
    }

    /// Tell the agent that the damage photo uploads are complete.
    ///
    /// The agent receives a synthetic message enumerating the stored
    /// references; the transcript shows a summary without them.
    pub async fn confirm_damage_batch(&self) -> Result<SendOutcome> {
        let uris = self.state.read().unwrap().evidence.damage_uris.clone();
        if uris.is_empty() {
            return Err(ClaimError::EvidenceIncomplete(
                "no damage photos have been uploaded".to_string(),
            ));
        }

        let wire = format!(
            "I have uploaded {} damage photo(s). Storage URIs: {}",
            uris.len(),
            uris.join(", ")
        );
        let display = format!("I have uploaded {} damage photo(s).", uris.len());
        Ok(self.run_turn(wire, display).await)
    }

    /// Tell the agent that both claim documents have been uploaded.
    pub async fn confirm_document_batch(&self) -> Result<SendOutcome> {
        let (police, estimate) = {
            let state = self.state.read().unwrap();
            (
                state.evidence.police_uri.clone(),
                state.evidence.estimate_uri.clone(),
            )
        };
        let (Some(police), Some(estimate)) = (police, estimate) else {
            return Err(ClaimError::EvidenceIncomplete(
                "both the police report and the repair estimate are required".to_string(),
            ));
        };

        let wire = format!(
            "I have uploaded both documents. Police report URI: {}, Repair estimate URI: {}",
            police, estimate
        );
        let display = "I have uploaded the police report and repair estimate.".to_string();

        let outcome = self.run_turn(wire, display).await;
        if matches!(outcome, SendOutcome::Replied(_)) {
            // The document panel is dismissed once the agent has received
            // the documents, whatever phase the reply mapped to.
            let mut state = self.state.write().unwrap();
            state.visibility.show_document_upload = false;
            return Ok(SendOutcome::Replied(Self::snapshot_locked(&state)));
        }
        Ok(outcome)
    }

    /// Choose a quick-reply option offered by an assistant message.
    ///
    /// Selection is single-use: the first choice permanently disables every
    /// option of that message, and the bare option number is sent as the
    /// next user message.
    pub async fn select_option(&self, message_id: &str, option: u8) -> Result<SendOutcome> {
        if self.agent_in_flight.load(Ordering::Acquire) {
            return Ok(SendOutcome::Busy);
        }

        {
            let mut state = self.state.write().unwrap();
            let message = state
                .transcript
                .get(message_id)
                .ok_or_else(|| ClaimError::MessageNotFound(message_id.to_string()))?;
            let offered = artifact::extract(&message.content).options;
            if !offered.iter().any(|o| o.number == option) {
                return Err(ClaimError::InvalidRequest(format!(
                    "message {} does not offer option {}",
                    message_id, option
                )));
            }
            if !state.consumed_options.insert(message_id.to_string()) {
                return Err(ClaimError::OptionsConsumed(message_id.to_string()));
            }
        }

        Ok(self.send_message(&option.to_string()).await)
    }

    /// Run one agent turn: append the display message, invoke the agent
    /// with the wire message, then fold the reply into the session state.
    async fn run_turn(&self, wire_text: String, display_text: String) -> SendOutcome {
        let Some(_guard) = InFlightGuard::acquire(&self.agent_in_flight) else {
            return SendOutcome::Busy;
        };

        let identity = self.start().await;

        {
            let mut state = self.state.write().unwrap();
            state.transcript.append(MessageRole::User, display_text);
        }

        let request = AgentTurnRequest {
            input_text: wire_text,
            session_id: identity.id,
            enable_trace: false,
        };

        match self.agent.invoke(request).await {
            Ok(reply) => {
                let mut state = self.state.write().unwrap();
                state
                    .transcript
                    .append(MessageRole::Assistant, reply.output.clone());

                let inference = phase::infer(state.phase, state.visibility, &reply.output);
                if inference.phase != state.phase {
                    info!(
                        from = state.phase.number(),
                        to = inference.phase.number(),
                        "Phase transition"
                    );
                }
                state.phase = inference.phase;
                state.visibility = inference.visibility;
                if inference.reset_document_refs {
                    state.evidence.reset_documents();
                }

                SendOutcome::Replied(Self::snapshot_locked(&state))
            }
            Err(e) => {
                warn!(error = %e, "Agent turn failed, surfacing error in transcript");
                let mut state = self.state.write().unwrap();
                state
                    .transcript
                    .append(MessageRole::Assistant, format!("Error: {}", e));
                SendOutcome::Replied(Self::snapshot_locked(&state))
            }
        }
    }

    fn render_message(message: &Message, consumed_options: &HashSet<String>) -> RenderedMessage {
        match message.role {
            MessageRole::Assistant => {
                let extracted = artifact::extract(&message.content);
                RenderedMessage {
                    id: message.id.clone(),
                    role: message.role,
                    display_text: extracted.display_text,
                    timestamp: message.timestamp,
                    report_url: extracted.report_url,
                    options: extracted.options,
                    options_consumed: consumed_options.contains(&message.id),
                }
            }
            MessageRole::User => RenderedMessage {
                id: message.id.clone(),
                role: message.role,
                display_text: message.content.clone(),
                timestamp: message.timestamp,
                report_url: None,
                options: Vec::new(),
                options_consumed: false,
            },
        }
    }

    fn snapshot_locked(state: &ClaimState) -> SessionSnapshot {
        SessionSnapshot {
            session_id: state.identity.as_ref().map(|i| i.id.clone()),
            degraded: state.identity.as_ref().is_some_and(|i| i.degraded),
            phase: state.phase,
            phase_number: state.phase.number(),
            visibility: state.visibility,
            evidence: EvidenceSummary {
                damage_photo_count: state.evidence.damage_uris.len(),
                police_report_uploaded: state.evidence.police_uri.is_some(),
                repair_estimate_uploaded: state.evidence.estimate_uri.is_some(),
                damage_done_enabled: state.evidence.damage_done_enabled(),
                documents_done_enabled: state.evidence.documents_done_enabled(),
            },
            transcript: state
                .transcript
                .iter()
                .map(|m| Self::render_message(m, &state.consumed_options))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::AgentTurnResponse;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use tokio::sync::oneshot;

    /// Agent mock with scripted replies; records every invocation.
    struct ScriptedAgent {
        start_fails: bool,
        replies: Mutex<VecDeque<Result<String>>>,
        requests: Mutex<Vec<AgentTurnRequest>>,
    }

    impl ScriptedAgent {
        fn new(start_fails: bool, replies: Vec<Result<String>>) -> Self {
            Self {
                start_fails,
                replies: Mutex::new(replies.into_iter().collect()),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn requests(&self) -> Vec<AgentTurnRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl AgentGateway for ScriptedAgent {
        async fn start_session(&self) -> Result<String> {
            if self.start_fails {
                Err(ClaimError::AgentTransport(
                    "session start unavailable".to_string(),
                ))
            } else {
                Ok("remote-session-1".to_string())
            }
        }

        async fn invoke(&self, request: AgentTurnRequest) -> Result<AgentTurnResponse> {
            let session_id = request.session_id.clone();
            self.requests.lock().unwrap().push(request);
            let output = self
                .replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Ok("Understood.".to_string()))?;
            Ok(AgentTurnResponse {
                session_id,
                output: output.clone(),
                completion: output,
                trace: None,
            })
        }
    }

    /// Agent mock that signals when a turn arrives and blocks it until the
    /// test releases it. Subsequent turns reply immediately.
    struct BlockingAgent {
        entered: Mutex<Option<oneshot::Sender<()>>>,
        release: Mutex<Option<oneshot::Receiver<()>>>,
    }

    #[async_trait]
    impl AgentGateway for BlockingAgent {
        async fn start_session(&self) -> Result<String> {
            Ok("remote-session-1".to_string())
        }

        async fn invoke(&self, request: AgentTurnRequest) -> Result<AgentTurnResponse> {
            if let Some(entered) = self.entered.lock().unwrap().take() {
                let _ = entered.send(());
            }
            let release = self.release.lock().unwrap().take();
            if let Some(release) = release {
                release
                    .await
                    .map_err(|_| ClaimError::AgentTransport("released".to_string()))?;
            }
            Ok(AgentTurnResponse {
                session_id: request.session_id,
                output: "Understood.".to_string(),
                completion: "Understood.".to_string(),
                trace: None,
            })
        }
    }

    /// Storage mock that accepts everything.
    struct SinkStorage;

    #[async_trait]
    impl StorageGateway for SinkStorage {
        async fn upload(&self, file: &EvidenceFile, folder: &str) -> Result<String> {
            Ok(format!("blob://{}/{}", folder, file.file_name))
        }
    }

    /// Storage mock that rejects one named file.
    struct FlakyStorage {
        fail: String,
    }

    #[async_trait]
    impl StorageGateway for FlakyStorage {
        async fn upload(&self, file: &EvidenceFile, folder: &str) -> Result<String> {
            if file.file_name == self.fail {
                Err(ClaimError::UploadFailed("storage rejected file".to_string()))
            } else {
                Ok(format!("blob://{}/{}", folder, file.file_name))
            }
        }
    }

    fn file(name: &str) -> EvidenceFile {
        EvidenceFile {
            file_name: name.to_string(),
            content_type: "application/pdf".to_string(),
            content: b"%PDF-1.4".to_vec(),
        }
    }

    fn manager_with(agent: ScriptedAgent) -> (Arc<SessionManager>, Arc<ScriptedAgent>) {
        let agent = Arc::new(agent);
        let manager = Arc::new(SessionManager::new(agent.clone(), Arc::new(SinkStorage)));
        (manager, agent)
    }

    #[tokio::test]
    async fn test_blank_input_is_ignored() {
        let (manager, agent) = manager_with(ScriptedAgent::new(false, vec![]));
        manager.start().await;

        assert!(matches!(
            manager.send_message("   \n\t ").await,
            SendOutcome::IgnoredEmpty
        ));
        assert!(manager.snapshot().transcript.is_empty());
        assert!(agent.requests().is_empty());
    }

    #[tokio::test]
    async fn test_turn_appends_user_then_assistant() {
        let (manager, _agent) = manager_with(ScriptedAgent::new(
            false,
            vec![Ok("Welcome! Please provide your customer id.".to_string())],
        ));
        manager.start().await;

        let SendOutcome::Replied(snapshot) = manager.send_message("hello").await else {
            panic!("expected a reply");
        };
        assert_eq!(snapshot.transcript.len(), 2);
        assert_eq!(snapshot.transcript[0].role, MessageRole::User);
        assert_eq!(snapshot.transcript[0].display_text, "hello");
        assert_eq!(snapshot.transcript[1].role, MessageRole::Assistant);
        assert_eq!(snapshot.phase, ClaimPhase::CustomerVerification);
    }

    #[tokio::test]
    async fn test_reply_drives_phase_inference() {
        let (manager, _agent) = manager_with(ScriptedAgent::new(
            false,
            vec![Ok("Please upload photos of the damage".to_string())],
        ));
        manager.start().await;

        let SendOutcome::Replied(snapshot) = manager.send_message("here is my policy").await
        else {
            panic!("expected a reply");
        };
        assert_eq!(snapshot.phase, ClaimPhase::DamageAnalysis);
        assert!(snapshot.visibility.show_damage_upload);
    }

    #[tokio::test]
    async fn test_transport_error_lands_in_transcript_and_releases_busy() {
        let (manager, _agent) = manager_with(ScriptedAgent::new(
            false,
            vec![
                Err(ClaimError::AgentTransport("gateway timeout".to_string())),
                Ok("Back online.".to_string()),
            ],
        ));
        manager.start().await;

        let SendOutcome::Replied(snapshot) = manager.send_message("hello").await else {
            panic!("expected a reply outcome even on failure");
        };
        let last = snapshot.transcript.last().unwrap();
        assert_eq!(last.role, MessageRole::Assistant);
        assert!(last.display_text.contains("gateway timeout"));

        // The busy flag was released: the next turn goes through.
        assert!(matches!(
            manager.send_message("retry").await,
            SendOutcome::Replied(_)
        ));
    }

    #[tokio::test]
    async fn test_second_send_while_in_flight_is_a_no_op() {
        let (entered_tx, entered_rx) = oneshot::channel();
        let (release_tx, release_rx) = oneshot::channel();
        let agent = Arc::new(BlockingAgent {
            entered: Mutex::new(Some(entered_tx)),
            release: Mutex::new(Some(release_rx)),
        });
        let manager = Arc::new(SessionManager::new(agent, Arc::new(SinkStorage)));
        manager.start().await;

        let background = {
            let manager = manager.clone();
            tokio::spawn(async move { manager.send_message("first").await })
        };
        entered_rx.await.unwrap();

        assert!(matches!(manager.send_message("second").await, SendOutcome::Busy));
        // The racing call appended nothing.
        assert_eq!(manager.snapshot().transcript.len(), 1);

        release_tx.send(()).unwrap();
        assert!(matches!(
            background.await.unwrap(),
            SendOutcome::Replied(_)
        ));
        assert!(matches!(
            manager.send_message("third").await,
            SendOutcome::Replied(_)
        ));
    }

    #[tokio::test]
    async fn test_fallback_identity_is_stable_and_reused() {
        let (manager, agent) = manager_with(ScriptedAgent::new(true, vec![Ok("Hi.".to_string())]));

        let first = manager.start().await;
        let second = manager.start().await;

        assert!(first.degraded);
        assert!(is_fallback_session_id(&first.id));
        assert_eq!(first, second);

        manager.send_message("hello").await;
        assert_eq!(agent.requests()[0].session_id, first.id);
    }

    #[tokio::test]
    async fn test_remote_identity_used_for_every_turn() {
        let (manager, agent) = manager_with(ScriptedAgent::new(
            false,
            vec![Ok("One.".to_string()), Ok("Two.".to_string())],
        ));
        let identity = manager.start().await;
        assert!(!identity.degraded);
        assert!(!is_fallback_session_id(&identity.id));

        manager.send_message("first").await;
        manager.send_message("second").await;
        let requests = agent.requests();
        assert_eq!(requests.len(), 2);
        assert!(requests.iter().all(|r| r.session_id == identity.id));
    }

    #[tokio::test]
    async fn test_damage_confirm_splits_wire_and_display_text() {
        let (manager, agent) = manager_with(ScriptedAgent::new(
            false,
            vec![Ok("Thanks, analyzing the photos now.".to_string())],
        ));
        manager.start().await;

        manager
            .upload_evidence(EvidenceCategory::Damage, vec![file("dent.jpg")])
            .await
            .unwrap();
        let outcome = manager.confirm_damage_batch().await.unwrap();

        let SendOutcome::Replied(snapshot) = outcome else {
            panic!("expected a reply");
        };

        let wire = &agent.requests()[0].input_text;
        assert!(wire.contains("blob://damage/dent.jpg"));

        let user_entry = &snapshot.transcript[0];
        assert_eq!(user_entry.role, MessageRole::User);
        assert_eq!(user_entry.display_text, "I have uploaded 1 damage photo(s).");
        assert!(!user_entry.display_text.contains("blob://"));
    }

    #[tokio::test]
    async fn test_damage_confirm_requires_published_photos() {
        let (manager, _agent) = manager_with(ScriptedAgent::new(false, vec![]));
        manager.start().await;

        assert!(matches!(
            manager.confirm_damage_batch().await,
            Err(ClaimError::EvidenceIncomplete(_))
        ));
    }

    #[tokio::test]
    async fn test_documents_gate_opens_on_second_slot_only() {
        let (manager, _agent) = manager_with(ScriptedAgent::new(false, vec![]));
        manager.start().await;

        let snapshot = manager
            .upload_evidence(EvidenceCategory::Police, vec![file("report.pdf")])
            .await
            .unwrap();
        assert!(!snapshot.evidence.documents_done_enabled);
        assert!(matches!(
            manager.confirm_document_batch().await,
            Err(ClaimError::EvidenceIncomplete(_))
        ));

        let snapshot = manager
            .upload_evidence(EvidenceCategory::Estimate, vec![file("estimate.pdf")])
            .await
            .unwrap();
        assert!(snapshot.evidence.documents_done_enabled);
    }

    #[tokio::test]
    async fn test_document_confirm_hides_panel_and_hides_uris() {
        let (manager, agent) = manager_with(ScriptedAgent::new(
            false,
            vec![Ok("Documents received, reviewing.".to_string())],
        ));
        manager.start().await;

        manager
            .upload_evidence(EvidenceCategory::Police, vec![file("report.pdf")])
            .await
            .unwrap();
        manager
            .upload_evidence(EvidenceCategory::Estimate, vec![file("estimate.pdf")])
            .await
            .unwrap();

        let SendOutcome::Replied(snapshot) = manager.confirm_document_batch().await.unwrap()
        else {
            panic!("expected a reply");
        };

        assert!(!snapshot.visibility.show_document_upload);
        let wire = &agent.requests()[0].input_text;
        assert!(wire.contains("blob://police/report.pdf"));
        assert!(wire.contains("blob://estimate/estimate.pdf"));
        assert!(!snapshot.transcript[0].display_text.contains("blob://"));
    }

    #[tokio::test]
    async fn test_failed_batch_publishes_nothing() {
        let agent = Arc::new(ScriptedAgent::new(false, vec![]));
        let manager = SessionManager::new(
            agent,
            Arc::new(FlakyStorage {
                fail: "b.jpg".to_string(),
            }),
        );
        manager.start().await;

        let result = manager
            .upload_evidence(EvidenceCategory::Damage, vec![file("a.jpg"), file("b.jpg")])
            .await;
        assert!(matches!(result, Err(ClaimError::UploadFailed(_))));

        let snapshot = manager.snapshot();
        assert_eq!(snapshot.evidence.damage_photo_count, 0);
        assert!(!snapshot.evidence.damage_done_enabled);
    }

    #[tokio::test]
    async fn test_quick_reply_selection_is_single_use() {
        let options_text = "Please select the vehicle involved:\n\
                            1\u{FE0F}\u{20E3} Sedan\n\
                            2\u{FE0F}\u{20E3} Truck\n\
                            3\u{FE0F}\u{20E3} SUV";
        let (manager, agent) = manager_with(ScriptedAgent::new(
            false,
            vec![
                Ok(options_text.to_string()),
                Ok("Truck it is.".to_string()),
            ],
        ));
        manager.start().await;

        let SendOutcome::Replied(snapshot) = manager.send_message("my id is C-1001").await
        else {
            panic!("expected a reply");
        };
        let offer = snapshot.transcript.last().unwrap();
        assert_eq!(offer.options.len(), 3);
        assert!(!offer.options_consumed);
        let offer_id = offer.id.clone();

        let SendOutcome::Replied(snapshot) = manager.select_option(&offer_id, 2).await.unwrap()
        else {
            panic!("expected a reply");
        };
        assert_eq!(agent.requests().last().unwrap().input_text, "2");
        let rendered_offer = snapshot
            .transcript
            .iter()
            .find(|m| m.id == offer_id)
            .unwrap();
        assert!(rendered_offer.options_consumed);

        assert!(matches!(
            manager.select_option(&offer_id, 1).await,
            Err(ClaimError::OptionsConsumed(_))
        ));
    }

    #[tokio::test]
    async fn test_selecting_an_option_the_message_never_offered() {
        let (manager, _agent) = manager_with(ScriptedAgent::new(
            false,
            vec![Ok("Please provide your policy number.".to_string())],
        ));
        manager.start().await;

        let SendOutcome::Replied(snapshot) = manager.send_message("hello").await else {
            panic!("expected a reply");
        };
        let id = snapshot.transcript.last().unwrap().id.clone();

        assert!(matches!(
            manager.select_option(&id, 1).await,
            Err(ClaimError::InvalidRequest(_))
        ));
        assert!(matches!(
            manager.select_option("msg-999999", 1).await,
            Err(ClaimError::MessageNotFound(_))
        ));
    }
}
