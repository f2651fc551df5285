use serde::{Deserialize, Serialize};

/// The five ordered stages of claim intake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimPhase {
    CustomerVerification,
    PolicyVerification,
    DamageAnalysis,
    DocumentAnalysis,
    SettlementDecision,
}

impl ClaimPhase {
    /// 1-based step number shown to the user.
    pub fn number(self) -> u8 {
        match self {
            ClaimPhase::CustomerVerification => 1,
            ClaimPhase::PolicyVerification => 2,
            ClaimPhase::DamageAnalysis => 3,
            ClaimPhase::DocumentAnalysis => 4,
            ClaimPhase::SettlementDecision => 5,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            ClaimPhase::CustomerVerification => "Customer Verification",
            ClaimPhase::PolicyVerification => "Policy Verification",
            ClaimPhase::DamageAnalysis => "Damage Analysis",
            ClaimPhase::DocumentAnalysis => "Document Analysis",
            ClaimPhase::SettlementDecision => "Settlement Decision",
        }
    }
}

impl Default for ClaimPhase {
    fn default() -> Self {
        ClaimPhase::CustomerVerification
    }
}

/// Which evidence upload panels the client should show.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadVisibility {
    pub show_damage_upload: bool,
    pub show_document_upload: bool,
}

/// Outcome of running the phase rules against one agent output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Inference {
    pub phase: ClaimPhase,
    pub visibility: UploadVisibility,
    /// Set when a new document batch begins: previously collected police /
    /// estimate references must be dropped before new uploads are accepted.
    pub reset_document_refs: bool,
}

/// How a matched rule changes the visibility flags. `None` leaves a flag as
/// it was before the rule fired.
struct RuleEffect {
    show_damage_upload: Option<bool>,
    show_document_upload: Option<bool>,
    reset_document_refs: bool,
}

/// One entry of the ordered rule table. The predicate receives the
/// lowercased agent output.
struct PhaseRule {
    target: ClaimPhase,
    predicate: fn(&str) -> bool,
    effect: RuleEffect,
}

fn mentions_policy_step(text: &str) -> bool {
    text.contains("step 2") && text.contains("policy")
}

fn mentions_damage_step(text: &str) -> bool {
    (text.contains("step 3") && text.contains("damage")) || text.contains("upload photos")
}

fn mentions_document_step(text: &str) -> bool {
    (text.contains("step 4") && text.contains("document"))
        || text.contains("police report")
        || text.contains("repair estimate")
}

fn mentions_settlement(text: &str) -> bool {
    [
        "step 5",
        "settlement",
        "final decision",
        "claim decision",
        "approved",
        "denied",
        "manual review",
    ]
    .iter()
    .any(|marker| text.contains(marker))
}

/// The ordered rule table. First match wins; the rules are not mutually
/// exclusive, so this order is load-bearing (e.g. "police report" must take
/// the document rule before a trailing "settlement" mention is considered).
const RULES: &[PhaseRule] = &[
    PhaseRule {
        target: ClaimPhase::PolicyVerification,
        predicate: mentions_policy_step,
        effect: RuleEffect {
            show_damage_upload: None,
            show_document_upload: None,
            reset_document_refs: false,
        },
    },
    PhaseRule {
        target: ClaimPhase::DamageAnalysis,
        predicate: mentions_damage_step,
        effect: RuleEffect {
            show_damage_upload: Some(true),
            show_document_upload: None,
            reset_document_refs: false,
        },
    },
    PhaseRule {
        target: ClaimPhase::DocumentAnalysis,
        predicate: mentions_document_step,
        effect: RuleEffect {
            show_damage_upload: Some(false),
            show_document_upload: Some(true),
            reset_document_refs: true,
        },
    },
    PhaseRule {
        target: ClaimPhase::SettlementDecision,
        predicate: mentions_settlement,
        effect: RuleEffect {
            show_damage_upload: None,
            show_document_upload: Some(false),
            reset_document_refs: false,
        },
    },
];

/// Classify one agent output against the current phase state.
///
/// Matching is case-insensitive substring testing. When no rule matches the
/// state is returned unchanged; that is the expected steady state for
/// conversational turns that stay within a phase. The rules assign absolute
/// targets, so an output that happens to match an earlier rule moves the
/// phase backward; no monotonicity guard is applied here.
pub fn infer(phase: ClaimPhase, visibility: UploadVisibility, agent_output: &str) -> Inference {
    let text = agent_output.to_lowercase();

    for rule in RULES {
        if (rule.predicate)(&text) {
            let mut visibility = visibility;
            if let Some(damage) = rule.effect.show_damage_upload {
                visibility.show_damage_upload = damage;
            }
            if let Some(document) = rule.effect.show_document_upload {
                visibility.show_document_upload = document;
            }
            return Inference {
                phase: rule.target,
                visibility,
                reset_document_refs: rule.effect.reset_document_refs,
            };
        }
    }

    Inference {
        phase,
        visibility,
        reset_document_refs: false,
    }
}
