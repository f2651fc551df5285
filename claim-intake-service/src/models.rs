use serde::{Deserialize, Serialize};

use claim_flow::EvidenceCategory;

// ---------------------------------------------------------------------------
// Browser-facing request/response bodies
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub content: String,
}

/// One file of an evidence batch, carried as base64 (no data-URI prefix).
#[derive(Debug, Deserialize)]
pub struct UploadFilePayload {
    pub file_name: String,
    pub content_type: String,
    pub content_base64: String,
}

#[derive(Debug, Deserialize)]
pub struct UploadBatchRequest {
    pub category: EvidenceCategory,
    pub files: Vec<UploadFilePayload>,
}

#[derive(Debug, Deserialize)]
pub struct SelectOptionRequest {
    pub message_id: String,
    pub option: u8,
}

#[derive(Debug, Serialize)]
pub struct StartSessionResponse {
    pub session_id: String,
    /// True when the remote session-start failed and the attempt runs on a
    /// locally synthesized id.
    pub degraded: bool,
}

#[derive(Debug, Deserialize)]
pub struct ListClaimsQuery {
    pub limit: Option<usize>,
}

// ---------------------------------------------------------------------------
// Claim snapshots served by the pass-through reads
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    pub customer_id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub driving_experience_years: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_claims_count: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Policy {
    pub policy_id: String,
    pub policy_number: String,
    pub policy_type: String,
    pub policy_status: String,
    pub coverage_amount: f64,
    pub deductible_amount: f64,
    pub premium_amount: f64,
    pub customer_id: String,
    pub policy_start_date: String,
    pub policy_end_date: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vehicle {
    pub vehicle_id: String,
    pub make: String,
    pub model: String,
    pub year_of_manufacture: u32,
    pub color: String,
    pub registration_number: String,
    pub vin: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DamageAnalysisDetails {
    pub vehicle_matches_policy: bool,
    pub damaged_parts: Vec<String>,
    pub damage_summary: String,
    pub estimated_repair_cost_usd: f64,
    pub likely_crash_reason: String,
    pub severity: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suspicious_indicators: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DamageAnalysis {
    pub vehicle_match: bool,
    pub analysis: DamageAnalysisDetails,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentAnalysis {
    pub incident_date: String,
    pub incident_location: String,
    pub police_case_number: String,
    pub fault_determination: String,
    pub estimated_repair_cost: f64,
    pub repair_items: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inconsistencies: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub red_flags: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettlementDecision {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub claim_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approved_amount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deductible_applies: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_pays: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insurance_pays: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genuine_factors: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suspicious_factors: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk_assessment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detailed_reasoning: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supporting_evidence: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_steps: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pdf_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pdf_s3_key: Option<String>,
}

/// Claim read-by-id snapshot. Key casing follows the upstream claims API.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimStatus {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer: Option<Customer>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy: Option<Policy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vehicle: Option<Vehicle>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub damage_analysis: Option<DamageAnalysis>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_analysis: Option<DocumentAnalysis>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settlement: Option<SettlementDecision>,
}

/// One row of the claims listing. The upstream records carry more fields
/// than the dashboard uses; everything unknown is passed through untouched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaimSummary {
    pub claim_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}
