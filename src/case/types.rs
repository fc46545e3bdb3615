use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;

/// Placeholder summary until enrichment runs
pub const PENDING_SUMMARY: &str = "Initial analysis pending.";
/// Placeholder policy check until enrichment runs
pub const PENDING_POLICY_CHECK: &str = "Awaiting AI policy check.";
/// Placeholder risk score until enrichment runs
pub const PENDING_RISK_SCORE: &str = "Unknown";
/// Status a case carries between creation and its first suspending step
pub const PROCESSING_STATUS: &str = "Processing";

/// A person or actor taking part in a case
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseParticipant {
    /// Display name
    pub name: String,

    /// Contact address
    #[serde(default)]
    pub email: Option<String>,
}

impl CaseParticipant {
    /// Create a participant
    pub fn new(name: impl Into<String>, email: Option<String>) -> Self {
        Self {
            name: name.into(),
            email,
        }
    }
}

/// Business payload of a case
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseData {
    /// Amount claimed
    pub amount: f64,
    /// ISO currency code
    pub currency: String,
    /// Business category
    pub category: String,
    /// Enrichment: summary
    pub ai_summary: String,
    /// Enrichment: policy check outcome
    pub ai_policy_check: String,
    /// Enrichment: risk score label
    pub ai_risk_score: String,
}

/// Identity and headline fields of a case
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseDetails {
    /// Case id, equal to the execution id
    pub case_id: String,
    /// Human readable title
    pub case_title: String,
    /// Free-text status label
    pub status: String,
    /// Current assignee
    pub assignee: CaseParticipant,
    /// Who submitted the case
    pub submitter: CaseParticipant,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last mutation time
    pub updated_at: DateTime<Utc>,
    /// Business payload
    pub case_data: CaseData,
}

/// One entry of the append-only activity log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityStreamItem {
    /// 1-based, sequential per case
    pub id: u64,
    /// Entry kind, e.g. `system_event` or `agent_decision`
    #[serde(rename = "type")]
    pub kind: String,
    /// Who produced the entry
    pub sender: String,
    /// Entry text
    pub text: String,
    /// When the entry was recorded
    pub timestamp: DateTime<Utc>,
}

/// A button offered to the reviewer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionButton {
    /// Button caption
    pub label: String,
    /// Signal value sent when pressed
    pub value: String,
    /// Presentation hint
    #[serde(default = "default_button_style")]
    pub style: String,
}

fn default_button_style() -> String {
    "default".to_string()
}

impl ActionButton {
    /// Create a button
    pub fn new(label: impl Into<String>, value: impl Into<String>, style: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
            style: style.into(),
        }
    }
}

/// Payload of an interaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionPayload {
    /// Available actions, in display order
    pub actions: Vec<ActionButton>,
}

/// The prompt a suspended case is waiting on
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveInteraction {
    /// Interaction id
    pub interaction_id: String,
    /// Kind of widget, e.g. `action_buttons`
    pub interaction_type: String,
    /// Prompt shown to the reviewer
    pub prompt: String,
    /// Actions offered
    pub payload: InteractionPayload,
    /// Where a decision is posted
    pub submit_url: String,
}

/// The mutable aggregate an execution builds and returns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Case {
    /// Identity and headline fields
    pub case_details: CaseDetails,
    /// Append-only activity log
    pub activity_stream: Vec<ActivityStreamItem>,
    /// Present exactly while a human-in-the-loop step is waiting
    #[serde(default)]
    pub active_interaction: Option<ActiveInteraction>,
}

/// Initial payload accepted by `run`, with defaults for absent fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseInput {
    /// Explicit title
    #[serde(default)]
    pub title: Option<String>,
    /// Submitter name
    #[serde(default)]
    pub submitter_name: Option<String>,
    /// Submitter email
    #[serde(default)]
    pub submitter_email: Option<String>,
    /// Amount, 0.0 when absent
    #[serde(default)]
    pub amount: f64,
    /// Currency, `USD` when absent
    #[serde(default = "default_currency")]
    pub currency: String,
    /// Category, `Uncategorized` when absent
    #[serde(default = "default_category")]
    pub category: String,
}

fn default_currency() -> String {
    "USD".to_string()
}

fn default_category() -> String {
    "Uncategorized".to_string()
}

impl Default for CaseInput {
    fn default() -> Self {
        Self {
            title: None,
            submitter_name: None,
            submitter_email: None,
            amount: 0.0,
            currency: default_currency(),
            category: default_category(),
        }
    }
}

impl CaseInput {
    /// Read the untyped initial payload. `null` yields all defaults.
    pub fn from_payload(payload: &Value) -> Result<Self> {
        if payload.is_null() {
            return Ok(Self::default());
        }
        Ok(serde_json::from_value(payload.clone())?)
    }

    /// Submitter name, or `N/A`
    pub fn submitter_display_name(&self) -> &str {
        self.submitter_name.as_deref().unwrap_or("N/A")
    }

    /// Explicit title, or one derived from the submitter
    pub fn display_title(&self) -> String {
        self.title
            .clone()
            .unwrap_or_else(|| format!("Expense from {}", self.submitter_display_name()))
    }
}
