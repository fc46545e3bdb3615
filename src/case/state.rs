use chrono::{DateTime, Utc};
use tokio::sync::watch;

use super::types::*;

/// Activity kinds written by the engine
pub mod activity {
    /// Engine-generated event
    pub const SYSTEM_EVENT: &str = "system_event";
    /// A reviewer's decision
    pub const AGENT_DECISION: &str = "agent_decision";
}

impl Case {
    /// Build the initial case for an execution.
    ///
    /// The activity stream starts with a single creation event.
    pub fn open(
        case_id: impl Into<String>,
        input: &CaseInput,
        assignee: CaseParticipant,
        now: DateTime<Utc>,
    ) -> Self {
        let mut case = Self {
            case_details: CaseDetails {
                case_id: case_id.into(),
                case_title: input.display_title(),
                status: PROCESSING_STATUS.to_string(),
                assignee,
                submitter: CaseParticipant::new(
                    input.submitter_display_name(),
                    input.submitter_email.clone(),
                ),
                created_at: now,
                updated_at: now,
                case_data: CaseData {
                    amount: input.amount,
                    currency: input.currency.clone(),
                    category: input.category.clone(),
                    ai_summary: PENDING_SUMMARY.to_string(),
                    ai_policy_check: PENDING_POLICY_CHECK.to_string(),
                    ai_risk_score: PENDING_RISK_SCORE.to_string(),
                },
            },
            activity_stream: Vec::new(),
            active_interaction: None,
        };
        case.append_activity(
            activity::SYSTEM_EVENT,
            "System",
            format!("Case created by {}.", input.submitter_display_name()),
            now,
        );
        case
    }

    /// Case id
    pub fn case_id(&self) -> &str {
        &self.case_details.case_id
    }

    /// Current status label
    pub fn status(&self) -> &str {
        &self.case_details.status
    }

    /// Append to the activity stream and return the new entry's id.
    pub fn append_activity(
        &mut self,
        kind: &str,
        sender: &str,
        text: impl Into<String>,
        at: DateTime<Utc>,
    ) -> u64 {
        let id = self.activity_stream.len() as u64 + 1;
        self.activity_stream.push(ActivityStreamItem {
            id,
            kind: kind.to_string(),
            sender: sender.to_string(),
            text: text.into(),
            timestamp: at,
        });
        self.case_details.updated_at = at;
        id
    }

    /// Set the status label
    pub fn set_status(&mut self, status: impl Into<String>, at: DateTime<Utc>) {
        self.case_details.status = status.into();
        self.case_details.updated_at = at;
    }

    /// Enter a suspension: publish the interaction and the waiting status together
    pub fn begin_interaction(
        &mut self,
        interaction: ActiveInteraction,
        status: impl Into<String>,
        at: DateTime<Utc>,
    ) {
        self.active_interaction = Some(interaction);
        self.set_status(status, at);
    }

    /// Leave a suspension
    pub fn clear_interaction(&mut self, at: DateTime<Utc>) {
        self.active_interaction = None;
        self.case_details.updated_at = at;
    }

    /// Refresh `updatedAt`
    pub fn touch(&mut self, at: DateTime<Utc>) {
        self.case_details.updated_at = at;
    }
}

/// Single-writer, many-reader cell holding the published case state.
///
/// The dispatch loop is the only writer. Every mutation is applied under the
/// channel's lock, so readers observe either the state before or after it.
/// `None` means the execution has not initialised its case yet.
#[derive(Debug)]
pub struct CaseStateHandle {
    sender: watch::Sender<Option<Case>>,
}

impl Default for CaseStateHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl CaseStateHandle {
    /// Create an empty handle
    pub fn new() -> Self {
        let (sender, _) = watch::channel(None);
        Self { sender }
    }

    /// Publish the initial case, replacing anything present
    pub fn publish(&self, case: Case) {
        self.sender.send_replace(Some(case));
    }

    /// Apply `f` atomically to the published case.
    ///
    /// Returns `None` if no case has been published yet.
    pub fn update<R>(&self, f: impl FnOnce(&mut Case) -> R) -> Option<R> {
        let mut result = None;
        self.sender.send_if_modified(|state| match state {
            Some(case) => {
                result = Some(f(case));
                true
            }
            None => false,
        });
        result
    }

    /// Clone of the current state
    pub fn snapshot(&self) -> Option<Case> {
        self.sender.borrow().clone()
    }

    /// Receiver notified on every published mutation
    pub fn subscribe(&self) -> watch::Receiver<Option<Case>> {
        self.sender.subscribe()
    }
}
