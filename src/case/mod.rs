//! Case state: the aggregate an execution mutates and returns.
//!
//! Field names on the wire follow the case API (`caseDetails`,
//! `activityStream`, `activeInteraction`).

/// Construction, mutation and the shared query handle
pub mod state;
/// Case data types
pub mod types;

pub use state::{activity, CaseStateHandle};
pub use types::{
    ActionButton, ActiveInteraction, ActivityStreamItem, Case, CaseData, CaseDetails, CaseInput,
    CaseParticipant, InteractionPayload, PENDING_POLICY_CHECK, PENDING_RISK_SCORE,
    PENDING_SUMMARY, PROCESSING_STATUS,
};
