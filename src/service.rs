//! Host-side registry of running cases.
//!
//! The service owns one [`CaseExecution`] per case id and exposes the
//! operations an API layer needs: start, query, decide, resume.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::case::Case;
use crate::engine::{CaseExecution, ExecutionStatus, ProcessEngine};
use crate::error::{Error, Result};
use crate::journal::JournalEntry;
use crate::signal::SignalDisposition;
use crate::telemetry::span_duration;

/// Receipt status for a decision the case accepted
pub const SIGNAL_SENT: &str = "Signal Sent";

/// Receipt status for a decision the case dropped
pub const SIGNAL_DROPPED: &str = "Signal Dropped";

/// Answer to a submitted decision
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionReceipt {
    /// Case the decision was sent to
    pub case_id: String,
    /// `Signal Sent` or `Signal Dropped`
    pub status: String,
    /// Human-readable outcome
    pub message: String,
}

/// Summary row of [`CaseService::list_cases`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseSummary {
    /// Case id
    pub case_id: String,
    /// Execution status
    pub status: ExecutionStatus,
    /// Case status label, once the case is opened
    pub case_status: Option<String>,
}

/// Registry of executions keyed by case id
#[derive(Debug)]
pub struct CaseService {
    engine: ProcessEngine,
    cases: RwLock<HashMap<String, Arc<CaseExecution>>>,
}

impl CaseService {
    /// Service starting cases on `engine`
    pub fn new(engine: ProcessEngine) -> Self {
        Self {
            engine,
            cases: RwLock::new(HashMap::new()),
        }
    }

    /// Engine backing the service
    pub fn engine(&self) -> &ProcessEngine {
        &self.engine
    }

    /// Execution registered under `case_id`
    pub async fn execution(&self, case_id: &str) -> Result<Arc<CaseExecution>> {
        self.cases
            .read()
            .await
            .get(case_id)
            .cloned()
            .ok_or_else(|| Error::CaseNotFound(case_id.to_string()))
    }

    /// Start a case; a fresh id is generated when `case_id` is `None`
    #[instrument(skip(self, payload))]
    pub async fn start_case(
        &self,
        case_id: Option<String>,
        process_name: &str,
        process_version: &str,
        payload: Value,
    ) -> Result<String> {
        let case_id = case_id.unwrap_or_else(|| format!("case-{}", Uuid::new_v4()));

        let mut cases = self.cases.write().await;
        if cases.contains_key(&case_id) {
            return Err(Error::CaseAlreadyExists(case_id));
        }

        let execution = self
            .engine
            .start(case_id.clone(), process_name, process_version, payload);
        cases.insert(case_id.clone(), Arc::new(execution));
        info!("Started case {} ({} v{})", case_id, process_name, process_version);
        Ok(case_id)
    }

    /// Current state of a case, live or final.
    ///
    /// `Ok(None)` means the execution exists but has not opened the case yet.
    pub async fn get_by_id(&self, case_id: &str) -> Result<Option<Case>> {
        Ok(self.execution(case_id).await?.get_current_state())
    }

    /// Deliver a human decision to a case
    #[instrument(skip(self))]
    pub async fn submit_decision(&self, case_id: &str, decision: &str) -> Result<DecisionReceipt> {
        let execution = self.execution(case_id).await?;
        let receipt = match execution.decision(decision).await? {
            SignalDisposition::Accepted => DecisionReceipt {
                case_id: case_id.to_string(),
                status: SIGNAL_SENT.to_string(),
                message: format!("Decision '{}' was successfully sent to the case.", decision),
            },
            SignalDisposition::Dropped => DecisionReceipt {
                case_id: case_id.to_string(),
                status: SIGNAL_DROPPED.to_string(),
                message: format!(
                    "Decision '{}' was dropped: the case already holds a pending decision.",
                    decision
                ),
            },
        };
        Ok(receipt)
    }

    /// Execution status of a case
    pub async fn status(&self, case_id: &str) -> Result<ExecutionStatus> {
        Ok(self.execution(case_id).await?.status())
    }

    /// Wait for a case to finish and return its final state
    pub async fn wait_for_completion(&self, case_id: &str) -> Result<Case> {
        let execution = self.execution(case_id).await?;
        match execution.wait_until_finished().await {
            ExecutionStatus::Completed => execution
                .get_current_state()
                .ok_or_else(|| Error::CaseNotFound(case_id.to_string())),
            ExecutionStatus::Failed(error) => Err(Error::ExecutionFailed(error)),
            ExecutionStatus::Cancelled => Err(Error::Cancelled),
            ExecutionStatus::Running => Err(Error::NotRunning(case_id.to_string())),
        }
    }

    /// Cancel a running case
    pub async fn cancel_case(&self, case_id: &str) -> Result<()> {
        self.execution(case_id).await?.cancel();
        Ok(())
    }

    /// Rebuild a case from the engine's journal.
    ///
    /// A finished or cancelled execution under the same id is replaced; a
    /// running one is left alone.
    #[instrument(skip(self))]
    pub async fn resume_case(&self, case_id: &str) -> Result<()> {
        let mut cases = self.cases.write().await;
        if let Some(existing) = cases.get(case_id) {
            if !existing.status().is_finished() {
                return Err(Error::CaseAlreadyExists(case_id.to_string()));
            }
        }

        let execution = self.engine.resume(case_id).await?;
        cases.insert(case_id.to_string(), Arc::new(execution));
        Ok(())
    }

    /// Resume every journaled case that neither completed nor failed and is
    /// not already registered. Returns the resumed ids, sorted.
    pub async fn resume_all(&self) -> Result<Vec<String>> {
        let _timer = span_duration("case_service_resume_all");
        let journal = self.engine.journal();
        let mut case_ids = journal.case_ids().await?;
        case_ids.sort();

        let mut resumed = Vec::new();
        for case_id in case_ids {
            if self.cases.read().await.contains_key(&case_id) {
                continue;
            }
            let entries = journal.load(&case_id).await?;
            let finished = matches!(
                entries.last(),
                Some(JournalEntry::Completed { .. } | JournalEntry::Failed { .. })
            );
            if finished {
                continue;
            }

            match self.resume_case(&case_id).await {
                Ok(()) => resumed.push(case_id),
                Err(err) => warn!("Could not resume case {}: {}", case_id, err),
            }
        }

        info!("Resumed {} case(s) from the journal", resumed.len());
        Ok(resumed)
    }

    /// All registered cases, sorted by id
    pub async fn list_cases(&self) -> Vec<CaseSummary> {
        let cases = self.cases.read().await;
        let mut summaries: Vec<CaseSummary> = cases
            .values()
            .map(|execution| CaseSummary {
                case_id: execution.case_id().to_string(),
                status: execution.status(),
                case_status: execution
                    .get_current_state()
                    .map(|case| case.status().to_string()),
            })
            .collect();
        summaries.sort_by(|a, b| a.case_id.cmp(&b.case_id));
        summaries
    }
}
