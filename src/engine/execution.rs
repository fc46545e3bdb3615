use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument};

use crate::case::{ActiveInteraction, Case, CaseStateHandle};
use crate::error::{Error, Result};
use crate::signal::{Signal, SignalDisposition, SignalInbox};
use crate::telemetry::add_metric;

/// Lifecycle of one execution
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionStatus {
    /// Dispatching steps or suspended on a signal
    Running,
    /// Reached a terminal step
    Completed,
    /// Aborted with an error
    Failed(String),
    /// Aborted by the host
    Cancelled,
}

impl ExecutionStatus {
    /// Whether the execution will make no further progress
    pub fn is_finished(&self) -> bool {
        !matches!(self, ExecutionStatus::Running)
    }
}

impl std::fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExecutionStatus::Running => write!(f, "running"),
            ExecutionStatus::Completed => write!(f, "completed"),
            ExecutionStatus::Failed(error) => write!(f, "failed: {}", error),
            ExecutionStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Handle to a running case: the signal and query surface of one execution.
///
/// Queries read the last published case state and never block on the
/// dispatch loop.
#[derive(Debug)]
pub struct CaseExecution {
    case_id: String,
    state: Arc<CaseStateHandle>,
    inbox: Arc<SignalInbox>,
    status: Arc<watch::Sender<ExecutionStatus>>,
    task: JoinHandle<Result<Case>>,
}

impl CaseExecution {
    pub(crate) fn new(
        case_id: String,
        state: Arc<CaseStateHandle>,
        inbox: Arc<SignalInbox>,
        status: Arc<watch::Sender<ExecutionStatus>>,
        task: JoinHandle<Result<Case>>,
    ) -> Self {
        Self {
            case_id,
            state,
            inbox,
            status,
            task,
        }
    }

    /// Id of the case
    pub fn case_id(&self) -> &str {
        &self.case_id
    }

    /// Deliver a human decision
    pub async fn decision(&self, value: impl Into<String>) -> Result<SignalDisposition> {
        self.signal(Signal::decision(value)).await
    }

    /// Deliver any signal to the execution's inbox
    #[instrument(skip(self, signal), fields(case_id = %self.case_id, signal.value = %signal.value))]
    pub async fn signal(&self, signal: Signal) -> Result<SignalDisposition> {
        let status = self.status();
        if status.is_finished() {
            return Err(Error::NotRunning(format!("{} ({})", self.case_id, status)));
        }

        debug!("Delivering signal '{}' to case {}", signal.value, self.case_id);
        let disposition = self.inbox.deliver(signal).await;
        if disposition == SignalDisposition::Dropped {
            info!(
                "Case {} already holds an unconsumed signal, new signal dropped",
                self.case_id
            );
        }
        let metric = match disposition {
            SignalDisposition::Accepted => "case_signals_accepted_total",
            SignalDisposition::Dropped => "case_signals_dropped_total",
        };
        add_metric(metric, 1.0, &[("case_id", self.case_id.clone())]);
        Ok(disposition)
    }

    /// Snapshot of the case; `None` until the execution has opened it
    pub fn get_current_state(&self) -> Option<Case> {
        self.state.snapshot()
    }

    /// Receiver notified on every published change
    pub fn subscribe(&self) -> watch::Receiver<Option<Case>> {
        self.state.subscribe()
    }

    /// Current lifecycle status
    pub fn status(&self) -> ExecutionStatus {
        self.status.borrow().clone()
    }

    /// Wait until the execution stops making progress
    pub async fn wait_until_finished(&self) -> ExecutionStatus {
        let mut status = self.status.subscribe();
        let finished = match status.wait_for(ExecutionStatus::is_finished).await {
            Ok(finished) => finished.clone(),
            Err(_) => self.status(),
        };
        finished
    }

    /// Wait until the published case satisfies `predicate`.
    ///
    /// Returns `None` when the execution finishes first.
    pub async fn wait_for_state<F>(&self, mut predicate: F) -> Option<Case>
    where
        F: FnMut(&Case) -> bool,
    {
        let mut state = self.state.subscribe();
        let mut status = self.status.subscribe();
        tokio::select! {
            found = state.wait_for(|case| case.as_ref().map_or(false, &mut predicate)) => {
                found.ok().and_then(|case| (*case).clone())
            }
            _ = status.wait_for(ExecutionStatus::is_finished) => None,
        }
    }

    /// Wait for the case to publish an interaction
    pub async fn wait_for_interaction(&self) -> Option<ActiveInteraction> {
        self.wait_for_state(|case| case.active_interaction.is_some())
            .await
            .and_then(|case| case.active_interaction)
    }

    /// Abort the execution. The last published state stays queryable.
    /// Only a running execution is marked cancelled; a status the task has
    /// already published is kept.
    pub fn cancel(&self) {
        let cancelled = self.status.send_if_modified(|status| {
            if status.is_finished() {
                return false;
            }
            *status = ExecutionStatus::Cancelled;
            true
        });
        if cancelled {
            info!("Cancelling case {}", self.case_id);
            self.task.abort();
        }
    }

    /// Wait for the execution and return the final case
    pub async fn result(self) -> Result<Case> {
        match self.task.await {
            Ok(result) => result,
            Err(err) if err.is_cancelled() => Err(Error::Cancelled),
            Err(err) => Err(Error::Task(err.to_string())),
        }
    }
}
