//! Step executors.
//!
//! One executor per step type, registered in a [`StepRegistry`] under its tag.
//! The dispatch loop never inspects tags itself: adding a step type means
//! registering another executor.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::case::CaseStateHandle;
use crate::config::EngineSettings;
use crate::definition::{StepDefinition, StepType};
use crate::error::Result;
use crate::journal::ExecutionLog;
use crate::signal::SignalInbox;

/// Final commit executor
pub mod commit;
/// Case enrichment executor and its collaborator
pub mod enrichment;
/// Human-in-the-loop executor
pub mod human;

pub use commit::{FinalCommitConfig, FinalCommitExecutor};
pub use enrichment::{CaseEnricher, CaseEnrichmentExecutor, Enrichment, StaticEnricher};
pub use human::{HumanInTheLoopConfig, HumanInTheLoopExecutor, DECISION_SENDER};

/// What the dispatch loop does after a step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// Continue with the named step
    Next(String),
    /// Stop; the case is final
    Terminate,
}

/// Everything an executor may touch while running a step.
///
/// Time is logical: it starts at the execution's start time and only moves
/// when a journaled event (a signal, a collaborator result) is observed, so a
/// replay reproduces identical timestamps.
pub struct StepContext<'a> {
    /// Id of the running case
    pub case_id: &'a str,
    /// Published case state
    pub case: &'a CaseStateHandle,
    /// Signal inbox of this execution
    pub inbox: &'a SignalInbox,
    /// Journal view of this execution
    pub log: &'a ExecutionLog,
    /// Engine settings
    pub settings: &'a EngineSettings,
    now: DateTime<Utc>,
}

impl<'a> StepContext<'a> {
    /// Create a context whose clock starts at `started_at`
    pub fn new(
        case_id: &'a str,
        case: &'a CaseStateHandle,
        inbox: &'a SignalInbox,
        log: &'a ExecutionLog,
        settings: &'a EngineSettings,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            case_id,
            case,
            inbox,
            log,
            settings,
            now: started_at,
        }
    }

    /// Current logical time
    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    /// Move the logical clock to a journaled event's time. Never moves backwards.
    pub fn advance_clock(&mut self, at: DateTime<Utc>) {
        if at > self.now {
            self.now = at;
        }
    }
}

impl fmt::Debug for StepContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StepContext")
            .field("case_id", &self.case_id)
            .field("now", &self.now)
            .finish()
    }
}

/// Runs one step type
#[async_trait]
pub trait StepExecutor: Send + Sync + fmt::Debug {
    /// Execute `step`, mutating the case through `ctx`
    async fn execute(&self, step: &StepDefinition, ctx: &mut StepContext<'_>)
        -> Result<StepOutcome>;

    /// Check the step's configuration ahead of dispatch
    fn validate(&self, _step: &StepDefinition) -> Result<()> {
        Ok(())
    }
}

/// Mapping from step type tag to executor, fixed when the engine is built
#[derive(Clone, Default)]
pub struct StepRegistry {
    executors: HashMap<StepType, Arc<dyn StepExecutor>>,
}

impl StepRegistry {
    /// Registry with no executors
    pub fn empty() -> Self {
        Self::default()
    }

    /// Registry with `human_in_the_loop`, `final_commit` and an
    /// enricher-less `case_enrichment`
    pub fn with_builtin() -> Self {
        Self::empty()
            .with_executor(StepType::human_in_the_loop(), HumanInTheLoopExecutor)
            .with_executor(StepType::final_commit(), FinalCommitExecutor)
            .with_executor(StepType::case_enrichment(), CaseEnrichmentExecutor::default())
    }

    /// Builder-style registration
    pub fn with_executor(
        mut self,
        step_type: StepType,
        executor: impl StepExecutor + 'static,
    ) -> Self {
        self.register(step_type, Arc::new(executor));
        self
    }

    /// Register or replace the executor for `step_type`
    pub fn register(&mut self, step_type: StepType, executor: Arc<dyn StepExecutor>) {
        self.executors.insert(step_type, executor);
    }

    /// Executor for `step_type`
    pub fn get(&self, step_type: &StepType) -> Option<Arc<dyn StepExecutor>> {
        self.executors.get(step_type).cloned()
    }

    /// Whether `step_type` has an executor
    pub fn contains(&self, step_type: &StepType) -> bool {
        self.executors.contains_key(step_type)
    }

    /// Registered tags, sorted
    pub fn step_types(&self) -> Vec<&StepType> {
        let mut types: Vec<&StepType> = self.executors.keys().collect();
        types.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        types
    }
}

impl fmt::Debug for StepRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StepRegistry")
            .field("step_types", &self.step_types())
            .finish()
    }
}
