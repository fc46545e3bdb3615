//! The process engine.
//!
//! One execution per case: a tokio task runs the dispatch loop, asks the
//! step registry for an executor per step and follows the returned outcome
//! until a terminal step. Signals and queries go through [`CaseExecution`].

use chrono::{DateTime, Utc};
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::watch;
use tracing::{debug, error, info, info_span, instrument, warn, Instrument};

use crate::case::{Case, CaseInput, CaseParticipant, CaseStateHandle};
use crate::config::EngineSettings;
use crate::definition::{DefinitionLoader, ProcessDefinition, StepType, YamlDirectoryLoader};
use crate::error::{Error, Result};
use crate::journal::{ExecutionJournal, ExecutionLog, FileJournal, InMemoryJournal, JournalEntry};
use crate::signal::SignalInbox;
use crate::steps::{CaseEnricher, CaseEnrichmentExecutor, StepContext, StepOutcome, StepRegistry};
use crate::telemetry::add_metric;

/// Execution handle and status
pub mod execution;
/// Transition resolution
pub mod resolver;

pub use execution::{CaseExecution, ExecutionStatus};
pub use resolver::resolve_transition;

/// Everything one execution needs to know about the case it runs
#[derive(Debug)]
struct CaseRun {
    case_id: String,
    process_name: String,
    process_version: String,
    payload: Value,
    started_at: DateTime<Utc>,
    log: ExecutionLog,
    fresh: bool,
}

/// Interprets process definitions
#[derive(Debug, Clone)]
pub struct ProcessEngine {
    loader: Arc<dyn DefinitionLoader>,
    registry: Arc<StepRegistry>,
    journal: Arc<dyn ExecutionJournal>,
    settings: Arc<EngineSettings>,
}

impl ProcessEngine {
    /// Engine with the builtin step types and an in-memory journal
    pub fn new(loader: Arc<dyn DefinitionLoader>, settings: EngineSettings) -> Self {
        Self {
            loader,
            registry: Arc::new(StepRegistry::with_builtin()),
            journal: Arc::new(InMemoryJournal::new()),
            settings: Arc::new(settings),
        }
    }

    /// Engine reading definitions from `definitions_path`, journaling to
    /// `journal_path` when set
    pub async fn from_settings(settings: EngineSettings) -> Result<Self> {
        let loader = Arc::new(YamlDirectoryLoader::new(settings.definitions_path.clone()));
        let journal: Arc<dyn ExecutionJournal> = match &settings.journal_path {
            Some(path) => Arc::new(FileJournal::open(path).await?),
            None => Arc::new(InMemoryJournal::new()),
        };
        Ok(Self::new(loader, settings).with_journal(journal))
    }

    /// Replace the step registry
    pub fn with_registry(mut self, registry: StepRegistry) -> Self {
        self.registry = Arc::new(registry);
        self
    }

    /// Replace the journal
    pub fn with_journal(mut self, journal: Arc<dyn ExecutionJournal>) -> Self {
        self.journal = journal;
        self
    }

    /// Back `case_enrichment` steps with `enricher`
    pub fn with_enricher(mut self, enricher: Arc<dyn CaseEnricher>) -> Self {
        Arc::make_mut(&mut self.registry).register(
            StepType::case_enrichment(),
            Arc::new(CaseEnrichmentExecutor::new(enricher)),
        );
        self
    }

    /// Step registry in use
    pub fn registry(&self) -> &StepRegistry {
        &self.registry
    }

    /// Engine settings
    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Journal in use
    pub fn journal(&self) -> Arc<dyn ExecutionJournal> {
        Arc::clone(&self.journal)
    }

    /// Structural checks plus registered step types and step configurations
    pub fn validate(&self, definition: &ProcessDefinition) -> Result<()> {
        definition.validate()?;
        for step in &definition.steps {
            let executor =
                self.registry
                    .get(&step.step_type)
                    .ok_or_else(|| Error::UnknownStepType {
                        step_id: step.step_id.clone(),
                        step_type: step.step_type.to_string(),
                    })?;
            executor.validate(step)?;
        }
        Ok(())
    }

    /// Start an execution of `process_name` `process_version` for `case_id`.
    ///
    /// Returns as soon as the execution task is spawned; the case becomes
    /// queryable once the execution has opened it.
    pub fn start(
        &self,
        case_id: impl Into<String>,
        process_name: impl Into<String>,
        process_version: impl Into<String>,
        payload: Value,
    ) -> CaseExecution {
        let case_id = case_id.into();
        let run = CaseRun {
            log: ExecutionLog::live(case_id.clone(), self.journal()),
            case_id,
            process_name: process_name.into(),
            process_version: process_version.into(),
            payload,
            started_at: Utc::now(),
            fresh: true,
        };
        self.spawn(run)
    }

    /// Start an execution and wait for its final case
    pub async fn run(
        &self,
        case_id: impl Into<String>,
        process_name: impl Into<String>,
        process_version: impl Into<String>,
        payload: Value,
    ) -> Result<Case> {
        self.start(case_id, process_name, process_version, payload)
            .result()
            .await
    }

    /// Rebuild an execution from its journal.
    ///
    /// Recorded signals and collaborator results are replayed in order; once
    /// they run out the execution continues live, typically suspended at the
    /// step the previous run was waiting in.
    #[instrument(skip(self))]
    pub async fn resume(&self, case_id: &str) -> Result<CaseExecution> {
        let mut entries = self.journal.load(case_id).await?.into_iter();
        let (process_name, process_version, payload, started_at) = match entries.next() {
            Some(JournalEntry::Started {
                process_name,
                process_version,
                payload,
                at,
                ..
            }) => (process_name, process_version, payload, at),
            Some(other) => {
                return Err(Error::Journal(format!(
                    "journal of case {} starts with {} instead of started",
                    case_id,
                    other.kind()
                )))
            }
            None => return Err(Error::CaseNotFound(case_id.to_string())),
        };

        let remaining: Vec<JournalEntry> = entries.collect();
        info!(
            "Resuming case {} ({} v{}) with {} journal entries",
            case_id,
            process_name,
            process_version,
            remaining.len()
        );

        let run = CaseRun {
            log: ExecutionLog::replaying(case_id, self.journal(), remaining),
            case_id: case_id.to_string(),
            process_name,
            process_version,
            payload,
            started_at,
            fresh: false,
        };
        Ok(self.spawn(run))
    }

    fn spawn(&self, run: CaseRun) -> CaseExecution {
        let state = Arc::new(CaseStateHandle::new());
        let inbox = Arc::new(SignalInbox::new());
        let (status, _) = watch::channel(ExecutionStatus::Running);
        let status = Arc::new(status);

        let span = info_span!(
            "case",
            case_id = %run.case_id,
            process = %run.process_name,
            version = %run.process_version
        );
        let case_id = run.case_id.clone();
        let engine = self.clone();
        let task = tokio::spawn({
            let state = Arc::clone(&state);
            let inbox = Arc::clone(&inbox);
            let status = Arc::clone(&status);
            async move {
                let result = engine.execute(&run, &state, &inbox).await;
                status.send_if_modified(|current| {
                    if current.is_finished() {
                        return false;
                    }
                    *current = match &result {
                        Ok(_) => ExecutionStatus::Completed,
                        Err(err) => ExecutionStatus::Failed(err.to_string()),
                    };
                    true
                });
                result
            }
            .instrument(span)
        });

        CaseExecution::new(case_id, state, inbox, status, task)
    }

    async fn execute(
        &self,
        run: &CaseRun,
        state: &CaseStateHandle,
        inbox: &SignalInbox,
    ) -> Result<Case> {
        let started = Instant::now();
        let result = self.dispatch(run, state, inbox).await;

        match &result {
            Ok(case) => {
                info!("Case {} completed with status '{}'", run.case_id, case.status());
                run.log
                    .complete(case.status(), case.case_details.updated_at)
                    .await?;
            }
            Err(err) => {
                error!("Case {} failed: {}", run.case_id, err);
                if let Err(journal_err) = run.log.fail(err, Utc::now()).await {
                    warn!("Could not journal failure of case {}: {}", run.case_id, journal_err);
                }
            }
        }

        add_metric(
            "case_execution_duration_ms",
            started.elapsed().as_millis() as f64,
            &[("success", result.is_ok().to_string())],
        );
        result
    }

    async fn dispatch(
        &self,
        run: &CaseRun,
        state: &CaseStateHandle,
        inbox: &SignalInbox,
    ) -> Result<Case> {
        if run.fresh {
            run.log
                .record(JournalEntry::Started {
                    case_id: run.case_id.clone(),
                    process_name: run.process_name.clone(),
                    process_version: run.process_version.clone(),
                    payload: run.payload.clone(),
                    at: run.started_at,
                })
                .await?;
        }

        let definition = self
            .loader
            .load_definition(&run.process_name, &run.process_version)
            .await?;
        if self.settings.validate_on_load {
            self.validate(&definition)?;
        }

        let input = CaseInput::from_payload(&run.payload)?;
        let assignee = CaseParticipant::new(
            self.settings.default_assignee.name.clone(),
            self.settings.default_assignee.email.clone(),
        );
        state.publish(Case::open(
            run.case_id.clone(),
            &input,
            assignee,
            run.started_at,
        ));
        info!("Case {} opened: {}", run.case_id, input.display_title());

        let mut ctx = StepContext::new(
            &run.case_id,
            state,
            inbox,
            &run.log,
            &self.settings,
            run.started_at,
        );
        let mut current = definition.initial_step.clone();
        let mut dispatched = 0usize;

        loop {
            if dispatched >= self.settings.max_steps {
                return Err(Error::StepLimitExceeded {
                    limit: self.settings.max_steps,
                });
            }
            dispatched += 1;

            let step = definition
                .step(&current)
                .ok_or_else(|| Error::StepNotFound {
                    step_id: current.clone(),
                })?;
            let executor =
                self.registry
                    .get(&step.step_type)
                    .ok_or_else(|| Error::UnknownStepType {
                        step_id: step.step_id.clone(),
                        step_type: step.step_type.to_string(),
                    })?;

            debug!("Dispatching step {} ({})", step.step_id, step.step_type);
            let step_started = Instant::now();
            let outcome = executor.execute(step, &mut ctx).await?;
            add_metric(
                "case_step_duration_ms",
                step_started.elapsed().as_millis() as f64,
                &[
                    ("step", step.step_id.clone()),
                    ("type", step.step_type.to_string()),
                ],
            );

            match outcome {
                StepOutcome::Next(next) => {
                    debug!("Step {} -> {}", step.step_id, next);
                    current = next;
                }
                StepOutcome::Terminate => break,
            }
        }

        state
            .snapshot()
            .ok_or_else(|| Error::CaseNotFound(run.case_id.clone()))
    }
}
