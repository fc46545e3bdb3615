//! Execution journal.
//!
//! Every externally observed input of an execution (its start payload, each
//! consumed signal, each collaborator result) is appended here. Re-running the
//! dispatch loop against the journal reproduces the same case state without
//! waiting for signals again or re-invoking collaborators.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::signal::Signal;

/// One journaled event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum JournalEntry {
    /// Execution started
    Started {
        /// Case id
        case_id: String,
        /// Process name
        process_name: String,
        /// Process version
        process_version: String,
        /// Initial payload
        payload: Value,
        /// Start time
        at: DateTime<Utc>,
    },

    /// A human-in-the-loop step consumed a signal
    SignalConsumed {
        /// Step that consumed it
        step_id: String,
        /// The signal
        signal: Signal,
    },

    /// A collaborator call returned
    ActivityCompleted {
        /// Step that made the call
        step_id: String,
        /// Returned value
        output: Value,
        /// Completion time
        at: DateTime<Utc>,
    },

    /// The dispatch loop reached a terminal step
    Completed {
        /// Final status label
        status: String,
        /// Completion time
        at: DateTime<Utc>,
    },

    /// The execution aborted
    Failed {
        /// Diagnostic
        error: String,
        /// Failure time
        at: DateTime<Utc>,
    },
}

impl JournalEntry {
    /// Event tag used on the wire
    pub fn kind(&self) -> &'static str {
        match self {
            JournalEntry::Started { .. } => "started",
            JournalEntry::SignalConsumed { .. } => "signal_consumed",
            JournalEntry::ActivityCompleted { .. } => "activity_completed",
            JournalEntry::Completed { .. } => "completed",
            JournalEntry::Failed { .. } => "failed",
        }
    }
}

/// Append-only store of journal entries, keyed by case id
#[async_trait]
pub trait ExecutionJournal: Send + Sync + std::fmt::Debug {
    /// Append one entry
    async fn append(&self, case_id: &str, entry: &JournalEntry) -> Result<()>;

    /// All entries for a case, in append order
    async fn load(&self, case_id: &str) -> Result<Vec<JournalEntry>>;

    /// Ids of every journaled case
    async fn case_ids(&self) -> Result<Vec<String>>;
}

/// Journal kept in process memory
#[derive(Debug, Default)]
pub struct InMemoryJournal {
    entries: Mutex<HashMap<String, Vec<JournalEntry>>>,
}

impl InMemoryJournal {
    /// Create an empty journal
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ExecutionJournal for InMemoryJournal {
    async fn append(&self, case_id: &str, entry: &JournalEntry) -> Result<()> {
        self.entries
            .lock()
            .await
            .entry(case_id.to_string())
            .or_default()
            .push(entry.clone());
        Ok(())
    }

    async fn load(&self, case_id: &str) -> Result<Vec<JournalEntry>> {
        Ok(self
            .entries
            .lock()
            .await
            .get(case_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn case_ids(&self) -> Result<Vec<String>> {
        let mut ids: Vec<String> = self.entries.lock().await.keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }
}

/// Journal stored as one JSON-lines file per case
#[derive(Debug)]
pub struct FileJournal {
    root: PathBuf,
    write_lock: Mutex<()>,
}

impl FileJournal {
    /// Create a journal in `root`, creating the directory if needed
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        tokio::fs::create_dir_all(&root).await?;
        Ok(Self {
            root,
            write_lock: Mutex::new(()),
        })
    }

    /// Directory holding the journal files
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, case_id: &str) -> Result<PathBuf> {
        if case_id.is_empty()
            || case_id.contains(|c| c == '/' || c == '\\')
            || case_id == "."
            || case_id == ".."
        {
            return Err(Error::Journal(format!("invalid case id for journal: '{}'", case_id)));
        }
        Ok(self.root.join(format!("{}.jsonl", case_id)))
    }
}

#[async_trait]
impl ExecutionJournal for FileJournal {
    async fn append(&self, case_id: &str, entry: &JournalEntry) -> Result<()> {
        let path = self.path_for(case_id)?;
        let mut line = serde_json::to_string(entry)?;
        line.push('\n');

        let _guard = self.write_lock.lock().await;
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        file.sync_data().await?;
        Ok(())
    }

    async fn load(&self, case_id: &str) -> Result<Vec<JournalEntry>> {
        let path = self.path_for(case_id)?;
        let contents = match tokio::fs::read_to_string(&path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        contents
            .lines()
            .filter(|line| !line.trim().is_empty())
            .enumerate()
            .map(|(n, line)| {
                serde_json::from_str(line).map_err(|e| {
                    Error::Journal(format!("{}:{}: {}", path.display(), n + 1, e))
                })
            })
            .collect()
    }

    async fn case_ids(&self) -> Result<Vec<String>> {
        let mut ids = Vec::new();
        let mut dir = tokio::fs::read_dir(&self.root).await?;
        while let Some(entry) = dir.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some("jsonl") {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    ids.push(stem.to_string());
                }
            }
        }
        ids.sort();
        Ok(ids)
    }
}

/// Per-execution view of the journal.
///
/// While entries recorded by an earlier run remain, lookups are served from
/// them and nothing is appended; afterwards the log records live events.
#[derive(Debug)]
pub struct ExecutionLog {
    case_id: String,
    journal: Arc<dyn ExecutionJournal>,
    replay: Mutex<VecDeque<JournalEntry>>,
}

impl ExecutionLog {
    /// Log for a fresh execution
    pub fn live(case_id: impl Into<String>, journal: Arc<dyn ExecutionJournal>) -> Self {
        Self::replaying(case_id, journal, Vec::new())
    }

    /// Log that first replays `entries` (those after `Started`)
    pub fn replaying(
        case_id: impl Into<String>,
        journal: Arc<dyn ExecutionJournal>,
        entries: Vec<JournalEntry>,
    ) -> Self {
        Self {
            case_id: case_id.into(),
            journal,
            replay: Mutex::new(entries.into()),
        }
    }

    /// Whether recorded entries remain to be replayed
    pub async fn is_replaying(&self) -> bool {
        !self.replay.lock().await.is_empty()
    }

    /// Append a live entry
    pub async fn record(&self, entry: JournalEntry) -> Result<()> {
        debug!("Journaling {} for case {}", entry.kind(), self.case_id);
        self.journal.append(&self.case_id, &entry).await
    }

    /// Signal recorded for `step_id` by an earlier run, if replaying
    pub async fn replay_signal(&self, step_id: &str) -> Result<Option<Signal>> {
        let mut replay = self.replay.lock().await;
        match replay.front() {
            None => Ok(None),
            Some(JournalEntry::SignalConsumed { step_id: recorded, .. }) if recorded == step_id => {
                match replay.pop_front() {
                    Some(JournalEntry::SignalConsumed { signal, .. }) => Ok(Some(signal)),
                    _ => Ok(None),
                }
            }
            Some(other) => Err(divergence(step_id, "signal_consumed", other)),
        }
    }

    /// Collaborator output recorded for `step_id` by an earlier run, if replaying
    pub async fn replay_activity(&self, step_id: &str) -> Result<Option<(Value, DateTime<Utc>)>> {
        let mut replay = self.replay.lock().await;
        match replay.front() {
            None => Ok(None),
            Some(JournalEntry::ActivityCompleted { step_id: recorded, .. })
                if recorded == step_id =>
            {
                match replay.pop_front() {
                    Some(JournalEntry::ActivityCompleted { output, at, .. }) => Ok(Some((output, at))),
                    _ => Ok(None),
                }
            }
            Some(other) => Err(divergence(step_id, "activity_completed", other)),
        }
    }

    /// Record completion unless an earlier run already did
    pub async fn complete(&self, status: &str, at: DateTime<Utc>) -> Result<()> {
        let mut replay = self.replay.lock().await;
        if let Some(JournalEntry::Completed { .. }) = replay.front() {
            replay.pop_front();
            if !replay.is_empty() {
                warn!(
                    "Case {} completed with {} journal entries left unreplayed",
                    self.case_id,
                    replay.len()
                );
            }
            return Ok(());
        }
        drop(replay);
        self.record(JournalEntry::Completed {
            status: status.to_string(),
            at,
        })
        .await
    }

    /// Record failure unless an earlier run already did
    pub async fn fail(&self, error: &Error, at: DateTime<Utc>) -> Result<()> {
        let mut replay = self.replay.lock().await;
        if let Some(JournalEntry::Failed { .. }) = replay.front() {
            replay.pop_front();
            return Ok(());
        }
        drop(replay);
        self.record(JournalEntry::Failed {
            error: error.to_string(),
            at,
        })
        .await
    }
}

fn divergence(step_id: &str, expected: &str, found: &JournalEntry) -> Error {
    let found_step = match found {
        JournalEntry::SignalConsumed { step_id, .. } | JournalEntry::ActivityCompleted { step_id, .. } => {
            format!(" for step '{}'", step_id)
        }
        _ => String::new(),
    };
    Error::ReplayDivergence {
        step_id: step_id.to_string(),
        message: format!("expected {}, journal has {}{}", expected, found.kind(), found_step),
    }
}
