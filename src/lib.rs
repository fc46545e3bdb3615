#![deny(missing_docs)]
#![deny(missing_debug_implementations)]
#![deny(rustdoc::missing_crate_level_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]
#![deny(rustdoc::invalid_codeblock_attributes)]
#![deny(rustdoc::invalid_html_tags)]
#![deny(rustdoc::bare_urls)]
#![deny(clippy::missing_panics_doc)]

//! Caseflow is a declarative process engine for long-running cases.
//!
//! A process definition is plain data: ordered steps, each with a type tag, a
//! configuration map and conditional transitions. The engine interprets it one
//! step at a time, suspends on human-in-the-loop steps until a decision signal
//! arrives, and keeps the case state queryable throughout. Every signal and
//! collaborator result is journaled so an execution can be rebuilt after a
//! restart.
//!
//! ## Basic Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use caseflow::config::EngineSettings;
//! use caseflow::definition::YamlDirectoryLoader;
//! use caseflow::ProcessEngine;
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let loader = Arc::new(YamlDirectoryLoader::new("process_definitions"));
//!     let engine = ProcessEngine::new(loader, EngineSettings::default());
//!
//!     // Start a case; it runs until the first human-in-the-loop step
//!     let execution = engine.start(
//!         "case-42",
//!         "expense_approval",
//!         "1.0.0",
//!         json!({ "submitter_name": "Dana", "amount": 120.0 }),
//!     );
//!
//!     if let Some(interaction) = execution.wait_for_interaction().await {
//!         println!("Waiting on: {}", interaction.prompt);
//!         execution.decision("approved").await?;
//!     }
//!
//!     let case = execution.result().await?;
//!     println!("Final status: {}", case.status());
//!     Ok(())
//! }
//! ```

/// Case state aggregate and its shared query handle
pub mod case;

/// Configuration management
pub mod config;

/// Process definitions and loaders
pub mod definition;

/// Dispatch loop, transition resolution and execution handles
pub mod engine;

/// Error types for Caseflow
pub mod error;

/// Human input handling for suspended cases
pub mod human_input;

/// Execution journal for deterministic replay
pub mod journal;

/// Host-side case registry
pub mod service;

/// Signal delivery to suspended executions
pub mod signal;

/// Step executors and their registry
pub mod steps;

/// Telemetry and metrics
pub mod telemetry;

// Re-export core types
pub use case::{Case, CaseStateHandle};
pub use definition::{ProcessDefinition, StepDefinition, StepType, Transition};
pub use engine::{CaseExecution, ExecutionStatus, ProcessEngine};
pub use service::{CaseService, DecisionReceipt};
pub use signal::{Signal, SignalDisposition};
pub use steps::{StepExecutor, StepOutcome, StepRegistry};

// Re-export error types
pub use error::{Error, Result};

/// Re-export telemetry types and functions for easier access
pub use telemetry::{add_metric, init_telemetry, span_duration, TelemetryConfig};

/// Re-export human input types for easier access
pub use human_input::{
    attend, ConsoleInputHandler, HumanInputHandler, HumanInputRequest, HumanInputResponse,
};
