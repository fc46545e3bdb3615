//! Error types for Caseflow
//!
//! Definition errors are fatal and always name the offending step. Loader and
//! runtime errors abort the execution; the last published case state stays
//! queryable.

use thiserror::Error;

/// A specialized Result type for Caseflow operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the process engine and its collaborators.
#[derive(Debug, Error)]
pub enum Error {
    /// The current step id is not present in the definition
    #[error("Step not found: '{step_id}'")]
    StepNotFound {
        /// Missing step id
        step_id: String,
    },

    /// No executor is registered for the step's type tag
    #[error("Unknown step type '{step_type}' on step '{step_id}'")]
    UnknownStepType {
        /// Offending step
        step_id: String,
        /// Unregistered type tag
        step_type: String,
    },

    /// Neither an exact nor a default transition matched
    #[error("No transition from step '{step_id}' matches signal {signal:?}")]
    NoMatchingTransition {
        /// Offending step
        step_id: String,
        /// Signal value that was resolved, if any
        signal: Option<String>,
    },

    /// A transition points at a step that does not exist
    #[error("Step '{step_id}' transitions to unknown step '{next_step}'")]
    DanglingTransition {
        /// Offending step
        step_id: String,
        /// Referenced step id
        next_step: String,
    },

    /// Two steps share an id
    #[error("Duplicate step id: '{step_id}'")]
    DuplicateStep {
        /// Duplicated id
        step_id: String,
    },

    /// More than one default transition on a single step
    #[error("Step '{step_id}' declares more than one default transition")]
    AmbiguousDefaultTransition {
        /// Offending step
        step_id: String,
    },

    /// Step configuration does not have the shape its executor expects
    #[error("Invalid configuration on step '{step_id}': {message}")]
    InvalidStepConfiguration {
        /// Offending step
        step_id: String,
        /// What is wrong
        message: String,
    },

    /// The definition has no steps
    #[error("Process definition '{name}' has no steps")]
    EmptyDefinition {
        /// Definition name
        name: String,
    },

    /// The loader has no definition under that name and version
    #[error("Process definition not found: {name} v{version}")]
    DefinitionNotFound {
        /// Process name
        name: String,
        /// Process version
        version: String,
    },

    /// The loader failed for another reason
    #[error("Failed to load process definition: {0}")]
    DefinitionLoad(String),

    /// The dispatch loop ran more steps than allowed
    #[error("Step limit of {limit} exceeded")]
    StepLimitExceeded {
        /// Configured limit
        limit: usize,
    },

    /// The journal does not match the steps the replay reaches
    #[error("Replay diverged at step '{step_id}': {message}")]
    ReplayDivergence {
        /// Step reached by the replay
        step_id: String,
        /// Mismatch description
        message: String,
    },

    /// The enrichment collaborator failed
    #[error("Enrichment failed: {0}")]
    Enrichment(String),

    /// The execution was cancelled by its host
    #[error("Execution cancelled")]
    Cancelled,

    /// A finished execution reported failure
    #[error("Case execution failed: {0}")]
    ExecutionFailed(String),

    /// The execution task panicked or could not be joined
    #[error("Execution task error: {0}")]
    Task(String),

    /// No execution is known under this case id
    #[error("Case not found: {0}")]
    CaseNotFound(String),

    /// An execution with this case id already exists
    #[error("Case already exists: {0}")]
    CaseAlreadyExists(String),

    /// The execution is no longer accepting signals
    #[error("Case is not running: {0}")]
    NotRunning(String),

    /// Configuration errors
    #[error("Config error: {0}")]
    Config(String),

    /// Journal read/write failure
    #[error("Journal error: {0}")]
    Journal(String),

    /// IO error during read/write operations
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding/decoding error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML decoding error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl Error {
    /// Whether this error indicates a malformed process definition.
    pub fn is_definition_error(&self) -> bool {
        matches!(
            self,
            Error::StepNotFound { .. }
                | Error::UnknownStepType { .. }
                | Error::NoMatchingTransition { .. }
                | Error::DanglingTransition { .. }
                | Error::DuplicateStep { .. }
                | Error::AmbiguousDefaultTransition { .. }
                | Error::InvalidStepConfiguration { .. }
                | Error::EmptyDefinition { .. }
        )
    }

    /// The step id a definition error points at, if any.
    pub fn step_id(&self) -> Option<&str> {
        match self {
            Error::StepNotFound { step_id }
            | Error::UnknownStepType { step_id, .. }
            | Error::NoMatchingTransition { step_id, .. }
            | Error::DanglingTransition { step_id, .. }
            | Error::DuplicateStep { step_id }
            | Error::AmbiguousDefaultTransition { step_id }
            | Error::InvalidStepConfiguration { step_id, .. }
            | Error::ReplayDivergence { step_id, .. } => Some(step_id),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_definition_error_classification() {
        let err = Error::NoMatchingTransition {
            step_id: "review".to_string(),
            signal: Some("maybe".to_string()),
        };
        assert!(err.is_definition_error());
        assert_eq!(err.step_id(), Some("review"));
        assert!(err.to_string().contains("review"));
        assert!(err.to_string().contains("maybe"));

        let err = Error::DefinitionNotFound {
            name: "expense_approval".to_string(),
            version: "1.0.0".to_string(),
        };
        assert!(!err.is_definition_error());
        assert_eq!(err.step_id(), None);
    }
}
