use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::fmt;

use crate::error::{Error, Result};

/// Type tag of a step, used to pick its executor from the registry
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StepType(String);

impl StepType {
    /// Suspends for a human decision
    pub const HUMAN_IN_THE_LOOP: &'static str = "human_in_the_loop";

    /// Writes the final status and terminates
    pub const FINAL_COMMIT: &'static str = "final_commit";

    /// Calls the enrichment collaborator and continues
    pub const CASE_ENRICHMENT: &'static str = "case_enrichment";

    /// Create a step type from its tag
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    /// Tag for `human_in_the_loop`
    pub fn human_in_the_loop() -> Self {
        Self::new(Self::HUMAN_IN_THE_LOOP)
    }

    /// Tag for `final_commit`
    pub fn final_commit() -> Self {
        Self::new(Self::FINAL_COMMIT)
    }

    /// Tag for `case_enrichment`
    pub fn case_enrichment() -> Self {
        Self::new(Self::CASE_ENRICHMENT)
    }

    /// The raw tag
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StepType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for StepType {
    fn from(tag: &str) -> Self {
        Self::new(tag)
    }
}

/// A conditional edge to another step.
///
/// An absent `on_signal` makes this the step's default transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    /// Signal value this transition fires on
    #[serde(default)]
    pub on_signal: Option<String>,

    /// Id of the step to run next
    #[serde(alias = "next")]
    pub next_step: String,
}

impl Transition {
    /// Transition taken when the signal equals `signal`
    pub fn on(signal: impl Into<String>, next_step: impl Into<String>) -> Self {
        Self {
            on_signal: Some(signal.into()),
            next_step: next_step.into(),
        }
    }

    /// Default transition
    pub fn default_to(next_step: impl Into<String>) -> Self {
        Self {
            on_signal: None,
            next_step: next_step.into(),
        }
    }

    /// Whether this is a default (fallback) transition
    pub fn is_default(&self) -> bool {
        self.on_signal.is_none()
    }
}

/// One node of a process definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepDefinition {
    /// Unique id within the definition
    #[serde(alias = "id")]
    pub step_id: String,

    /// Executor tag
    #[serde(alias = "type")]
    pub step_type: StepType,

    /// Executor-specific configuration
    #[serde(default, alias = "config")]
    pub configuration: Map<String, Value>,

    /// Ordered outgoing transitions
    #[serde(default)]
    pub transitions: Vec<Transition>,
}

impl StepDefinition {
    /// Create a step with empty configuration and no transitions
    pub fn new(step_id: impl Into<String>, step_type: impl Into<StepType>) -> Self {
        Self {
            step_id: step_id.into(),
            step_type: step_type.into(),
            configuration: Map::new(),
            transitions: Vec::new(),
        }
    }

    /// Set a configuration entry
    pub fn with_config(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.configuration.insert(key.to_string(), value.into());
        self
    }

    /// Append a transition
    pub fn with_transition(mut self, transition: Transition) -> Self {
        self.transitions.push(transition);
        self
    }

    /// Decode the configuration into the executor's typed view
    pub fn config_as<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_value(Value::Object(self.configuration.clone())).map_err(|e| {
            Error::InvalidStepConfiguration {
                step_id: self.step_id.clone(),
                message: e.to_string(),
            }
        })
    }
}

/// A versioned, data-defined process
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessDefinition {
    /// Process name
    #[serde(alias = "process_name")]
    pub name: String,

    /// Process version
    #[serde(alias = "process_version")]
    pub version: String,

    /// Id of the first step to execute
    pub initial_step: String,

    /// Ordered steps
    pub steps: Vec<StepDefinition>,
}

impl ProcessDefinition {
    /// Create an empty definition
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        initial_step: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            initial_step: initial_step.into(),
            steps: Vec::new(),
        }
    }

    /// Append a step
    pub fn with_step(mut self, step: StepDefinition) -> Self {
        self.steps.push(step);
        self
    }

    /// Look up a step by id. The first step with a matching id wins.
    pub fn step(&self, step_id: &str) -> Option<&StepDefinition> {
        self.steps.iter().find(|s| s.step_id == step_id)
    }

    /// Structural checks run before dispatching.
    ///
    /// Rejects empty definitions, a missing initial step, duplicate ids,
    /// dangling `next_step` references and steps with several defaults.
    /// Step types are checked by the engine against its registry.
    pub fn validate(&self) -> Result<()> {
        if self.steps.is_empty() {
            return Err(Error::EmptyDefinition {
                name: self.name.clone(),
            });
        }

        let mut ids = HashSet::with_capacity(self.steps.len());
        for step in &self.steps {
            if !ids.insert(step.step_id.as_str()) {
                return Err(Error::DuplicateStep {
                    step_id: step.step_id.clone(),
                });
            }
        }

        if !ids.contains(self.initial_step.as_str()) {
            return Err(Error::StepNotFound {
                step_id: self.initial_step.clone(),
            });
        }

        for step in &self.steps {
            if step.transitions.iter().filter(|t| t.is_default()).count() > 1 {
                return Err(Error::AmbiguousDefaultTransition {
                    step_id: step.step_id.clone(),
                });
            }
            if let Some(dangling) = step
                .transitions
                .iter()
                .find(|t| !ids.contains(t.next_step.as_str()))
            {
                return Err(Error::DanglingTransition {
                    step_id: step.step_id.clone(),
                    next_step: dangling.next_step.clone(),
                });
            }
        }

        Ok(())
    }
}
