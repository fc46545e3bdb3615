use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::case::{ActionButton, ActiveInteraction};
use crate::error::Result;

/// A request for a human decision on a case
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HumanInputRequest {
    /// Interaction the request answers
    pub request_id: String,

    /// Case awaiting the decision
    pub case_id: String,

    /// The prompt to show to the user
    pub prompt: String,

    /// Choices offered, in order
    #[serde(default)]
    pub actions: Vec<ActionButton>,

    /// Where a remote client would post the decision
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submit_url: Option<String>,

    /// Optional timeout in seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_seconds: Option<u64>,
}

impl HumanInputRequest {
    /// Request for `case_id` with a free-form prompt
    pub fn new(case_id: impl Into<String>, prompt: impl Into<String>) -> Self {
        let case_id = case_id.into();
        Self {
            request_id: case_id.clone(),
            case_id,
            prompt: prompt.into(),
            actions: Vec::new(),
            submit_url: None,
            timeout_seconds: None,
        }
    }

    /// Request mirroring an interaction published by a case
    pub fn from_interaction(case_id: impl Into<String>, interaction: &ActiveInteraction) -> Self {
        Self {
            request_id: interaction.interaction_id.clone(),
            case_id: case_id.into(),
            prompt: interaction.prompt.clone(),
            actions: interaction.payload.actions.clone(),
            submit_url: Some(interaction.submit_url.clone()),
            timeout_seconds: None,
        }
    }

    /// Add an action
    pub fn with_action(mut self, action: ActionButton) -> Self {
        self.actions.push(action);
        self
    }

    /// Add a timeout to the request
    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout_seconds = Some(seconds);
        self
    }

    /// Get the timeout as a Duration
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_seconds.map(Duration::from_secs)
    }

    /// Map raw input to an action value.
    ///
    /// Accepts an action's value, its label (case-insensitive) or its
    /// 1-based position. Without actions any non-empty input is taken as is.
    pub fn resolve(&self, input: &str) -> Option<String> {
        let input = input.trim();
        if input.is_empty() {
            return None;
        }
        if self.actions.is_empty() {
            return Some(input.to_string());
        }

        if let Some(action) = self
            .actions
            .iter()
            .find(|a| a.value == input || a.label.eq_ignore_ascii_case(input))
        {
            return Some(action.value.clone());
        }

        input
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|index| self.actions.get(index))
            .map(|action| action.value.clone())
    }
}

/// A response to a human input request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HumanInputResponse {
    /// ID of the original request
    pub request_id: String,

    /// The decision value
    pub response: String,
}

impl HumanInputResponse {
    /// Create a new human input response
    pub fn new(request_id: impl Into<String>, response: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            response: response.into(),
        }
    }
}

/// A trait for human input handlers
#[async_trait]
pub trait HumanInputHandler: Send + Sync + std::fmt::Debug {
    /// Handle a human input request
    async fn handle_request(&self, request: HumanInputRequest) -> Result<HumanInputResponse>;
}
