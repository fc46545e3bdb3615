use serde::{Deserialize, Serialize};
use std::path::Path;
use validator::Validate;

use crate::error::{Error, Result};

/// Environment variable overriding `engine.definitions_path`
pub const DEFINITIONS_PATH_ENV: &str = "CASEFLOW_DEFINITIONS_PATH";

/// Environment variable overriding `engine.journal_path`
pub const JOURNAL_PATH_ENV: &str = "CASEFLOW_JOURNAL_PATH";

/// Settings for Caseflow
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct Settings {
    /// Engine settings
    #[serde(default)]
    #[validate]
    pub engine: EngineSettings,

    /// Logger settings
    #[serde(default)]
    pub logger: LoggerSettings,
}

/// Settings for the process engine
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct EngineSettings {
    /// Directory holding YAML process definitions
    #[serde(default = "default_definitions_path")]
    pub definitions_path: String,

    /// Run structural validation before dispatching
    #[serde(default = "default_true")]
    pub validate_on_load: bool,

    /// Upper bound on steps dispatched by one execution
    #[serde(default = "default_max_steps")]
    #[validate(range(min = 1))]
    pub max_steps: usize,

    /// Human-in-the-loop wait limit; unset waits indefinitely
    #[serde(default)]
    #[validate(range(min = 1))]
    pub signal_timeout_seconds: Option<u64>,

    /// Status label while a case awaits review
    #[serde(default = "default_review_status")]
    #[validate(length(min = 1))]
    pub review_status: String,

    /// Prefix of the decision URL exposed in interactions
    #[serde(default = "default_submit_url_base")]
    pub submit_url_base: String,

    /// Assignee of newly created cases
    #[serde(default)]
    pub default_assignee: AssigneeSettings,

    /// Directory for JSON-lines journals; in-memory when unset
    #[serde(default)]
    pub journal_path: Option<String>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            definitions_path: default_definitions_path(),
            validate_on_load: true,
            max_steps: default_max_steps(),
            signal_timeout_seconds: None,
            review_status: default_review_status(),
            submit_url_base: default_submit_url_base(),
            default_assignee: AssigneeSettings::default(),
            journal_path: None,
        }
    }
}

/// Assignee given to new cases
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssigneeSettings {
    /// Display name
    pub name: String,

    /// Contact address
    pub email: Option<String>,
}

impl Default for AssigneeSettings {
    fn default() -> Self {
        Self {
            name: "AI Triage".to_string(),
            email: Some("ai@caseflow.local".to_string()),
        }
    }
}

/// Logger settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggerSettings {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Colored console output
    #[serde(default = "default_true")]
    pub ansi: bool,
}

impl Default for LoggerSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            ansi: true,
        }
    }
}

fn default_definitions_path() -> String {
    "process_definitions".to_string()
}

fn default_true() -> bool {
    true
}

fn default_max_steps() -> usize {
    500
}

fn default_review_status() -> String {
    "Pending Human Review".to_string()
}

fn default_submit_url_base() -> String {
    "/api/v1/cases".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Settings {
    /// Parse settings from YAML text, then validate
    pub fn from_yaml(contents: &str) -> Result<Self> {
        let settings: Settings = serde_yaml::from_str(contents)
            .map_err(|e| Error::Config(format!("Failed to parse config file: {}", e)))?;
        settings.checked()
    }

    /// Apply environment overrides
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(path) = std::env::var(DEFINITIONS_PATH_ENV) {
            self.engine.definitions_path = path;
        }
        if let Ok(path) = std::env::var(JOURNAL_PATH_ENV) {
            self.engine.journal_path = Some(path);
        }
        self
    }

    fn checked(self) -> Result<Self> {
        self.validate()
            .map_err(|e| Error::Config(format!("Invalid settings: {}", e)))?;
        Ok(self)
    }
}

/// Load settings from a YAML file
pub fn load_settings<P: AsRef<Path>>(path: P) -> Result<Settings> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Failed to read config file: {}", e)))?;
    Settings::from_yaml(&contents)
}

/// Get settings, optionally from a specific file.
///
/// Environment overrides are applied last.
pub fn get_settings(config_path: Option<&str>) -> Result<Settings> {
    let settings = match config_path {
        Some(path) => load_settings(path)?,
        None => {
            // Try to find config file in common locations
            let default_paths = [
                "caseflow.config.yaml",
                "config/caseflow.config.yaml",
                "../caseflow.config.yaml",
            ];

            match default_paths.iter().find(|path| Path::new(path).exists()) {
                Some(path) => load_settings(path)?,
                None => Settings::default(),
            }
        }
    };

    settings.with_env_overrides().checked()
}
