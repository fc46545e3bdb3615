use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::{debug, info, instrument};

use super::types::ProcessDefinition;
use crate::error::{Error, Result};

/// Fetches a named, versioned process definition.
///
/// Called exactly once at the start of an execution.
#[async_trait]
pub trait DefinitionLoader: Send + Sync + std::fmt::Debug {
    /// Load the definition for `process_name` at `process_version`
    async fn load_definition(
        &self,
        process_name: &str,
        process_version: &str,
    ) -> Result<ProcessDefinition>;
}

/// File stem for a process definition, e.g. `expense_approval_v1_0_0`
pub fn definition_file_stem(process_name: &str, process_version: &str) -> String {
    format!("{}_v{}", process_name, process_version).replace('.', "_")
}

/// Loads definitions from YAML files in a directory
#[derive(Debug, Clone)]
pub struct YamlDirectoryLoader {
    root: PathBuf,
}

impl YamlDirectoryLoader {
    /// Create a loader rooted at `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory searched by this loader
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn candidates(&self, process_name: &str, process_version: &str) -> [PathBuf; 2] {
        let stem = definition_file_stem(process_name, process_version);
        [
            self.root.join(format!("{}.yml", stem)),
            self.root.join(format!("{}.yaml", stem)),
        ]
    }
}

#[async_trait]
impl DefinitionLoader for YamlDirectoryLoader {
    #[instrument(skip(self), fields(root = %self.root.display()))]
    async fn load_definition(
        &self,
        process_name: &str,
        process_version: &str,
    ) -> Result<ProcessDefinition> {
        for path in self.candidates(process_name, process_version) {
            debug!("Attempting to load from path: {}", path.display());
            let contents = match tokio::fs::read_to_string(&path).await {
                Ok(contents) => contents,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => return Err(Error::DefinitionLoad(format!("{}: {}", path.display(), e))),
            };

            let definition: ProcessDefinition = serde_yaml::from_str(&contents)
                .map_err(|e| Error::DefinitionLoad(format!("{}: {}", path.display(), e)))?;

            info!(
                "Loaded process definition {} v{} ({} steps)",
                definition.name,
                definition.version,
                definition.steps.len()
            );
            return Ok(definition);
        }

        Err(Error::DefinitionNotFound {
            name: process_name.to_string(),
            version: process_version.to_string(),
        })
    }
}

/// Serves definitions registered in memory
#[derive(Debug, Default)]
pub struct InMemoryDefinitionLoader {
    definitions: RwLock<HashMap<(String, String), ProcessDefinition>>,
}

impl InMemoryDefinitionLoader {
    /// Create an empty loader
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style registration
    pub fn with_definition(self, definition: ProcessDefinition) -> Self {
        let key = (definition.name.clone(), definition.version.clone());
        let mut definitions = self.definitions.into_inner();
        definitions.insert(key, definition);
        Self {
            definitions: RwLock::new(definitions),
        }
    }

    /// Register or replace a definition
    pub async fn insert(&self, definition: ProcessDefinition) {
        let key = (definition.name.clone(), definition.version.clone());
        self.definitions.write().await.insert(key, definition);
    }
}

#[async_trait]
impl DefinitionLoader for InMemoryDefinitionLoader {
    async fn load_definition(
        &self,
        process_name: &str,
        process_version: &str,
    ) -> Result<ProcessDefinition> {
        self.definitions
            .read()
            .await
            .get(&(process_name.to_string(), process_version.to_string()))
            .cloned()
            .ok_or_else(|| Error::DefinitionNotFound {
                name: process_name.to_string(),
                version: process_version.to_string(),
            })
    }
}
