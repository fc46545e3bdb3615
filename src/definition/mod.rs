//! Process definition model and loaders.
//!
//! A definition is plain data: ordered steps, each with a type tag, an opaque
//! configuration map and ordered conditional transitions. It is loaded once per
//! execution and never mutated afterwards.

/// Definition loaders
pub mod loader;
/// Definition data types and structural validation
pub mod types;

pub use loader::{
    definition_file_stem, DefinitionLoader, InMemoryDefinitionLoader, YamlDirectoryLoader,
};
pub use types::{ProcessDefinition, StepDefinition, StepType, Transition};
