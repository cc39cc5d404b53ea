//! Configuration for the validation pipeline
//!
//! Covers the model endpoint, harness timeouts, the output directory and the
//! language registry that maps a script type to its container recipe.

pub mod loader;
pub mod registry;
pub mod types;

pub use loader::ConfigLoader;
pub use registry::LanguageRegistry;
pub use types::{DockerConfig, ExecutionConfig, LlmConfig, ScriptCheckConfig};
