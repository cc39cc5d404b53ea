//! Configuration type definitions
//!
//! Every section has serde defaults so that an empty YAML document (or no
//! file at all) yields a working configuration once the API key has been
//! resolved from the environment.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

use crate::errors::PipelineError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptCheckConfig {
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub execution: ExecutionConfig,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Entries merged over the built-in language registry.
    #[serde(default)]
    pub languages: HashMap<String, DockerConfig>,
}

impl Default for ScriptCheckConfig {
    fn default() -> Self {
        Self {
            llm: LlmConfig::default(),
            execution: ExecutionConfig::default(),
            output_dir: default_output_dir(),
            languages: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    /// Resolved at load time, never read from the YAML file.
    #[serde(skip)]
    pub api_key: Option<String>,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default)]
    pub max_tokens: Option<u32>,
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            api_base: default_api_base(),
            api_key_env: default_api_key_env(),
            api_key: None,
            temperature: default_temperature(),
            max_tokens: None,
            request_timeout_secs: None,
        }
    }
}

/// Timeouts for the container harness. `None` waits without bound.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExecutionConfig {
    #[serde(default)]
    pub build_timeout_secs: Option<u64>,
    #[serde(default)]
    pub run_timeout_secs: Option<u64>,
}

/// Container recipe for one script language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DockerConfig {
    pub base_image: String,
    pub entrypoint: Vec<String>,
    pub exec_prefix: String,
}

impl DockerConfig {
    pub fn new(base_image: &str, entrypoint: &[&str], exec_prefix: &str) -> Self {
        Self {
            base_image: base_image.to_string(),
            entrypoint: entrypoint.iter().map(|s| s.to_string()).collect(),
            exec_prefix: exec_prefix.to_string(),
        }
    }
}

impl ScriptCheckConfig {
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.llm.model.trim().is_empty() {
            return Err(PipelineError::Config("llm.model must not be empty".to_string()));
        }
        if self.llm.api_base.trim().is_empty() {
            return Err(PipelineError::Config(
                "llm.api_base must not be empty".to_string(),
            ));
        }
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(PipelineError::Config(format!(
                "llm.temperature must be between 0.0 and 2.0, got {}",
                self.llm.temperature
            )));
        }
        if self.output_dir.as_os_str().is_empty() {
            return Err(PipelineError::Config(
                "output_dir must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

fn default_model() -> String { "gpt-4.1-mini".to_string() }
fn default_api_base() -> String { "https://api.openai.com/v1".to_string() }
fn default_api_key_env() -> String { "OPENAI_API_KEY".to_string() }
fn default_temperature() -> f32 { 0.5 }
fn default_output_dir() -> PathBuf { PathBuf::from("output") }
