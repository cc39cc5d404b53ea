//! Configuration loader for YAML files and environment resolution
//!
//! Loading order: `.env` in the working directory (if present), the YAML
//! file (if given), environment overrides, API key resolution, validation.
//! A missing API key is fatal here so that no pipeline stage ever starts
//! without credentials.

use crate::config::types::*;
use crate::errors::PipelineError;
use std::env;
use std::path::Path;
use tokio::fs;

/// Configuration loader with environment resolution
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load the configuration used by the CLI.
    pub async fn load(path: Option<&Path>) -> Result<ScriptCheckConfig, PipelineError> {
        let env_file = Path::new(".env");
        if env_file.exists() {
            log::debug!("Loading environment from {}", env_file.display());
            Self::load_env_file(env_file)?;
        }

        match path {
            Some(path) => Self::from_file(path).await,
            None => Self::from_str("{}"),
        }
    }

    /// Load configuration from a YAML file
    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<ScriptCheckConfig, PipelineError> {
        let path = path.as_ref();

        let content = fs::read_to_string(path).await.map_err(|e| {
            PipelineError::Config(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;

        Self::from_str(&content)
    }

    /// Load configuration from a YAML string
    pub fn from_str(content: &str) -> Result<ScriptCheckConfig, PipelineError> {
        let mut config: ScriptCheckConfig = serde_yaml::from_str(content)
            .map_err(|e| PipelineError::Config(format!("Failed to parse YAML config: {}", e)))?;

        Self::apply_env_overrides(&mut config);
        Self::resolve_llm_auth(&mut config.llm)?;
        config.validate()?;

        Ok(config)
    }

    fn apply_env_overrides(config: &mut ScriptCheckConfig) {
        if let Ok(base_url) = env::var("OPENAI_BASE_URL") {
            if !base_url.trim().is_empty() {
                config.llm.api_base = base_url;
            }
        }
        if let Ok(model) = env::var("OPENAI_MODEL") {
            if !model.trim().is_empty() {
                config.llm.model = model;
            }
        }
    }

    /// Resolve LLM authentication from environment
    fn resolve_llm_auth(llm: &mut LlmConfig) -> Result<(), PipelineError> {
        match env::var(&llm.api_key_env) {
            Ok(api_key) if !api_key.trim().is_empty() => {
                llm.api_key = Some(api_key);
                Ok(())
            }
            _ => Err(PipelineError::Config(format!(
                "{} environment variable is not set",
                llm.api_key_env
            ))),
        }
    }

    /// Set variables from a dotenv-style file without overriding the
    /// process environment.
    fn load_env_file<P: AsRef<Path>>(path: P) -> Result<(), PipelineError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            PipelineError::Config(format!(
                "Failed to read env file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if let Some((key, value)) = line.split_once('=') {
                let key = key.trim().trim_start_matches("export ").trim();
                let value = value.trim().trim_matches('"').trim_matches('\'');
                if env::var_os(key).is_none() {
                    env::set_var(key, value);
                }
            }
        }

        Ok(())
    }
}
