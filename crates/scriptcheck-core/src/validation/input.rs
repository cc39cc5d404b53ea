//! Size and shape checks on the inputs embedded in model prompts

use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::DockerConfig;
use crate::errors::PipelineError;

pub const MAX_SCRIPT_SIZE: usize = 1024 * 1024;
pub const MAX_README_SIZE: usize = 100 * 1024;

static SCRIPT_NAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[\w\-.]+$").unwrap());
static BASE_IMAGE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[\w\-/:.]+$").unwrap());
static EXEC_PREFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^/[\w\-/]+$").unwrap());

pub fn validate_script_input(script_content: &str, script_name: &str) -> Result<(), PipelineError> {
    if script_content.len() > MAX_SCRIPT_SIZE {
        return Err(PipelineError::InputValidation(format!(
            "Script size {} bytes exceeds maximum allowed size of {} bytes",
            script_content.len(),
            MAX_SCRIPT_SIZE
        )));
    }

    if !SCRIPT_NAME.is_match(script_name) {
        return Err(PipelineError::InputValidation(format!(
            "Invalid script name format: {:?}",
            script_name
        )));
    }

    if script_name.contains("..") || script_name.contains('/') {
        return Err(PipelineError::InputValidation(format!(
            "Path traversal attempt detected in script name: {:?}",
            script_name
        )));
    }

    Ok(())
}

pub fn validate_readme_content(readme_content: &str) -> Result<(), PipelineError> {
    if readme_content.len() > MAX_README_SIZE {
        return Err(PipelineError::InputValidation(format!(
            "README size {} bytes exceeds maximum allowed size of {} bytes",
            readme_content.len(),
            MAX_README_SIZE
        )));
    }
    Ok(())
}

pub fn validate_docker_config(config: &DockerConfig) -> Result<(), PipelineError> {
    if !BASE_IMAGE.is_match(&config.base_image) {
        return Err(PipelineError::InvalidDockerConfig(format!(
            "Invalid base image format: {:?}",
            config.base_image
        )));
    }

    if !EXEC_PREFIX.is_match(&config.exec_prefix) {
        return Err(PipelineError::InvalidDockerConfig(format!(
            "Execution prefix must be an absolute path, got {:?}",
            config.exec_prefix
        )));
    }

    if config.entrypoint.is_empty() {
        return Err(PipelineError::InvalidDockerConfig(
            "Entrypoint must contain at least one element".to_string(),
        ));
    }

    if config.entrypoint.iter().any(|part| part.trim().is_empty()) {
        return Err(PipelineError::InvalidDockerConfig(
            "Entrypoint elements must not be empty".to_string(),
        ));
    }

    Ok(())
}
