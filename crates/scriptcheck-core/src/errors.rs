//! Error types for the validation pipeline
//!
//! Every variant of [`PipelineError`] is fatal to the current run. The
//! variants are split by the stage that raises them so that a failed run can
//! be reported with enough context to tell a bad input apart from a
//! misbehaving model or a broken container build.

use thiserror::Error;

use crate::pipeline::PipelineState;

#[derive(Error, Debug, Clone)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Input validation failed: {0}")]
    InputValidation(String),
    #[error("Potential prompt injection detected by '{check}': {detail}")]
    InjectionDetected { check: String, detail: String },
    #[error("LLM interaction failed: {0}")]
    LLMError(String),
    #[error("Incomplete model response: {0}")]
    IncompleteModelResponse(String),
    #[error("Invalid response format: {0}")]
    InvalidResponseFormat(String),
    #[error("Schema violation in {schema} response: {violations}")]
    SchemaViolation { schema: String, violations: String },
    #[error("Analysis rejected the script (verdict {verdict}): {reason}")]
    AnalysisRejected { verdict: String, reason: String },
    #[error("Invalid Docker configuration: {0}")]
    InvalidDockerConfig(String),
    #[error("Unsupported script type \"{script_type}\". Supported types: {supported}")]
    UnsupportedScriptType {
        script_type: String,
        supported: String,
    },
    #[error("Image build failed for '{image}': {message}")]
    ImageBuildFailed { image: String, message: String },
    #[error("Container execution failed: {0}")]
    ContainerExecution(String),
    #[error("Output directory error: {0}")]
    OutputDirectory(String),
    #[error("{operation} timed out after {seconds}s")]
    Timeout { operation: String, seconds: u64 },
    #[error("I/O error: {0}")]
    Io(String),
}

impl From<std::io::Error> for PipelineError {
    fn from(err: std::io::Error) -> Self {
        PipelineError::Io(err.to_string())
    }
}

impl From<reqwest::Error> for PipelineError {
    fn from(err: reqwest::Error) -> Self {
        PipelineError::LLMError(err.to_string())
    }
}

impl From<serde_json::Error> for PipelineError {
    fn from(err: serde_json::Error) -> Self {
        PipelineError::InvalidResponseFormat(err.to_string())
    }
}

/// A run that stopped before reaching `Done`, with the state it was in.
#[derive(Error, Debug, Clone)]
#[error("Pipeline failed while {failed_in}: {source}")]
pub struct PipelineFailure {
    pub failed_in: PipelineState,
    #[source]
    pub source: PipelineError,
}

impl PipelineFailure {
    pub fn new(failed_in: PipelineState, source: PipelineError) -> Self {
        Self { failed_in, source }
    }

    /// Process exit code for a failed run.
    pub fn exit_code(&self) -> i32 {
        1
    }
}

// Specific error for the Docker harness
#[derive(Error, Debug)]
pub enum DockerExecutorError {
    #[error("Bollard (Docker client) error: {0}")]
    BollardError(#[from] bollard::errors::Error),
    #[error("Image build failed: {0}")]
    BuildFailed(String),
    #[error("Container wait stream ended unexpectedly")]
    WaitStreamEnded,
    #[error("I/O error during Docker operation: {0}")]
    IoError(#[from] std::io::Error),
    #[error("{0} timed out after {1}s")]
    Timeout(String, u64),
}

impl From<DockerExecutorError> for PipelineError {
    fn from(err: DockerExecutorError) -> Self {
        match err {
            DockerExecutorError::Timeout(operation, seconds) => {
                PipelineError::Timeout { operation, seconds }
            }
            DockerExecutorError::IoError(e) => PipelineError::Io(e.to_string()),
            other => PipelineError::ContainerExecution(other.to_string()),
        }
    }
}
