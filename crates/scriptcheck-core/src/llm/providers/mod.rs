//! LLM provider implementations
//!
//! Only OpenAI-compatible endpoints are supported; a custom `api_base`
//! covers self-hosted and proxy deployments speaking the same protocol.

use std::sync::Arc;

use crate::config::LlmConfig;
use crate::errors::PipelineError;
use crate::llm::LLM;

pub mod openai;

/// Create an LLM client based on the configuration
pub fn create_llm_client(config: &LlmConfig) -> Result<Arc<dyn LLM>, PipelineError> {
    openai::create_client(config)
}
