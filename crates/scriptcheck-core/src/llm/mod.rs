//! Language model provider abstractions and integrations.
//!
//! Defines the `LLM` trait the pipeline stages talk to and an
//! OpenAI-compatible chat completion client behind it.

pub use crate::core_types::{LLMResponse, Message};
use crate::errors::PipelineError;
use async_trait::async_trait;

pub mod providers;
pub mod response_parser;

pub use providers::openai::OpenAIClient;
pub use response_parser::ResponseParser;

#[async_trait]
pub trait LLM: Send + Sync {
    async fn generate(&self, messages: Vec<Message>) -> Result<LLMResponse, PipelineError>;
}
