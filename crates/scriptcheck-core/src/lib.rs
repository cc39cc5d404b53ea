//! LLM-driven, container-verified script validation.
//!
//! A run hands a script and its README to a language model, which classifies
//! the script, judges whether it works and proposes test cases. If the model
//! approves, it is asked for a Dockerfile and README; those are written to an
//! output directory, built into an image and run with the first proposed
//! test's input. The container's output is then compared with the model's
//! prediction.
//!
//! # Layout
//!
//! - **Guardrails and validation**: prompt-injection screening of outgoing
//!   text, size and shape limits on inputs, JSON-schema checks on replies
//! - **Language model access**: the [`LLM`] trait and an OpenAI-compatible
//!   client
//! - **Pipeline stages**: analysis and synthesis over a shared
//!   [`conversation::Conversation`]
//! - **Execution**: the [`executors::ScriptExecutor`] trait and its Docker
//!   implementation
//! - **Orchestration**: [`ScriptValidator`] drives the stages and produces a
//!   [`ValidationReport`]

pub mod config;
pub mod conversation;
pub mod core_types;
pub mod errors;
pub mod executors;
pub mod guardrails;
pub mod llm;
pub mod models;
pub mod orchestrator;
pub mod output;
pub mod pipeline;
pub mod validation;
pub mod verdict;

pub use config::{ConfigLoader, LanguageRegistry, ScriptCheckConfig};
pub use errors::{PipelineError, PipelineFailure};
pub use executors::{DockerScriptExecutor, ScriptExecutor};
pub use llm::LLM;
pub use orchestrator::ScriptValidator;
pub use verdict::ValidationReport;

#[cfg(test)]
pub mod test_utils;
