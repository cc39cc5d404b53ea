//! Model-facing pipeline stages
//!
//! Both stages follow the same sequence: check their inputs, extend the
//! conversation with screened messages, request one completion, reject
//! incomplete completions, then validate the reply against the stage's
//! schema.

use std::fmt;

use crate::conversation::Conversation;
use crate::core_types::LLMResponse;
use crate::errors::PipelineError;
use crate::guardrails::InjectionGuard;
use crate::llm::LLM;
use crate::validation::StructuredResponseValidator;

pub mod analysis;
pub mod prompts;
pub mod synthesis;

pub use analysis::analyze_script;
pub use synthesis::synthesize_docker_artifacts;

/// Orchestrator states, in the order a successful run visits them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Init,
    Analyzing,
    VerdictChecked,
    Synthesizing,
    Materialized,
    Executing,
    Compared,
    Done,
    Failed,
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineState::Init => "initializing",
            PipelineState::Analyzing => "analyzing",
            PipelineState::VerdictChecked => "checking the verdict",
            PipelineState::Synthesizing => "synthesizing",
            PipelineState::Materialized => "materialized",
            PipelineState::Executing => "executing",
            PipelineState::Compared => "comparing",
            PipelineState::Done => "done",
            PipelineState::Failed => "failed",
        };
        write!(f, "{}", name)
    }
}

/// Collaborators shared by both stages.
pub struct StageContext<'a> {
    pub llm: &'a dyn LLM,
    pub guard: &'a InjectionGuard,
    pub validator: &'a StructuredResponseValidator,
}

impl<'a> StageContext<'a> {
    /// Send the conversation, check the completion and append the reply.
    pub async fn complete(
        &self,
        conversation: Conversation,
        stage: &str,
    ) -> Result<(String, Conversation), PipelineError> {
        log::info!(
            "Requesting {} completion ({} messages)",
            stage,
            conversation.messages().len()
        );
        let response = self.llm.generate(conversation.messages().to_vec()).await?;
        let content = check_completion(&response)?.to_string();
        log::debug!("{} completion: {}", stage, content);
        Ok((content.clone(), conversation.push_reply(content)))
    }
}

/// Returns the first choice's text if the completion is usable.
pub fn check_completion(response: &LLMResponse) -> Result<&str, PipelineError> {
    let choice = response.choices.first().ok_or_else(|| {
        PipelineError::IncompleteModelResponse("Model returned no choices".to_string())
    })?;

    if let Some(reason) = &choice.finish_reason {
        if reason.is_incomplete() {
            return Err(PipelineError::IncompleteModelResponse(format!(
                "Response was cut off (finish reason {:?})",
                reason
            )));
        }
    }

    match choice.content.as_deref() {
        Some(content) if !content.trim().is_empty() => Ok(content),
        _ => Err(PipelineError::IncompleteModelResponse(
            "Response content is empty".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_types::{Choice, FinishReason};

    fn response(content: Option<&str>, finish_reason: Option<FinishReason>) -> LLMResponse {
        LLMResponse {
            choices: vec![Choice {
                content: content.map(|s| s.to_string()),
                finish_reason,
            }],
            usage: None,
        }
    }

    #[test]
    fn test_complete_response_passes() {
        let ok = response(Some("{}"), Some(FinishReason::Stop));
        assert_eq!(check_completion(&ok).unwrap(), "{}");

        let no_reason = response(Some("{}"), None);
        assert!(check_completion(&no_reason).is_ok());
    }

    #[test]
    fn test_incomplete_responses_are_rejected() {
        let cases = [
            LLMResponse { choices: vec![], usage: None },
            response(Some("{\"partial\":"), Some(FinishReason::Length)),
            response(Some("{}"), Some(FinishReason::ContentFilter)),
            response(None, Some(FinishReason::Stop)),
            response(Some("   \n"), Some(FinishReason::Stop)),
        ];
        for case in cases {
            assert!(
                matches!(
                    check_completion(&case),
                    Err(PipelineError::IncompleteModelResponse(_))
                ),
                "{case:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_state_display() {
        assert_eq!(PipelineState::VerdictChecked.to_string(), "checking the verdict");
        assert_eq!(PipelineState::Failed.to_string(), "failed");
    }
}
