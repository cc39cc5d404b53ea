use crate::core_types::{Choice, FinishReason, LLMResponse, Usage};
use crate::errors::PipelineError;
use serde_json::Value;

pub struct ResponseParser;

impl ResponseParser {
    /// Convert a raw chat completion body into an [`LLMResponse`].
    ///
    /// A missing `choices` array is a wire-format error. An empty array is
    /// passed through untouched so the stage can report it as an incomplete
    /// response.
    pub fn parse_openai_response(response: Value) -> Result<LLMResponse, PipelineError> {
        let choices = response["choices"].as_array().ok_or_else(|| {
            PipelineError::LLMError("No choices array in completion response".to_string())
        })?;

        let choices = choices
            .iter()
            .map(|choice| Choice {
                content: choice["message"]["content"].as_str().map(|s| s.to_string()),
                finish_reason: Self::parse_finish_reason(&choice["finish_reason"]),
            })
            .collect();

        Ok(LLMResponse {
            choices,
            usage: Self::parse_usage(&response["usage"]),
        })
    }

    fn parse_finish_reason(value: &Value) -> Option<FinishReason> {
        match value.as_str()? {
            "stop" => Some(FinishReason::Stop),
            "length" => Some(FinishReason::Length),
            "content_filter" => Some(FinishReason::ContentFilter),
            "tool_calls" | "function_call" => Some(FinishReason::ToolCalls),
            _ => Some(FinishReason::Other),
        }
    }

    fn parse_usage(value: &Value) -> Option<Usage> {
        let field = |name: &str| value[name].as_u64().map(|n| n as u32);
        Some(Usage {
            prompt_tokens: field("prompt_tokens")?,
            completion_tokens: field("completion_tokens")?,
            total_tokens: field("total_tokens")?,
        })
    }
}
