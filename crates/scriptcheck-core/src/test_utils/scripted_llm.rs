// In-process LLM that replays canned responses and records every request.
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

use crate::core_types::{LLMResponse, Message};
use crate::errors::PipelineError;
use crate::llm::LLM;

pub struct ScriptedLLM {
    responses: Mutex<VecDeque<Result<LLMResponse, PipelineError>>>,
    requests: Mutex<Vec<Vec<Message>>>,
}

impl ScriptedLLM {
    pub fn new(responses: Vec<Result<LLMResponse, PipelineError>>) -> Self {
        Self {
            responses: Mutex::new(VecDeque::from(responses)),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn replying(texts: &[&str]) -> Self {
        Self::new(texts.iter().map(|t| Ok(LLMResponse::from_text(*t))).collect())
    }

    pub fn requests(&self) -> Vec<Vec<Message>> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl LLM for ScriptedLLM {
    async fn generate(&self, messages: Vec<Message>) -> Result<LLMResponse, PipelineError> {
        self.requests.lock().unwrap().push(messages);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(PipelineError::LLMError("no scripted response left".to_string())))
    }
}
