//! Append-only message log shared by the pipeline stages
//!
//! A `Conversation` is passed by value into each stage and handed back with
//! the stage's exchange appended, so the synthesis request carries the
//! analysis exchange as context without any hidden shared state.

use crate::core_types::Message;
use crate::errors::PipelineError;
use crate::guardrails::InjectionGuard;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Append a message that is headed to the model after screening it.
    pub fn push_screened(
        mut self,
        guard: &InjectionGuard,
        message: Message,
    ) -> Result<Self, PipelineError> {
        guard.screen(&message.content)?;
        self.messages.push(message);
        Ok(self)
    }

    /// Append the model's own reply.
    pub fn push_reply(mut self, content: impl Into<String>) -> Self {
        self.messages.push(Message::assistant(content));
        self
    }
}
