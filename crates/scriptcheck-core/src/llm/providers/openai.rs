use crate::config::LlmConfig;
use crate::core_types::{LLMResponse, Message};
use crate::errors::PipelineError;
use crate::llm::{ResponseParser, LLM};
use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};

#[derive(Debug, Clone)]
pub struct OpenAIClient {
    client: Client,
    api_key: String,
    api_base: String,
    model: String,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
    request_timeout: Option<Duration>,
}

impl OpenAIClient {
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            api_base: "https://api.openai.com/v1".to_string(),
            model,
            temperature: None,
            max_tokens: None,
            request_timeout: None,
        }
    }

    pub fn with_api_base(mut self, api_base: String) -> Self {
        self.api_base = api_base.trim_end_matches('/').to_string();
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Result<Self, PipelineError> {
        self.client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PipelineError::Config(format!("Failed to build HTTP client: {}", e)))?;
        self.request_timeout = Some(timeout);
        Ok(self)
    }

    /// A timed-out transfer becomes [`PipelineError::Timeout`] so it reads the
    /// same as a container that overran its limit.
    fn transport_error(&self, context: &str, e: reqwest::Error) -> PipelineError {
        match self.request_timeout {
            Some(timeout) if e.is_timeout() => PipelineError::Timeout {
                operation: "model request".to_string(),
                seconds: timeout.as_secs(),
            },
            _ => PipelineError::LLMError(format!("{}: {}", context, e)),
        }
    }

    fn build_request_body(&self, messages: &[Message]) -> Value {
        let mut body = json!({
            "model": self.model,
            "messages": self.format_messages(messages),
        });

        if let Some(temp) = self.temperature {
            body["temperature"] = temp.into();
        }

        if let Some(max_tokens) = self.max_tokens {
            body["max_tokens"] = max_tokens.into();
        }

        body
    }

    fn format_messages(&self, messages: &[Message]) -> Vec<Value> {
        messages
            .iter()
            .map(|msg| {
                json!({
                    "role": msg.role.as_str(),
                    "content": msg.content
                })
            })
            .collect()
    }
}

#[async_trait]
impl LLM for OpenAIClient {
    async fn generate(&self, messages: Vec<Message>) -> Result<LLMResponse, PipelineError> {
        let url = format!("{}/chat/completions", self.api_base);
        let body = self.build_request_body(&messages);

        log::debug!("OpenAI API request to {} ({} messages)", url, messages.len());
        for (i, msg) in messages.iter().enumerate() {
            log::debug!("  Message #{}: role={:?}, {} bytes", i, msg.role, msg.content.len());
        }

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| self.transport_error("HTTP request failed", e))?;

        let status = response.status();
        let response_text = response
            .text()
            .await
            .map_err(|e| self.transport_error("Failed to read response", e))?;

        log::debug!("OpenAI API response ({}): {}", status, response_text);

        if !status.is_success() {
            return Err(PipelineError::LLMError(format!(
                "API request failed with status {}: {}",
                status, response_text
            )));
        }

        let response_json: Value = serde_json::from_str(&response_text).map_err(|e| {
            PipelineError::LLMError(format!("Invalid JSON completion body: {}", e))
        })?;

        ResponseParser::parse_openai_response(response_json)
    }
}

/// Create an OpenAI-compatible client from configuration
pub fn create_client(config: &LlmConfig) -> Result<Arc<dyn LLM>, PipelineError> {
    let api_key = config.api_key.clone().ok_or_else(|| {
        PipelineError::Config(format!(
            "No API key found for OpenAI. Set {}",
            config.api_key_env
        ))
    })?;

    let mut client = OpenAIClient::new(api_key, config.model.clone())
        .with_api_base(config.api_base.clone())
        .with_temperature(config.temperature);

    if let Some(max_tokens) = config.max_tokens {
        client = client.with_max_tokens(max_tokens);
    }
    if let Some(seconds) = config.request_timeout_secs {
        client = client.with_request_timeout(Duration::from_secs(seconds))?;
    }

    Ok(Arc::new(client))
}
