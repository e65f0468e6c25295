//! Client for the hosted LLM agent runtime.
//!
//! The runtime speaks the Ollama chat protocol: a non-streaming
//! `POST /api/chat` with a system and a user message.

use crate::config::ModelConfig;
use crate::prompts::PromptError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Errors raised while invoking an agent.
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    #[error("Failed to build HTTP client: {0}")]
    Client(String),

    #[error("Cannot connect to agent runtime at {0}")]
    Connect(String),

    #[error("Request timed out after {0}s")]
    Timeout(u64),

    #[error("Failed to send request: {0}")]
    Request(String),

    #[error("Agent runtime error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Failed to parse agent runtime response: {0}")]
    Decode(String),

    #[error("Agent runtime returned an empty answer")]
    EmptyResponse,

    #[error("Prompt template error: {0}")]
    Prompt(#[from] PromptError),
}

/// A hosted model that turns a prompt into free text.
#[async_trait]
pub trait AgentRuntime: Send + Sync {
    /// Name of the model answering the prompts.
    fn model(&self) -> &str;

    /// Send a system and user prompt, returning the model's answer.
    async fn complete(&self, system: &str, prompt: &str) -> Result<String, AgentError>;
}

/// Message in the chat request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    fn new(role: &str, content: &str) -> Self {
        Self {
            role: role.to_string(),
            content: content.to_string(),
        }
    }
}

/// Chat API request.
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    stream: bool,
    options: ChatOptions,
}

#[derive(Debug, Serialize)]
struct ChatOptions {
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<usize>,
}

/// Chat API response.
#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: ChatMessage,
}

/// Agent runtime reached over HTTP.
pub struct HttpAgentRuntime {
    http_client: reqwest::Client,
    runtime_url: String,
    model: String,
    temperature: f32,
    max_tokens: Option<usize>,
    timeout_seconds: u64,
    api_key: Option<String>,
}

impl HttpAgentRuntime {
    /// Create a runtime client from model settings.
    pub fn new(config: &ModelConfig) -> Result<Self, AgentError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| AgentError::Client(e.to_string()))?;

        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty());

        Ok(Self {
            http_client,
            runtime_url: config.runtime_url.trim_end_matches('/').to_string(),
            model: config.name.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            timeout_seconds: config.timeout_seconds,
            api_key,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/api/chat", self.runtime_url)
    }
}

#[async_trait]
impl AgentRuntime for HttpAgentRuntime {
    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, system: &str, prompt: &str) -> Result<String, AgentError> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage::new("system", system),
                ChatMessage::new("user", prompt),
            ],
            stream: false,
            options: ChatOptions {
                temperature: self.temperature,
                num_predict: self.max_tokens,
            },
        };

        debug!("Sending {} byte prompt to {}", prompt.len(), self.endpoint());

        let mut builder = self.http_client.post(self.endpoint()).json(&request);
        if let Some(ref key) = self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                AgentError::Timeout(self.timeout_seconds)
            } else if e.is_connect() {
                AgentError::Connect(self.runtime_url.clone())
            } else {
                AgentError::Request(e.to_string())
            }
        })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(AgentError::Api { status, body });
        }

        let chat_response: ChatResponse = response
            .json()
            .await
            .map_err(|e| AgentError::Decode(e.to_string()))?;

        let content = chat_response.message.content.trim();
        if content.is_empty() {
            return Err(AgentError::EmptyResponse);
        }

        Ok(content.to_string())
    }
}
