//! Blocking HTTP client for the chat-completions endpoint.

use crate::wire::{parse_completion, status_error, CompletionRequest};
use doc_chat_core::{ApiKey, ChatGateway, ChatRequest, Error, Result};
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";

/// Settings for [`OpenAiGateway`].
#[derive(Debug, Clone, PartialEq)]
pub struct OpenAiConfig {
    /// API root, without a trailing `/chat/completions`.
    pub base_url: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub timeout_secs: u64,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            max_tokens: 1500,
            temperature: 0.7,
            timeout_secs: 120,
        }
    }
}

impl OpenAiConfig {
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }
}

/// [`ChatGateway`] backed by an OpenAI-compatible HTTP API.
#[derive(Debug)]
pub struct OpenAiGateway {
    config: OpenAiConfig,
    agent: ureq::Agent,
}

impl OpenAiGateway {
    pub fn new(config: OpenAiConfig) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build();
        Self { config, agent }
    }

    pub fn config(&self) -> &OpenAiConfig {
        &self.config
    }
}

impl Default for OpenAiGateway {
    fn default() -> Self {
        Self::new(OpenAiConfig::default())
    }
}

impl ChatGateway for OpenAiGateway {
    fn send(&self, request: &ChatRequest, credential: &ApiKey) -> Result<String> {
        let url = self.config.endpoint("chat/completions");
        let body = CompletionRequest {
            model: &self.config.model,
            messages: &request.messages,
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        };
        log::debug!(
            "POST {} ({} messages, model {})",
            url,
            request.messages.len(),
            self.config.model
        );

        let response = self
            .agent
            .post(&url)
            .set("Authorization", &bearer(credential))
            .send_json(&body)
            .map_err(classify)?;

        let status = response.status();
        let text = response
            .into_string()
            .map_err(|e| Error::Network(format!("failed to read response: {}", e)))?;
        parse_completion(status, &text)
    }

    /// Lists models, which succeeds for any key the provider accepts.
    fn verify(&self, credential: &ApiKey) -> Result<()> {
        let url = self.config.endpoint("models");
        log::debug!("GET {}", url);

        self.agent
            .get(&url)
            .set("Authorization", &bearer(credential))
            .call()
            .map_err(classify)?;
        Ok(())
    }
}

fn bearer(credential: &ApiKey) -> String {
    format!("Bearer {}", credential.expose())
}

/// Map a ureq failure onto the session's error kinds.
fn classify(error: ureq::Error) -> Error {
    match error {
        ureq::Error::Status(status, response) => {
            let body = response.into_string().unwrap_or_default();
            log::warn!("Provider returned status {}", status);
            status_error(status, &body)
        }
        ureq::Error::Transport(transport) => Error::Network(transport.to_string()),
    }
}
