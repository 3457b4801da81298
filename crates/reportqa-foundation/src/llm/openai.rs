//! OpenAI-compatible chat completion model
//!
//! Uses the `async-openai` crate against any server exposing the OpenAI
//! chat completions API: OpenAI itself, LM Studio, vLLM, Ollama's `/v1`.
//!
//! # Example
//!
//! ```rust,ignore
//! use reportqa_foundation::llm::{OpenAiChatConfig, OpenAiChatModel};
//!
//! let model = OpenAiChatModel::new(
//!     OpenAiChatConfig::lm_studio()
//!         .with_model("llama-2-7b-chat")
//!         .with_timeout(Duration::from_secs(120)),
//! );
//! let answer = model.complete("Say hello").await?;
//! ```

use super::{call_with_timeout, no_retry_backoff};
use async_openai::{
    Client,
    config::OpenAIConfig as AsyncOpenAIConfig,
    types::{ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs},
};
use async_trait::async_trait;
use reportqa_kernel::error::ProviderError;
use reportqa_kernel::rag::CompletionModel;
use std::time::Duration;
use tracing::debug;

/// Chat model configuration.
#[derive(Debug, Clone)]
pub struct OpenAiChatConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
    pub timeout: Option<Duration>,
}

impl Default for OpenAiChatConfig {
    fn default() -> Self {
        Self::lm_studio()
    }
}

impl OpenAiChatConfig {
    /// Local LM Studio server defaults.
    pub fn lm_studio() -> Self {
        Self {
            api_key: "lm-studio".to_string(),
            base_url: "http://localhost:1234/v1".to_string(),
            model: "llama-2-7b-chat".to_string(),
            temperature: 0.0,
            max_tokens: None,
            timeout: None,
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = api_key.into();
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, tokens: u32) -> Self {
        self.max_tokens = Some(tokens);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// [`CompletionModel`] backed by an OpenAI-compatible chat endpoint.
///
/// The prompt is sent as a single user message.
pub struct OpenAiChatModel {
    client: Client<AsyncOpenAIConfig>,
    config: OpenAiChatConfig,
}

impl OpenAiChatModel {
    pub fn new(config: OpenAiChatConfig) -> Self {
        let openai_config = AsyncOpenAIConfig::new()
            .with_api_key(&config.api_key)
            .with_api_base(&config.base_url);

        Self {
            client: Client::with_config(openai_config).with_backoff(no_retry_backoff()),
            config,
        }
    }

    pub fn config(&self) -> &OpenAiChatConfig {
        &self.config
    }

    async fn request(&self, prompt: &str) -> Result<String, ProviderError> {
        let endpoint = self.config.base_url.as_str();

        let message = ChatCompletionRequestUserMessageArgs::default()
            .content(prompt)
            .build()
            .map_err(|e| ProviderError::request(endpoint, e))?;

        let mut builder = CreateChatCompletionRequestArgs::default();
        builder
            .model(&self.config.model)
            .messages(vec![message.into()])
            .temperature(self.config.temperature);
        if let Some(max_tokens) = self.config.max_tokens {
            builder.max_tokens(max_tokens);
        }
        let request = builder
            .build()
            .map_err(|e| ProviderError::request(endpoint, e))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| ProviderError::request(endpoint, e))?;

        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| ProviderError::invalid_response(endpoint, "no message content"))?;

        debug!(model = %self.config.model, chars = content.len(), "Chat completion received");
        Ok(content)
    }
}

#[async_trait]
impl CompletionModel for OpenAiChatModel {
    fn model_id(&self) -> &str {
        &self.config.model
    }

    async fn complete(&self, prompt: &str) -> Result<String, ProviderError> {
        call_with_timeout(&self.config.base_url, self.config.timeout, self.request(prompt)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_target_lm_studio() {
        let config = OpenAiChatConfig::default();
        assert_eq!(config.base_url, "http://localhost:1234/v1");
        assert_eq!(config.model, "llama-2-7b-chat");
        assert_eq!(config.api_key, "lm-studio");
        assert_eq!(config.temperature, 0.0);
        assert!(config.timeout.is_none());
    }

    #[test]
    fn builder_overrides() {
        let config = OpenAiChatConfig::lm_studio()
            .with_base_url("http://gpu-box:8000/v1")
            .with_model("mistral-7b-instruct")
            .with_max_tokens(512)
            .with_timeout(Duration::from_secs(30));

        let model = OpenAiChatModel::new(config);
        assert_eq!(model.model_id(), "mistral-7b-instruct");
        assert_eq!(model.config().max_tokens, Some(512));
        assert_eq!(model.config().timeout, Some(Duration::from_secs(30)));
    }

    #[tokio::test]
    async fn unreachable_server_is_request_error() {
        // Port 9 (discard) is not an HTTP server.
        let model = OpenAiChatModel::new(
            OpenAiChatConfig::lm_studio()
                .with_base_url("http://127.0.0.1:9/v1")
                .with_timeout(Duration::from_secs(5)),
        );
        let err = model.complete("hello").await.unwrap_err();
        assert!(matches!(
            err,
            ProviderError::Request { .. } | ProviderError::Timeout { .. }
        ));
    }
}
