//! OpenAI-compatible embedding model
//!
//! Calls the `/embeddings` endpoint of OpenAI or any compatible server
//! (LM Studio, vLLM, text-embeddings-inference with the OpenAI router).

use crate::llm::{call_with_timeout, no_retry_backoff};
use async_openai::{Client, config::OpenAIConfig as AsyncOpenAIConfig, types::CreateEmbeddingRequestArgs};
use async_trait::async_trait;
use reportqa_kernel::error::{EmbeddingError, ProviderError};
use reportqa_kernel::rag::Embedder;
use std::time::Duration;
use tracing::debug;

/// Embedding endpoint configuration.
#[derive(Debug, Clone)]
pub struct OpenAiEmbedderConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    /// Requested output dimensions, for models that support shortening
    pub dimensions: Option<u32>,
    pub timeout: Option<Duration>,
}

impl Default for OpenAiEmbedderConfig {
    fn default() -> Self {
        Self {
            api_key: "lm-studio".to_string(),
            base_url: "http://localhost:1234/v1".to_string(),
            model: "sentence-transformers/all-MiniLM-L6-v2".to_string(),
            dimensions: None,
            timeout: None,
        }
    }
}

impl OpenAiEmbedderConfig {
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

    pub fn with_dimensions(mut self, dimensions: u32) -> Self {
        self.dimensions = Some(dimensions);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// [`Embedder`] backed by an OpenAI-compatible embeddings endpoint.
pub struct OpenAiEmbedder {
    client: Client<AsyncOpenAIConfig>,
    config: OpenAiEmbedderConfig,
}

impl OpenAiEmbedder {
    pub fn new(config: OpenAiEmbedderConfig) -> Self {
        let openai_config = AsyncOpenAIConfig::new()
            .with_api_key(&config.api_key)
            .with_api_base(&config.base_url);

        Self {
            client: Client::with_config(openai_config).with_backoff(no_retry_backoff()),
            config,
        }
    }

    pub fn config(&self) -> &OpenAiEmbedderConfig {
        &self.config
    }

    async fn request(&self, input: Vec<String>) -> Result<Vec<Vec<f32>>, ProviderError> {
        let endpoint = self.config.base_url.as_str();

        let mut builder = CreateEmbeddingRequestArgs::default();
        builder.model(&self.config.model).input(input);
        if let Some(dimensions) = self.config.dimensions {
            builder.dimensions(dimensions);
        }
        let request = builder
            .build()
            .map_err(|e| ProviderError::request(endpoint, e))?;

        let response = self
            .client
            .embeddings()
            .create(request)
            .await
            .map_err(|e| ProviderError::request(endpoint, e))?;

        let mut data = response.data;
        data.sort_by_key(|d| d.index);
        Ok(data.into_iter().map(|d| d.embedding).collect())
    }

    async fn embed(&self, input: Vec<String>) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let expected = input.len();
        let vectors =
            call_with_timeout(&self.config.base_url, self.config.timeout, self.request(input))
                .await?;

        if vectors.len() != expected {
            return Err(EmbeddingError::CountMismatch {
                expected,
                actual: vectors.len(),
            });
        }
        debug!(model = %self.config.model, count = expected, "Embeddings received");
        Ok(vectors)
    }
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    fn model_id(&self) -> &str {
        &self.config.model
    }

    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Err(EmbeddingError::EmptyInput);
        }
        self.embed(texts.to_vec()).await
    }

    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        if text.trim().is_empty() {
            return Err(EmbeddingError::EmptyQuery);
        }
        let mut vectors = self.embed(vec![text.to_string()]).await?;
        vectors.pop().ok_or(EmbeddingError::CountMismatch {
            expected: 1,
            actual: 0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn empty_inputs_fail_before_any_request() {
        let embedder = OpenAiEmbedder::new(
            OpenAiEmbedderConfig::default().with_base_url("http://127.0.0.1:9/v1"),
        );

        assert!(matches!(
            embedder.embed_query("  ").await,
            Err(EmbeddingError::EmptyQuery)
        ));
        assert!(matches!(
            embedder.embed_documents(&[]).await,
            Err(EmbeddingError::EmptyInput)
        ));
    }

    #[test]
    fn model_id_is_configured_model() {
        let embedder = OpenAiEmbedder::new(
            OpenAiEmbedderConfig::default()
                .with_model("text-embedding-3-small")
                .with_dimensions(256),
        );
        assert_eq!(embedder.model_id(), "text-embedding-3-small");
        assert_eq!(embedder.config().dimensions, Some(256));
    }

    #[tokio::test]
    async fn provider_failure_maps_to_embedding_error() {
        let embedder = OpenAiEmbedder::new(
            OpenAiEmbedderConfig::default()
                .with_base_url("http://127.0.0.1:9/v1")
                .with_timeout(Duration::from_secs(5)),
        );
        let err = embedder.embed_query("budget").await.unwrap_err();
        assert!(matches!(err, EmbeddingError::Provider(_)));
    }
}
