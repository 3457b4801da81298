//! Local sentence embeddings via `fastembed`
//!
//! Runs an ONNX sentence-transformer in process. The weights are
//! downloaded on first use and the model is loaded once, lazily, on the
//! blocking pool.

use async_trait::async_trait;
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use reportqa_kernel::error::{EmbeddingError, ProviderError};
use reportqa_kernel::rag::Embedder;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, info};

/// Model used when `embedding.model` is empty.
pub const DEFAULT_FASTEMBED_MODEL: &str = "sentence-transformers/all-MiniLM-L6-v2";

const ENDPOINT: &str = "fastembed";

/// A model `fastembed` can run, resolved from a configured name.
#[derive(Debug, Clone)]
pub struct FastEmbedModel {
    pub model: EmbeddingModel,
    pub model_code: String,
    pub dimensions: usize,
}

/// `Qdrant/all-MiniLM-L6-v2-onnx` and `sentence-transformers/all-MiniLM-L6-v2`
/// both reduce to `all-minilm-l6-v2`.
fn base_name(name: &str) -> String {
    let name = name.rsplit('/').next().unwrap_or(name).to_lowercase();
    name.strip_suffix("-onnx").map(str::to_string).unwrap_or(name)
}

impl FastEmbedModel {
    /// Resolve `name` against the models `fastembed` supports.
    ///
    /// Accepts the exact model code (`Qdrant/all-MiniLM-L6-v2-onnx`), the
    /// variant name (`AllMiniLML6V2`), or the upstream repository name
    /// (`sentence-transformers/all-MiniLM-L6-v2`). An empty name selects
    /// [`DEFAULT_FASTEMBED_MODEL`].
    pub fn resolve(name: &str) -> Option<Self> {
        let name = match name.trim() {
            "" => DEFAULT_FASTEMBED_MODEL,
            other => other,
        };
        let supported = TextEmbedding::list_supported_models();

        let found = supported
            .iter()
            .find(|info| info.model_code.eq_ignore_ascii_case(name))
            .or_else(|| {
                supported
                    .iter()
                    .find(|info| format!("{:?}", info.model).eq_ignore_ascii_case(name))
            })
            .or_else(|| {
                let wanted = base_name(name);
                supported
                    .iter()
                    .find(|info| base_name(&info.model_code) == wanted)
            })?;

        Some(Self {
            model: found.model.clone(),
            model_code: found.model_code.clone(),
            dimensions: found.dim,
        })
    }
}

/// [`Embedder`] backed by a local `fastembed` model.
pub struct FastEmbedEmbedder {
    info: FastEmbedModel,
    model: OnceCell<Arc<TextEmbedding>>,
}

impl FastEmbedEmbedder {
    pub fn new(info: FastEmbedModel) -> Self {
        Self {
            info,
            model: OnceCell::new(),
        }
    }

    pub fn model_info(&self) -> &FastEmbedModel {
        &self.info
    }

    async fn model(&self) -> Result<Arc<TextEmbedding>, ProviderError> {
        self.model
            .get_or_try_init(|| async {
                let model = self.info.model.clone();
                info!(model = %self.info.model_code, "Loading local embedding model");
                let loaded = tokio::task::spawn_blocking(move || {
                    let mut options = InitOptions::default();
                    options.model_name = model;
                    options.show_download_progress = false;
                    TextEmbedding::try_new(options)
                })
                .await
                .map_err(|e| ProviderError::request(ENDPOINT, e))?
                .map_err(|e| ProviderError::request(ENDPOINT, e))?;
                Ok::<_, ProviderError>(Arc::new(loaded))
            })
            .await
            .cloned()
    }

    async fn embed(&self, input: Vec<String>) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let expected = input.len();
        let model = self.model().await?;
        let vectors = tokio::task::spawn_blocking(move || model.embed(input, None))
            .await
            .map_err(|e| ProviderError::request(ENDPOINT, e))?
            .map_err(|e| ProviderError::request(ENDPOINT, e))?;

        if vectors.len() != expected {
            return Err(EmbeddingError::CountMismatch {
                expected,
                actual: vectors.len(),
            });
        }
        if vectors.iter().any(Vec::is_empty) {
            return Err(EmbeddingError::EmptyVector);
        }
        debug!(model = %self.info.model_code, count = expected, "Local embeddings computed");
        Ok(vectors)
    }
}

#[async_trait]
impl Embedder for FastEmbedEmbedder {
    fn model_id(&self) -> &str {
        &self.info.model_code
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
