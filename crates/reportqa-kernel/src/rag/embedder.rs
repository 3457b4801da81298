//! Embedder trait definition
//!
//! The text-to-vector collaborator. Concrete implementations (hash-based,
//! OpenAI-compatible) live in reportqa-foundation.

use crate::error::EmbeddingError;
use async_trait::async_trait;

/// Abstract interface over an embedding model.
///
/// Every vector produced by one model must have the same dimensionality.
/// The vector index records [`Embedder::model_id`] when it is persisted so a
/// reload with a different model can be reported.
///
/// # Example
///
/// ```rust,ignore
/// let vectors = embedder.embed_documents(&texts).await?;
/// let query = embedder.embed_query("What is the total budget?").await?;
/// ```
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Identity of the embedding model.
    fn model_id(&self) -> &str;

    /// Embed a batch of texts, one vector per input, in input order.
    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError>;

    /// Embed a single query string.
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;
}
