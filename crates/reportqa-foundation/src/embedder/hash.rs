//! Feature-hashing embedder
//!
//! Produces L2-normalised vectors from word and character-bigram hashes.
//! No model download or network access is needed, so it backs offline
//! runs and tests. Retrieval quality is lexical, not semantic.

use async_trait::async_trait;
use reportqa_kernel::error::EmbeddingError;
use reportqa_kernel::rag::Embedder;

/// Self-contained embedder based on FNV-1a hashing.
///
/// # Example
///
/// ```rust,ignore
/// use reportqa_foundation::HashEmbedder;
///
/// let embedder = HashEmbedder::new(256);
/// let v = embedder.embed_query("What is the total budget?").await?;
/// assert_eq!(v.len(), 256);
/// ```
#[derive(Debug, Clone)]
pub struct HashEmbedder {
    dims: usize,
    model_id: String,
}

impl HashEmbedder {
    /// Create an embedder with `dims` dimensions (at least 1).
    pub fn new(dims: usize) -> Self {
        let dims = dims.max(1);
        Self {
            dims,
            model_id: format!("hash-embedder-{dims}"),
        }
    }

    pub fn dimensions(&self) -> usize {
        self.dims
    }

    fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut embedding = vec![0.0f32; self.dims];
        let lower = text.to_lowercase();

        // Word features (weight 1.0), punctuation stripped from the edges
        for word in lower.split_whitespace() {
            let word = word.trim_matches(|c: char| !c.is_alphanumeric() && c != '$');
            if word.is_empty() {
                continue;
            }
            let h = fnv1a(word.as_bytes());
            embedding[(h % self.dims as u64) as usize] += 1.0;
        }

        // Character bigrams (weight 0.5) for partial matches
        let bytes = lower.as_bytes();
        for bigram in bytes.windows(2) {
            let h = fnv1a(bigram);
            embedding[(h % self.dims as u64) as usize] += 0.5;
        }

        let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut embedding {
                *v /= norm;
            }
        }

        embedding
    }
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self::new(256)
    }
}

#[async_trait]
impl Embedder for HashEmbedder {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Err(EmbeddingError::EmptyInput);
        }
        Ok(texts.iter().map(|t| self.embed_text(t)).collect())
    }

    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        if text.trim().is_empty() {
            return Err(EmbeddingError::EmptyQuery);
        }
        Ok(self.embed_text(text))
    }
}

/// FNV-1a 64-bit hash.
fn fnv1a(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 14695981039346656037;
    for &b in bytes {
        hash ^= b as u64;
        hash = hash.wrapping_mul(1099511628211);
    }
    hash
}
