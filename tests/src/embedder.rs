use async_trait::async_trait;
use parking_lot::Mutex;
use reportqa_kernel::error::{EmbeddingError, ProviderError};
use reportqa_kernel::rag::Embedder;

/// Embeds text as counts over a fixed keyword vocabulary.
///
/// Dimension `i` counts occurrences of `vocabulary[i]`; the final dimension
/// holds a small constant plus the number of out-of-vocabulary words, so no
/// vector is ever all zeros. Similarity is therefore easy to predict in tests.
pub struct KeywordEmbedder {
    vocabulary: Vec<String>,
    model_id: String,
    batches: Mutex<usize>,
}

impl KeywordEmbedder {
    pub fn new<I, S>(vocabulary: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let vocabulary: Vec<String> = vocabulary
            .into_iter()
            .map(|w| w.as_ref().to_lowercase())
            .collect();
        let model_id = format!("keyword-embedder-{}", vocabulary.len());
        Self {
            vocabulary,
            model_id,
            batches: Mutex::new(0),
        }
    }

    /// Number of vector dimensions produced.
    pub fn dimensions(&self) -> usize {
        self.vocabulary.len() + 1
    }

    /// Number of `embed_documents` calls so far.
    pub fn batch_count(&self) -> usize {
        *self.batches.lock()
    }

    fn vectorize(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0; self.dimensions()];
        let unknown = self.vocabulary.len();
        vector[unknown] = 0.1;

        for word in text.split_whitespace() {
            let word = word
                .trim_matches(|c: char| !c.is_alphanumeric() && c != '$')
                .to_lowercase();
            if word.is_empty() {
                continue;
            }
            match self.vocabulary.iter().position(|v| *v == word) {
                Some(i) => vector[i] += 1.0,
                None => vector[unknown] += 0.1,
            }
        }
        vector
    }
}

#[async_trait]
impl Embedder for KeywordEmbedder {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Err(EmbeddingError::EmptyInput);
        }
        *self.batches.lock() += 1;
        Ok(texts.iter().map(|t| self.vectorize(t)).collect())
    }

    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        if text.trim().is_empty() {
            return Err(EmbeddingError::EmptyQuery);
        }
        Ok(self.vectorize(text))
    }
}

/// An embedder whose endpoint is always unreachable.
#[derive(Default)]
pub struct FailingEmbedder;

#[async_trait]
impl Embedder for FailingEmbedder {
    fn model_id(&self) -> &str {
        "failing-embedder"
    }

    async fn embed_documents(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        Err(ProviderError::request("http://localhost:1234/v1/embeddings", "connection refused").into())
    }

    async fn embed_query(&self, _text: &str) -> Result<Vec<f32>, EmbeddingError> {
        Err(ProviderError::request("http://localhost:1234/v1/embeddings", "connection refused").into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn counts_vocabulary_words() {
        let embedder = KeywordEmbedder::new(["budget", "timeline"]);
        let v = embedder.embed_query("Budget, budget and timeline").await.unwrap();

        assert_eq!(v.len(), 3);
        assert_eq!(v[0], 2.0);
        assert_eq!(v[1], 1.0);
        assert!(v[2] > 0.1);
    }

    #[tokio::test]
    async fn failing_embedder_reports_provider_error() {
        let err = FailingEmbedder.embed_query("budget").await.unwrap_err();
        assert!(matches!(err, EmbeddingError::Provider(_)));
    }
}
