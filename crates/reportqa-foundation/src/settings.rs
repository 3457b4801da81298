//! Application settings
//!
//! Layered, later sources win:
//!
//! 1. built-in defaults (a local LM Studio deployment)
//! 2. the legacy variables `ENV`, `EMBEDDING_MODEL_NAME`, `LMSTUDIO_API_KEY`,
//!    `LMSTUDIO_API_BASE`, `LMSTUDIO_MODEL`, `VECTOR_STORE_DIR`
//! 3. an optional config file (TOML, YAML, JSON, ...) with `${VAR}` substitution
//! 4. `REPORTQA__SECTION__KEY` variables, e.g. `REPORTQA__LLM__MODEL`
//!
//! # Example (reportqa.toml)
//!
//! ```toml
//! env = "local"
//! vector_store_dir = "vector_store"
//!
//! [embedding]
//! # hash (default, offline), openai, or fastembed (feature-gated)
//! provider = "openai"
//! model = "text-embedding-nomic-embed-text-v1.5"
//! base_url = "${LMSTUDIO_API_BASE}"
//!
//! [llm]
//! model = "llama-2-7b-chat"
//! timeout_secs = 120
//!
//! [retrieval]
//! similarity_k = 4
//! comparative_keywords = ["compare", "versus", "across"]
//! metric = "cosine"
//! ```

use crate::embedder::{HashEmbedder, OpenAiEmbedder, OpenAiEmbedderConfig};
use crate::llm::{OpenAiChatConfig, OpenAiChatModel};
use crate::rag::chunker::ChunkerConfig;
use crate::rag::index::VectorIndex;
use crate::rag::orchestrator::RetrievalConfig;
use crate::rag::router::{DEFAULT_COMPARATIVE_KEYWORDS, RetrievalRouter};
use reportqa_kernel::config::{ConfigError, ConfigResult, load_layered};
use reportqa_kernel::rag::{CompletionModel, Embedder, SimilarityMetric};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// Prefix of the structured environment overrides.
pub const ENV_PREFIX: &str = "REPORTQA";

const DEFAULT_HASH_DIMENSIONS: usize = 256;

/// Which embedder backs the index.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbedderProvider {
    /// Offline feature hashing
    #[default]
    Hash,
    /// OpenAI-compatible `/embeddings` endpoint
    #[serde(rename = "openai")]
    OpenAi,
    /// Local ONNX model; needs the `fastembed` feature
    FastEmbed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    pub provider: EmbedderProvider,
    /// Model name; empty uses the provider default. The hash provider has no model.
    pub model: String,
    pub base_url: String,
    pub api_key: String,
    /// Output size; 0 uses the provider default
    pub dimensions: usize,
    /// Per-call timeout; 0 disables it
    pub timeout_secs: u64,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            provider: EmbedderProvider::Hash,
            model: String::new(),
            base_url: "http://localhost:1234/v1".to_string(),
            api_key: "lm-studio".to_string(),
            dimensions: 0,
            timeout_secs: 60,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    pub base_url: String,
    pub model: String,
    pub api_key: String,
    pub temperature: f32,
    /// Completion limit; 0 leaves it to the server
    pub max_tokens: u32,
    /// Per-call timeout; 0 disables it
    pub timeout_secs: u64,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:1234/v1".to_string(),
            model: "llama-2-7b-chat".to_string(),
            api_key: "lm-studio".to_string(),
            temperature: 0.0,
            max_tokens: 0,
            timeout_secs: 120,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    pub similarity_k: usize,
    pub mmr_k: usize,
    pub mmr_fetch_k: usize,
    pub mmr_lambda: f32,
    pub context_limit: usize,
    pub comparative_keywords: Vec<String>,
    pub metric: SimilarityMetric,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        let config = RetrievalConfig::default();
        Self {
            similarity_k: config.similarity_k,
            mmr_k: config.mmr_k,
            mmr_fetch_k: config.mmr_fetch_k,
            mmr_lambda: config.mmr_lambda,
            context_limit: config.context_limit,
            comparative_keywords: DEFAULT_COMPARATIVE_KEYWORDS
                .iter()
                .map(|k| k.to_string())
                .collect(),
            metric: SimilarityMetric::default(),
        }
    }
}

/// Root settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Deployment environment (`local`, `production`, ...)
    pub env: String,
    pub vector_store_dir: PathBuf,
    pub embedding: EmbeddingSettings,
    pub llm: LlmSettings,
    pub chunking: ChunkerConfig,
    pub retrieval: RetrievalSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            env: "local".to_string(),
            vector_store_dir: PathBuf::from("vector_store"),
            embedding: EmbeddingSettings::default(),
            llm: LlmSettings::default(),
            chunking: ChunkerConfig::default(),
            retrieval: RetrievalSettings::default(),
        }
    }
}

impl Settings {
    /// Load and validate settings from every layer.
    pub fn load(path: Option<&Path>) -> ConfigResult<Self> {
        let base = Self::default().with_legacy_env(|name| std::env::var(name).ok());
        let settings = load_layered(&base, path, ENV_PREFIX)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Apply the flat legacy variables, looked up through `lookup`.
    #[must_use]
    pub fn with_legacy_env(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let lookup = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(env) = lookup("ENV") {
            self.env = env;
        }
        if let Some(model) = lookup("EMBEDDING_MODEL_NAME") {
            self.embedding.model = model;
        }
        if let Some(key) = lookup("LMSTUDIO_API_KEY") {
            self.llm.api_key = key;
        }
        if let Some(base) = lookup("LMSTUDIO_API_BASE") {
            self.llm.base_url = base.trim().to_string();
        }
        if let Some(model) = lookup("LMSTUDIO_MODEL") {
            self.llm.model = model;
        }
        if let Some(dir) = lookup("VECTOR_STORE_DIR") {
            self.vector_store_dir = PathBuf::from(dir);
        }
        self
    }

    pub fn validate(&self) -> ConfigResult<()> {
        self.chunking
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        self.retrieval_config()
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        if self.llm.model.trim().is_empty() {
            return Err(ConfigError::Invalid("llm.model must not be empty".to_string()));
        }
        if self.embedding.provider == EmbedderProvider::FastEmbed {
            self.fastembed_model()?;
        }
        Ok(())
    }

    pub fn is_production(&self) -> bool {
        self.env.eq_ignore_ascii_case("production")
    }

    pub fn is_local(&self) -> bool {
        self.env.eq_ignore_ascii_case("local")
    }

    pub fn retrieval_config(&self) -> RetrievalConfig {
        RetrievalConfig {
            similarity_k: self.retrieval.similarity_k,
            mmr_k: self.retrieval.mmr_k,
            mmr_fetch_k: self.retrieval.mmr_fetch_k,
            mmr_lambda: self.retrieval.mmr_lambda,
            context_limit: self.retrieval.context_limit,
        }
    }

    pub fn router(&self) -> RetrievalRouter {
        RetrievalRouter::with_keywords(&self.retrieval.comparative_keywords)
    }

    /// Embedder for the configured provider.
    pub fn build_embedder(&self) -> ConfigResult<Arc<dyn Embedder>> {
        let settings = &self.embedding;
        let embedder: Arc<dyn Embedder> = match settings.provider {
            EmbedderProvider::Hash => {
                if !settings.model.trim().is_empty() {
                    warn!(model = %settings.model, "embedding.model is ignored by the hash provider");
                }
                let dims = if settings.dimensions == 0 {
                    DEFAULT_HASH_DIMENSIONS
                } else {
                    settings.dimensions
                };
                Arc::new(HashEmbedder::new(dims))
            }
            EmbedderProvider::OpenAi => {
                let mut config = OpenAiEmbedderConfig::default()
                    .with_api_key(&settings.api_key)
                    .with_base_url(settings.base_url.trim());
                if !settings.model.trim().is_empty() {
                    config = config.with_model(settings.model.trim());
                }
                if settings.dimensions > 0 {
                    config = config.with_dimensions(settings.dimensions as u32);
                }
                if let Some(timeout) = timeout(settings.timeout_secs) {
                    config = config.with_timeout(timeout);
                }
                Arc::new(OpenAiEmbedder::new(config))
            }
            EmbedderProvider::FastEmbed => self.build_fastembed()?,
        };
        Ok(embedder)
    }

    #[cfg(feature = "fastembed")]
    fn fastembed_model(&self) -> ConfigResult<crate::embedder::FastEmbedModel> {
        crate::embedder::FastEmbedModel::resolve(&self.embedding.model).ok_or_else(|| {
            ConfigError::Invalid(format!(
                "embedding.model '{}' is not a model fastembed supports",
                self.embedding.model
            ))
        })
    }

    #[cfg(not(feature = "fastembed"))]
    fn fastembed_model(&self) -> ConfigResult<std::convert::Infallible> {
        Err(ConfigError::Invalid(
            "embedding.provider 'fastembed' requires reportqa to be built with the `fastembed` feature"
                .to_string(),
        ))
    }

    #[cfg(feature = "fastembed")]
    fn build_fastembed(&self) -> ConfigResult<Arc<dyn Embedder>> {
        let model = self.fastembed_model()?;
        if self.embedding.dimensions > 0 && self.embedding.dimensions != model.dimensions {
            warn!(
                requested = self.embedding.dimensions,
                actual = model.dimensions,
                "embedding.dimensions is fixed by the fastembed model"
            );
        }
        Ok(Arc::new(crate::embedder::FastEmbedEmbedder::new(model)))
    }

    #[cfg(not(feature = "fastembed"))]
    fn build_fastembed(&self) -> ConfigResult<Arc<dyn Embedder>> {
        match self.fastembed_model()? {}
    }

    /// Empty index over the configured embedder and metric.
    pub fn build_index(&self) -> ConfigResult<VectorIndex> {
        Ok(VectorIndex::with_metric(self.build_embedder()?, self.retrieval.metric))
    }

    pub fn build_completion_model(&self) -> Arc<dyn CompletionModel> {
        let settings = &self.llm;
        let mut config = OpenAiChatConfig::lm_studio()
            .with_api_key(&settings.api_key)
            .with_base_url(settings.base_url.trim())
            .with_model(&settings.model)
            .with_temperature(settings.temperature);
        if settings.max_tokens > 0 {
            config = config.with_max_tokens(settings.max_tokens);
        }
        if let Some(timeout) = timeout(settings.timeout_secs) {
            config = config.with_timeout(timeout);
        }
        Arc::new(OpenAiChatModel::new(config))
    }
}

fn timeout(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn defaults_mirror_local_lm_studio() {
        let settings = Settings::default();
        assert!(settings.is_local());
        assert!(!settings.is_production());
        assert_eq!(settings.llm.base_url, "http://localhost:1234/v1");
        assert_eq!(settings.llm.model, "llama-2-7b-chat");
        assert_eq!(settings.llm.api_key, "lm-studio");
        assert_eq!(settings.vector_store_dir, PathBuf::from("vector_store"));
        assert_eq!(settings.chunking, ChunkerConfig::new(900, 150));
        assert_eq!(settings.retrieval_config(), RetrievalConfig::default());
        assert_eq!(settings.retrieval.comparative_keywords.len(), 8);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn legacy_variables_override_defaults() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("ENV", "Production"),
            ("LMSTUDIO_API_BASE", " http://10.0.0.5:1234/v1 "),
            ("LMSTUDIO_MODEL", "mistral-7b"),
            ("VECTOR_STORE_DIR", "/data/index"),
            ("LMSTUDIO_API_KEY", ""),
        ]);
        let settings =
            Settings::default().with_legacy_env(|name| vars.get(name).map(|v| v.to_string()));

        assert!(settings.is_production());
        assert_eq!(settings.llm.base_url, "http://10.0.0.5:1234/v1");
        assert_eq!(settings.llm.model, "mistral-7b");
        assert_eq!(settings.llm.api_key, "lm-studio");
        assert_eq!(settings.vector_store_dir, PathBuf::from("/data/index"));
    }

    #[test]
    fn file_layer_is_applied_and_validated() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("reportqa.toml");
        std::fs::write(
            &path,
            r#"
[embedding]
provider = "openai"
model = "nomic-embed-text"

[retrieval]
mmr_k = 3
mmr_fetch_k = 9
comparative_keywords = ["versus"]
metric = "dot_product"
"#,
        )
        .unwrap();

        let base = Settings::default();
        let settings: Settings = load_layered(&base, Some(&path), "REPORTQA_SETTINGS_TEST").unwrap();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.embedding.provider, EmbedderProvider::OpenAi);
        assert_eq!(settings.retrieval.mmr_k, 3);
        assert_eq!(settings.retrieval.similarity_k, 4);
        assert_eq!(settings.router().keywords(), ["versus".to_string()]);
        assert_eq!(settings.build_embedder().unwrap().model_id(), "nomic-embed-text");
        assert_eq!(settings.build_index().unwrap().metric(), SimilarityMetric::DotProduct);
    }

    #[test]
    fn invalid_values_are_rejected() {
        let mut settings = Settings::default();
        settings.chunking = ChunkerConfig::new(100, 100);
        assert!(matches!(settings.validate(), Err(ConfigError::Invalid(_))));

        let mut settings = Settings::default();
        settings.retrieval.mmr_lambda = 2.0;
        assert!(matches!(settings.validate(), Err(ConfigError::Invalid(_))));

        let mut settings = Settings::default();
        settings.retrieval.similarity_k = 0;
        assert!(matches!(settings.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn hash_provider_uses_default_dimensions() {
        let embedder = Settings::default().build_embedder().unwrap();
        assert_eq!(embedder.model_id(), "hash-embedder-256");

        let model = Settings::default().build_completion_model();
        assert_eq!(model.model_id(), "llama-2-7b-chat");
    }

    #[test]
    fn embedding_model_name_reaches_the_openai_embedder() {
        let vars = HashMap::from([("EMBEDDING_MODEL_NAME", "text-embedding-3-small")]);
        let mut settings =
            Settings::default().with_legacy_env(|name| vars.get(name).map(|v| v.to_string()));
        assert_eq!(settings.embedding.model, "text-embedding-3-small");

        settings.embedding.provider = EmbedderProvider::OpenAi;
        assert_eq!(settings.build_embedder().unwrap().model_id(), "text-embedding-3-small");

        settings.embedding.model.clear();
        assert_eq!(
            settings.build_embedder().unwrap().model_id(),
            "sentence-transformers/all-MiniLM-L6-v2"
        );
    }

    #[test]
    fn default_settings_name_no_embedding_model() {
        let settings = Settings::default();
        assert!(settings.embedding.model.is_empty());
        assert_eq!(settings.embedding.provider, EmbedderProvider::Hash);
    }

    #[cfg(not(feature = "fastembed"))]
    #[test]
    fn fastembed_provider_needs_the_feature() {
        let mut settings = Settings::default();
        settings.embedding.provider = EmbedderProvider::FastEmbed;

        assert!(matches!(settings.validate(), Err(ConfigError::Invalid(msg)) if msg.contains("feature")));
        assert!(settings.build_embedder().is_err());
    }

    #[cfg(feature = "fastembed")]
    #[test]
    fn fastembed_provider_resolves_configured_model() {
        let mut settings = Settings::default();
        settings.embedding.provider = EmbedderProvider::FastEmbed;
        settings.embedding.model = "sentence-transformers/all-MiniLM-L6-v2".to_string();
        assert!(settings.validate().is_ok());
        assert!(settings.build_embedder().unwrap().model_id().contains("all-MiniLM-L6-v2"));

        settings.embedding.model = "no-such-model".to_string();
        assert!(matches!(settings.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn provider_names_deserialize() {
        let providers: Vec<EmbedderProvider> =
            serde_json::from_str(r#"["hash", "openai", "fastembed"]"#).unwrap();
        assert_eq!(
            providers,
            vec![EmbedderProvider::Hash, EmbedderProvider::OpenAi, EmbedderProvider::FastEmbed]
        );
    }
}
