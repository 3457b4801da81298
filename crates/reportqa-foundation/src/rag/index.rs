//! Vector index over retrieval units
//!
//! Brute-force index holding one immutable snapshot of units and their
//! embeddings. `build` and `load` create a complete new snapshot and then
//! swap it in, so concurrent searches see either the old or the new
//! contents, never a mix. The lock only guards the pointer swap.
//!
//! # Persisted layout
//!
//! ```text
//! <dir>/manifest.json   format version, model id, metric, dimensions, count, created_at
//! <dir>/vectors.bin     bincode-encoded embedding rows
//! <dir>/units.json      retrieval units, parallel to the rows
//! ```

use super::mmr::{MmrCandidate, mmr_select};
use super::similarity::compute_similarity;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use reportqa_kernel::error::{EmbeddingError, IndexError};
use reportqa_kernel::rag::{Embedder, RetrievalUnit, SimilarityMetric};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const MANIFEST_FILE: &str = "manifest.json";
pub const VECTORS_FILE: &str = "vectors.bin";
pub const UNITS_FILE: &str = "units.json";
pub const FORMAT_VERSION: u32 = 1;

/// Metadata describing a persisted index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexManifest {
    pub format_version: u32,
    pub model_id: String,
    pub metric: SimilarityMetric,
    pub dimensions: usize,
    pub count: usize,
    pub created_at: DateTime<Utc>,
}

/// A unit returned together with its relevance score.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredUnit {
    pub unit: RetrievalUnit,
    pub score: f32,
}

#[derive(Debug)]
struct IndexSnapshot {
    units: Vec<RetrievalUnit>,
    vectors: Vec<Vec<f32>>,
    dimensions: usize,
    model_id: String,
    created_at: DateTime<Utc>,
}

/// Searchable store of embedded retrieval units.
///
/// # Example
///
/// ```rust,ignore
/// let index = VectorIndex::new(Arc::new(HashEmbedder::default()));
/// index.build(units).await?;
/// index.save(Path::new("vector_store"))?;
///
/// let hits = index.similarity_search("What is the total budget?", 4).await?;
/// let diverse = index.mmr_search("Compare project timelines", 6, 20, 0.5).await?;
/// ```
pub struct VectorIndex {
    embedder: Arc<dyn Embedder>,
    metric: SimilarityMetric,
    snapshot: RwLock<Option<Arc<IndexSnapshot>>>,
}

impl VectorIndex {
    /// Create an empty index using cosine similarity.
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self::with_metric(embedder, SimilarityMetric::Cosine)
    }

    pub fn with_metric(embedder: Arc<dyn Embedder>, metric: SimilarityMetric) -> Self {
        Self {
            embedder,
            metric,
            snapshot: RwLock::new(None),
        }
    }

    pub fn metric(&self) -> SimilarityMetric {
        self.metric
    }

    pub fn embedder(&self) -> &Arc<dyn Embedder> {
        &self.embedder
    }

    pub fn is_initialized(&self) -> bool {
        self.snapshot.read().is_some()
    }

    /// Number of indexed units (0 before build/load).
    pub fn len(&self) -> usize {
        self.snapshot.read().as_ref().map_or(0, |s| s.units.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Embedding dimensionality of the current snapshot.
    pub fn dimensions(&self) -> Option<usize> {
        self.snapshot.read().as_ref().map(|s| s.dimensions)
    }

    /// Embedding model that produced the current snapshot.
    pub fn model_id(&self) -> Option<String> {
        self.snapshot.read().as_ref().map(|s| s.model_id.clone())
    }

    /// Manifest describing the current snapshot.
    pub fn manifest(&self) -> Option<IndexManifest> {
        self.snapshot.read().as_ref().map(|s| self.manifest_for(s))
    }

    /// Indexed units in build order. Empty when uninitialized.
    pub fn units(&self) -> Vec<RetrievalUnit> {
        self.snapshot
            .read()
            .as_ref()
            .map(|s| s.units.clone())
            .unwrap_or_default()
    }

    fn manifest_for(&self, snapshot: &IndexSnapshot) -> IndexManifest {
        IndexManifest {
            format_version: FORMAT_VERSION,
            model_id: snapshot.model_id.clone(),
            metric: self.metric,
            dimensions: snapshot.dimensions,
            count: snapshot.units.len(),
            created_at: snapshot.created_at,
        }
    }

    fn current(&self) -> Result<Arc<IndexSnapshot>, IndexError> {
        self.snapshot
            .read()
            .as_ref()
            .cloned()
            .ok_or(IndexError::NotInitialized)
    }

    fn publish(&self, snapshot: IndexSnapshot) {
        *self.snapshot.write() = Some(Arc::new(snapshot));
    }

    /// Embed `units` in one batch and replace the indexed contents.
    pub async fn build(&self, units: Vec<RetrievalUnit>) -> Result<(), IndexError> {
        if units.is_empty() {
            return Err(IndexError::EmptyBuild);
        }

        info!(units = units.len(), model = %self.embedder.model_id(), "Building vector index");

        let texts: Vec<String> = units.iter().map(|u| u.content().to_string()).collect();
        let vectors = self.embedder.embed_documents(&texts).await?;

        if vectors.len() != units.len() {
            return Err(EmbeddingError::CountMismatch {
                expected: units.len(),
                actual: vectors.len(),
            }
            .into());
        }
        let dimensions = check_dimensions(&vectors)?;

        self.publish(IndexSnapshot {
            units,
            vectors,
            dimensions,
            model_id: self.embedder.model_id().to_string(),
            created_at: Utc::now(),
        });

        info!(dimensions, count = self.len(), "Vector index ready");
        Ok(())
    }

    /// Persist the current snapshot into `dir`, creating it if needed.
    pub fn save(&self, dir: &Path) -> Result<IndexManifest, IndexError> {
        let snapshot = self.current()?;
        let manifest = self.manifest_for(&snapshot);

        std::fs::create_dir_all(dir).map_err(|source| IndexError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        let vectors = bincode::serialize(&snapshot.vectors)
            .map_err(|e| IndexError::corrupt(format!("encoding vectors: {e}")))?;
        let units = serde_json::to_vec_pretty(&snapshot.units)
            .map_err(|e| IndexError::corrupt(format!("encoding units: {e}")))?;
        let manifest_json = serde_json::to_vec_pretty(&manifest)
            .map_err(|e| IndexError::corrupt(format!("encoding manifest: {e}")))?;

        // Manifest last: a directory with a manifest has complete payloads.
        write_file(dir, VECTORS_FILE, &vectors)?;
        write_file(dir, UNITS_FILE, &units)?;
        write_file(dir, MANIFEST_FILE, &manifest_json)?;

        info!(path = %dir.display(), count = manifest.count, "Vector index saved");
        Ok(manifest)
    }

    /// Replace the indexed contents with the snapshot persisted in `dir`.
    pub fn load(&self, dir: &Path) -> Result<IndexManifest, IndexError> {
        if !dir.is_dir() {
            return Err(IndexError::NotFound(dir.to_path_buf()));
        }

        let manifest: IndexManifest = serde_json::from_slice(&read_file(dir, MANIFEST_FILE)?)
            .map_err(|e| IndexError::corrupt(format!("{MANIFEST_FILE}: {e}")))?;
        if manifest.format_version != FORMAT_VERSION {
            return Err(IndexError::corrupt(format!(
                "unsupported format version {} (expected {FORMAT_VERSION})",
                manifest.format_version
            )));
        }

        let vectors: Vec<Vec<f32>> = bincode::deserialize(&read_file(dir, VECTORS_FILE)?)
            .map_err(|e| IndexError::corrupt(format!("{VECTORS_FILE}: {e}")))?;
        let units: Vec<RetrievalUnit> = serde_json::from_slice(&read_file(dir, UNITS_FILE)?)
            .map_err(|e| IndexError::corrupt(format!("{UNITS_FILE}: {e}")))?;

        if units.is_empty() || units.len() != vectors.len() || units.len() != manifest.count {
            return Err(IndexError::corrupt(format!(
                "manifest lists {} units, found {} units and {} vectors",
                manifest.count,
                units.len(),
                vectors.len()
            )));
        }
        if units.iter().any(|u| u.content().trim().is_empty()) {
            return Err(IndexError::corrupt("unit with empty content"));
        }
        let dimensions = check_dimensions(&vectors).map_err(|_| {
            IndexError::corrupt("embedding rows have inconsistent dimensions")
        })?;
        if dimensions != manifest.dimensions {
            return Err(IndexError::corrupt(format!(
                "manifest dimensions {} do not match stored vectors ({dimensions})",
                manifest.dimensions
            )));
        }

        if manifest.model_id != self.embedder.model_id() {
            warn!(
                stored = %manifest.model_id,
                current = %self.embedder.model_id(),
                "Index was built with a different embedding model"
            );
        }
        if manifest.metric != self.metric {
            warn!(
                stored = %manifest.metric,
                current = %self.metric,
                "Index was saved with a different similarity metric"
            );
        }

        self.publish(IndexSnapshot {
            units,
            vectors,
            dimensions,
            model_id: manifest.model_id.clone(),
            created_at: manifest.created_at,
        });

        info!(path = %dir.display(), count = manifest.count, "Vector index loaded");
        Ok(manifest)
    }

    /// Return up to `k` units nearest to `query`, best first.
    pub async fn similarity_search(
        &self,
        query: &str,
        k: usize,
    ) -> Result<Vec<RetrievalUnit>, IndexError> {
        Ok(self
            .similarity_search_with_scores(query, k)
            .await?
            .into_iter()
            .map(|hit| hit.unit)
            .collect())
    }

    /// Like [`similarity_search`](Self::similarity_search), keeping scores.
    pub async fn similarity_search_with_scores(
        &self,
        query: &str,
        k: usize,
    ) -> Result<Vec<ScoredUnit>, IndexError> {
        if k == 0 {
            return Err(IndexError::invalid_argument("k must be greater than 0"));
        }
        let snapshot = self.current()?;
        let query_vector = self.embed_query(query, &snapshot).await?;

        let hits = self
            .rank(&snapshot, &query_vector, k)
            .into_iter()
            .map(|(id, score)| ScoredUnit {
                unit: snapshot.units[id].clone(),
                score,
            })
            .collect::<Vec<_>>();

        debug!(k, returned = hits.len(), "Similarity search");
        Ok(hits)
    }

    /// Select `k` units by maximal marginal relevance among the `fetch_k`
    /// nearest candidates.
    pub async fn mmr_search(
        &self,
        query: &str,
        k: usize,
        fetch_k: usize,
        lambda: f32,
    ) -> Result<Vec<RetrievalUnit>, IndexError> {
        if k == 0 {
            return Err(IndexError::invalid_argument("k must be greater than 0"));
        }
        if fetch_k < k {
            return Err(IndexError::invalid_argument(format!(
                "fetch_k ({fetch_k}) must be at least k ({k})"
            )));
        }
        if !(0.0..=1.0).contains(&lambda) {
            return Err(IndexError::invalid_argument(format!(
                "lambda ({lambda}) must be within [0, 1]"
            )));
        }

        let snapshot = self.current()?;
        let query_vector = self.embed_query(query, &snapshot).await?;

        let candidates: Vec<MmrCandidate<'_>> = self
            .rank(&snapshot, &query_vector, fetch_k)
            .into_iter()
            .map(|(id, relevance)| MmrCandidate {
                id,
                relevance,
                vector: &snapshot.vectors[id],
            })
            .collect();

        let selected = mmr_select(&candidates, k, lambda);
        debug!(k, fetch_k, lambda, candidates = candidates.len(), returned = selected.len(), "MMR search");

        Ok(selected
            .into_iter()
            .map(|(id, _)| snapshot.units[id].clone())
            .collect())
    }

    async fn embed_query(
        &self,
        query: &str,
        snapshot: &IndexSnapshot,
    ) -> Result<Vec<f32>, IndexError> {
        let vector = self.embedder.embed_query(query).await?;
        if vector.len() != snapshot.dimensions {
            return Err(IndexError::DimensionMismatch {
                expected: snapshot.dimensions,
                actual: vector.len(),
            });
        }
        Ok(vector)
    }

    /// Top `limit` `(position, score)` pairs, best first; equal scores keep build order.
    fn rank(&self, snapshot: &IndexSnapshot, query: &[f32], limit: usize) -> Vec<(usize, f32)> {
        let mut scored: Vec<(usize, f32)> = snapshot
            .vectors
            .iter()
            .enumerate()
            .map(|(id, vector)| (id, compute_similarity(query, vector, self.metric)))
            .collect();

        scored.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        scored.truncate(limit);
        scored
    }
}

/// Shared dimensionality of `vectors`, which must be non-zero and uniform.
fn check_dimensions(vectors: &[Vec<f32>]) -> Result<usize, IndexError> {
    let dimensions = vectors.first().map_or(0, Vec::len);
    if dimensions == 0 {
        return Err(EmbeddingError::EmptyVector.into());
    }
    if let Some(bad) = vectors.iter().find(|v| v.len() != dimensions) {
        return Err(IndexError::DimensionMismatch {
            expected: dimensions,
            actual: bad.len(),
        });
    }
    Ok(dimensions)
}

fn write_file(dir: &Path, name: &str, bytes: &[u8]) -> Result<(), IndexError> {
    let path = dir.join(name);
    std::fs::write(&path, bytes).map_err(|source| IndexError::Io { path, source })
}

fn read_file(dir: &Path, name: &str) -> Result<Vec<u8>, IndexError> {
    let path = dir.join(name);
    std::fs::read(&path).map_err(|source| IndexError::Io { path, source })
}
