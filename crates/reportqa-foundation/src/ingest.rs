//! Document ingestion
//!
//! Parses, classifies and chunks each document on the blocking pool in
//! parallel, tags every unit with its document's file name, then builds
//! the vector index once over the merged units.

use crate::rag::{ElementClassifier, HybridChunker, ParserRegistry, VectorIndex};
use error_stack::{Report, ResultExt};
use futures::future::try_join_all;
use reportqa_kernel::error::{IngestionError, ReportError, ReportResult};
use reportqa_kernel::rag::{RetrievalUnit, UnitCategory};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, instrument};

/// Per-document ingestion summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentReport {
    pub path: PathBuf,
    /// File name recorded as each unit's `source`
    pub source: String,
    pub elements: usize,
    pub units: usize,
    pub tables: usize,
}

/// Result of one ingestion call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub documents: Vec<DocumentReport>,
    pub total_units: usize,
    pub dimensions: usize,
    pub model_id: String,
}

/// Turns documents on disk into a built [`VectorIndex`].
pub struct Ingestor {
    registry: Arc<ParserRegistry>,
    classifier: ElementClassifier,
    chunker: HybridChunker,
    index: Arc<VectorIndex>,
}

impl Ingestor {
    pub fn new(index: Arc<VectorIndex>) -> Self {
        Self {
            registry: Arc::new(ParserRegistry::with_defaults()),
            classifier: ElementClassifier::new(),
            chunker: HybridChunker::with_defaults(),
            index,
        }
    }

    #[must_use]
    pub fn with_registry(mut self, registry: ParserRegistry) -> Self {
        self.registry = Arc::new(registry);
        self
    }

    #[must_use]
    pub fn with_chunker(mut self, chunker: HybridChunker) -> Self {
        self.chunker = chunker;
        self
    }

    pub fn index(&self) -> &Arc<VectorIndex> {
        &self.index
    }

    /// Ingest `paths` and rebuild the index from their units.
    ///
    /// Any document failure aborts the whole call and leaves the index untouched.
    #[instrument(skip_all, fields(documents = paths.len()))]
    pub async fn ingest(&self, paths: &[PathBuf]) -> ReportResult<IngestReport> {
        let tasks = paths.iter().cloned().map(|path| {
            let registry = Arc::clone(&self.registry);
            let classifier = self.classifier;
            let chunker = self.chunker.clone();
            tokio::task::spawn_blocking(move || {
                process_document(&registry, classifier, &chunker, &path)
            })
        });

        let results = try_join_all(tasks)
            .await
            .map_err(|e| Report::new(ReportError::from(IngestionError::Worker(e.to_string()))))
            .attach("joining document workers")?;

        let mut documents = Vec::with_capacity(results.len());
        let mut units = Vec::new();
        for result in results {
            let (report, document_units) = result?;
            documents.push(report);
            units.extend(document_units);
        }

        let total_units = units.len();
        self.index
            .build(units)
            .await
            .map_err(|e| Report::new(ReportError::from(e)))
            .attach(format!("building index over {total_units} units"))?;

        let report = IngestReport {
            documents,
            total_units,
            dimensions: self.index.dimensions().unwrap_or_default(),
            model_id: self.index.embedder().model_id().to_string(),
        };
        info!(
            documents = report.documents.len(),
            units = report.total_units,
            "Ingestion completed"
        );
        Ok(report)
    }
}

fn process_document(
    registry: &ParserRegistry,
    classifier: ElementClassifier,
    chunker: &HybridChunker,
    path: &Path,
) -> ReportResult<(DocumentReport, Vec<RetrievalUnit>)> {
    let context = format!("ingesting {}", path.display());

    let elements = registry
        .parse(path)
        .map_err(|e| Report::new(ReportError::from(e)))
        .attach(context.clone())?;
    let element_count = elements.len();

    let classified = classifier
        .classify(elements)
        .map_err(|e| Report::new(ReportError::from(e)))
        .attach(context.clone())?;

    let source = source_name(path);
    let units: Vec<RetrievalUnit> = chunker
        .chunk(&classified)
        .map_err(|e| Report::new(ReportError::from(e)))
        .attach(context.clone())?
        .into_iter()
        .map(|unit| unit.with_source(source.clone()))
        .collect();

    let tables = units
        .iter()
        .filter(|u| u.category() == UnitCategory::Table)
        .count();
    info!(source = %source, elements = element_count, units = units.len(), tables, "Document processed");

    Ok((
        DocumentReport {
            path: path.to_path_buf(),
            source,
            elements: element_count,
            units: units.len(),
            tables,
        },
        units,
    ))
}

/// File name of `path`, or the whole path when it has none.
fn source_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
