//! RAG (Retrieval-Augmented Generation) implementations
//!
//! Structure-aware segmentation (classifier, splitter, hybrid chunker),
//! the vector index with similarity and MMR search, query routing, the
//! question-answering orchestrator and the document parsers feeding it.

pub mod chunker;
pub mod classifier;
pub mod index;
pub mod loaders;
pub mod mmr;
pub mod orchestrator;
pub mod router;
pub mod similarity;
pub mod splitter;

pub use chunker::{ChunkerConfig, HybridChunker};
pub use classifier::ElementClassifier;
pub use index::{IndexManifest, ScoredUnit, VectorIndex};
pub use loaders::{MarkdownParser, ParserRegistry, PdfParser, TextParser};
pub use orchestrator::{NOT_FOUND_SENTINEL, RagOrchestrator, RetrievalConfig};
pub use router::RetrievalRouter;
pub use similarity::compute_similarity;
pub use splitter::TextSplitter;

// Re-export kernel types for convenience
pub use reportqa_kernel::rag::{
    Citation, ClassifiedElement, CompletionModel, DocumentParser, Embedder, ElementKind,
    PipelineState, RetrievalMode, RetrievalUnit, SimilarityMetric, StructuralElement,
};
