//! RAG traits and types
//!
//! Defines the document model, the collaborator seams (parser, embedder,
//! completion model) and the per-run pipeline state. Concrete
//! implementations live in reportqa-foundation.

pub mod embedder;
pub mod parser;
pub mod pipeline;
pub mod types;

pub use embedder::Embedder;
pub use parser::DocumentParser;
pub use pipeline::{CompletionModel, PipelineStage, PipelineState};
pub use types::{
    Citation, ClassifiedElement, ElementKind, ElementMetadata, ElementTag, RetrievalMode,
    RetrievalUnit, SimilarityMetric, StructuralElement, UnitCategory, UnitMetadata,
};
