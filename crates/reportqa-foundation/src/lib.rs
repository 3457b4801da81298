//! reportqa foundation
//!
//! Implementations behind the kernel traits: segmentation, the vector
//! index, the retrieval pipeline, document parsers and model providers.

// RAG module - classification, chunking, index, routing, orchestration
pub mod rag;

// embedder module
pub mod embedder;

// llm module
pub mod llm;

// ingest module
pub mod ingest;

// settings module
pub mod settings;

pub use embedder::{HashEmbedder, OpenAiEmbedder, OpenAiEmbedderConfig};
pub use ingest::{DocumentReport, IngestReport, Ingestor};
pub use llm::{OpenAiChatConfig, OpenAiChatModel};
pub use settings::{EmbedderProvider, Settings};
