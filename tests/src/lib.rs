//! reportqa testing utilities
//!
//! Deterministic stand-ins for the embedding model and the language model
//! so the whole question-answering pipeline can be exercised without a
//! running model server.

pub mod backend;
pub mod embedder;
pub mod fixtures;

pub use backend::{FailingModel, ScriptedModel};
pub use embedder::{FailingEmbedder, KeywordEmbedder};
