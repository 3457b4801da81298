//! Embedding model implementations
//!
//! - [`HashEmbedder`]: deterministic, API-free feature hashing
//! - [`OpenAiEmbedder`]: any OpenAI-compatible `/embeddings` endpoint
//! - `FastEmbedEmbedder`: local ONNX models (`fastembed` feature)

#[cfg(feature = "fastembed")]
pub mod fastembed;
pub mod hash;
pub mod openai;

#[cfg(feature = "fastembed")]
pub use self::fastembed::{DEFAULT_FASTEMBED_MODEL, FastEmbedEmbedder, FastEmbedModel};
pub use hash::HashEmbedder;
pub use openai::{OpenAiEmbedder, OpenAiEmbedderConfig};
