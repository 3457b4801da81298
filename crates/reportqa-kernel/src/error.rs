//! Crate-level error types for `reportqa-kernel`.
//!
//! Every component has its own error enum with a stable, human-readable
//! message. Underlying failures (IO, provider calls, index misuse) are kept
//! as `#[source]` so logs can print the full chain while callers only show
//! the top-level message.
//!
//! [`ReportError`] composes all of them via `#[from]`, and
//! [`ReportResult`] wraps it in an [`error_stack::Report`] for callers that
//! want to attach context as errors propagate.
//!
//! # Usage
//!
//! ```rust,ignore
//! use reportqa_kernel::error::{ReportError, ReportResult};
//! use error_stack::ResultExt;
//!
//! fn ingest() -> ReportResult<()> {
//!     let units = chunker
//!         .chunk(classified)
//!         .map_err(ReportError::from)
//!         .map_err(error_stack::Report::new)
//!         .attach("chunking report.md")?;
//!     Ok(())
//! }
//! ```

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Boxed error used where a collaborator's concrete error type is opaque.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

// ============================================================================
// External collaborators
// ============================================================================

/// Failure of an external call (embedding endpoint, language model).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProviderError {
    /// The request could not be completed
    #[error("Request to {endpoint} failed")]
    Request {
        endpoint: String,
        #[source]
        source: BoxError,
    },

    /// The call did not finish within the configured timeout
    #[error("Call to {endpoint} timed out after {elapsed:?}")]
    Timeout { endpoint: String, elapsed: Duration },

    /// The provider answered with something unusable
    #[error("Invalid response from {endpoint}: {reason}")]
    InvalidResponse { endpoint: String, reason: String },
}

impl ProviderError {
    pub fn request(
        endpoint: impl Into<String>,
        source: impl Into<BoxError>,
    ) -> Self {
        Self::Request {
            endpoint: endpoint.into(),
            source: source.into(),
        }
    }

    pub fn invalid_response(endpoint: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidResponse {
            endpoint: endpoint.into(),
            reason: reason.into(),
        }
    }
}

// ============================================================================
// Ingestion
// ============================================================================

/// Raised when a document cannot be loaded or parsed.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum IngestionError {
    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Unsupported file type: {0}")]
    UnsupportedFormat(String),

    #[error("Failed to read '{}'", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse '{}': {reason}", .path.display())]
    Parse { path: PathBuf, reason: String },

    #[error("Document parsing returned no content: {}", .0.display())]
    Empty(PathBuf),

    /// The blocking task processing a document panicked or was cancelled
    #[error("Document worker failed: {0}")]
    Worker(String),
}

/// Raised when a parsed element is structurally malformed.
///
/// Classification never fails because of what the text says.
#[derive(Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum ClassificationError {
    #[error("Element {index} has invalid page number 0 (pages start at 1)")]
    InvalidPage { index: usize },
}

/// Raised when chunking cannot produce retrieval units.
#[derive(Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum ChunkingError {
    #[error("No classified elements provided")]
    EmptyInput,

    #[error("Chunking resulted in zero output documents")]
    EmptyOutput,

    #[error("Invalid chunking configuration: {0}")]
    InvalidConfig(String),
}

// ============================================================================
// Embeddings and index
// ============================================================================

/// Raised when embedding generation fails.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum EmbeddingError {
    #[error("No texts provided for embedding")]
    EmptyInput,

    #[error("Query text is empty")]
    EmptyQuery,

    #[error("Embedding model returned an empty vector")]
    EmptyVector,

    #[error("Embedding model returned {actual} vectors for {expected} inputs")]
    CountMismatch { expected: usize, actual: usize },

    #[error("Failed to generate embeddings")]
    Provider(#[from] ProviderError),
}

/// Raised when vector index creation, persistence or querying fails.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum IndexError {
    #[error("No documents provided for indexing")]
    EmptyBuild,

    #[error("Vector index is not initialized")]
    NotInitialized,

    #[error("Invalid search argument: {0}")]
    InvalidArgument(String),

    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Embedding failed")]
    Embedding(#[from] EmbeddingError),

    #[error("Vector index directory not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Failed to access index files at '{}'", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Index payload is unreadable: {0}")]
    Corrupt(String),
}

impl IndexError {
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub fn corrupt(msg: impl Into<String>) -> Self {
        Self::Corrupt(msg.into())
    }
}

// ============================================================================
// Pipeline stages
// ============================================================================

/// Rejected retrieval parameters.
#[derive(Debug, Error, PartialEq)]
#[non_exhaustive]
pub enum RetrievalConfigError {
    #[error("{0} must be greater than 0")]
    Zero(&'static str),

    #[error("mmr_fetch_k ({fetch_k}) must be at least mmr_k ({k})")]
    FetchBelowK { k: usize, fetch_k: usize },

    #[error("mmr_lambda ({0}) must be within [0, 1]")]
    LambdaOutOfRange(f32),
}

/// Raised when the retrieve stage cannot fetch context.
#[derive(Debug, Error)]
#[error("Document retrieval failed")]
pub struct RetrievalError {
    #[from]
    source: IndexError,
}

impl RetrievalError {
    /// The index failure behind this error.
    pub fn index_error(&self) -> &IndexError {
        &self.source
    }
}

/// Raised when the generate stage cannot produce an answer.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum GenerationError {
    #[error("No documents available for answer generation")]
    NoContext,

    #[error("Answer generation failed")]
    Model(#[from] ProviderError),
}

/// Failure of a pipeline run. The cite stage never fails.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PipelineError {
    #[error(transparent)]
    Retrieval(#[from] RetrievalError),

    #[error(transparent)]
    Generation(#[from] GenerationError),
}

// ============================================================================
// Crate-level error
// ============================================================================

/// Crate-level error type for reportqa.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ReportError {
    #[error(transparent)]
    Ingestion(#[from] IngestionError),

    #[error(transparent)]
    Classification(#[from] ClassificationError),

    #[error(transparent)]
    Chunking(#[from] ChunkingError),

    #[error(transparent)]
    Embedding(#[from] EmbeddingError),

    #[error(transparent)]
    Index(#[from] IndexError),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    /// A configuration-related error (requires the `config` feature).
    #[cfg(feature = "config")]
    #[error("Config error: {0}")]
    Config(#[from] crate::config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<RetrievalError> for ReportError {
    fn from(err: RetrievalError) -> Self {
        Self::Pipeline(PipelineError::Retrieval(err))
    }
}

impl From<GenerationError> for ReportError {
    fn from(err: GenerationError) -> Self {
        Self::Pipeline(PipelineError::Generation(err))
    }
}

/// Convenience result alias using [`error_stack::Report`].
pub type ReportResult<T> = Result<T, error_stack::Report<ReportError>>;

/// Render an error and its source chain as `outer: inner: root`.
pub fn error_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut rendered = err.to_string();
    let mut current = err.source();
    while let Some(cause) = current {
        rendered.push_str(": ");
        rendered.push_str(&cause.to_string());
        current = cause.source();
    }
    rendered
}
