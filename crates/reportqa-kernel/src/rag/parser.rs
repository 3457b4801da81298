//! DocumentParser trait definition

use crate::error::IngestionError;
use crate::rag::types::StructuralElement;
use std::path::Path;

/// The document-structure parser collaborator.
///
/// Turns a document on disk into an ordered sequence of typed elements.
/// Order must follow document position: the chunker relies on titles
/// preceding the body text they introduce.
pub trait DocumentParser: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// File extensions (lowercase, without the dot) this parser accepts.
    fn extensions(&self) -> &[&'static str];

    /// Parse the document at `path`.
    fn parse(&self, path: &Path) -> Result<Vec<StructuralElement>, IngestionError>;
}
