//! RAG core data types
//!
//! Types that flow through ingestion (elements → classified elements →
//! retrieval units) and through a single question-answering run
//! (pipeline state and citations).

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Parsed document elements
// ============================================================================

/// Structural tag attached to an element by the document-structure parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementTag {
    Title,
    NarrativeText,
    Table,
    ListItem,
    Header,
    Footer,
    Image,
    PageBreak,
    Formula,
    UncategorizedText,
}

/// A typed unit of parsed document content with page provenance.
///
/// Produced by a [`DocumentParser`](crate::rag::DocumentParser) in document
/// order and never modified afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuralElement {
    /// Raw text of the element (may be empty)
    pub text: String,
    /// Structural tag assigned by the parser
    pub tag: ElementTag,
    /// 1-based page number, when the parser knows it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
}

impl StructuralElement {
    pub fn new(tag: ElementTag, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            tag,
            page: None,
        }
    }

    pub fn title(text: impl Into<String>) -> Self {
        Self::new(ElementTag::Title, text)
    }

    pub fn narrative(text: impl Into<String>) -> Self {
        Self::new(ElementTag::NarrativeText, text)
    }

    pub fn table(text: impl Into<String>) -> Self {
        Self::new(ElementTag::Table, text)
    }

    /// Attach a page number
    pub fn with_page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }
}

/// Structural role assigned by the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ElementKind {
    Title,
    Table,
    Narrative,
    Other,
}

impl ElementKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Title => "TITLE",
            Self::Table => "TABLE",
            Self::Narrative => "NARRATIVE",
            Self::Other => "OTHER",
        }
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Metadata extracted from an element during classification.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
}

/// An element together with its structural role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedElement {
    pub element: StructuralElement,
    pub kind: ElementKind,
    pub metadata: ElementMetadata,
}

impl ClassifiedElement {
    pub fn new(element: StructuralElement, kind: ElementKind, metadata: ElementMetadata) -> Self {
        Self {
            element,
            kind,
            metadata,
        }
    }
}

// ============================================================================
// Retrieval units
// ============================================================================

/// Category of a retrieval unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum UnitCategory {
    Table,
    Narrative,
}

impl UnitCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Table => "TABLE",
            Self::Narrative => "NARRATIVE",
        }
    }
}

impl fmt::Display for UnitCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Metadata carried by every retrieval unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitMetadata {
    pub category: UnitCategory,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl UnitMetadata {
    pub fn new(category: UnitCategory) -> Self {
        Self {
            category,
            page: None,
            source: None,
        }
    }

    pub fn with_page(mut self, page: Option<u32>) -> Self {
        self.page = page;
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

/// A contiguous piece of text sized for indexing and retrieval ("chunk").
///
/// Units are immutable values: the content and metadata can only be read,
/// and [`RetrievalUnit::with_source`] produces a new unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrievalUnit {
    content: String,
    metadata: UnitMetadata,
}

impl RetrievalUnit {
    pub fn new(content: impl Into<String>, metadata: UnitMetadata) -> Self {
        let content = content.into();
        debug_assert!(
            !content.trim().is_empty(),
            "retrieval units must have content"
        );
        Self { content, metadata }
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn metadata(&self) -> &UnitMetadata {
        &self.metadata
    }

    pub fn category(&self) -> UnitCategory {
        self.metadata.category
    }

    pub fn page(&self) -> Option<u32> {
        self.metadata.page
    }

    pub fn source(&self) -> Option<&str> {
        self.metadata.source.as_deref()
    }

    /// Return a copy of this unit attributed to `source`.
    #[must_use]
    pub fn with_source(self, source: impl Into<String>) -> Self {
        Self {
            content: self.content,
            metadata: self.metadata.with_source(source),
        }
    }
}

// ============================================================================
// Query-time types
// ============================================================================

/// Retrieval strategy chosen by the router.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RetrievalMode {
    /// Plain nearest-neighbour search
    Similarity,
    /// Max marginal relevance (relevance traded against redundancy)
    Mmr,
}

impl RetrievalMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Similarity => "SIMILARITY",
            Self::Mmr => "MMR",
        }
    }
}

impl fmt::Display for RetrievalMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Similarity metric used by the vector index.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimilarityMetric {
    /// Cosine similarity (angle between vectors)
    #[default]
    Cosine,
    /// Euclidean distance, reported as `1 / (1 + distance)`
    Euclidean,
    /// Dot product (higher is more similar)
    DotProduct,
}

impl SimilarityMetric {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cosine => "cosine",
            Self::Euclidean => "euclidean",
            Self::DotProduct => "dot_product",
        }
    }
}

impl fmt::Display for SimilarityMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A (source, page) pair surfaced to justify an answer.
///
/// Equality is by value, which is what citation deduplication relies on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Citation {
    pub source: Option<String>,
    pub page: Option<u32>,
}

impl Citation {
    pub fn new(source: Option<String>, page: Option<u32>) -> Self {
        Self { source, page }
    }

    /// Project a retrieval unit onto its citation.
    pub fn from_unit(unit: &RetrievalUnit) -> Self {
        Self {
            source: unit.source().map(str::to_string),
            page: unit.page(),
        }
    }
}

impl fmt::Display for Citation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let source = self.source.as_deref().unwrap_or("unknown source");
        match self.page {
            Some(page) => write!(f, "{source}, Page {page}"),
            None => write!(f, "{source}"),
        }
    }
}
