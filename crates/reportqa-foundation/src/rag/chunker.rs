//! Structure-aware chunking
//!
//! Converts a classified element stream into retrieval units:
//! tables are kept whole, narrative is split recursively, and a title is
//! held back and prepended to the next narrative element.

use super::splitter::TextSplitter;
use reportqa_kernel::error::ChunkingError;
use reportqa_kernel::rag::{
    ClassifiedElement, ElementKind, RetrievalUnit, UnitCategory, UnitMetadata,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Configuration for the hybrid chunker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkerConfig {
    /// Maximum characters per narrative unit
    pub target_size: usize,
    /// Characters carried between consecutive narrative units
    pub overlap: usize,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            target_size: 900,
            overlap: 150,
        }
    }
}

impl ChunkerConfig {
    pub fn new(target_size: usize, overlap: usize) -> Self {
        Self {
            target_size,
            overlap,
        }
    }

    pub fn validate(&self) -> Result<(), ChunkingError> {
        if self.target_size == 0 {
            return Err(ChunkingError::InvalidConfig(
                "target_size must be greater than 0".to_string(),
            ));
        }
        if self.overlap >= self.target_size {
            return Err(ChunkingError::InvalidConfig(format!(
                "overlap ({}) must be smaller than target_size ({})",
                self.overlap, self.target_size
            )));
        }
        Ok(())
    }
}

/// Chunker that keeps tables intact and splits narrative text.
#[derive(Debug, Clone)]
pub struct HybridChunker {
    splitter: TextSplitter,
}

impl HybridChunker {
    /// Create a chunker, rejecting an overlap that is not smaller than the target size.
    pub fn new(config: ChunkerConfig) -> Result<Self, ChunkingError> {
        config.validate()?;
        Ok(Self {
            splitter: TextSplitter::new(config.target_size, config.overlap),
        })
    }

    /// Chunker with 900-character units and 150 characters of overlap.
    pub fn with_defaults() -> Self {
        Self {
            splitter: TextSplitter::new(900, 150),
        }
    }

    /// Convert classified elements into retrieval units in one pass.
    ///
    /// A title waits in `pending_title` until the next narrative or other
    /// element, which gets `title\n` prepended. A later title replaces it
    /// and a table clears it without inheriting it.
    pub fn chunk(&self, classified: &[ClassifiedElement]) -> Result<Vec<RetrievalUnit>, ChunkingError> {
        if classified.is_empty() {
            return Err(ChunkingError::EmptyInput);
        }

        let mut units = Vec::new();
        let mut pending_title: Option<String> = None;

        for item in classified {
            let text = item.element.text.trim();
            if text.is_empty() {
                continue;
            }

            match item.kind {
                ElementKind::Title => {
                    if let Some(dropped) = pending_title.replace(text.to_string()) {
                        debug!(title = %dropped, "Title superseded before any body text");
                    }
                }
                ElementKind::Table => {
                    pending_title = None;
                    units.push(RetrievalUnit::new(
                        text,
                        UnitMetadata::new(UnitCategory::Table).with_page(item.metadata.page),
                    ));
                }
                ElementKind::Narrative | ElementKind::Other => {
                    let body = match pending_title.take() {
                        Some(title) => format!("{title}\n{text}"),
                        None => text.to_string(),
                    };
                    for piece in self.splitter.split(&body) {
                        units.push(RetrievalUnit::new(
                            piece,
                            UnitMetadata::new(UnitCategory::Narrative)
                                .with_page(item.metadata.page),
                        ));
                    }
                }
            }
        }

        if units.is_empty() {
            return Err(ChunkingError::EmptyOutput);
        }

        let tables = units
            .iter()
            .filter(|u| u.category() == UnitCategory::Table)
            .count();
        info!(
            units = units.len(),
            tables,
            narrative = units.len() - tables,
            "Chunking completed"
        );

        Ok(units)
    }
}

impl Default for HybridChunker {
    fn default() -> Self {
        Self::with_defaults()
    }
}
