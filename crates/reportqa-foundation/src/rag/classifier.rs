//! Element classification
//!
//! Labels each parsed element with its structural role. The mapping is a
//! pure function of the parser's tag: text content is never inspected.

use reportqa_kernel::error::ClassificationError;
use reportqa_kernel::rag::{
    ClassifiedElement, ElementKind, ElementMetadata, ElementTag, StructuralElement,
};
use std::collections::BTreeMap;
use tracing::info;

/// Map a parser tag to a structural role.
///
/// First match wins: table, title, narrative text, then everything else.
pub fn kind_for_tag(tag: ElementTag) -> ElementKind {
    match tag {
        ElementTag::Table => ElementKind::Table,
        ElementTag::Title => ElementKind::Title,
        ElementTag::NarrativeText => ElementKind::Narrative,
        _ => ElementKind::Other,
    }
}

/// Stateless classifier over a parsed element stream.
#[derive(Debug, Clone, Copy, Default)]
pub struct ElementClassifier;

impl ElementClassifier {
    pub fn new() -> Self {
        Self
    }

    /// Classify `elements`, one output per input, order preserved.
    ///
    /// Pages are copied when present and left unset otherwise. A page of 0
    /// is rejected since pages start at 1.
    pub fn classify(
        &self,
        elements: Vec<StructuralElement>,
    ) -> Result<Vec<ClassifiedElement>, ClassificationError> {
        let mut classified = Vec::with_capacity(elements.len());
        let mut distribution: BTreeMap<ElementKind, usize> = BTreeMap::new();

        for (index, element) in elements.into_iter().enumerate() {
            if element.page == Some(0) {
                return Err(ClassificationError::InvalidPage { index });
            }

            let kind = kind_for_tag(element.tag);
            let metadata = ElementMetadata { page: element.page };
            *distribution.entry(kind).or_default() += 1;
            classified.push(ClassifiedElement::new(element, kind, metadata));
        }

        info!(
            total = classified.len(),
            titles = distribution.get(&ElementKind::Title).copied().unwrap_or(0),
            tables = distribution.get(&ElementKind::Table).copied().unwrap_or(0),
            narrative = distribution.get(&ElementKind::Narrative).copied().unwrap_or(0),
            other = distribution.get(&ElementKind::Other).copied().unwrap_or(0),
            "Classified document elements"
        );

        Ok(classified)
    }
}
