//! Ready-made documents and units

use reportqa_kernel::rag::{RetrievalUnit, UnitCategory, UnitMetadata};

/// Vocabulary covering [`report_units`].
pub const REPORT_VOCABULARY: &[&str] = &[
    "budget", "total", "$500,000", "timeline", "project", "staffing", "risk", "vendor",
];

/// A narrative unit from `source` on `page`.
pub fn narrative(content: &str, source: &str, page: u32) -> RetrievalUnit {
    RetrievalUnit::new(
        content,
        UnitMetadata::new(UnitCategory::Narrative)
            .with_page(Some(page))
            .with_source(source),
    )
}

/// A table unit from `source` on `page`.
pub fn table(content: &str, source: &str, page: u32) -> RetrievalUnit {
    RetrievalUnit::new(
        content,
        UnitMetadata::new(UnitCategory::Table)
            .with_page(Some(page))
            .with_source(source),
    )
}

/// Small two-report corpus; the budget figure lives in A.pdf page 3.
pub fn report_units() -> Vec<RetrievalUnit> {
    vec![
        narrative("Budget\nThe total budget: $500,000", "A.pdf", 3),
        narrative("Project A timeline ends in June", "A.pdf", 4),
        narrative("Project B timeline ends in December", "B.pdf", 1),
        table("| Item | Cost |\n| Staffing | $350,000 |", "A.pdf", 5),
        narrative("Risk register tracks vendor delays", "B.pdf", 2),
        narrative("Staffing plan lists four engineers", "B.pdf", 3),
    ]
}
