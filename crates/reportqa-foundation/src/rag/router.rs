//! Query routing
//!
//! Picks the retrieval strategy for a query. Questions that compare or
//! span several items benefit from diverse context (MMR); everything else
//! uses plain similarity search.

use reportqa_kernel::rag::RetrievalMode;
use tracing::debug;

/// Keywords that signal a comparative or multi-item question.
pub const DEFAULT_COMPARATIVE_KEYWORDS: [&str; 8] = [
    "compare",
    "comparison",
    "difference",
    "timeline",
    "timelines",
    "multiple",
    "projects",
    "across",
];

/// Keyword-based router between similarity and MMR retrieval.
#[derive(Debug, Clone)]
pub struct RetrievalRouter {
    keywords: Vec<String>,
}

impl Default for RetrievalRouter {
    fn default() -> Self {
        Self::with_keywords(DEFAULT_COMPARATIVE_KEYWORDS)
    }
}

impl RetrievalRouter {
    /// Router with a custom keyword set. Keywords are matched lowercased.
    pub fn with_keywords<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            keywords: keywords
                .into_iter()
                .map(|k| k.as_ref().trim().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect(),
        }
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    /// MMR when the lowercased query contains any keyword as a substring.
    pub fn select_mode(&self, query: &str) -> RetrievalMode {
        let lowered = query.to_lowercase();
        let matched = self.keywords.iter().find(|k| lowered.contains(k.as_str()));

        let mode = if matched.is_some() {
            RetrievalMode::Mmr
        } else {
            RetrievalMode::Similarity
        };
        debug!(mode = %mode, keyword = matched.map(String::as_str), "Retrieval mode selected");
        mode
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comparative_queries_use_mmr() {
        let router = RetrievalRouter::default();
        assert_eq!(
            router.select_mode("Compare timelines across the two projects"),
            RetrievalMode::Mmr
        );
        assert_eq!(
            router.select_mode("What is the DIFFERENCE between A and B?"),
            RetrievalMode::Mmr
        );
    }

    #[test]
    fn plain_queries_use_similarity() {
        let router = RetrievalRouter::default();
        assert_eq!(
            router.select_mode("What is the budget for Project A?"),
            RetrievalMode::Similarity
        );
        assert_eq!(router.select_mode(""), RetrievalMode::Similarity);
    }

    #[test]
    fn matching_is_by_substring() {
        // "projects" is a keyword; "project" alone is not.
        let router = RetrievalRouter::default();
        assert_eq!(router.select_mode("list all projects"), RetrievalMode::Mmr);
        assert_eq!(router.select_mode("list the project"), RetrievalMode::Similarity);
    }

    #[test]
    fn custom_keywords_replace_defaults() {
        let router = RetrievalRouter::with_keywords(["Versus", "  "]);
        assert_eq!(router.keywords(), ["versus".to_string()]);
        assert_eq!(router.select_mode("A versus B"), RetrievalMode::Mmr);
        assert_eq!(router.select_mode("compare A and B"), RetrievalMode::Similarity);
    }
}
