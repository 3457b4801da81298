//! Retrieve, generate, cite
//!
//! A fixed three-stage question-answering pipeline over a [`VectorIndex`].
//! Each run threads a fresh [`PipelineState`] through the stages in order;
//! there is no branching and no retry, and any stage failure aborts the run.

use super::index::VectorIndex;
use super::router::RetrievalRouter;
use reportqa_kernel::error::{
    GenerationError, PipelineError, RetrievalConfigError, RetrievalError, error_chain,
};
use reportqa_kernel::rag::{Citation, CompletionModel, PipelineState, RetrievalMode, RetrievalUnit};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{error, info};

/// Answer the model is told to give when the context lacks the answer.
pub const NOT_FOUND_SENTINEL: &str = "Not found in documents.";

/// Retrieval parameters for each mode, and the generation context budget.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Units returned by similarity search
    pub similarity_k: usize,
    /// Units selected by MMR
    pub mmr_k: usize,
    /// Candidates fetched before MMR selection
    pub mmr_fetch_k: usize,
    /// MMR relevance/diversity balance
    pub mmr_lambda: f32,
    /// Maximum retrieved units placed in the prompt
    pub context_limit: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            similarity_k: 4,
            mmr_k: 6,
            mmr_fetch_k: 20,
            mmr_lambda: 0.5,
            context_limit: 4,
        }
    }
}

impl RetrievalConfig {
    /// Check the parameters, reporting the first violation.
    pub fn validate(&self) -> Result<(), RetrievalConfigError> {
        if self.similarity_k == 0 {
            return Err(RetrievalConfigError::Zero("similarity_k"));
        }
        if self.mmr_k == 0 {
            return Err(RetrievalConfigError::Zero("mmr_k"));
        }
        if self.mmr_fetch_k < self.mmr_k {
            return Err(RetrievalConfigError::FetchBelowK {
                k: self.mmr_k,
                fetch_k: self.mmr_fetch_k,
            });
        }
        if !(0.0..=1.0).contains(&self.mmr_lambda) {
            return Err(RetrievalConfigError::LambdaOutOfRange(self.mmr_lambda));
        }
        if self.context_limit == 0 {
            return Err(RetrievalConfigError::Zero("context_limit"));
        }
        Ok(())
    }
}

/// Render units as prompt context: a `(Source: X, Page: Y)` header line
/// above each unit's content, blocks separated by a blank line.
pub fn format_context(units: &[RetrievalUnit]) -> String {
    units
        .iter()
        .map(|unit| {
            let page = unit
                .page()
                .map_or_else(|| "unknown".to_string(), |p| p.to_string());
            format!(
                "(Source: {}, Page: {})\n{}",
                unit.source().unwrap_or("unknown"),
                page,
                unit.content()
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Build the constrained answering prompt.
pub fn build_prompt(query: &str, units: &[RetrievalUnit]) -> String {
    format!(
        "Answer the question using ONLY the context below.\n\n\
         Context:\n{context}\n\n\
         Question:\n{query}\n\n\
         If the answer is not in the context, say \"{NOT_FOUND_SENTINEL}\"",
        context = format_context(units),
    )
}

/// Project units onto citations, dropping repeats and keeping first-occurrence order.
pub fn collect_citations(units: &[RetrievalUnit]) -> Vec<Citation> {
    let mut seen = HashSet::new();
    units
        .iter()
        .map(Citation::from_unit)
        .filter(|citation| seen.insert(citation.clone()))
        .collect()
}

/// The question-answering pipeline.
///
/// # Example
///
/// ```rust,ignore
/// let orchestrator = RagOrchestrator::new(index, Arc::new(OpenAiChatModel::new(config)));
/// let state = orchestrator.run("What is the total budget?").await?;
/// println!("{} ({} sources)", state.answer, state.citations.len());
/// ```
pub struct RagOrchestrator {
    index: Arc<VectorIndex>,
    model: Arc<dyn CompletionModel>,
    router: RetrievalRouter,
    config: RetrievalConfig,
}

impl RagOrchestrator {
    pub fn new(index: Arc<VectorIndex>, model: Arc<dyn CompletionModel>) -> Self {
        Self {
            index,
            model,
            router: RetrievalRouter::default(),
            config: RetrievalConfig::default(),
        }
    }

    #[must_use]
    pub fn with_router(mut self, router: RetrievalRouter) -> Self {
        self.router = router;
        self
    }

    /// Replace the retrieval parameters. Invalid parameters are rejected here
    /// so a run never starts with them.
    pub fn with_config(mut self, config: RetrievalConfig) -> Result<Self, RetrievalConfigError> {
        config.validate()?;
        self.config = config;
        Ok(self)
    }

    pub fn config(&self) -> &RetrievalConfig {
        &self.config
    }

    pub fn index(&self) -> &Arc<VectorIndex> {
        &self.index
    }

    /// Answer `query` from the indexed documents.
    pub async fn run(&self, query: &str) -> Result<PipelineState, PipelineError> {
        info!(model = %self.model.model_id(), "RAG pipeline invoked");
        let mut state = PipelineState::new(query);

        self.retrieve(&mut state).await?;
        state.advance();

        self.generate(&mut state).await?;
        state.advance();

        self.cite(&mut state);
        state.advance();

        info!(
            retrieval_mode = ?state.retrieval_mode,
            units = state.retrieved_units.len(),
            citations = state.citations.len(),
            "RAG pipeline completed"
        );
        Ok(state)
    }

    /// Retrieve stage: route the query and search the index.
    pub async fn retrieve(&self, state: &mut PipelineState) -> Result<(), RetrievalError> {
        let mode = self.router.select_mode(&state.query);
        let config = &self.config;

        let result = match mode {
            RetrievalMode::Similarity => {
                self.index
                    .similarity_search(&state.query, config.similarity_k)
                    .await
            }
            RetrievalMode::Mmr => {
                self.index
                    .mmr_search(&state.query, config.mmr_k, config.mmr_fetch_k, config.mmr_lambda)
                    .await
            }
        };

        match result {
            Ok(units) => {
                info!(mode = %mode, units = units.len(), "Retrieval completed");
                state.retrieved_units = units;
                state.retrieval_mode = Some(mode);
                Ok(())
            }
            Err(err) => {
                let err = RetrievalError::from(err);
                error!(mode = %mode, error = %error_chain(&err), "Retrieval failed");
                Err(err)
            }
        }
    }

    /// Generate stage: prompt the model with the leading retrieved units.
    pub async fn generate(&self, state: &mut PipelineState) -> Result<(), GenerationError> {
        let limit = self.config.context_limit.min(state.retrieved_units.len());
        let context = &state.retrieved_units[..limit];
        if context.is_empty() {
            return Err(GenerationError::NoContext);
        }

        let prompt = build_prompt(&state.query, context);
        match self.model.complete(&prompt).await {
            Ok(answer) => {
                info!(context_units = context.len(), answer_chars = answer.len(), "Answer generated");
                state.answer = answer;
                Ok(())
            }
            Err(err) => {
                let err = GenerationError::from(err);
                error!(error = %error_chain(&err), "LLM generation failed");
                Err(err)
            }
        }
    }

    /// Cite stage: one citation per distinct (source, page) among all retrieved units.
    pub fn cite(&self, state: &mut PipelineState) {
        state.citations = collect_citations(&state.retrieved_units);
    }
}
