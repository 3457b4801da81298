//! RAG pipeline contracts and per-run state.

use crate::error::ProviderError;
use crate::rag::types::{Citation, RetrievalMode, RetrievalUnit};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// The prompt-to-text collaborator used by the generate stage.
#[async_trait]
pub trait CompletionModel: Send + Sync {
    /// Identifier of the underlying model, for logs.
    fn model_id(&self) -> &str;

    /// Complete `prompt` and return the full response text.
    async fn complete(&self, prompt: &str) -> Result<String, ProviderError>;
}

/// Stages of a run, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PipelineStage {
    Retrieve,
    Generate,
    Cite,
    Done,
}

impl PipelineStage {
    /// The stage that follows this one. `Done` is terminal.
    pub fn next(self) -> Self {
        match self {
            Self::Retrieve => Self::Generate,
            Self::Generate => Self::Cite,
            Self::Cite | Self::Done => Self::Done,
        }
    }
}

/// State threaded through the stages of one question-answering run.
///
/// Created fresh for every query and returned to the caller once the
/// `Done` stage is reached. Nothing in it outlives the call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineState {
    pub query: String,
    pub retrieved_units: Vec<RetrievalUnit>,
    pub answer: String,
    pub citations: Vec<Citation>,
    pub retrieval_mode: Option<RetrievalMode>,
    stage: PipelineStage,
}

impl PipelineState {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            retrieved_units: Vec::new(),
            answer: String::new(),
            citations: Vec::new(),
            retrieval_mode: None,
            stage: PipelineStage::Retrieve,
        }
    }

    pub fn stage(&self) -> PipelineStage {
        self.stage
    }

    /// Move to the next stage.
    pub fn advance(&mut self) {
        self.stage = self.stage.next();
    }

    pub fn is_done(&self) -> bool {
        self.stage == PipelineStage::Done
    }
}
