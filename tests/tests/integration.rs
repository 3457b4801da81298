use reportqa_foundation::Ingestor;
use reportqa_foundation::rag::{
    ChunkerConfig, ElementClassifier, HybridChunker, NOT_FOUND_SENTINEL, RagOrchestrator,
    RetrievalConfig, VectorIndex,
};
use reportqa_kernel::error::{EmbeddingError, GenerationError, IndexError, PipelineError};
use reportqa_kernel::rag::{
    Citation, PipelineState, RetrievalMode, StructuralElement, UnitCategory,
};
use reportqa_testing::fixtures::{REPORT_VOCABULARY, narrative, report_units};
use reportqa_testing::{FailingEmbedder, FailingModel, KeywordEmbedder, ScriptedModel};
use std::sync::Arc;
use tempfile::TempDir;

fn embedder() -> Arc<KeywordEmbedder> {
    Arc::new(KeywordEmbedder::new(REPORT_VOCABULARY.iter().copied()))
}

async fn built_index() -> Arc<VectorIndex> {
    let index = VectorIndex::new(embedder());
    index.build(report_units()).await.unwrap();
    Arc::new(index)
}

#[tokio::test]
async fn answers_budget_question_with_citation() {
    let model = Arc::new(ScriptedModel::new());
    model.add_response("$500,000", "The total budget is $500,000.");
    let orchestrator = RagOrchestrator::new(built_index().await, model.clone());

    let state = orchestrator.run("What is the total budget?").await.unwrap();

    assert!(state.is_done());
    assert_eq!(state.retrieval_mode, Some(RetrievalMode::Similarity));
    assert_eq!(state.answer, "The total budget is $500,000.");
    assert_eq!(state.retrieved_units[0].content(), "Budget\nThe total budget: $500,000");
    assert_eq!(
        state.citations[0],
        Citation::new(Some("A.pdf".to_string()), Some(3))
    );
    reportqa_testing::assert_model_called!(model, 1);

    let prompt = &model.prompts()[0];
    assert!(prompt.starts_with("Answer the question using ONLY the context below."));
    assert!(prompt.contains("(Source: A.pdf, Page: 3)\nBudget\nThe total budget: $500,000"));
    assert!(prompt.contains("Question:\nWhat is the total budget?"));
}

#[tokio::test]
async fn comparative_question_uses_mmr() {
    let model = Arc::new(ScriptedModel::new());
    let orchestrator = RagOrchestrator::new(built_index().await, model.clone());

    let state = orchestrator
        .run("Compare the project timelines")
        .await
        .unwrap();

    assert_eq!(state.retrieval_mode, Some(RetrievalMode::Mmr));
    assert!(!state.retrieved_units.is_empty());
    assert!(state.retrieved_units.len() <= 6);
    assert_eq!(state.answer, NOT_FOUND_SENTINEL);
}

#[tokio::test]
async fn prompt_is_capped_but_citations_cover_all_retrieved_units() {
    let model = Arc::new(ScriptedModel::new());
    let config = RetrievalConfig {
        context_limit: 2,
        ..RetrievalConfig::default()
    };
    let orchestrator = RagOrchestrator::new(built_index().await, model.clone())
        .with_config(config)
        .unwrap();

    let state = orchestrator.run("What is the total budget?").await.unwrap();

    assert_eq!(state.retrieved_units.len(), 4);
    assert_eq!(model.prompts()[0].matches("(Source: ").count(), 2);
    // No two retrieved fixture units share a (source, page)
    assert_eq!(state.citations.len(), 4);
}

#[tokio::test]
async fn citations_are_deduplicated_in_first_seen_order() {
    let index = VectorIndex::new(embedder());
    index
        .build(vec![
            narrative("The total budget: $500,000", "A.pdf", 3),
            narrative("The budget total was revised", "A.pdf", 3),
            narrative("Budget risk from vendor delays", "B.pdf", 2),
        ])
        .await
        .unwrap();
    let orchestrator = RagOrchestrator::new(Arc::new(index), Arc::new(ScriptedModel::new()));

    let state = orchestrator.run("What is the total budget?").await.unwrap();

    assert_eq!(state.retrieved_units.len(), 3);
    assert_eq!(
        state.citations,
        vec![
            Citation::new(Some("A.pdf".to_string()), Some(3)),
            Citation::new(Some("B.pdf".to_string()), Some(2)),
        ]
    );
}

#[tokio::test]
async fn mmr_with_full_relevance_matches_similarity_search() {
    let index = built_index().await;

    let similar = index.similarity_search("project timeline budget", 3).await.unwrap();
    let mmr = index.mmr_search("project timeline budget", 3, 3, 1.0).await.unwrap();

    assert_eq!(similar, mmr);
}

#[tokio::test]
async fn saved_index_answers_like_the_original() {
    let tmp = TempDir::new().unwrap();
    let original = built_index().await;
    let manifest = original.save(tmp.path()).unwrap();

    let reloaded = VectorIndex::new(embedder());
    let loaded = reloaded.load(tmp.path()).unwrap();

    assert_eq!(loaded, manifest);
    for query in ["What is the total budget?", "staffing plan", "vendor risk"] {
        assert_eq!(
            original.similarity_search_with_scores(query, 4).await.unwrap(),
            reloaded.similarity_search_with_scores(query, 4).await.unwrap(),
        );
    }
}

#[tokio::test]
async fn generate_without_units_never_calls_the_model() {
    let model = Arc::new(ScriptedModel::new());
    let orchestrator = RagOrchestrator::new(built_index().await, model.clone());
    let mut state = PipelineState::new("What is the total budget?");

    let err = orchestrator.generate(&mut state).await.unwrap_err();

    assert!(matches!(err, GenerationError::NoContext));
    assert!(state.answer.is_empty());
    reportqa_testing::assert_model_called!(model, 0);
}

#[tokio::test]
async fn cite_without_units_yields_no_citations() {
    let orchestrator = RagOrchestrator::new(built_index().await, Arc::new(ScriptedModel::new()));
    let mut state = PipelineState::new("anything");

    orchestrator.cite(&mut state);

    assert!(state.citations.is_empty());
}

#[tokio::test]
async fn uninitialized_index_fails_retrieval() {
    let model = Arc::new(ScriptedModel::new());
    let orchestrator = RagOrchestrator::new(Arc::new(VectorIndex::new(embedder())), model.clone());

    let err = orchestrator.run("What is the total budget?").await.unwrap_err();

    match err {
        PipelineError::Retrieval(e) => {
            assert!(matches!(e.index_error(), IndexError::NotInitialized));
        }
        other => panic!("expected retrieval failure, got {other:?}"),
    }
    reportqa_testing::assert_model_called!(model, 0);
}

#[tokio::test]
async fn unreachable_model_fails_generation() {
    let model = Arc::new(FailingModel::new());
    let orchestrator = RagOrchestrator::new(built_index().await, model.clone());

    let err = orchestrator.run("What is the total budget?").await.unwrap_err();

    assert!(matches!(
        err,
        PipelineError::Generation(GenerationError::Model(_))
    ));
    assert_eq!(err.to_string(), "Answer generation failed");
    reportqa_testing::assert_model_called!(model, 1);
}

#[tokio::test]
async fn unreachable_embedder_leaves_index_empty() {
    let index = VectorIndex::new(Arc::new(FailingEmbedder));

    let err = index.build(report_units()).await.unwrap_err();

    assert!(matches!(
        err,
        IndexError::Embedding(EmbeddingError::Provider(_))
    ));
    assert!(!index.is_initialized());
}

#[test]
fn chunking_keeps_tables_whole_and_bounds_narrative() {
    let long_text = "The budget covers staffing and hardware for the year. ".repeat(10);
    let big_table = format!(
        "| Item | Cost |\n{}",
        "| Staffing | $350,000 |\n".repeat(8)
    );
    let classified = ElementClassifier::new()
        .classify(vec![
            StructuralElement::title("Budget").with_page(1),
            StructuralElement::narrative(&long_text).with_page(1),
            StructuralElement::table(&big_table).with_page(2),
        ])
        .unwrap();
    let chunker = HybridChunker::new(ChunkerConfig::new(100, 20)).unwrap();

    let units = chunker.chunk(&classified).unwrap();

    let tables: Vec<_> = units
        .iter()
        .filter(|u| u.category() == UnitCategory::Table)
        .collect();
    assert_eq!(tables.len(), 1);
    assert_eq!(tables[0].content(), big_table.trim());
    assert_eq!(tables[0].page(), Some(2));

    let narrative: Vec<_> = units
        .iter()
        .filter(|u| u.category() == UnitCategory::Narrative)
        .collect();
    assert!(narrative.len() > 1);
    assert!(narrative[0].content().starts_with("Budget"));
    assert!(narrative.iter().all(|u| u.content().chars().count() <= 100));
    assert!(narrative.iter().all(|u| u.page() == Some(1)));
}

#[tokio::test]
async fn ingested_files_are_searchable_by_source() {
    let tmp = TempDir::new().unwrap();
    let a = tmp.path().join("A.md");
    let b = tmp.path().join("B.txt");
    std::fs::write(&a, "# Budget\n\nThe total budget: $500,000 for project A.\n").unwrap();
    std::fs::write(&b, "Project B timeline ends in December.\n\nStaffing plan lists four engineers.\n").unwrap();

    let embedder = embedder();
    let index = Arc::new(VectorIndex::new(embedder.clone()));
    let report = Ingestor::new(Arc::clone(&index))
        .ingest(&[a, b])
        .await
        .unwrap();

    assert_eq!(report.documents.len(), 2);
    assert_eq!(report.total_units, index.len());
    assert_eq!(report.dimensions, embedder.dimensions());
    assert_eq!(embedder.batch_count(), 1);

    let hits = index.similarity_search("total budget", 1).await.unwrap();
    assert_eq!(hits[0].source(), Some("A.md"));
    assert!(hits[0].content().contains("$500,000"));
}
