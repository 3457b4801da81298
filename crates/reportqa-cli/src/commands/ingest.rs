//! `reportqa ingest` command implementation

use crate::context::CliContext;
use crate::error::CliError;
use crate::output::{OutputFormat, ProgressBar, Table, print_json};
use colored::Colorize;
use reportqa_foundation::rag::{ChunkerConfig, HybridChunker, IndexManifest};
use reportqa_foundation::{IngestReport, Ingestor};
use reportqa_kernel::config::ConfigError;
use reportqa_kernel::error::error_chain;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug, Serialize)]
struct IngestOutput<'a> {
    index_dir: &'a Path,
    report: &'a IngestReport,
    manifest: &'a IndexManifest,
}

/// Execute the `ingest` command
pub async fn run(
    ctx: &CliContext,
    files: &[PathBuf],
    chunk_size: Option<usize>,
    overlap: Option<usize>,
) -> Result<(), CliError> {
    let chunker = HybridChunker::new(chunker_config(ctx, chunk_size, overlap))
        .map_err(|e| ConfigError::Invalid(e.to_string()))?;
    let index = Arc::new(ctx.settings.build_index()?);
    let ingestor = Ingestor::new(Arc::clone(&index)).with_chunker(chunker);

    let progress = ProgressBar::spinner(
        format!("Ingesting {} document(s)...", files.len()),
        ctx.show_progress(),
    );
    let report = ingestor.ingest(files).await.map_err(|report| {
        tracing::debug!("{report:?}");
        CliError::Ingest(error_chain(report.current_context()))
    })?;

    progress.set_message("Saving vector index...");
    let manifest = index
        .save(&ctx.index_dir)
        .map_err(|e| CliError::index("Failed to save the vector index", e))?;
    drop(progress);

    match ctx.output {
        OutputFormat::Json => print_json(&IngestOutput {
            index_dir: &ctx.index_dir,
            report: &report,
            manifest: &manifest,
        })?,
        OutputFormat::Table => {
            let mut table = Table::builder().header(["Source", "Elements", "Units", "Tables"]);
            for doc in &report.documents {
                table = table.row([
                    doc.source.clone(),
                    doc.elements.to_string(),
                    doc.units.to_string(),
                    doc.tables.to_string(),
                ]);
            }
            table.build().print();
            print_summary(ctx, &report);
        }
        OutputFormat::Text => {
            for doc in &report.documents {
                println!(
                    "  {} {} ({} units, {} tables)",
                    "✓".green(),
                    doc.source.cyan(),
                    doc.units,
                    doc.tables
                );
            }
            print_summary(ctx, &report);
        }
    }

    Ok(())
}

fn chunker_config(
    ctx: &CliContext,
    chunk_size: Option<usize>,
    overlap: Option<usize>,
) -> ChunkerConfig {
    let base = &ctx.settings.chunking;
    ChunkerConfig::new(
        chunk_size.unwrap_or(base.target_size),
        overlap.unwrap_or(base.overlap),
    )
}

fn print_summary(ctx: &CliContext, report: &IngestReport) {
    println!();
    println!(
        "{} Indexed {} units from {} document(s) into {}",
        "→".green(),
        report.total_units.to_string().bold(),
        report.documents.len(),
        ctx.index_dir.display().to_string().cyan()
    );
    println!(
        "  Embeddings: {} ({} dimensions)",
        report.model_id, report.dimensions
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn flags_override_configured_chunking() {
        let ctx = CliContext::for_tests("unused", OutputFormat::Text);

        let config = chunker_config(&ctx, Some(400), None);
        assert_eq!(config.target_size, 400);
        assert_eq!(config.overlap, ctx.settings.chunking.overlap);
    }

    #[tokio::test]
    async fn ingest_writes_index_files() {
        let tmp = TempDir::new().unwrap();
        let doc = tmp.path().join("A.md");
        std::fs::write(
            &doc,
            "# Budget\n\nThe total budget is $500,000 for project A.\n",
        )
        .unwrap();
        let index_dir = tmp.path().join("store");
        let ctx = CliContext::for_tests(&index_dir, OutputFormat::Json);

        run(&ctx, &[doc], None, None).await.unwrap();

        assert!(index_dir.join("manifest.json").is_file());
        assert!(index_dir.join("units.json").is_file());
    }

    #[tokio::test]
    async fn invalid_overlap_is_a_config_error() {
        let tmp = TempDir::new().unwrap();
        let ctx = CliContext::for_tests(tmp.path().join("store"), OutputFormat::Text);

        let err = run(&ctx, &[tmp.path().join("A.md")], Some(100), Some(100))
            .await
            .unwrap_err();
        assert!(matches!(err, CliError::Config(_)));
    }

    #[tokio::test]
    async fn missing_document_reports_the_path() {
        let tmp = TempDir::new().unwrap();
        let ctx = CliContext::for_tests(tmp.path().join("store"), OutputFormat::Text);

        let err = run(&ctx, &[tmp.path().join("missing.md")], None, None)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("missing.md"));
        assert!(!tmp.path().join("store").exists());
    }
}
