//! `reportqa ask` command implementation

use super::load_index;
use crate::context::CliContext;
use crate::error::CliError;
use crate::output::{OutputFormat, ProgressBar, Table, print_json};
use colored::Colorize;
use reportqa_foundation::rag::RagOrchestrator;
use reportqa_kernel::config::ConfigError;
use reportqa_kernel::rag::{Citation, PipelineState};
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Serialize)]
struct AskOutput<'a> {
    question: &'a str,
    answer: &'a str,
    citations: &'a [Citation],
    retrieval_mode: Option<&'static str>,
    chunks_used: usize,
}

impl<'a> From<&'a PipelineState> for AskOutput<'a> {
    fn from(state: &'a PipelineState) -> Self {
        Self {
            question: &state.query,
            answer: &state.answer,
            citations: &state.citations,
            retrieval_mode: state.retrieval_mode.map(|m| m.as_str()),
            chunks_used: state.retrieved_units.len(),
        }
    }
}

/// Execute the `ask` command
pub async fn run(ctx: &CliContext, question: &str) -> Result<(), CliError> {
    let index = Arc::new(load_index(ctx)?);
    let orchestrator = RagOrchestrator::new(index, ctx.settings.build_completion_model())
        .with_router(ctx.settings.router())
        .with_config(ctx.settings.retrieval_config())
        .map_err(|e| ConfigError::Invalid(e.to_string()))?;

    let progress = ProgressBar::spinner("Searching documents...", ctx.show_progress());
    let state = orchestrator.run(question).await?;
    drop(progress);

    render(ctx, &state)
}

fn render(ctx: &CliContext, state: &PipelineState) -> Result<(), CliError> {
    let mode = state.retrieval_mode.map_or("unknown", |m| m.as_str());

    match ctx.output {
        OutputFormat::Json => print_json(&AskOutput::from(state))?,
        OutputFormat::Table => {
            Table::key_value([
                ("Answer", state.answer.clone()),
                ("Retrieval mode", mode.to_string()),
                ("Chunks used", state.retrieved_units.len().to_string()),
            ])
            .print();

            if !state.citations.is_empty() {
                let mut table = Table::builder().header(["Source", "Page"]);
                for citation in &state.citations {
                    table = table.row([
                        citation.source.clone().unwrap_or_else(|| "unknown".to_string()),
                        citation
                            .page
                            .map_or_else(|| "-".to_string(), |p| p.to_string()),
                    ]);
                }
                table.build().print();
            }
        }
        OutputFormat::Text => {
            println!("{}", "Answer".bold());
            println!("{}", state.answer);

            if !state.citations.is_empty() {
                println!();
                println!("{}", "Sources".bold());
                for citation in &state.citations {
                    println!("  - {}", citation_line(citation));
                }
            }

            if ctx.verbose {
                println!();
                println!("{}", "Debug Info".dimmed());
                println!("  Retrieval mode: {mode}");
                println!("  Chunks used: {}", state.retrieved_units.len());
            }
        }
    }

    Ok(())
}

fn citation_line(citation: &Citation) -> String {
    let source = citation.source.as_deref().unwrap_or("unknown");
    match citation.page {
        Some(page) => format!("{} (Page {page})", source.cyan()),
        None => source.cyan().to_string(),
    }
}
