//! `reportqa inspect` command implementation

use super::load_index;
use crate::context::CliContext;
use crate::error::CliError;
use crate::output::{OutputFormat, Table, print_json};
use colored::Colorize;
use reportqa_foundation::rag::IndexManifest;
use reportqa_kernel::rag::RetrievalUnit;
use serde::Serialize;

const PREVIEW_CHARS: usize = 60;

#[derive(Debug, Serialize)]
struct InspectOutput<'a> {
    index_dir: String,
    manifest: &'a IndexManifest,
    #[serde(skip_serializing_if = "Option::is_none")]
    units: Option<&'a [RetrievalUnit]>,
}

/// Execute the `inspect` command
pub fn run(ctx: &CliContext, show_units: bool) -> Result<(), CliError> {
    let index = load_index(ctx)?;
    // load_index only returns an initialized index
    let Some(manifest) = index.manifest() else {
        return Ok(());
    };
    let units = if show_units { index.units() } else { Vec::new() };

    match ctx.output {
        OutputFormat::Json => print_json(&InspectOutput {
            index_dir: ctx.index_dir.display().to_string(),
            manifest: &manifest,
            units: show_units.then_some(units.as_slice()),
        })?,
        OutputFormat::Table | OutputFormat::Text => {
            println!(
                "{} Vector index at {}",
                "→".green(),
                ctx.index_dir.display().to_string().cyan()
            );
            manifest_table(&manifest).print();
            if show_units {
                units_table(&units).print();
            }
        }
    }

    Ok(())
}

fn manifest_table(manifest: &IndexManifest) -> Table {
    Table::key_value([
        ("Format version", manifest.format_version.to_string()),
        ("Embedding model", manifest.model_id.clone()),
        ("Metric", manifest.metric.to_string()),
        ("Dimensions", manifest.dimensions.to_string()),
        ("Units", manifest.count.to_string()),
        ("Created", manifest.created_at.to_rfc3339()),
    ])
}

fn units_table(units: &[RetrievalUnit]) -> Table {
    let mut table = Table::builder().header(["#", "Source", "Page", "Category", "Preview"]);
    for (i, unit) in units.iter().enumerate() {
        table = table.row([
            (i + 1).to_string(),
            unit.source().unwrap_or("unknown").to_string(),
            unit.page().map_or_else(|| "-".to_string(), |p| p.to_string()),
            unit.category().to_string(),
            preview(unit.content()),
        ]);
    }
    table.build()
}

fn preview(content: &str) -> String {
    let flat = content.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= PREVIEW_CHARS {
        return flat;
    }
    let cut: String = flat.chars().take(PREVIEW_CHARS).collect();
    format!("{cut}...")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preview_flattens_and_truncates() {
        assert_eq!(preview("Budget\n\n  total"), "Budget total");

        let long = "word ".repeat(40);
        let short = preview(&long);
        assert!(short.ends_with("..."));
        assert_eq!(short.chars().count(), PREVIEW_CHARS + 3);
    }
}
