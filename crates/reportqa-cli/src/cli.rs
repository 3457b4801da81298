//! CLI command definitions using clap

use crate::output::OutputFormat;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// reportqa - ask cited questions about your documents
#[derive(Parser)]
#[command(name = "reportqa")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Output format (text, json, table)
    #[arg(short = 'o', long, global = true, default_value_t = OutputFormat::Text)]
    pub output: OutputFormat,

    /// Configuration file path
    #[arg(short = 'c', long, global = true, env = "REPORTQA_CONFIG")]
    pub config: Option<PathBuf>,

    /// Vector index directory (overrides `vector_store_dir`)
    #[arg(long, global = true)]
    pub index_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Parse, chunk and embed documents, then save the index
    Ingest {
        /// Documents to ingest (.txt, .md)
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Maximum characters per narrative chunk
        #[arg(long)]
        chunk_size: Option<usize>,

        /// Characters shared between consecutive chunks
        #[arg(long)]
        overlap: Option<usize>,
    },

    /// Answer a question from the ingested documents
    Ask {
        /// The question
        question: String,
    },

    /// Show the saved index manifest
    Inspect {
        /// Also list the indexed chunks
        #[arg(long)]
        units: bool,
    },
}
