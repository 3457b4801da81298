//! CLI context shared by every command

use crate::cli::Cli;
use crate::error::CliError;
use crate::output::OutputFormat;
use reportqa_foundation::Settings;
use std::path::PathBuf;

/// Resolved settings and global flags for one invocation
pub struct CliContext {
    pub settings: Settings,
    /// Where the vector index is saved and loaded
    pub index_dir: PathBuf,
    pub output: OutputFormat,
    pub verbose: bool,
}

impl CliContext {
    pub fn from_cli(cli: &Cli) -> Result<Self, CliError> {
        let settings = Settings::load(cli.config.as_deref())?;
        let index_dir = cli
            .index_dir
            .clone()
            .unwrap_or_else(|| settings.vector_store_dir.clone());

        tracing::debug!(
            env = %settings.env,
            index_dir = %index_dir.display(),
            llm = %settings.llm.model,
            "Settings resolved"
        );

        Ok(Self {
            settings,
            index_dir,
            output: cli.output,
            verbose: cli.verbose,
        })
    }

    /// Spinners only make sense for human-readable output.
    pub fn show_progress(&self) -> bool {
        self.output == OutputFormat::Text
    }
}

#[cfg(test)]
impl CliContext {
    pub fn for_tests(index_dir: impl Into<PathBuf>, output: OutputFormat) -> Self {
        Self {
            settings: Settings::default(),
            index_dir: index_dir.into(),
            output,
            verbose: false,
        }
    }
}
