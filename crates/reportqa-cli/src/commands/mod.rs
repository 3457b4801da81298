//! Command implementations

pub mod ask;
pub mod ingest;
pub mod inspect;

use crate::context::CliContext;
use crate::error::CliError;
use reportqa_foundation::rag::VectorIndex;
use reportqa_kernel::error::IndexError;

/// Load the saved index with the configured embedder.
pub(crate) fn load_index(ctx: &CliContext) -> Result<VectorIndex, CliError> {
    let index = ctx.settings.build_index()?;
    match index.load(&ctx.index_dir) {
        Ok(_) => Ok(index),
        Err(err @ IndexError::NotFound(_)) => Err(CliError::index(
            format!(
                "No vector index at '{}'. Run `reportqa ingest <files>` first.",
                ctx.index_dir.display()
            ),
            err,
        )),
        Err(err) => Err(CliError::index(
            format!("Failed to load the vector index from '{}'", ctx.index_dir.display()),
            err,
        )),
    }
}
