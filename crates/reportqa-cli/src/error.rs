use reportqa_kernel::config::ConfigError;
use reportqa_kernel::error::{IndexError, PipelineError};

#[derive(thiserror::Error, Debug)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Ingestion failed: {0}")]
    Ingest(String),

    #[error("{message}")]
    Index {
        message: String,
        #[source]
        source: IndexError,
    },

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    pub fn index(message: impl Into<String>, source: IndexError) -> Self {
        Self::Index {
            message: message.into(),
            source,
        }
    }
}
