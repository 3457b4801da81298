//! Configuration loading
//!
//! Thin layer over the `config` crate used by the settings of every
//! reportqa component.
//!
//! ## Features
//!
//! - Format auto-detection from the file extension (YAML, TOML, JSON, INI, RON, JSON5)
//! - Environment variable substitution inside files (`${VAR}` and `$VAR`)
//! - Layering: serialized defaults, then an optional file, then
//!   `PREFIX__SECTION__KEY` environment overrides

use config::{Config as Cfg, Environment, File, FileFormat};
use regex::Regex;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::LazyLock;

pub use config::FileFormat as Format;

static BRACED_VAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("braced env var pattern is valid")
});

static BARE_VAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$([A-Za-z_][A-Za-z0-9_]*)\b").expect("bare env var pattern is valid")
});

/// Configuration loading error
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parsing error: {0}")]
    Parse(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Result type for config operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Detect configuration format from file extension
///
/// # Supported Extensions
///
/// - YAML: `.yaml`, `.yml`
/// - TOML: `.toml`
/// - JSON: `.json`
/// - INI: `.ini`
/// - RON: `.ron`
/// - JSON5: `.json5`
pub fn detect_format(path: &Path) -> ConfigResult<FileFormat> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .ok_or_else(|| ConfigError::UnsupportedFormat("No file extension found".to_string()))?;

    match ext.to_lowercase().as_str() {
        "yaml" | "yml" => Ok(FileFormat::Yaml),
        "toml" => Ok(FileFormat::Toml),
        "json" => Ok(FileFormat::Json),
        "ini" => Ok(FileFormat::Ini),
        "ron" => Ok(FileFormat::Ron),
        "json5" => Ok(FileFormat::Json5),
        _ => Err(ConfigError::UnsupportedFormat(ext.to_string())),
    }
}

/// Substitute environment variables in a string
///
/// `${VAR_NAME}` is replaced first, then bare `$VAR_NAME`. References to
/// unset variables are left untouched.
///
/// ```rust,ignore
/// std::env::set_var("LMSTUDIO_API_BASE", "http://localhost:1234/v1");
/// let result = substitute_env_vars("base_url = \"${LMSTUDIO_API_BASE}\"");
/// assert_eq!(result, "base_url = \"http://localhost:1234/v1\"");
/// ```
pub fn substitute_env_vars(content: &str) -> String {
    let braced = BRACED_VAR.replace_all(content, |caps: &regex::Captures| {
        std::env::var(&caps[1]).unwrap_or_else(|_| caps[0].to_string())
    });

    BARE_VAR
        .replace_all(&braced, |caps: &regex::Captures| {
            std::env::var(&caps[1]).unwrap_or_else(|_| caps[0].to_string())
        })
        .into_owned()
}

/// Load configuration from a string with an explicit format
pub fn from_str<T>(content: &str, format: FileFormat) -> ConfigResult<T>
where
    T: DeserializeOwned,
{
    let substituted = substitute_env_vars(content);

    Cfg::builder()
        .add_source(File::from_str(&substituted, format))
        .build()
        .map_err(|e| ConfigError::Parse(e.to_string()))?
        .try_deserialize()
        .map_err(|e| ConfigError::Serialization(e.to_string()))
}

/// Load configuration from a file, detecting the format from its extension
pub fn load_config<T>(path: &Path) -> ConfigResult<T>
where
    T: DeserializeOwned,
{
    let format = detect_format(path)?;
    let content = std::fs::read_to_string(path)?;
    from_str(&content, format)
}

/// Load layered configuration
///
/// Sources, later overriding earlier:
/// 1. `defaults` serialized as the base layer
/// 2. the file at `path`, if given
/// 3. environment variables named `{env_prefix}__SECTION__KEY`
///
/// ```rust,ignore
/// // REPORTQA__LLM__MODEL=mistral-7b overrides `llm.model`
/// let settings: Settings = load_layered(&Settings::default(), Some(path), "REPORTQA")?;
/// ```
pub fn load_layered<T>(defaults: &T, path: Option<&Path>, env_prefix: &str) -> ConfigResult<T>
where
    T: Serialize + DeserializeOwned,
{
    let base = Cfg::try_from(defaults).map_err(|e| ConfigError::Serialization(e.to_string()))?;
    let mut builder = Cfg::builder().add_source(base);

    if let Some(path) = path {
        let format = detect_format(path)?;
        tracing::debug!(path = %path.display(), "loading config file");
        let content = std::fs::read_to_string(path)?;
        let substituted = substitute_env_vars(&content);
        builder = builder.add_source(File::from_str(&substituted, format));
    }

    builder
        .add_source(
            Environment::with_prefix(env_prefix)
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .map_err(|e| ConfigError::Parse(e.to_string()))?
        .try_deserialize()
        .map_err(|e| ConfigError::Serialization(e.to_string()))
}
