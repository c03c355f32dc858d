//! Configuration error types.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file at {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse TOML config at {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("failed to build configuration: {0}")]
    BuildError(String),

    /// Configuration conflict (spec.md §7 error taxonomy, class 3): a
    /// reload tried to change a value that must stay fixed for a running
    /// node.
    #[error("refusing reload: {field} cannot change on a running node ({old} -> {new})")]
    ImmutableFieldChanged {
        field: &'static str,
        old: String,
        new: String,
    },

    #[error("invalid configuration: {0}")]
    ValidationError(String),

    #[error("XDG directory error: {0}")]
    XdgError(String),
}
