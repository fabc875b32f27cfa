//! Error types for catalogue and configuration loading.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while loading manuals or configuration.
///
/// A manual that fails classification is not an error here: it is logged and
/// recorded as a [`Rejection`](crate::Rejection) so one bad declaration does
/// not take the other commands down with it.
#[derive(Debug, Error)]
pub enum CatalogueError {
    /// File I/O failure.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON parsing failure.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// YAML parsing or serialization failure.
    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// A declaration file with an extension other than json, yaml or yml.
    #[error("unsupported declaration file '{}': expected .json, .yaml or .yml", .0.display())]
    UnsupportedFormat(PathBuf),

    /// Configuration values that parse but cannot be used.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// All configured sources failed.
    #[error("no manual sources available")]
    NoSourcesAvailable,
}

/// Convenience alias for results with [`CatalogueError`].
pub type Result<T> = std::result::Result<T, CatalogueError>;
