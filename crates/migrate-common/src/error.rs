//! Error types shared by the migration crates

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for run-level migration operations
pub type Result<T> = std::result::Result<T, MigrateError>;

/// Run-level failures.
///
/// Everything here aborts a migration run. Per-record mapping failures are
/// not represented: the orchestrator recovers from those and counts them.
#[derive(Error, Debug)]
pub enum MigrateError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Input file not found: {0}")]
    InputNotFound(PathBuf),

    #[error("Failed to load catalog '{}': {reason}", path.display())]
    Catalog { path: PathBuf, reason: String },

    #[error("Malformed JSON input at byte {offset}: {reason}")]
    MalformedInput { offset: usize, reason: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Migration cancelled")]
    Cancelled,
}

impl MigrateError {
    /// Create a catalog load error
    pub fn catalog(path: impl Into<PathBuf>, reason: impl std::fmt::Display) -> Self {
        Self::Catalog {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Create a malformed input error
    pub fn malformed(offset: usize, reason: impl Into<String>) -> Self {
        Self::MalformedInput {
            offset,
            reason: reason.into(),
        }
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
