//! Error types for the migrate CLI
//!
//! Every variant is user-facing: the message says what went wrong and where
//! to look to fix it.

use migrate_common::MigrateError;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Error, Debug)]
pub enum CliError {
    /// Configuration is missing or invalid
    #[error("Configuration error: {0}. Check the MIGRATE_* environment variables and command-line flags.")]
    Config(String),

    /// Input file does not exist
    #[error("Input file not found: '{}'. Pass --input or set MIGRATE_INPUT.", .0.display())]
    InputNotFound(PathBuf),

    /// A catalog source could not be loaded
    #[error("Failed to load catalog '{}': {reason}. Check --attributes-catalog, --reference-catalog and --configuration.", path.display())]
    Catalog { path: PathBuf, reason: String },

    /// Input is not valid JSON
    #[error("Malformed input at byte {offset}: {reason}. Input must be a JSON array of objects or a sequence of JSON objects.")]
    MalformedInput { offset: usize, reason: String },

    /// Run interrupted
    #[error("Migration cancelled. Output written so far was kept.")]
    Cancelled,

    /// File system operation failed
    #[error("File operation failed: {0}. Check file permissions and disk space.")]
    Io(#[from] std::io::Error),

    /// JSON serialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<MigrateError> for CliError {
    fn from(err: MigrateError) -> Self {
        match err {
            MigrateError::Io(e) => CliError::Io(e),
            MigrateError::Serialization(e) => CliError::Json(e),
            MigrateError::InputNotFound(path) => CliError::InputNotFound(path),
            MigrateError::Catalog { path, reason } => CliError::Catalog { path, reason },
            MigrateError::MalformedInput { offset, reason } => {
                CliError::MalformedInput { offset, reason }
            },
            MigrateError::Config(msg) => CliError::Config(msg),
            MigrateError::Cancelled => CliError::Cancelled,
        }
    }
}

impl CliError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_carry_remediation() {
        let err = CliError::from(MigrateError::InputNotFound(PathBuf::from("samples/in.json")));
        let msg = err.to_string();
        assert!(msg.contains("samples/in.json"));
        assert!(msg.contains("--input"));
    }

    #[test]
    fn test_engine_errors_map_to_cli_variants() {
        assert!(matches!(
            CliError::from(MigrateError::malformed(3, "bad")),
            CliError::MalformedInput { offset: 3, .. }
        ));
        assert!(matches!(CliError::from(MigrateError::Cancelled), CliError::Cancelled));
        assert!(matches!(
            CliError::from(MigrateError::catalog("a.json", "missing")),
            CliError::Catalog { .. }
        ));
    }
}
