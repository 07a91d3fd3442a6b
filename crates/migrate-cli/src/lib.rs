//! Migrate CLI Library
//!
//! Command-line front end for the migration engine. It resolves the run
//! configuration, loads catalogs when the selected mapper needs them, runs the
//! pipeline and reports the outcome.
//!
//! Exit codes of the `migrate` binary:
//!
//! - `0`: every record was mapped or deliberately skipped
//! - `1`: the run failed (missing or malformed input, catalog, configuration)
//! - `2`: the run completed but at least one record failed to map

#![deny(clippy::unwrap_used, clippy::expect_used)]

pub mod config;
pub mod error;

pub use config::MigrationConfig;
pub use error::{CliError, Result};

use clap::Parser;
use migrate_engine::catalog::{CatalogLookup, CatalogStore, ReferenceAliases};
use migrate_engine::{build_mapper, MapperKind, MigrationReport, Orchestrator};
use std::fmt::Write as _;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::info;

pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_ERROR: i32 = 1;
pub const EXIT_RECORD_FAILURES: i32 = 2;

/// Migrate legacy JSON records to line-delimited target JSON
#[derive(Parser, Debug)]
#[command(name = "migrate")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Input file: a JSON array of objects or a sequence of JSON objects
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Output file, one JSON document per line
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Mapping strategy: passthrough, conditional or form
    #[arg(short, long)]
    pub mapper: Option<MapperKind>,

    /// Attributes catalog (JSON array)
    #[arg(long)]
    pub attributes_catalog: Option<PathBuf>,

    /// Reference data catalog (JSON array, flat or wrapped entries)
    #[arg(long)]
    pub reference_catalog: Option<PathBuf>,

    /// Configuration document holding roles and the attribute tree
    #[arg(long)]
    pub configuration: Option<PathBuf>,

    /// Extra reference aliases, e.g. "idiomes:llengues|RD_IDIOMES"
    #[arg(long)]
    pub reference_aliases: Option<String>,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

/// Outcome of a completed run
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub report: MigrationReport,
    pub elapsed: Duration,
    pub output: PathBuf,
}

impl RunSummary {
    pub fn exit_code(&self) -> i32 {
        if self.report.has_failures() {
            EXIT_RECORD_FAILURES
        } else {
            EXIT_SUCCESS
        }
    }

    /// Human-readable report printed after a run
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "=== REPORT ===");
        let _ = writeln!(out, "OK      : {}", self.report.ok());
        let _ = writeln!(out, "SKIPPED : {}", self.report.skipped());
        let _ = writeln!(out, "FAIL    : {}", self.report.fail());
        let _ = writeln!(out, "Elapsed : {:.2}s", self.elapsed.as_secs_f64());
        let _ = write!(out, "Output  : {}", self.output.display());
        out
    }
}

/// Run one migration as configured
pub async fn run(config: &MigrationConfig, cancel: &CancellationToken) -> Result<RunSummary> {
    config.validate()?;

    if !config.input.is_file() {
        return Err(CliError::InputNotFound(config.input.clone()));
    }

    let catalogs = if config.mapper.requires_catalogs() {
        Some(load_catalogs(config)?)
    } else {
        None
    };

    let mapper = build_mapper(config.mapper, catalogs)?;
    let orchestrator = Orchestrator::new(mapper);
    info!(
        mapper = orchestrator.mapper_name(),
        input = %config.input.display(),
        output = %config.output.display(),
        "Migration configured"
    );

    let start = Instant::now();
    let report = orchestrator
        .run_files(&config.input, &config.output, cancel)
        .await?;

    Ok(RunSummary {
        report,
        elapsed: start.elapsed(),
        output: config.output.clone(),
    })
}

fn load_catalogs(config: &MigrationConfig) -> Result<Arc<dyn CatalogLookup>> {
    let aliases = match &config.reference_aliases {
        Some(list) => ReferenceAliases::default().extend_from_list(list)?,
        None => ReferenceAliases::default(),
    };

    let store = CatalogStore::load(&config.catalogs, &aliases)?;
    Ok(Arc::new(store))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_render_report() {
        let summary = RunSummary {
            report: MigrationReport::new(3, 1, 0),
            elapsed: Duration::from_millis(1500),
            output: PathBuf::from("out.ndjson"),
        };

        let text = summary.render();
        assert!(text.contains("OK      : 3"));
        assert!(text.contains("SKIPPED : 1"));
        assert!(text.contains("Elapsed : 1.50s"));
        assert_eq!(summary.exit_code(), EXIT_SUCCESS);
    }

    #[test]
    fn test_failures_exit_with_two() {
        let summary = RunSummary {
            report: MigrationReport::new(0, 0, 1),
            elapsed: Duration::ZERO,
            output: PathBuf::from("out.ndjson"),
        };
        assert_eq!(summary.exit_code(), EXIT_RECORD_FAILURES);
    }

    #[tokio::test]
    async fn test_missing_input_fails_before_catalogs() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = MigrationConfig::with_samples_dir(dir.path());

        let result = run(&config, &CancellationToken::new()).await;
        assert!(matches!(result, Err(CliError::InputNotFound(_))));
        assert!(!config.output.exists());
    }
}
