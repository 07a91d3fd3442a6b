//! Run configuration
//!
//! Resolution order, later wins: built-in defaults, `.env` (loaded by the
//! binary through `dotenvy`), `MIGRATE_*` environment variables, CLI flags.

use crate::error::{CliError, Result};
use crate::Cli;
use migrate_engine::catalog::CatalogPaths;
use migrate_engine::MapperKind;
use std::path::{Path, PathBuf};

pub const ENV_SAMPLES_DIR: &str = "MIGRATE_SAMPLES_DIR";
pub const ENV_INPUT: &str = "MIGRATE_INPUT";
pub const ENV_OUTPUT: &str = "MIGRATE_OUTPUT";
pub const ENV_ATTRIBUTES_CATALOG: &str = "MIGRATE_ATTRIBUTES_CATALOG";
pub const ENV_REFERENCE_CATALOG: &str = "MIGRATE_REFERENCE_CATALOG";
pub const ENV_CONFIGURATION: &str = "MIGRATE_CONFIGURATION";
pub const ENV_MAPPER: &str = "MIGRATE_MAPPER";
pub const ENV_REFERENCE_ALIASES: &str = "MIGRATE_REFERENCE_ALIASES";

pub const DEFAULT_SAMPLES_DIR: &str = "samples";
pub const DEFAULT_INPUT_FILE: &str = "configuration.json";
pub const DEFAULT_OUTPUT_FILE: &str = "output.ndjson";
pub const CATALOGS_DIR: &str = "catalogs";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationConfig {
    pub input: PathBuf,
    pub output: PathBuf,
    pub mapper: MapperKind,
    pub catalogs: CatalogPaths,
    /// Extra reference aliases, `target:alias1|alias2;...`
    pub reference_aliases: Option<String>,
}

impl MigrationConfig {
    /// Defaults rooted at `samples_dir`
    pub fn with_samples_dir(samples_dir: &Path) -> Self {
        let input = samples_dir.join(DEFAULT_INPUT_FILE);
        Self {
            output: samples_dir.join(DEFAULT_OUTPUT_FILE),
            mapper: MapperKind::default(),
            catalogs: CatalogPaths::in_dir(samples_dir.join(CATALOGS_DIR), input.clone()),
            input,
            reference_aliases: None,
        }
    }

    /// Load from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using `lookup` as the environment
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let samples_dir = PathBuf::from(var(ENV_SAMPLES_DIR).unwrap_or_else(|| DEFAULT_SAMPLES_DIR.to_string()));
        let mut config = Self::with_samples_dir(&samples_dir);

        if let Some(input) = var(ENV_INPUT) {
            config.input = PathBuf::from(input);
        }
        if let Some(output) = var(ENV_OUTPUT) {
            config.output = PathBuf::from(output);
        }
        if let Some(path) = var(ENV_ATTRIBUTES_CATALOG) {
            config.catalogs.attributes = PathBuf::from(path);
        }
        if let Some(path) = var(ENV_REFERENCE_CATALOG) {
            config.catalogs.reference_data = PathBuf::from(path);
        }
        if let Some(path) = var(ENV_CONFIGURATION) {
            config.catalogs.configuration = PathBuf::from(path);
        }
        if let Some(mapper) = var(ENV_MAPPER) {
            config.mapper = mapper.parse()?;
        }
        config.reference_aliases = var(ENV_REFERENCE_ALIASES);

        Ok(config)
    }

    /// Overlay command-line flags
    pub fn apply_cli(mut self, cli: &Cli) -> Self {
        if let Some(input) = &cli.input {
            self.input = input.clone();
        }
        if let Some(output) = &cli.output {
            self.output = output.clone();
        }
        if let Some(mapper) = cli.mapper {
            self.mapper = mapper;
        }
        if let Some(path) = &cli.attributes_catalog {
            self.catalogs.attributes = path.clone();
        }
        if let Some(path) = &cli.reference_catalog {
            self.catalogs.reference_data = path.clone();
        }
        if let Some(path) = &cli.configuration {
            self.catalogs.configuration = path.clone();
        }
        if let Some(aliases) = &cli.reference_aliases {
            self.reference_aliases = Some(aliases.clone());
        }
        self
    }

    pub fn validate(&self) -> Result<()> {
        let paths = [
            ("input", &self.input),
            ("output", &self.output),
            ("attributes catalog", &self.catalogs.attributes),
            ("reference catalog", &self.catalogs.reference_data),
            ("configuration", &self.catalogs.configuration),
        ];
        if let Some((name, _)) = paths.iter().find(|(_, p)| p.as_os_str().is_empty()) {
            return Err(CliError::config(format!("{name} path is empty")));
        }

        if self.input == self.output {
            return Err(CliError::config(format!(
                "input and output are the same file '{}'",
                self.input.display()
            )));
        }

        Ok(())
    }
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self::with_samples_dir(Path::new(DEFAULT_SAMPLES_DIR))
    }
}
