//! Logging setup for the migration binaries
//!
//! Log lines go to stderr, to a daily rolling file, or both. Stdout is left
//! to the run report. Library code never configures anything here; it only
//! emits `tracing` events with structured fields:
//!
//! ```rust,ignore
//! warn!(record = ordinal, error = %err, "Failed to map record");
//! ```
//!
//! Environment overrides, applied by [`LogConfig::merge_env`]:
//!
//! | Variable          | Values                          |
//! |-------------------|---------------------------------|
//! | `LOG_LEVEL`       | `trace` .. `error`              |
//! | `LOG_FORMAT`      | `text`, `json`                  |
//! | `LOG_OUTPUT`      | `console`, `file`, `both`       |
//! | `LOG_DIR`         | directory for rolling files     |
//! | `LOG_FILE_PREFIX` | rolling file name prefix        |
//! | `LOG_FILTER`      | comma-separated `EnvFilter` directives |
//!
//! # Example
//!
//! ```no_run
//! use migrate_common::logging::{init_logging, LogConfig};
//! use tracing::Level;
//!
//! let config = LogConfig::console(Level::DEBUG).merge_env().unwrap();
//! let _guard = init_logging(&config).unwrap();
//! ```

use anyhow::{bail, Context, Result};
use std::path::PathBuf;
use std::str::FromStr;
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer, Registry,
};

pub const ENV_LOG_LEVEL: &str = "LOG_LEVEL";
pub const ENV_LOG_FORMAT: &str = "LOG_FORMAT";
pub const ENV_LOG_OUTPUT: &str = "LOG_OUTPUT";
pub const ENV_LOG_DIR: &str = "LOG_DIR";
pub const ENV_LOG_FILE_PREFIX: &str = "LOG_FILE_PREFIX";
pub const ENV_LOG_FILTER: &str = "LOG_FILTER";

const DEFAULT_LOG_DIR: &str = "./logs";
const DEFAULT_FILE_PREFIX: &str = "migrate";

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync + 'static>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" | "pretty" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => bail!("Invalid log format '{other}', expected text or json"),
        }
    }
}

/// Daily rolling log file location
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSink {
    pub dir: PathBuf,
    pub prefix: String,
}

impl Default for FileSink {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(DEFAULT_LOG_DIR),
            prefix: DEFAULT_FILE_PREFIX.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LogConfig {
    pub level: Level,
    pub format: LogFormat,
    /// Write to stderr
    pub console: bool,
    /// Also write to a rolling file
    pub file: Option<FileSink>,
    /// Extra `EnvFilter` directives, e.g. `migrate_engine=trace`
    pub directives: Vec<String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self::console(Level::INFO)
    }
}

impl LogConfig {
    /// Text logs on stderr at `level`
    pub fn console(level: Level) -> Self {
        Self {
            level,
            format: LogFormat::Text,
            console: true,
            file: None,
            directives: Vec::new(),
        }
    }

    pub fn json(mut self) -> Self {
        self.format = LogFormat::Json;
        self
    }

    pub fn with_file(mut self, sink: FileSink) -> Self {
        self.file = Some(sink);
        self
    }

    pub fn with_directive(mut self, directive: impl Into<String>) -> Self {
        self.directives.push(directive.into());
        self
    }

    /// Overlay `LOG_*` variables from the process environment
    pub fn merge_env(self) -> Result<Self> {
        self.merge_lookup(|key| std::env::var(key).ok())
    }

    /// Overlay `LOG_*` variables read through `lookup`
    pub fn merge_lookup<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(level) = var(ENV_LOG_LEVEL) {
            self.level = level
                .trim()
                .parse()
                .with_context(|| format!("Invalid {ENV_LOG_LEVEL} '{level}'"))?;
        }
        if let Some(format) = var(ENV_LOG_FORMAT) {
            self.format = format.parse()?;
        }
        if let Some(output) = var(ENV_LOG_OUTPUT) {
            let (console, file) = match output.trim().to_ascii_lowercase().as_str() {
                "console" | "stderr" => (true, false),
                "file" => (false, true),
                "both" | "all" => (true, true),
                other => bail!("Invalid {ENV_LOG_OUTPUT} '{other}', expected console, file or both"),
            };
            self.console = console;
            self.file = match (file, self.file.take()) {
                (true, existing) => Some(existing.unwrap_or_default()),
                (false, _) => None,
            };
        }
        if let Some(sink) = self.file.as_mut() {
            if let Some(dir) = var(ENV_LOG_DIR) {
                sink.dir = PathBuf::from(dir);
            }
            if let Some(prefix) = var(ENV_LOG_FILE_PREFIX) {
                sink.prefix = prefix;
            }
        }
        if let Some(filter) = var(ENV_LOG_FILTER) {
            self.directives.extend(
                filter
                    .split(',')
                    .map(str::trim)
                    .filter(|d| !d.is_empty())
                    .map(String::from),
            );
        }

        Ok(self)
    }

    fn env_filter(&self) -> Result<EnvFilter> {
        self.directives.iter().try_fold(
            EnvFilter::from_default_env().add_directive(self.level.into()),
            |filter, directive| -> Result<EnvFilter> {
                let parsed = directive
                    .parse()
                    .with_context(|| format!("Invalid log filter directive '{directive}'"))?;
                Ok(filter.add_directive(parsed))
            },
        )
    }

    fn layer<W>(&self, writer: W, ansi: bool) -> BoxedLayer
    where
        W: for<'w> fmt::MakeWriter<'w> + Send + Sync + 'static,
    {
        let layer = fmt::layer()
            .with_writer(writer)
            .with_ansi(ansi)
            .with_span_events(FmtSpan::CLOSE);

        match self.format {
            LogFormat::Text => layer.boxed(),
            LogFormat::Json => layer.json().boxed(),
        }
    }
}

/// Holds the background file writer; buffered lines are flushed on drop
#[must_use = "dropping the guard stops file logging"]
pub struct LoggingGuard {
    _file: Option<WorkerGuard>,
}

/// Install the global subscriber. Fails if one is already installed.
pub fn init_logging(config: &LogConfig) -> Result<LoggingGuard> {
    let filter = config.env_filter()?;
    let mut layers = Vec::with_capacity(2);
    let mut file_guard = None;

    if config.console {
        layers.push(config.layer(std::io::stderr, true));
    }

    if let Some(sink) = &config.file {
        std::fs::create_dir_all(&sink.dir)
            .with_context(|| format!("Failed to create log directory '{}'", sink.dir.display()))?;
        let (writer, guard) =
            tracing_appender::non_blocking(tracing_appender::rolling::daily(&sink.dir, &sink.prefix));
        layers.push(config.layer(writer, false));
        file_guard = Some(guard);
    }

    tracing_subscriber::registry()
        .with(layers)
        .with(filter)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(LoggingGuard { _file: file_guard })
}
