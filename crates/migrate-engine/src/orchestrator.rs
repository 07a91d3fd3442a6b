//! Reader -> Mapper -> Writer pipeline
//!
//! One logical flow per run. Records are mapped as they are decoded and fed to
//! the writer as they are mapped, so memory stays bounded by the largest single
//! record rather than the input size.
//!
//! Failure policy:
//! - read/parse errors abort the run (stream position can't be trusted after)
//! - a mapper error is logged, counted as `fail`, and the run continues
//! - a mapper returning no result is counted as `skipped`
//!
//! Cancellation is checked before each record is mapped. A cancelled run ends
//! with [`MigrateError::Cancelled`]; lines already fed are still flushed.

use crate::mapping::RecordMapper;
use crate::reader::JsonStreamReader;
use crate::writer::NdjsonWriter;
use futures::{future, StreamExt, TryStreamExt};
use migrate_common::{MigrateError, Result};
use serde::Serialize;
use serde_json::Value;
use std::path::Path;
use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::sync::CancellationToken;
use tracing::{info, info_span, warn, Instrument};

/// Final per-run outcome counts; `ok + skipped + fail` equals records read
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MigrationReport {
    ok: u64,
    skipped: u64,
    fail: u64,
}

impl MigrationReport {
    pub fn new(ok: u64, skipped: u64, fail: u64) -> Self {
        Self { ok, skipped, fail }
    }

    pub fn ok(&self) -> u64 {
        self.ok
    }

    pub fn skipped(&self) -> u64 {
        self.skipped
    }

    pub fn fail(&self) -> u64 {
        self.fail
    }

    pub fn total(&self) -> u64 {
        self.ok + self.skipped + self.fail
    }

    pub fn has_failures(&self) -> bool {
        self.fail > 0
    }
}

#[derive(Debug, Default)]
struct Tally {
    seen: u64,
    ok: u64,
    skipped: u64,
    fail: u64,
}

impl Tally {
    fn report(&self) -> MigrationReport {
        MigrationReport::new(self.ok, self.skipped, self.fail)
    }
}

pub struct Orchestrator {
    reader: JsonStreamReader,
    mapper: Box<dyn RecordMapper>,
    writer: NdjsonWriter,
}

impl Orchestrator {
    pub fn new(mapper: Box<dyn RecordMapper>) -> Self {
        Self {
            reader: JsonStreamReader::new(),
            mapper,
            writer: NdjsonWriter::new(),
        }
    }

    pub fn mapper_name(&self) -> &str {
        self.mapper.name()
    }

    /// Migrate from `input` to `output`; both are released when this returns
    pub async fn run<R, W>(
        &self,
        input: R,
        output: W,
        cancel: &CancellationToken,
    ) -> Result<MigrationReport>
    where
        R: AsyncRead,
        W: AsyncWrite + Unpin,
    {
        let span = info_span!("migration", mapper = self.mapper.name());
        self.pipeline(input, output, cancel).instrument(span).await
    }

    /// File-based run; a missing input fails before the output is created
    pub async fn run_files(
        &self,
        input: &Path,
        output: &Path,
        cancel: &CancellationToken,
    ) -> Result<MigrationReport> {
        let input_file = File::open(input).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => MigrateError::InputNotFound(input.to_path_buf()),
            _ => MigrateError::Io(e),
        })?;
        let output_file = File::create(output).await?;

        info!(input = %input.display(), output = %output.display(), "Starting migration");
        self.run(input_file, output_file, cancel).await
    }

    async fn pipeline<R, W>(
        &self,
        input: R,
        output: W,
        cancel: &CancellationToken,
    ) -> Result<MigrationReport>
    where
        R: AsyncRead,
        W: AsyncWrite + Unpin,
    {
        if cancel.is_cancelled() {
            return Err(MigrateError::Cancelled);
        }

        let mut tally = Tally::default();

        let mapped = self
            .reader
            .read(input)
            .map(|item| self.process(item, &mut tally, cancel))
            .try_filter_map(|record| future::ready(Ok(record)));

        let written = self.writer.write(output, mapped).await?;

        let report = tally.report();
        debug_assert_eq!(report.total(), tally.seen);
        debug_assert_eq!(written, report.ok());

        info!(
            ok = report.ok(),
            skipped = report.skipped(),
            fail = report.fail(),
            "Migration finished"
        );

        Ok(report)
    }

    fn process(
        &self,
        item: Result<Value>,
        tally: &mut Tally,
        cancel: &CancellationToken,
    ) -> Result<Option<Value>> {
        if cancel.is_cancelled() {
            warn!(records = tally.seen, "Migration cancelled");
            return Err(MigrateError::Cancelled);
        }

        let record = item?;
        tally.seen += 1;

        match self.mapper.map(&record) {
            Ok(Some(mapped)) => {
                tally.ok += 1;
                Ok(Some(mapped))
            },
            Ok(None) => {
                tally.skipped += 1;
                Ok(None)
            },
            Err(e) => {
                tally.fail += 1;
                warn!(record = tally.seen, error = %e, "Failed to map record");
                Ok(None)
            },
        }
    }
}
