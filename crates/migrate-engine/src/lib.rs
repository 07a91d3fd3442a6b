//! Catalog-driven JSON migration engine
//!
//! Streams legacy JSON records through a pluggable mapper and writes the
//! results as line-delimited JSON:
//!
//! ```text
//! bytes ─▶ JsonStreamReader ─▶ RecordMapper ─▶ NdjsonWriter ─▶ bytes
//!                                   ▲
//!                              CatalogStore
//! ```
//!
//! # Example
//!
//! ```no_run
//! use migrate_engine::mapping::{build_mapper, MapperKind};
//! use migrate_engine::Orchestrator;
//! use std::path::Path;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> migrate_common::Result<()> {
//! let mapper = build_mapper(MapperKind::Conditional, None)?;
//! let report = Orchestrator::new(mapper)
//!     .run_files(Path::new("in.json"), Path::new("out.ndjson"), &CancellationToken::new())
//!     .await?;
//! println!("ok={} skipped={} fail={}", report.ok(), report.skipped(), report.fail());
//! # Ok(())
//! # }
//! ```

#![deny(clippy::unwrap_used, clippy::expect_used)]

pub mod catalog;
pub mod json;
pub mod mapping;
pub mod orchestrator;
pub mod reader;
pub mod writer;

pub use catalog::{CatalogLookup, CatalogPaths, CatalogStore, ReferenceAliases};
pub use mapping::{build_mapper, MapError, MapperKind, RecordMapper};
pub use orchestrator::{MigrationReport, Orchestrator};
pub use reader::JsonStreamReader;
pub use writer::NdjsonWriter;
