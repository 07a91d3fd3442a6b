//! Migration Common Library
//!
//! Shared error handling and logging for the legacy migration workspace.
//!
//! - **Error Handling**: [`MigrateError`] and the [`Result`] alias used by
//!   every run-level operation (catalog loading, streaming, cancellation)
//! - **Logging**: [`logging::LogConfig`] and [`logging::init_logging`]
//!
//! # Example
//!
//! ```no_run
//! use migrate_common::logging::{init_logging, LogConfig};
//!
//! fn main() -> anyhow::Result<()> {
//!     let _guard = init_logging(&LogConfig::default().merge_env()?)?;
//!     tracing::info!("Migration started");
//!     Ok(())
//! }
//! ```

#![deny(clippy::unwrap_used, clippy::expect_used)]

pub mod error;
pub mod logging;

// Re-export commonly used types
pub use error::{MigrateError, Result};
