//! Record mapper family
//!
//! A mapper turns one legacy record into at most one target record:
//!
//! - `Ok(Some(value))` - mapped, forwarded to the writer
//! - `Ok(None)` - deliberate skip (business precondition not met)
//! - `Err(MapError)` - per-record failure, isolated by the orchestrator
//!
//! Mappers never mutate their input and never hold mutable shared state.
//! Catalog access is injected at construction as an `Arc<dyn CatalogLookup>`.

pub mod conditional;
pub mod form;
pub mod passthrough;
pub mod rules;

pub use conditional::ConditionalMapper;
pub use form::{FormGeneratorOptions, FormSchemaGenerator};
pub use passthrough::PassThroughMapper;

use crate::catalog::CatalogLookup;
use migrate_common::{MigrateError, Result};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;

/// Failure to map a single record
#[derive(Error, Debug)]
pub enum MapError {
    #[error("Record has an unexpected shape: {0}")]
    InvalidShape(String),

    #[error("Field '{field}' cannot be mapped: {reason}")]
    Field { field: String, reason: String },

    #[error("Failed to build target document: {0}")]
    Build(#[from] serde_json::Error),
}

impl MapError {
    pub fn field(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Field {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// One legacy record in, at most one target record out
pub trait RecordMapper: Send + Sync {
    /// Short identifier used in logs
    fn name(&self) -> &str;

    fn map(&self, legacy: &Value) -> std::result::Result<Option<Value>, MapError>;
}

/// Selectable mapping strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MapperKind {
    PassThrough,
    Conditional,
    #[default]
    FormSchema,
}

impl MapperKind {
    pub const ALL: [MapperKind; 3] = [
        MapperKind::PassThrough,
        MapperKind::Conditional,
        MapperKind::FormSchema,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MapperKind::PassThrough => "passthrough",
            MapperKind::Conditional => "conditional",
            MapperKind::FormSchema => "form",
        }
    }

    /// Whether this strategy consults the catalogs
    pub fn requires_catalogs(&self) -> bool {
        matches!(self, MapperKind::FormSchema)
    }
}

impl fmt::Display for MapperKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MapperKind {
    type Err = MigrateError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "passthrough" | "pass-through" | "identity" => Ok(MapperKind::PassThrough),
            "conditional" => Ok(MapperKind::Conditional),
            "form" | "form-schema" | "formschema" => Ok(MapperKind::FormSchema),
            other => Err(MigrateError::config(format!(
                "unknown mapper '{other}', expected one of: passthrough, conditional, form"
            ))),
        }
    }
}

/// Construct the mapper for `kind`; catalog-driven strategies need `catalogs`
pub fn build_mapper(
    kind: MapperKind,
    catalogs: Option<Arc<dyn CatalogLookup>>,
) -> Result<Box<dyn RecordMapper>> {
    Ok(match kind {
        MapperKind::PassThrough => Box::new(PassThroughMapper),
        MapperKind::Conditional => Box::new(ConditionalMapper::new()),
        MapperKind::FormSchema => {
            let catalogs = catalogs.ok_or_else(|| {
                MigrateError::config("the form mapper requires loaded catalogs")
            })?;
            Box::new(FormSchemaGenerator::new(catalogs))
        },
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_mapper_kind_parsing() {
        assert_eq!("form".parse::<MapperKind>().unwrap(), MapperKind::FormSchema);
        assert_eq!(" Conditional ".parse::<MapperKind>().unwrap(), MapperKind::Conditional);
        assert_eq!("passthrough".parse::<MapperKind>().unwrap(), MapperKind::PassThrough);
        assert!("xml".parse::<MapperKind>().is_err());

        for kind in MapperKind::ALL {
            assert_eq!(kind.as_str().parse::<MapperKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_form_mapper_requires_catalogs() {
        assert!(build_mapper(MapperKind::FormSchema, None).is_err());
        assert_eq!(build_mapper(MapperKind::Conditional, None).unwrap().name(), "conditional");
    }
}
