//! Reference catalogs consulted during mapping
//!
//! Three sources feed the store:
//!
//! - **Attributes catalog**: validations, reference-data linkage and
//!   dependency rules per numeric attribute id
//! - **Reference data catalog**: named lookup lists (flat entries or wrapper
//!   nodes), addressable by id, name or alias
//! - **Configuration document**: the ordered role list and a node/form/attribute
//!   tree searchable by attribute name
//!
//! Mappers never see [`CatalogStore`] directly; they receive an
//! `Arc<dyn CatalogLookup>` at construction.

pub mod aliases;
pub mod entries;
pub mod store;

pub use aliases::ReferenceAliases;
pub use entries::{
    AttributeCatalogEntry, Dependencies, ReferenceCatalogEntry, ReferenceItem, ReferenceOption,
};
pub use store::CatalogStore;

use serde_json::Value;
use std::path::PathBuf;

/// Default file names inside the catalogs directory
pub const ATTRIBUTES_CATALOG_FILE: &str = "attributes_catalog.json";
pub const REFERENCE_CATALOG_FILE: &str = "reference_data_catalog.json";

/// Locations of the three catalog sources
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogPaths {
    pub attributes: PathBuf,
    pub reference_data: PathBuf,
    pub configuration: PathBuf,
}

impl CatalogPaths {
    /// Standard layout: `<dir>/attributes_catalog.json`, `<dir>/reference_data_catalog.json`
    pub fn in_dir(catalogs_dir: impl Into<PathBuf>, configuration: impl Into<PathBuf>) -> Self {
        let dir = catalogs_dir.into();
        Self {
            attributes: dir.join(ATTRIBUTES_CATALOG_FILE),
            reference_data: dir.join(REFERENCE_CATALOG_FILE),
            configuration: configuration.into(),
        }
    }
}

/// Read-only catalog capability handed to mappers
pub trait CatalogLookup: Send + Sync {
    /// Attribute definition by numeric id
    fn attribute_by_id(&self, id: i64) -> Option<&AttributeCatalogEntry>;

    /// Reference list by id, name or alias (case-insensitive)
    fn reference_list(&self, reference_id: &str) -> Option<&ReferenceCatalogEntry>;

    /// Role labels from the configuration document, in document order
    fn roles(&self) -> &[String];

    /// First attribute named `name` (case-insensitive) in the configuration tree
    fn find_config_attribute(&self, name: &str) -> Option<&Value>;

    /// Materialized options, `None` when the list is unknown or empty
    fn try_reference_values(&self, reference_id: &str) -> Option<Vec<ReferenceOption>> {
        let options: Vec<_> = self.reference_list(reference_id)?.options().collect();
        (!options.is_empty()).then_some(options)
    }
}
