//! In-memory catalog store
//!
//! Built once from the three catalog sources and read-only afterwards. Any
//! missing or unparseable source aborts construction, and so does a malformed
//! entry. The only entries skipped are those without a usable id, and each
//! skip is logged at `warn`.

use super::aliases::ReferenceAliases;
use super::entries::{AttributeCatalogEntry, ReferenceCatalogEntry, ReferenceOption};
use super::{CatalogLookup, CatalogPaths};
use crate::json::{self, PathStep};
use migrate_common::{MigrateError, Result};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info, warn};

/// Key under which wrapper nodes nest their reference entries
pub const REFERENCE_WRAPPER_KEY: &str = "referenceDataCatalog";

/// Where the role list may live in the configuration document, in priority order
pub const ROLE_POINTERS: &[&str] = &["/config/roles", "/roles"];

const CONFIG_ATTRIBUTES: &[PathStep<'static>] = &[
    PathStep::Key("nodes"),
    PathStep::Each,
    PathStep::Key("config"),
    PathStep::Key("forms"),
    PathStep::Each,
    PathStep::Key("attributes"),
    PathStep::Each,
];

/// Indexed attribute, reference and configuration data
#[derive(Debug, Clone)]
pub struct CatalogStore {
    attributes: HashMap<i64, AttributeCatalogEntry>,
    references: Vec<ReferenceCatalogEntry>,
    reference_index: HashMap<String, usize>,
    roles: Vec<String>,
    configuration: Value,
}

impl CatalogStore {
    /// Load and index the three catalog files
    pub fn load(paths: &CatalogPaths, aliases: &ReferenceAliases) -> Result<Self> {
        let attributes = index_attributes(&read_document(&paths.attributes)?)
            .map_err(|reason| MigrateError::catalog(&paths.attributes, reason))?;
        let references = flatten_references(&read_document(&paths.reference_data)?)
            .map_err(|reason| MigrateError::catalog(&paths.reference_data, reason))?;
        let configuration = read_document(&paths.configuration)?;

        let store = Self::assemble(attributes, references, configuration, aliases);
        info!(
            attributes = store.attributes.len(),
            reference_lists = store.references.len(),
            roles = store.roles.len(),
            "Catalogs loaded"
        );

        Ok(store)
    }

    /// Build the store from already-parsed documents
    pub fn from_documents(
        attributes: &Value,
        references: &Value,
        configuration: Value,
        aliases: &ReferenceAliases,
    ) -> Result<Self> {
        let attributes = index_attributes(attributes).map_err(MigrateError::config)?;
        let references = flatten_references(references).map_err(MigrateError::config)?;

        Ok(Self::assemble(attributes, references, configuration, aliases))
    }

    fn assemble(
        attributes: HashMap<i64, AttributeCatalogEntry>,
        references: Vec<ReferenceCatalogEntry>,
        configuration: Value,
        aliases: &ReferenceAliases,
    ) -> Self {
        let reference_index = index_references(&references, aliases);
        let roles = extract_roles(&configuration);

        Self {
            attributes,
            references,
            reference_index,
            roles,
            configuration,
        }
    }

    pub fn attribute_count(&self) -> usize {
        self.attributes.len()
    }

    /// Resolved options of a reference list; empty when the list is unknown
    pub fn reference_values<'a>(
        &'a self,
        reference_id: &str,
    ) -> impl Iterator<Item = ReferenceOption> + 'a {
        self.reference_list(reference_id)
            .into_iter()
            .flat_map(|entry| entry.options())
    }
}

impl CatalogLookup for CatalogStore {
    fn attribute_by_id(&self, id: i64) -> Option<&AttributeCatalogEntry> {
        self.attributes.get(&id)
    }

    fn reference_list(&self, reference_id: &str) -> Option<&ReferenceCatalogEntry> {
        let key = reference_id.trim().to_lowercase();
        self.reference_index
            .get(&key)
            .and_then(|&idx| self.references.get(idx))
    }

    fn roles(&self) -> &[String] {
        &self.roles
    }

    fn find_config_attribute(&self, name: &str) -> Option<&Value> {
        json::select(&self.configuration, CONFIG_ATTRIBUTES)
            .into_iter()
            .map(|located| located.value)
            .find(|attribute| {
                attribute
                    .get("name")
                    .and_then(Value::as_str)
                    .is_some_and(|n| n.eq_ignore_ascii_case(name))
            })
    }
}

fn read_document(path: &Path) -> Result<Value> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| MigrateError::catalog(path, format!("cannot read file: {e}")))?;

    serde_json::from_str(&raw).map_err(|e| MigrateError::catalog(path, format!("invalid JSON: {e}")))
}

/// Entries without a usable id are skipped; any other malformed entry fails the load
fn index_attributes(
    document: &Value,
) -> std::result::Result<HashMap<i64, AttributeCatalogEntry>, String> {
    let items = document
        .as_array()
        .ok_or("attributes catalog must be a JSON array")?;

    let mut attributes = HashMap::with_capacity(items.len());
    for (position, item) in items.iter().enumerate() {
        let Some(id) = item.get("id").and_then(json::integer_id) else {
            warn!(position, id = ?item.get("id"), "Skipping attribute catalog entry without a usable id");
            continue;
        };

        let entry = AttributeCatalogEntry::deserialize(item)
            .map_err(|e| format!("attribute entry {position} (id {id}): {e}"))?;
        if attributes.contains_key(&entry.id) {
            warn!(id = entry.id, position, "Duplicate attribute id, keeping the later entry");
        }
        attributes.insert(entry.id, entry);
    }

    Ok(attributes)
}

/// Normalize both catalog shapes (flat entries and wrapper nodes) into one list
fn flatten_references(
    document: &Value,
) -> std::result::Result<Vec<ReferenceCatalogEntry>, String> {
    let items = document
        .as_array()
        .ok_or("reference data catalog must be a JSON array")?;

    let mut entries = Vec::new();
    for (position, item) in items.iter().enumerate() {
        match item.get(REFERENCE_WRAPPER_KEY) {
            Some(Value::Array(inner)) => {
                for nested in inner {
                    push_reference(nested, position, &mut entries)?;
                }
            },
            Some(_) => {
                warn!(position, "Ignoring '{}' wrapper that is not an array", REFERENCE_WRAPPER_KEY)
            },
            None => push_reference(item, position, &mut entries)?,
        }
    }

    Ok(entries)
}

fn push_reference(
    item: &Value,
    position: usize,
    entries: &mut Vec<ReferenceCatalogEntry>,
) -> std::result::Result<(), String> {
    let id = item
        .get("id")
        .and_then(json::scalar_text)
        .filter(|id| !id.trim().is_empty());
    let Some(id) = id else {
        warn!(position, id = ?item.get("id"), "Skipping reference entry without a usable id");
        return Ok(());
    };

    let entry = ReferenceCatalogEntry::deserialize(item)
        .map_err(|e| format!("reference entry {position} (id {id}): {e}"))?;
    entries.push(entry);
    Ok(())
}

/// Ids first (later entries win), then names and aliases only where the key is free
fn index_references(
    entries: &[ReferenceCatalogEntry],
    aliases: &ReferenceAliases,
) -> HashMap<String, usize> {
    let mut index = HashMap::new();

    for (idx, entry) in entries.iter().enumerate() {
        index.insert(entry.id.trim().to_lowercase(), idx);
    }

    for (idx, entry) in entries.iter().enumerate() {
        if let Some(name) = entry.name.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
            index.entry(name.to_lowercase()).or_insert(idx);
        }
    }

    for (target, keys) in aliases.iter() {
        let Some(&idx) = index.get(&target.to_lowercase()) else {
            debug!(target, "Alias target not present in reference catalog");
            continue;
        };
        for key in keys {
            index.entry(key.to_lowercase()).or_insert(idx);
        }
    }

    index
}

fn extract_roles(configuration: &Value) -> Vec<String> {
    let Some(Value::Array(items)) = ROLE_POINTERS
        .iter()
        .filter_map(|p| configuration.pointer(p))
        .find(|v| v.is_array())
    else {
        return Vec::new();
    };

    items
        .iter()
        .filter_map(|role| match role {
            Value::Object(map) => ["label", "name", "value"]
                .iter()
                .find_map(|k| map.get(*k).and_then(json::scalar_text)),
            other => json::scalar_text(other),
        })
        .filter(|label| !label.trim().is_empty())
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn store(references: Value, configuration: Value) -> CatalogStore {
        CatalogStore::from_documents(
            &json!([]),
            &references,
            configuration,
            &ReferenceAliases::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_wrapper_and_flat_shapes_resolve_identically() {
        let flat = store(
            json!([{"id": "RD1", "name": "tipusPersona", "data": [{"key": "1", "value": "Física"}]}]),
            json!({}),
        );
        let wrapped = store(
            json!([{"referenceDataCatalog": [
                {"id": "RD1", "name": "tipusPersona", "data": [{"key": "1", "value": "Física"}]}
            ]}]),
            json!({}),
        );

        let a: Vec<_> = flat.reference_values("tipuspersona").collect();
        let b: Vec<_> = wrapped.reference_values("RD1").collect();
        assert_eq!(a, b);
        assert_eq!(a.len(), 1);
    }

    #[test]
    fn test_ids_take_precedence_over_names() {
        let s = store(
            json!([
                {"id": "A", "name": "B", "data": [{"key": "from-a", "value": "A"}]},
                {"id": "B", "data": [{"key": "from-b", "value": "B"}]}
            ]),
            json!({}),
        );

        let values: Vec<_> = s.reference_values("b").map(|o| o.value).collect();
        assert_eq!(values, vec![json!("from-b")]);
    }

    #[test]
    fn test_roles_fall_back_to_root_path() {
        let s = store(json!([]), json!({"roles": ["Sol·licitant", " ", {"label": "Interessat"}]}));
        assert_eq!(s.roles(), ["Sol·licitant".to_string(), "Interessat".to_string()]);
    }

    #[test]
    fn test_non_array_attribute_catalog_is_rejected() {
        let result = CatalogStore::from_documents(
            &json!({"id": 1}),
            &json!([]),
            json!({}),
            &ReferenceAliases::default(),
        );
        assert!(matches!(result, Err(MigrateError::Config(_))));
    }

    #[test]
    fn test_malformed_entry_fails_instead_of_vanishing() {
        let result = CatalogStore::from_documents(
            &json!([{"id": 1}, {"id": 2, "validations": [{"rule": "required"}]}]),
            &json!([]),
            json!({}),
            &ReferenceAliases::default(),
        );
        match result {
            Err(MigrateError::Config(reason)) => assert!(reason.contains("id 2"), "{reason}"),
            other => panic!("expected config error, got {other:?}"),
        }
    }
}
