//! Catalog-driven form schema generator
//!
//! Reconstructs a multi-panel form document from a legacy workflow tree:
//!
//! 1. Locate the form block: the first `nodes[*].config.forms[*]` whose owning
//!    node has the target activity subtype or a name containing it.
//! 2. Translate each attribute of that block into a component, enriched from
//!    the attributes catalog (validations, reference data, dependency rules).
//! 3. Nest `group$child` attributes and `section` hints into containers.
//! 4. Render the fixed interested-party template next to the migrated fields.
//! 5. Wrap everything in the shell document.
//!
//! A tree without a matching form block is not an error: the generator emits
//! a shell carrying a `__warning` marker instead.

pub mod component;
pub mod shell;
pub mod template;
pub mod translate;

pub use component::{Component, ComponentType};
pub use shell::{ShellDocument, WARNING_KEY};

use super::{MapError, RecordMapper};
use crate::catalog::CatalogLookup;
use crate::json::{self, PathStep};
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use std::sync::Arc;
use template::TemplateRenderer;
use tracing::debug;
use translate::AttributeTranslator;

pub const DEFAULT_TARGET_SUBTYPE: &str = "partsInteressades";

pub const NO_FORMS_WARNING: &str = "No forms array under any node's config.forms";

pub const MIGRATED_PANEL_KEY: &str = "dadesMigrades";
pub const MIGRATED_PANEL_LABEL: &str = "Dades migrades";

const FORMS_PATH: &[PathStep<'static>] = &[
    PathStep::Key("nodes"),
    PathStep::Each,
    PathStep::Key("config"),
    PathStep::Key("forms"),
    PathStep::Each,
];

/// Subtype locations on a node's `config`; the second is a legacy misspelling
const SUBTYPE_POINTERS: &[&str] = &["/activitySubtype", "/acivitySubtype"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormGeneratorOptions {
    /// Subtype (and node-name substring) selecting the form block
    pub target_subtype: String,
    /// Render the interested-party template panel
    pub include_template: bool,
    /// Use this instead of the clock for `controlData` timestamps
    pub fixed_timestamp: Option<DateTime<Utc>>,
}

impl Default for FormGeneratorOptions {
    fn default() -> Self {
        Self {
            target_subtype: DEFAULT_TARGET_SUBTYPE.to_string(),
            include_template: true,
            fixed_timestamp: None,
        }
    }
}

impl FormGeneratorOptions {
    pub fn with_target_subtype(mut self, subtype: impl Into<String>) -> Self {
        self.target_subtype = subtype.into();
        self
    }

    pub fn with_template(mut self, include: bool) -> Self {
        self.include_template = include;
        self
    }

    pub fn with_fixed_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.fixed_timestamp = Some(timestamp);
        self
    }

    /// Warning used when no form block matches
    pub fn no_match_warning(&self) -> String {
        format!("No form found for {}", self.target_subtype)
    }

    fn timestamp(&self) -> DateTime<Utc> {
        self.fixed_timestamp.unwrap_or_else(Utc::now)
    }
}

pub struct FormSchemaGenerator {
    catalogs: Arc<dyn CatalogLookup>,
    options: FormGeneratorOptions,
}

impl FormSchemaGenerator {
    pub fn new(catalogs: Arc<dyn CatalogLookup>) -> Self {
        Self::with_options(catalogs, FormGeneratorOptions::default())
    }

    pub fn with_options(catalogs: Arc<dyn CatalogLookup>, options: FormGeneratorOptions) -> Self {
        Self { catalogs, options }
    }

    pub fn options(&self) -> &FormGeneratorOptions {
        &self.options
    }

    /// Build the shell document for one legacy tree
    pub fn generate(&self, legacy: &Value) -> ShellDocument {
        let timestamp = self.options.timestamp();

        let forms: Vec<_> = json::select(legacy, FORMS_PATH)
            .into_iter()
            .filter(|located| located.value.is_object())
            .collect();
        if forms.is_empty() {
            return ShellDocument::with_warning(NO_FORMS_WARNING, timestamp);
        }

        let Some(block) = forms.iter().find_map(|located| {
            let node = located.closest_object(is_owning_node)?;
            self.is_target_node(node).then_some(located.value)
        }) else {
            return ShellDocument::with_warning(&self.options.no_match_warning(), timestamp);
        };

        let attributes = block
            .get("attributes")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();

        let translator = AttributeTranslator::new(self.catalogs.as_ref());
        let migrated = translator.translate_block(attributes);

        let mut components = Vec::with_capacity(2);
        if self.options.include_template {
            components.push(TemplateRenderer::new(&translator).render());
        }
        components.push(Component::panel(
            MIGRATED_PANEL_KEY,
            MIGRATED_PANEL_LABEL,
            migrated,
        ));

        ShellDocument::new(components, timestamp)
    }

    fn is_target_node(&self, node: &Map<String, Value>) -> bool {
        let target = &self.options.target_subtype;
        let name = node.get("name").and_then(json::scalar_text).unwrap_or_default();
        let subtype = node
            .get("config")
            .and_then(|config| json::first_pointer(config, SUBTYPE_POINTERS))
            .and_then(json::scalar_text);

        let matched = subtype
            .as_deref()
            .is_some_and(|s| s.eq_ignore_ascii_case(target))
            || name.to_lowercase().contains(&target.to_lowercase());

        if matched {
            debug!(node = %name, subtype = ?subtype, "Selected form block");
        }
        matched
    }
}

/// A workflow node: has a name and a `config` object declaring `forms`
fn is_owning_node(candidate: &Map<String, Value>) -> bool {
    candidate.contains_key("name")
        && candidate
            .get("config")
            .and_then(Value::as_object)
            .is_some_and(|config| config.contains_key("forms"))
}

impl RecordMapper for FormSchemaGenerator {
    fn name(&self) -> &str {
        "form"
    }

    fn map(&self, legacy: &Value) -> Result<Option<Value>, MapError> {
        let document = self.generate(legacy);
        Ok(Some(serde_json::to_value(document)?))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::catalog::{CatalogStore, ReferenceAliases};
    use serde_json::json;

    fn generator() -> FormSchemaGenerator {
        let store = CatalogStore::from_documents(
            &json!([]),
            &json!([]),
            json!({}),
            &ReferenceAliases::default(),
        )
        .unwrap();
        FormSchemaGenerator::new(Arc::new(store))
    }

    #[test]
    fn test_no_forms_yields_warning() {
        let doc = generator().generate(&json!({"nodes": [{"name": "x", "config": {}}]}));
        assert_eq!(doc.warning.as_deref(), Some(NO_FORMS_WARNING));
    }

    #[test]
    fn test_misspelled_subtype_key_is_honored() {
        let doc = generator().generate(&json!({
            "nodes": [{
                "name": "FEM_altres",
                "config": {"acivitySubtype": "PARTSINTERESSADES", "forms": [{"attributes": []}]}
            }]
        }));
        assert!(doc.warning.is_none());
    }

    #[test]
    fn test_first_matching_node_wins() {
        let doc = generator().generate(&json!({
            "nodes": [
                {"name": "FEM_partsInteressades_a", "config": {"forms": [{"attributes": [{"name": "first"}]}]}},
                {"name": "FEM_partsInteressades_b", "config": {"forms": [{"attributes": [{"name": "second"}]}]}}
            ]
        }));

        let migrated = doc.components().last().unwrap();
        assert_eq!(migrated.key, MIGRATED_PANEL_KEY);
        assert!(migrated.child("first").is_some());
        assert!(migrated.child("second").is_none());
    }

    #[test]
    fn test_template_can_be_disabled() {
        let store = CatalogStore::from_documents(&json!([]), &json!([]), json!({}), &ReferenceAliases::default())
            .unwrap();
        let generator = FormSchemaGenerator::with_options(
            Arc::new(store),
            FormGeneratorOptions::default().with_template(false),
        );

        let doc = generator.generate(&json!({
            "nodes": [{"name": "partsInteressades", "config": {"forms": [{}]}}]
        }));
        assert_eq!(doc.components().len(), 1);
        assert_eq!(doc.components()[0].key, MIGRATED_PANEL_KEY);
    }
}
