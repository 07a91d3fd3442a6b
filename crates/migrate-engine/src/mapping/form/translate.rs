//! Legacy attribute to form component translation

use super::component::{Component, ComponentType, SelectData, SelectValue};
use crate::catalog::{AttributeCatalogEntry, CatalogLookup};
use crate::json::{self, scalar_text};
use crate::mapping::rules::first_visibility_expression;
use serde_json::Value;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Separator between group prefix and child key, as in `representant$telefon`
pub const GROUP_SEPARATOR: char = '$';

/// Group shown only when its companion flag is set
pub const REPRESENTANT_GROUP: &str = "representant";
pub const REPRESENTANT_CONDITIONAL: &str = "show = !!data.isRepresentant;";

/// Attribute whose options fall back to the configuration roles
pub const ROLE_FIELD: &str = "rol";

const REQUIRED_VALIDATION: &str = "required";
const DEFAULT_HINT: &str = "input";

/// Legacy UI hints understood by the translator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegacyHint {
    Select,
    Boolean,
    Mask,
    IdentityDocument,
    Panel,
    Section,
    Other,
}

impl LegacyHint {
    pub fn parse(hint: &str) -> Self {
        match hint.trim().to_lowercase().as_str() {
            "select" => LegacyHint::Select,
            "boolean" => LegacyHint::Boolean,
            "mask" => LegacyHint::Mask,
            "identitydocument" => LegacyHint::IdentityDocument,
            "panel" => LegacyHint::Panel,
            "section" => LegacyHint::Section,
            _ => LegacyHint::Other,
        }
    }

    pub fn target_type(self) -> ComponentType {
        match self {
            LegacyHint::Select => ComponentType::Select,
            LegacyHint::Boolean => ComponentType::Checkbox,
            LegacyHint::Panel | LegacyHint::Section => ComponentType::Panel,
            LegacyHint::Mask | LegacyHint::IdentityDocument | LegacyHint::Other => {
                ComponentType::Textfield
            },
        }
    }
}

/// One `attributes[*]` entry of a legacy form block
#[derive(Debug, Clone, PartialEq)]
pub struct LegacyAttribute {
    pub attribute_id: Option<i64>,
    pub name: String,
    pub label: String,
    pub hint: String,
    pub disabled: bool,
}

impl LegacyAttribute {
    /// `None` for anything that is not an object
    pub fn from_value(value: &Value) -> Option<Self> {
        let map = value.as_object()?;

        let attribute_id = map.get("attributeId").and_then(json::integer_id);
        let name = map.get("name").and_then(scalar_text).unwrap_or_default();
        let label = map
            .get("label")
            .and_then(scalar_text)
            .unwrap_or_else(|| name.clone());
        let hint = map
            .get("component")
            .and_then(scalar_text)
            .unwrap_or_else(|| DEFAULT_HINT.to_string());
        let disabled = map.get("disabled").and_then(Value::as_bool).unwrap_or(false);

        Some(Self {
            attribute_id,
            name,
            label,
            hint,
            disabled,
        })
    }

    /// `(group, child)` when the name carries a group prefix
    pub fn group(&self) -> Option<(&str, &str)> {
        self.name
            .split_once(GROUP_SEPARATOR)
            .filter(|(group, child)| !group.is_empty() && !child.is_empty())
    }
}

/// Translates single attributes using catalog data
pub struct AttributeTranslator<'c> {
    catalogs: &'c dyn CatalogLookup,
}

impl<'c> AttributeTranslator<'c> {
    pub fn new(catalogs: &'c dyn CatalogLookup) -> Self {
        Self { catalogs }
    }

    pub fn catalogs(&self) -> &'c dyn CatalogLookup {
        self.catalogs
    }

    /// Build the leaf component for one attribute
    pub fn translate(&self, attribute: &LegacyAttribute) -> Component {
        let kind = LegacyHint::parse(&attribute.hint).target_type();
        let entry = attribute
            .attribute_id
            .and_then(|id| self.catalogs.attribute_by_id(id));

        let mut component = Component::field(&attribute.name, &attribute.label, kind);
        if let Some(id) = attribute.attribute_id {
            component.properties_mut().attribute_id = Some(id);
        }
        if attribute.disabled {
            component.disabled = true;
        }
        if entry.is_some_and(|e| e.has_validation(REQUIRED_VALIDATION)) {
            component.require();
        }

        let reference = entry.and_then(AttributeCatalogEntry::reference_id);
        if kind == ComponentType::Select || reference.is_some() {
            let values = self.select_values(&attribute.name, reference);
            if !values.is_empty() {
                component.set_kind(ComponentType::Select);
                component.data = Some(SelectData { values });
            }
        }

        if let Some(entry) = entry {
            apply_dependencies(&mut component, entry);
        }

        component
    }

    /// Reference list first, configuration roles for the role field, else nothing
    pub fn select_values(&self, name: &str, reference: Option<&str>) -> Vec<SelectValue> {
        if let Some(options) = reference.and_then(|id| self.catalogs.try_reference_values(id)) {
            return options
                .into_iter()
                .map(|option| SelectValue {
                    label: option.label,
                    value: option.value,
                })
                .collect();
        }

        if name.eq_ignore_ascii_case(ROLE_FIELD) {
            return self
                .catalogs
                .roles()
                .iter()
                .map(|role| SelectValue {
                    label: role.clone(),
                    value: Value::String(role.clone()),
                })
                .collect();
        }

        Vec::new()
    }

    /// Translate a whole attribute list, nesting grouped and sectioned fields
    pub fn translate_block(&self, attributes: &[Value]) -> Vec<Component> {
        let mut tree = GroupedComponents::default();

        for attribute in attributes.iter().filter_map(LegacyAttribute::from_value) {
            if let Some((group, child_key)) = attribute.group() {
                let mut component = self.translate(&attribute);
                component.key = child_key.to_string();
                tree.push_grouped(group, component);
            } else if LegacyHint::parse(&attribute.hint) == LegacyHint::Section {
                tree.container(&attribute.name, &attribute.label);
            } else {
                tree.push(self.translate(&attribute));
            }
        }

        debug!(components = tree.roots.len(), "Attribute block translated");
        tree.roots
    }
}

fn apply_dependencies(component: &mut Component, entry: &AttributeCatalogEntry) {
    if let Some(expression) = first_visibility_expression(&entry.dependencies.visibility) {
        component.custom_conditional = Some(expression);
    }

    if let Some(rule) = entry.dependencies.disabled.first() {
        component.properties_mut().disabled_rule = Some(rule.clone());
    }
}

/// Top-level components with one container per group, created on first use.
/// Sibling keys stay unique: a repeated key gets a `_2`, `_3`... suffix.
#[derive(Default)]
struct GroupedComponents {
    roots: Vec<Component>,
    groups: HashMap<String, usize>,
}

impl GroupedComponents {
    fn push(&mut self, mut component: Component) {
        component.key = unique_key(&self.roots, &component.key);
        self.roots.push(component);
    }

    fn push_grouped(&mut self, group: &str, mut component: Component) {
        let container = self.container(group, &title_case(group));
        component.key = unique_key(container.children(), &component.key);
        container.push_child(component);
    }

    fn container(&mut self, key: &str, label: &str) -> &mut Component {
        let next = self.roots.len();
        let idx = *self.groups.entry(key.to_lowercase()).or_insert(next);

        if idx == next {
            let mut container = Component::container(&unique_key(&self.roots, key), label);
            if key.eq_ignore_ascii_case(REPRESENTANT_GROUP) {
                container.custom_conditional = Some(REPRESENTANT_CONDITIONAL.to_string());
            }
            self.roots.push(container);
        }

        &mut self.roots[idx]
    }
}

fn unique_key(siblings: &[Component], key: &str) -> String {
    let taken = |candidate: &str| siblings.iter().any(|c| c.key == candidate);
    if !taken(key) {
        return key.to_string();
    }

    let mut n = 2;
    loop {
        let candidate = format!("{key}_{n}");
        if !taken(&candidate) {
            warn!(key, renamed = %candidate, "Duplicate component key among siblings");
            return candidate;
        }
        n += 1;
    }
}

/// Upper-case the first character
pub fn title_case(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
