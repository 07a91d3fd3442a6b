//! Target form component model
//!
//! Field order in these structs is the key order of the emitted JSON.

use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentType {
    Textfield,
    Select,
    Checkbox,
    Panel,
    Container,
    Email,
    Columns,
}

impl ComponentType {
    /// Whether the renderer stores a value for this component
    pub fn is_input(self) -> bool {
        !matches!(self, ComponentType::Panel | ComponentType::Columns)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Properties {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attribute_id: Option<i64>,

    /// Disablement rule kept verbatim, never evaluated here
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disabled_rule: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Validate {
    pub required: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectValue {
    pub label: String,
    pub value: Value,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SelectData {
    pub values: Vec<SelectValue>,
}

/// Simple equality condition evaluated by the renderer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Conditional {
    pub show: bool,
    pub when: String,
    pub eq: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Column {
    pub width: u8,
    pub size: &'static str,
    pub components: Vec<Component>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Component {
    pub label: String,
    pub key: String,
    #[serde(rename = "type")]
    pub kind: ComponentType,
    pub input: bool,
    pub table_view: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub validate_when_hidden: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<Properties>,

    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub disabled: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub validate: Option<Validate>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<SelectData>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_conditional: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub conditional: Option<Conditional>,

    /// Upstream fields whose value drives this one's options
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub columns: Option<Vec<Column>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub components: Option<Vec<Component>>,
}

impl Component {
    fn base(key: &str, label: &str, kind: ComponentType) -> Self {
        Self {
            label: label.to_string(),
            key: key.to_string(),
            kind,
            input: false,
            table_view: false,
            validate_when_hidden: None,
            properties: None,
            disabled: false,
            validate: None,
            data: None,
            custom_conditional: None,
            conditional: None,
            depends_on: Vec::new(),
            columns: None,
            components: None,
        }
    }

    /// Value-carrying field
    pub fn field(key: &str, label: &str, kind: ComponentType) -> Self {
        let mut component = Self::base(key, label, kind);
        component.set_kind(kind);
        component.validate_when_hidden = Some(false);
        component
    }

    pub fn panel(key: &str, label: &str, children: Vec<Component>) -> Self {
        let mut panel = Self::base(key, label, ComponentType::Panel);
        panel.components = Some(children);
        panel
    }

    /// Grouping container; nests its children's values under `key`
    pub fn container(key: &str, label: &str) -> Self {
        let mut container = Self::base(key, label, ComponentType::Container);
        container.input = true;
        container.components = Some(Vec::new());
        container
    }

    pub fn columns(key: &str, columns: Vec<Column>) -> Self {
        let mut row = Self::base(key, "", ComponentType::Columns);
        row.columns = Some(columns);
        row
    }

    /// Change the type, keeping `input`/`tableView` consistent with it
    pub fn set_kind(&mut self, kind: ComponentType) {
        self.kind = kind;
        self.input = kind.is_input();
        self.table_view = kind.is_input();
    }

    pub fn require(&mut self) {
        self.validate = Some(Validate { required: true });
    }

    pub fn properties_mut(&mut self) -> &mut Properties {
        self.properties.get_or_insert_with(Properties::default)
    }

    pub fn push_child(&mut self, child: Component) {
        self.components.get_or_insert_with(Vec::new).push(child);
    }

    pub fn children(&self) -> &[Component] {
        self.components.as_deref().unwrap_or_default()
    }

    /// Direct child by key
    pub fn child(&self, key: &str) -> Option<&Component> {
        self.children().iter().find(|c| c.key == key)
    }

    /// Depth-first search through children and columns
    pub fn find(&self, key: &str) -> Option<&Component> {
        if self.key == key {
            return Some(self);
        }

        let nested = self
            .columns
            .iter()
            .flatten()
            .flat_map(|column| column.components.iter());

        self.children()
            .iter()
            .chain(nested)
            .find_map(|child| child.find(key))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_field_serializes_in_declared_order() {
        let mut field = Component::field("nom", "Nom", ComponentType::Textfield);
        field.require();
        field.properties_mut().attribute_id = Some(12);

        assert_eq!(
            serde_json::to_string(&field).unwrap(),
            r#"{"label":"Nom","key":"nom","type":"textfield","input":true,"tableView":true,"validateWhenHidden":false,"properties":{"attributeId":12},"validate":{"required":true}}"#
        );
    }

    #[test]
    fn test_panel_and_container_flags() {
        let panel = serde_json::to_value(Component::panel("p", "P", vec![])).unwrap();
        assert_eq!(panel["input"], json!(false));
        assert_eq!(panel["tableView"], json!(false));
        assert_eq!(panel["components"], json!([]));

        let container = serde_json::to_value(Component::container("c", "C")).unwrap();
        assert_eq!(container["type"], json!("container"));
        assert_eq!(container["input"], json!(true));
        assert_eq!(container["tableView"], json!(false));
    }

    #[test]
    fn test_find_descends_into_columns() {
        let row = Component::columns(
            "row",
            vec![Column {
                width: 6,
                size: "md",
                components: vec![Component::field("rol", "Rol", ComponentType::Select)],
            }],
        );
        let root = Component::panel("root", "Root", vec![row]);

        assert_eq!(root.find("rol").unwrap().kind, ComponentType::Select);
        assert!(root.find("missing").is_none());
    }
}
