//! Interested-party template
//!
//! The fixed part of the generated form is described as static data below and
//! rendered against the catalogs on every run. Each field spec is independent,
//! so adding or reordering fields never touches the renderer.

use super::component::{Column, Component, ComponentType, Conditional, SelectData, SelectValue};
use super::translate::{AttributeTranslator, LegacyAttribute};
use crate::json::scalar_text;
use serde_json::Value;
use tracing::debug;

pub const TEMPLATE_PANEL_KEY: &str = "dadesPartInteressada";
pub const TEMPLATE_PANEL_LABEL: &str = "Dades de la part interessada";

pub const ROLE_KEY: &str = "rol";
pub const PERSON_TYPE_KEY: &str = "tipusPersona";

/// Role label to role code; unmapped labels fall back to their lower-case form
pub const ROLE_CODES: &[(&str, &str)] = &[
    ("Sol·licitant", "SOLLICITANT"),
    ("Representant", "REPRESENTANT"),
    ("Interessat", "INTERESSAT"),
    ("Persona de contacte", "CONTACTE"),
    ("Notificat", "NOTIFICAT"),
];

/// Numeric person-type code to the code the panels are gated on
pub const PERSON_TYPE_CODES: &[(&str, &str)] = &[
    ("1", "fisica"),
    ("2", "juridica"),
    ("3", "administracioPublica"),
    ("4", "entitatSensePersonalitat"),
];

/// Where a select gets its options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionSource {
    None,
    /// Named reference list, empty when the catalog lacks it
    Reference(&'static str),
    /// Reference list whose values go through [`PERSON_TYPE_CODES`]
    PersonTypes(&'static str),
    /// Configuration roles through [`ROLE_CODES`]
    Roles,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Always,
    /// Shown once the named field has a value
    WhenSet(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub key: &'static str,
    pub label: &'static str,
    pub kind: ComponentType,
    pub required: bool,
    pub options: OptionSource,
    pub depends_on: &'static [&'static str],
    pub visibility: Visibility,
}

impl FieldSpec {
    const fn new(key: &'static str, label: &'static str, kind: ComponentType) -> Self {
        Self {
            key,
            label,
            kind,
            required: false,
            options: OptionSource::None,
            depends_on: &[],
            visibility: Visibility::Always,
        }
    }

    pub const fn text(key: &'static str, label: &'static str) -> Self {
        Self::new(key, label, ComponentType::Textfield)
    }

    pub const fn select(key: &'static str, label: &'static str, options: OptionSource) -> Self {
        let mut spec = Self::new(key, label, ComponentType::Select);
        spec.options = options;
        spec
    }

    pub const fn checkbox(key: &'static str, label: &'static str) -> Self {
        Self::new(key, label, ComponentType::Checkbox)
    }

    pub const fn email(key: &'static str, label: &'static str) -> Self {
        Self::new(key, label, ComponentType::Email)
    }

    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub const fn depends_on(mut self, fields: &'static [&'static str]) -> Self {
        self.depends_on = fields;
        self
    }

    pub const fn visible_when_set(mut self, field: &'static str) -> Self {
        self.visibility = Visibility::WhenSet(field);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateItem {
    Field(FieldSpec),
    /// Defined by the configuration attribute of that name; omitted when absent
    ConfigAttribute(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PanelSpec {
    pub key: &'static str,
    pub label: &'static str,
    /// Person-type code gating the panel
    pub person_type: Option<&'static str>,
    pub sections: &'static [&'static [TemplateItem]],
}

pub const TOP_ROW_KEY: &str = "filaPrincipal";

pub const TOP_ROW: &[FieldSpec] = &[
    FieldSpec::select(ROLE_KEY, "Rol", OptionSource::Roles).required(),
    FieldSpec::select(PERSON_TYPE_KEY, "Tipus de persona", OptionSource::PersonTypes("tipusPersona"))
        .required(),
    FieldSpec::checkbox("isRepresentant", "Actua com a representant").visible_when_set(ROLE_KEY),
    FieldSpec::checkbox("notificacioElectronica", "Accepta la notificació electrònica")
        .visible_when_set(ROLE_KEY),
];

const DOCUMENT: &[TemplateItem] = &[
    TemplateItem::Field(FieldSpec::select(
        "tipusDocument",
        "Tipus de document",
        OptionSource::Reference("tipusDocument"),
    )),
    TemplateItem::Field(FieldSpec::text("numeroDocument", "Número de document").required()),
];

const GEOGRAPHY: &[TemplateItem] = &[
    TemplateItem::Field(FieldSpec::select("pais", "País", OptionSource::Reference("paisos"))),
    TemplateItem::Field(
        FieldSpec::select(
            "comunitat",
            "Comunitat autònoma",
            OptionSource::Reference("comunitatsAutonomes"),
        )
        .depends_on(&["pais"]),
    ),
    TemplateItem::Field(
        FieldSpec::select("provincia", "Província", OptionSource::Reference("provincies"))
            .depends_on(&["pais", "comunitat"]),
    ),
    TemplateItem::Field(
        FieldSpec::text("codiPostal", "Codi postal").depends_on(&["pais", "comunitat", "provincia"]),
    ),
];

const CONTACT: &[TemplateItem] = &[
    TemplateItem::Field(FieldSpec::email("email", "Correu electrònic")),
    TemplateItem::Field(FieldSpec::text("telefon", "Telèfon")),
];

const INDIVIDUAL_CONTACT: &[TemplateItem] = &[
    TemplateItem::Field(FieldSpec::email("email", "Correu electrònic")),
    TemplateItem::Field(FieldSpec::text("telefon", "Telèfon")),
    TemplateItem::ConfigAttribute("telefonMobil"),
];

const LANGUAGE: &[TemplateItem] = &[TemplateItem::Field(FieldSpec::select(
    "idioma",
    "Idioma",
    OptionSource::Reference("idiomes"),
))];

const INDIVIDUAL_NAME: &[TemplateItem] = &[
    TemplateItem::Field(FieldSpec::text("nom", "Nom").required()),
    TemplateItem::Field(FieldSpec::text("primerCognom", "Primer cognom").required()),
    TemplateItem::Field(FieldSpec::text("segonCognom", "Segon cognom")),
];

const LEGAL_ENTITY_NAME: &[TemplateItem] =
    &[TemplateItem::Field(FieldSpec::text("raoSocial", "Raó social").required())];

const PUBLIC_BODY_NAME: &[TemplateItem] = &[
    TemplateItem::Field(FieldSpec::text("nomOrganisme", "Nom de l'organisme").required()),
    TemplateItem::Field(FieldSpec::text("codiDir3", "Codi DIR3")),
];

const UNINCORPORATED_NAME: &[TemplateItem] =
    &[TemplateItem::Field(FieldSpec::text("nomEntitat", "Nom de l'entitat").required())];

const ADDRESS_REMARKS: &[TemplateItem] = &[
    TemplateItem::Field(FieldSpec::text("adrecaCompleta", "Adreça completa")),
    TemplateItem::Field(FieldSpec::text("observacions", "Observacions")),
    TemplateItem::Field(FieldSpec::text("indicacionsAddicionals", "Indicacions addicionals")),
];

pub const PERSON_PANELS: &[PanelSpec] = &[
    PanelSpec {
        key: "personaFisica",
        label: "Persona física",
        person_type: Some("fisica"),
        sections: &[DOCUMENT, INDIVIDUAL_NAME, GEOGRAPHY, INDIVIDUAL_CONTACT, LANGUAGE],
    },
    PanelSpec {
        key: "personaJuridica",
        label: "Persona jurídica",
        person_type: Some("juridica"),
        sections: &[DOCUMENT, LEGAL_ENTITY_NAME, GEOGRAPHY, CONTACT, LANGUAGE],
    },
    PanelSpec {
        key: "administracioPublica",
        label: "Administració pública",
        person_type: Some("administracioPublica"),
        sections: &[DOCUMENT, PUBLIC_BODY_NAME, GEOGRAPHY, CONTACT, LANGUAGE],
    },
    PanelSpec {
        key: "entitatSensePersonalitat",
        label: "Entitat sense personalitat jurídica",
        person_type: Some("entitatSensePersonalitat"),
        sections: &[DOCUMENT, UNINCORPORATED_NAME, GEOGRAPHY, CONTACT, LANGUAGE],
    },
];

pub const ADDRESS_PANEL: PanelSpec = PanelSpec {
    key: "adreca",
    label: "Adreça",
    person_type: None,
    sections: &[GEOGRAPHY, ADDRESS_REMARKS],
};

/// Role code for a configuration role label
pub fn role_code(label: &str) -> String {
    let label = label.trim().to_lowercase();
    ROLE_CODES
        .iter()
        .find(|(known, _)| known.to_lowercase() == label)
        .map_or(label, |(_, code)| (*code).to_string())
}

/// Semantic person-type code for a catalog value, unchanged when unknown
pub fn person_type_code(value: &Value) -> Value {
    scalar_text(value)
        .and_then(|text| {
            let text = text.trim().to_string();
            PERSON_TYPE_CODES
                .iter()
                .find(|(numeric, _)| *numeric == text)
                .map(|(_, code)| Value::String((*code).to_string()))
        })
        .unwrap_or_else(|| value.clone())
}

/// Renders the template specs into components
pub struct TemplateRenderer<'a, 'c> {
    translator: &'a AttributeTranslator<'c>,
}

impl<'a, 'c> TemplateRenderer<'a, 'c> {
    pub fn new(translator: &'a AttributeTranslator<'c>) -> Self {
        Self { translator }
    }

    /// The complete `dadesPartInteressada` panel
    pub fn render(&self) -> Component {
        let mut children = vec![self.top_row()];
        children.extend(PERSON_PANELS.iter().map(|panel| self.panel(panel)));
        children.push(self.panel(&ADDRESS_PANEL));

        Component::panel(TEMPLATE_PANEL_KEY, TEMPLATE_PANEL_LABEL, children)
    }

    fn top_row(&self) -> Component {
        let width = u8::try_from(12 / TOP_ROW.len().max(1)).unwrap_or(12);
        let columns = TOP_ROW
            .iter()
            .map(|spec| Column {
                width,
                size: "md",
                components: vec![self.field(spec)],
            })
            .collect();

        Component::columns(TOP_ROW_KEY, columns)
    }

    pub fn panel(&self, spec: &PanelSpec) -> Component {
        let children = spec
            .sections
            .iter()
            .flat_map(|section| section.iter())
            .filter_map(|item| self.item(item))
            .collect();

        let mut panel = Component::panel(spec.key, spec.label, children);
        panel.conditional = spec.person_type.map(|code| Conditional {
            show: true,
            when: PERSON_TYPE_KEY.to_string(),
            eq: code.to_string(),
        });
        panel
    }

    fn item(&self, item: &TemplateItem) -> Option<Component> {
        match item {
            TemplateItem::Field(spec) => Some(self.field(spec)),
            TemplateItem::ConfigAttribute(name) => {
                let attribute = self
                    .translator
                    .catalogs()
                    .find_config_attribute(name)
                    .and_then(LegacyAttribute::from_value);
                if attribute.is_none() {
                    debug!(name, "Optional template field not declared in configuration");
                }
                attribute.map(|attribute| self.translator.translate(&attribute))
            },
        }
    }

    pub fn field(&self, spec: &FieldSpec) -> Component {
        let mut component = Component::field(spec.key, spec.label, spec.kind);
        if spec.required {
            component.require();
        }
        component.depends_on = spec.depends_on.iter().map(|f| (*f).to_string()).collect();
        if let Visibility::WhenSet(field) = spec.visibility {
            component.custom_conditional = Some(format!("show = !!data.{field};"));
        }
        if spec.kind == ComponentType::Select {
            component.data = Some(SelectData {
                values: self.options(spec.options),
            });
        }
        component
    }

    fn options(&self, source: OptionSource) -> Vec<SelectValue> {
        let catalogs = self.translator.catalogs();
        match source {
            OptionSource::None => Vec::new(),
            OptionSource::Reference(list) => self.translator.select_values("", Some(list)),
            OptionSource::PersonTypes(list) => self
                .translator
                .select_values("", Some(list))
                .into_iter()
                .map(|option| SelectValue {
                    value: person_type_code(&option.value),
                    label: option.label,
                })
                .collect(),
            OptionSource::Roles => catalogs
                .roles()
                .iter()
                .map(|role| SelectValue {
                    label: role.clone(),
                    value: Value::String(role_code(role)),
                })
                .collect(),
        }
    }
}
