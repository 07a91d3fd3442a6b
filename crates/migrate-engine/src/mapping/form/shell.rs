//! Outer envelope of a generated form document

use super::component::Component;
use super::template::{TEMPLATE_PANEL_KEY, TEMPLATE_PANEL_LABEL};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use serde_json::Value;

pub const WARNING_KEY: &str = "__warning";
pub const MIGRATION_USER: &str = "migration";

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShellDocument {
    pub family: &'static str,
    pub subfamily: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub functional_id: &'static str,
    pub mode: &'static str,
    pub external_id: Option<String>,
    pub object_path: Option<String>,
    #[serde(rename = "objectPathS3")]
    pub object_path_s3: Option<String>,
    pub version: Version,
    pub status: &'static str,
    pub state: &'static str,
    pub scopes: Vec<&'static str>,
    pub users: Vec<String>,
    pub tags: Vec<&'static str>,
    pub is_priority: bool,
    pub specific_metadata: Option<Value>,
    pub search_simple: Option<Value>,
    pub search: Option<Value>,
    pub control_data: ControlData,
    pub data: ShellData,
    #[serde(rename = "__warning", skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Version {
    pub is_current: bool,
    pub major: u32,
    pub minor: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct MongoDate {
    #[serde(rename = "$date")]
    pub date: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ControlData {
    pub creation_user: &'static str,
    pub update_user: &'static str,
    pub creation_date: MongoDate,
    pub last_update: MongoDate,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShellData {
    pub config_form: ConfigForm,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConfigForm {
    pub mode: &'static str,
    pub path: &'static str,
    pub form: FormBody,
}

#[derive(Debug, Clone, Serialize)]
pub struct FormBody {
    pub components: Vec<Component>,
}

impl ShellDocument {
    /// Shell around the given top-level components
    pub fn new(components: Vec<Component>, timestamp: DateTime<Utc>) -> Self {
        let now = timestamp.to_rfc3339_opts(SecondsFormat::Millis, true);

        Self {
            family: "CONF",
            subfamily: "FORMSS",
            name: "Generat - Estàndard Manual",
            description: "Migració automàtica des de legacy (parts interessades)",
            functional_id: "CONF_FORMSS_AUTO",
            mode: "MANUAL",
            external_id: None,
            object_path: None,
            object_path_s3: None,
            version: Version {
                is_current: true,
                major: 1,
                minor: 0,
            },
            status: "INPROGRESS",
            state: "EnCurs",
            scopes: vec!["corporatiu"],
            users: Vec::new(),
            tags: vec!["formulari", "migrat"],
            is_priority: false,
            specific_metadata: None,
            search_simple: None,
            search: None,
            control_data: ControlData {
                creation_user: MIGRATION_USER,
                update_user: MIGRATION_USER,
                creation_date: MongoDate { date: now.clone() },
                last_update: MongoDate { date: now },
            },
            data: ShellData {
                config_form: ConfigForm {
                    mode: "render",
                    path: "data",
                    form: FormBody { components },
                },
            },
            warning: None,
        }
    }

    /// Placeholder emitted when no form block could be located
    pub fn with_warning(reason: &str, timestamp: DateTime<Utc>) -> Self {
        let empty = Component::panel(TEMPLATE_PANEL_KEY, TEMPLATE_PANEL_LABEL, Vec::new());
        let mut shell = Self::new(vec![empty], timestamp);
        shell.warning = Some(reason.to_string());
        shell
    }

    pub fn components(&self) -> &[Component] {
        &self.data.config_form.form.components
    }
}
