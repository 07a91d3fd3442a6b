//! Catalog entry shapes
//!
//! These mirror the external catalog contracts. Deserialization is lenient
//! about scalar types (ids, codes and tokens show up as both strings and
//! numbers in legacy exports) but strict about structure: an object where a
//! scalar belongs is an error, never a silently dropped entry.

use crate::json;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::collections::BTreeSet;

/// One attribute definition from the attributes catalog
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AttributeCatalogEntry {
    #[serde(deserialize_with = "lenient_id")]
    pub id: i64,

    #[serde(default, deserialize_with = "lenient_string")]
    pub name: Option<String>,

    #[serde(default, deserialize_with = "lenient_string")]
    pub label: Option<String>,

    /// Legacy UI hint (`select`, `boolean`, `mask`, ...)
    #[serde(default, alias = "component", deserialize_with = "lenient_string")]
    pub component_hint: Option<String>,

    #[serde(default, deserialize_with = "lenient_string_list")]
    pub validations: BTreeSet<String>,

    /// Id or name of the reference list feeding this attribute's options
    #[serde(default, deserialize_with = "lenient_string")]
    pub reference_data: Option<String>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub dependencies: Dependencies,
}

impl AttributeCatalogEntry {
    /// Case-insensitive membership test on the validation tokens
    pub fn has_validation(&self, token: &str) -> bool {
        self.validations.iter().any(|v| v.eq_ignore_ascii_case(token))
    }

    /// Reference data id, ignoring blank values
    pub fn reference_id(&self) -> Option<&str> {
        self.reference_data
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }
}

/// Rule strings attached to an attribute, e.g. `tipusPersona=1|2`
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct Dependencies {
    #[serde(default, deserialize_with = "lenient_string_list")]
    pub visibility: Vec<String>,

    #[serde(default, deserialize_with = "lenient_string_list")]
    pub disabled: Vec<String>,
}

/// A named lookup list from the reference data catalog
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ReferenceCatalogEntry {
    #[serde(deserialize_with = "required_lenient_string")]
    pub id: String,

    #[serde(default, deserialize_with = "lenient_string")]
    pub name: Option<String>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub data: Vec<ReferenceItem>,
}

impl ReferenceCatalogEntry {
    /// Resolved `(label, value)` pairs in catalog order
    pub fn options(&self) -> impl Iterator<Item = ReferenceOption> + '_ {
        self.data.iter().map(ReferenceItem::to_option)
    }
}

/// One entry of a reference list
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ReferenceItem {
    #[serde(default)]
    pub key: Value,

    /// Display text
    #[serde(default, deserialize_with = "lenient_string")]
    pub value: Option<String>,

    #[serde(default)]
    pub reference: Option<ItemReference>,
}

impl ReferenceItem {
    /// The preferred code wins when present and non-empty, the raw key otherwise
    pub fn resolved_value(&self) -> Value {
        match self.reference.as_ref().and_then(|r| r.preferred_code.as_ref()) {
            Some(Value::String(code)) if !code.is_empty() => Value::String(code.clone()),
            Some(code) if !code.is_null() && !code.is_string() => code.clone(),
            _ => self.key.clone(),
        }
    }

    pub fn to_option(&self) -> ReferenceOption {
        ReferenceOption {
            label: self.value.clone().unwrap_or_default(),
            value: self.resolved_value(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ItemReference {
    #[serde(default)]
    pub preferred_code: Option<Value>,
}

/// A selectable option: display label plus the value stored by the form
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceOption {
    pub label: String,
    pub value: Value,
}

/// Accepts strings and numbers, maps null to `None`
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s)),
        Value::Number(n) => Ok(Some(n.to_string())),
        Value::Bool(b) => Ok(Some(b.to_string())),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number, found {other}"
        ))),
    }
}

fn lenient_id<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    json::integer_id(&value)
        .ok_or_else(|| serde::de::Error::custom(format!("expected an integer id, found {value}")))
}

/// A list of scalars collected as strings; null means empty
fn lenient_string_list<'de, D, C>(deserializer: D) -> Result<C, D::Error>
where
    D: Deserializer<'de>,
    C: FromIterator<String>,
{
    match Option::<Vec<Value>>::deserialize(deserializer)? {
        None => Ok(std::iter::empty().collect()),
        Some(items) => items
            .into_iter()
            .filter(|item| !item.is_null())
            .map(|item| {
                json::scalar_text(&item).ok_or_else(|| {
                    serde::de::Error::custom(format!("expected string or number, found {item}"))
                })
            })
            .collect(),
    }
}

fn required_lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    lenient_string(deserializer)?
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| serde::de::Error::custom("missing or empty value"))
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
