//! Dependency rule strings
//!
//! Catalog dependencies are written as `field=v1|v2|...`. A rule that does
//! not fit that shape is not an error: it is treated as no rule at all.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleOperator {
    Equals,
}

impl fmt::Display for RuleOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleOperator::Equals => f.write_str("="),
        }
    }
}

/// Parsed `field=v1|v2` rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub field: String,
    pub operator: RuleOperator,
    pub values: Vec<String>,
}

impl Rule {
    /// Parse one rule string; `None` when it has no usable field or values
    pub fn parse(raw: &str) -> Option<Self> {
        let (field, values) = raw.trim().split_once('=')?;
        let field = field.trim();
        if !is_identifier(field) {
            return None;
        }

        let values: Vec<String> = values
            .split('|')
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(String::from)
            .collect();
        if values.is_empty() {
            return None;
        }

        Some(Self {
            field: field.to_string(),
            operator: RuleOperator::Equals,
            values,
        })
    }

    /// Render as a form-renderer `customConditional` script
    pub fn show_expression(&self) -> String {
        let alternatives: Vec<String> = self
            .values
            .iter()
            .map(String::as_str)
            .map(script_literal)
            .collect();
        format!(
            "show = [{}].includes(data.{});",
            alternatives.join(","),
            self.field
        )
    }
}

/// Compile the first rule of a list; later rules are ignored
pub fn first_visibility_expression(rules: &[String]) -> Option<String> {
    rules
        .first()
        .and_then(|raw| Rule::parse(raw))
        .map(|rule| rule.show_expression())
}

fn is_identifier(field: &str) -> bool {
    !field.is_empty()
        && field
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

/// Integers and booleans stay bare, everything else becomes a quoted string
fn script_literal(value: &str) -> String {
    if value.parse::<i64>().is_ok() || value == "true" || value == "false" {
        value.to_string()
    } else {
        serde_json::Value::String(value.to_string()).to_string()
    }
}
