//! Secondary lookup keys for reference lists
//!
//! Some lists are referenced by more than one identifier across legacy
//! systems (the country list is the classic case). An alias only ever adds a
//! key: it never shadows an id or name that a catalog entry already claims.

use migrate_common::{MigrateError, Result};

/// Reference list addressable under `paisos`, `pais` and `RD_PAISOS`
pub const COUNTRY_LIST: &str = "paisos";

/// Alias table: `target` id/name -> additional keys
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceAliases {
    entries: Vec<(String, Vec<String>)>,
}

impl Default for ReferenceAliases {
    fn default() -> Self {
        Self::empty().with_alias(COUNTRY_LIST, ["pais", "RD_PAISOS"])
    }
}

impl ReferenceAliases {
    /// A table without the built-in aliases
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Register extra keys for `target`
    pub fn with_alias<I, S>(mut self, target: impl Into<String>, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let target = target.into();
        let aliases: Vec<String> = aliases.into_iter().map(Into::into).collect();

        match self
            .entries
            .iter_mut()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(&target))
        {
            Some((_, keys)) => keys.extend(aliases),
            None => self.entries.push((target, aliases)),
        }

        self
    }

    /// Parse `target:alias1|alias2;target2:alias3` and merge it into this table
    pub fn extend_from_list(mut self, list: &str) -> Result<Self> {
        for clause in list.split(';').map(str::trim).filter(|c| !c.is_empty()) {
            let (target, aliases) = clause.split_once(':').ok_or_else(|| {
                MigrateError::config(format!(
                    "Invalid reference alias '{clause}', expected 'target:alias1|alias2'"
                ))
            })?;

            let target = target.trim();
            let aliases: Vec<&str> = aliases
                .split('|')
                .map(str::trim)
                .filter(|a| !a.is_empty())
                .collect();

            if target.is_empty() || aliases.is_empty() {
                return Err(MigrateError::config(format!(
                    "Invalid reference alias '{clause}': target and at least one alias are required"
                )));
            }

            self = self.with_alias(target, aliases);
        }

        Ok(self)
    }

    /// `(target, aliases)` pairs in registration order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|(target, aliases)| (target.as_str(), aliases.as_slice()))
    }
}
