//! Per-group alias tables.
//!
//! Agents guess ergonomic names: `query` for `readQuery`, the redundant
//! `coreReadQuery` form, and so on. Each group owns a static table mapping
//! those alternates to their canonical method name; at build time every alias
//! whose target exists in the group is bound to the same wrapper as the
//! canonical method.
//!
//! For introspection, aliases split into *surfaced* ones (shown by `help()`)
//! and literal near-duplicates of the form `<group><Canonical>`, which remain
//! callable but are hidden so the help listing stays readable.

use std::collections::BTreeMap;

use crate::naming::upper_first;

/// Alias tables for all groups: `group -> (alias -> canonical)`.
#[derive(Debug, Clone, Default)]
pub struct AliasTable {
    entries: BTreeMap<String, BTreeMap<String, String>>,
}

impl AliasTable {
    /// An empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one alias. Later insertions overwrite earlier ones.
    pub fn insert(
        &mut self,
        group: impl Into<String>,
        alias: impl Into<String>,
        canonical: impl Into<String>,
    ) {
        self.entries
            .entry(group.into())
            .or_default()
            .insert(alias.into(), canonical.into());
    }

    /// Builder-style [`insert`](Self::insert).
    #[must_use]
    pub fn with(
        mut self,
        group: impl Into<String>,
        alias: impl Into<String>,
        canonical: impl Into<String>,
    ) -> Self {
        self.insert(group, alias, canonical);
        self
    }

    /// Aliases registered for one group, sorted by alias name.
    pub fn for_group(&self, group: &str) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .get(group)
            .into_iter()
            .flat_map(|m| m.iter().map(|(a, c)| (a.as_str(), c.as_str())))
    }
}

/// Whether an alias is surfaced by `help()`.
///
/// The hidden form is exactly the group name concatenated with the
/// capitalized canonical name (`core` + `ReadQuery` = `coreReadQuery`), a
/// redundant-prefix spelling that adds noise without information.
#[must_use]
pub fn is_surfaced(group: &str, alias: &str, canonical: &str) -> bool {
    alias != format!("{group}{}", upper_first(canonical))
}

/// Default alias tables for the stock database groups.
#[must_use]
pub fn default_aliases() -> AliasTable {
    AliasTable::new()
        // core
        .with("core", "query", "readQuery")
        .with("core", "runQuery", "readQuery")
        .with("core", "select", "readQuery")
        .with("core", "coreReadQuery", "readQuery")
        .with("core", "exec", "writeQuery")
        .with("core", "coreWriteQuery", "writeQuery")
        // schema
        .with("schema", "tables", "listTables")
        .with("schema", "describe", "describeTable")
        .with("schema", "schemaListTables", "listTables")
        // admin
        .with("admin", "optimize", "optimizeTable")
        .with("admin", "adminOptimizeTable", "optimizeTable")
}
