//! Canonical method naming.
//!
//! Raw registry identifiers are snake_case and carry a group prefix
//! (`core_read_query` in group `core`). The callable surface uses short
//! camelCase names (`readQuery`), so the transform here is: strip the
//! group prefix, then camel-case the remaining segments.
//!
//! A configured subset of groups keeps its full prefix because stripping it
//! would collide with a method of another group sharing the same namespace
//! object (e.g. two replication-ish groups both owning a `status` op).

use std::collections::BTreeSet;

/// Naming configuration for one binding.
#[derive(Debug, Clone, Default)]
pub struct NamingRules {
    /// Groups whose operations keep the `<group>_` prefix when deriving the
    /// canonical name.
    pub keep_prefix: BTreeSet<String>,
}

impl NamingRules {
    /// Rules that strip the group prefix everywhere.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a group as prefix-keeping.
    pub fn keep_prefix_for(mut self, group: impl Into<String>) -> Self {
        self.keep_prefix.insert(group.into());
        self
    }
}

/// Convert a snake_case identifier to camelCase.
///
/// Empty segments (doubled underscores, leading/trailing underscores) are
/// dropped rather than producing stray capitals.
#[must_use]
pub fn camel_case(ident: &str) -> String {
    let mut out = String::with_capacity(ident.len());
    for segment in ident.split('_').filter(|s| !s.is_empty()) {
        if out.is_empty() {
            out.push_str(segment);
        } else {
            let mut chars = segment.chars();
            if let Some(first) = chars.next() {
                out.extend(first.to_uppercase());
                out.push_str(chars.as_str());
            }
        }
    }
    out
}

/// Derive the canonical callable name for a raw registry identifier.
#[must_use]
pub fn canonical_method_name(group: &str, raw: &str, rules: &NamingRules) -> String {
    let stripped = if rules.keep_prefix.contains(group) {
        raw
    } else {
        raw.strip_prefix(&format!("{group}_")).unwrap_or(raw)
    };
    camel_case(stripped)
}

/// Capitalize the first character (used by the alias-surfacing predicate).
#[must_use]
pub fn upper_first(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
