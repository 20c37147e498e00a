//! Execution manifests.
//!
//! A [`Manifest`] is the only artifact that crosses the isolation boundary at
//! session spawn time: group and method *names*, never handler references.
//! The sandboxed runtime rebuilds its proxy call surface purely from this
//! structure, so whatever is absent here is unreachable from script code.

use serde::{Deserialize, Serialize};

use crate::aliases::is_surfaced;
use crate::binding::CapabilityBinding;

/// One alias entry: calling `alias` must emit RPC traffic for `canonical`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestAlias {
    pub alias: String,
    pub canonical: String,
}

/// The reachable surface of one group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestGroup {
    /// Group name (the property name on the capability root object).
    pub name: String,
    /// Canonical method names, in binding order.
    pub methods: Vec<String>,
    /// Alias name pairs, sorted by alias.
    pub aliases: Vec<ManifestAlias>,
}

impl ManifestGroup {
    /// Method names surfaced by the group's `help()`: canonical names plus
    /// surfaced aliases.
    #[must_use]
    pub fn help_entries(&self) -> Vec<String> {
        let mut entries = self.methods.clone();
        entries.extend(
            self.aliases
                .iter()
                .filter(|a| is_surfaced(&self.name, &a.alias, &a.canonical))
                .map(|a| a.alias.clone()),
        );
        entries
    }
}

/// The complete reachable surface handed to one execution session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    /// Name of the global capability root object inside the sandbox
    /// (e.g. `mysql`).
    pub root: String,
    /// Reachable groups, sorted by name.
    pub groups: Vec<ManifestGroup>,
}

impl Manifest {
    /// Derive the manifest for a binding.
    #[must_use]
    pub fn from_binding(root: impl Into<String>, binding: &CapabilityBinding) -> Self {
        let groups = binding
            .groups()
            .iter()
            .map(|group| {
                let mut aliases: Vec<ManifestAlias> = group
                    .callables()
                    .filter(|(name, canonical)| name != canonical)
                    .map(|(name, canonical)| ManifestAlias {
                        alias: name.to_string(),
                        canonical: canonical.to_string(),
                    })
                    .collect();
                aliases.sort_by(|a, b| a.alias.cmp(&b.alias));

                ManifestGroup {
                    name: group.name().to_string(),
                    methods: group.canonical_names().to_vec(),
                    aliases,
                }
            })
            .collect();

        Self {
            root: root.into(),
            groups,
        }
    }

    /// Group names, in manifest order.
    #[must_use]
    pub fn group_names(&self) -> Vec<String> {
        self.groups.iter().map(|g| g.name.clone()).collect()
    }
}
