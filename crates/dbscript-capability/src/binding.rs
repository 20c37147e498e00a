//! Capability bindings.
//!
//! [`CapabilityBinding`] is the real, in-process call surface: per group, an
//! immutable mapping from every callable name (canonical and alias) to the
//! operation behind it. It is built once from a registry snapshot and lives
//! for the process lifetime; execution sessions only ever see the names (via
//! [`Manifest`](crate::manifest::Manifest)), never the handlers.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use dbscript_registry::{OperationDescriptor, OperationRegistry, RequestContext};

use crate::aliases::{AliasTable, is_surfaced};
use crate::args::{CallConventions, normalize};
use crate::error::{CapabilityError, Result};
use crate::naming::{NamingRules, canonical_method_name};

/// Everything the builder needs besides the registry itself.
#[derive(Debug, Clone, Default)]
pub struct BindingOptions {
    pub naming: NamingRules,
    pub aliases: AliasTable,
    pub conventions: CallConventions,
}

impl BindingOptions {
    /// Options with the stock alias tables and call conventions.
    #[must_use]
    pub fn defaults() -> Self {
        Self {
            naming: NamingRules::new(),
            aliases: crate::aliases::default_aliases(),
            conventions: CallConventions::defaults(),
        }
    }
}

/// One callable method: its canonical name plus the operation it wraps.
///
/// Aliases share the same `Arc`, so invoking an alias is the same wrapper
/// invocation as the canonical call.
#[derive(Debug, Clone)]
pub struct BoundMethod {
    canonical: String,
    descriptor: OperationDescriptor,
}

impl BoundMethod {
    /// Canonical name of this method.
    pub fn canonical(&self) -> &str {
        &self.canonical
    }
}

/// The bound call surface of one group.
#[derive(Debug, Clone)]
pub struct GroupBinding {
    name: String,
    methods: HashMap<String, Arc<BoundMethod>>,
    canonical: Vec<String>,
    surfaced_aliases: Vec<String>,
}

impl GroupBinding {
    /// Group name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Canonical method names, in operation registration order.
    pub fn canonical_names(&self) -> &[String] {
        &self.canonical
    }

    /// Aliases worth surfacing in `help()`, sorted.
    pub fn surfaced_aliases(&self) -> &[String] {
        &self.surfaced_aliases
    }

    /// Every `(callable name, canonical name)` pair, aliases included.
    pub fn callables(&self) -> impl Iterator<Item = (&str, &str)> {
        self.methods
            .iter()
            .map(|(name, method)| (name.as_str(), method.canonical()))
    }

    fn method(&self, name: &str) -> Option<&Arc<BoundMethod>> {
        self.methods.get(name)
    }
}

/// The full bound call surface: every group, every callable name.
#[derive(Debug)]
pub struct CapabilityBinding {
    groups: Vec<GroupBinding>,
    conventions: CallConventions,
}

impl CapabilityBinding {
    /// Build the binding from a registry snapshot.
    ///
    /// Fails only if two operations of one group collide on the same
    /// canonical name after the naming transform; aliases whose canonical
    /// target is missing from the group are skipped silently.
    pub fn build(registry: &OperationRegistry, options: BindingOptions) -> Result<Self> {
        let mut groups = Vec::new();

        for (group_name, descriptors) in registry.snapshot() {
            let mut methods: HashMap<String, Arc<BoundMethod>> = HashMap::new();
            let mut canonical = Vec::with_capacity(descriptors.len());

            for descriptor in descriptors {
                let name = canonical_method_name(&group_name, &descriptor.name, &options.naming);
                if methods.contains_key(&name) {
                    return Err(CapabilityError::MethodCollision {
                        group: group_name,
                        method: name,
                    });
                }
                methods.insert(
                    name.clone(),
                    Arc::new(BoundMethod {
                        canonical: name.clone(),
                        descriptor,
                    }),
                );
                canonical.push(name);
            }

            let mut surfaced_aliases = Vec::new();
            for (alias, target) in options.aliases.for_group(&group_name) {
                let Some(method) = methods.get(target).cloned() else {
                    // Alias tables are shared across deployments; a missing
                    // target just means this registry does not expose the op.
                    continue;
                };
                if is_surfaced(&group_name, alias, target) {
                    surfaced_aliases.push(alias.to_string());
                }
                methods.insert(alias.to_string(), method);
            }

            tracing::debug!(
                group = %group_name,
                methods = canonical.len(),
                aliases = methods.len() - canonical.len(),
                "capability group bound"
            );

            groups.push(GroupBinding {
                name: group_name,
                methods,
                canonical,
                surfaced_aliases,
            });
        }

        Ok(Self {
            groups,
            conventions: options.conventions,
        })
    }

    /// Bound groups, sorted by name (registry snapshot order).
    pub fn groups(&self) -> &[GroupBinding] {
        &self.groups
    }

    /// Look up a group by name.
    pub fn group(&self, name: &str) -> Result<&GroupBinding> {
        self.groups
            .iter()
            .find(|g| g.name == name)
            .ok_or_else(|| CapabilityError::UnknownGroup {
                group: name.to_string(),
            })
    }

    /// Invoke `group.method` with ordered call arguments.
    ///
    /// `method` may be a canonical name or an alias. Arguments are
    /// normalized into the operation's named-parameter object before the
    /// handler runs; errors from the handler pass through verbatim.
    pub async fn invoke(
        &self,
        group: &str,
        method: &str,
        args: &[Value],
        ctx: RequestContext,
    ) -> Result<Value> {
        let bound = self
            .group(group)?
            .method(method)
            .ok_or_else(|| CapabilityError::UnknownMethod {
                group: group.to_string(),
                method: method.to_string(),
            })?;

        let params = normalize(self.conventions.spec(bound.canonical()), args);
        tracing::trace!(
            group,
            method,
            canonical = bound.canonical(),
            "invoking capability"
        );

        Ok(bound.descriptor.handler.call(params, ctx).await?)
    }
}
