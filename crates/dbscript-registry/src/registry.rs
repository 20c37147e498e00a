//! Operation registry.
//!
//! The registry tracks every database operation handler known to the process,
//! grouped by its `group` tag (e.g. `core`, `schema`, `admin`). It is the
//! single source the capability layer reads when building a call surface, and
//! the source the orchestrator resolves RPC requests against.
//!
//! Internally the registry is backed by [`DashMap`] which provides lock-free
//! concurrent reads and fine-grained write locking, making it safe to share
//! across tasks without a global `RwLock`. Registration order is preserved
//! within a group; groups themselves are reported in sorted order so that
//! snapshots (and the manifests derived from them) are deterministic.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use futures::future::BoxFuture;
use serde_json::Value;

use crate::context::RequestContext;
use crate::error::{RegistryError, Result};

// ---------------------------------------------------------------------------
// Operations
// ---------------------------------------------------------------------------

/// A single database operation handler.
///
/// Implementations own their input validation: `params` arrives exactly as
/// the caller (or the positional-argument normalizer) produced it, and the
/// handler is expected to reject shapes it does not understand. Nothing in
/// the capability or sandbox layers second-guesses that validation.
#[async_trait]
pub trait Operation: Send + Sync {
    /// Execute the operation with named parameters and a per-call context.
    async fn call(&self, params: Value, ctx: RequestContext) -> Result<Value>;
}

/// Adapter turning an async closure into an [`Operation`].
///
/// Mostly useful for tests and small embedders that do not want a dedicated
/// handler type per operation.
pub struct FnOperation<F> {
    f: F,
}

impl<F> FnOperation<F>
where
    F: Fn(Value, RequestContext) -> BoxFuture<'static, Result<Value>> + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

#[async_trait]
impl<F> Operation for FnOperation<F>
where
    F: Fn(Value, RequestContext) -> BoxFuture<'static, Result<Value>> + Send + Sync,
{
    async fn call(&self, params: Value, ctx: RequestContext) -> Result<Value> {
        (self.f)(params, ctx).await
    }
}

/// A registered operation: its raw registry identifier, its group, and the
/// handler that executes it.
#[derive(Clone)]
pub struct OperationDescriptor {
    /// Raw registry identifier (e.g. `core_read_query`). The capability layer
    /// derives the callable camelCase name from this.
    pub name: String,
    /// Group tag the operation belongs to (e.g. `core`).
    pub group: String,
    /// The handler invoked for every call.
    pub handler: Arc<dyn Operation>,
}

impl OperationDescriptor {
    /// Create a descriptor from any handler.
    pub fn new(
        group: impl Into<String>,
        name: impl Into<String>,
        handler: Arc<dyn Operation>,
    ) -> Self {
        Self {
            name: name.into(),
            group: group.into(),
            handler,
        }
    }

    /// Create a descriptor backed by a synchronous closure.
    ///
    /// The closure result is returned as an immediately-ready future, which
    /// is all most stub handlers need.
    pub fn from_sync_fn<F>(group: impl Into<String>, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(Value) -> Result<Value> + Send + Sync + 'static,
    {
        let f = Arc::new(f);
        let handler = FnOperation::new(move |params, _ctx| {
            let f = Arc::clone(&f);
            Box::pin(async move { f(params) }) as BoxFuture<'static, Result<Value>>
        });
        Self::new(group, name, Arc::new(handler))
    }
}

impl fmt::Debug for OperationDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperationDescriptor")
            .field("name", &self.name)
            .field("group", &self.group)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Concurrent operation registry backed by [`DashMap`].
///
/// The registry is cheaply cloneable (`Arc`-backed) and `Send + Sync`.
#[derive(Clone, Default)]
pub struct OperationRegistry {
    groups: Arc<DashMap<String, Vec<OperationDescriptor>>>,
}

impl OperationRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an operation.
    ///
    /// Returns [`RegistryError::DuplicateOperation`] if the `(group, name)`
    /// pair already exists.
    pub fn register(&self, descriptor: OperationDescriptor) -> Result<()> {
        let mut group = self.groups.entry(descriptor.group.clone()).or_default();
        if group.iter().any(|d| d.name == descriptor.name) {
            return Err(RegistryError::DuplicateOperation {
                group: descriptor.group,
                name: descriptor.name,
            });
        }

        tracing::info!(
            group = %descriptor.group,
            operation = %descriptor.name,
            "operation registered"
        );
        group.push(descriptor);
        Ok(())
    }

    /// Look up a single operation by `(group, name)`.
    pub fn get(&self, group: &str, name: &str) -> Result<OperationDescriptor> {
        let entry = self
            .groups
            .get(group)
            .ok_or_else(|| RegistryError::GroupNotFound {
                group: group.to_string(),
            })?;
        entry
            .iter()
            .find(|d| d.name == name)
            .cloned()
            .ok_or_else(|| RegistryError::OperationNotFound {
                group: group.to_string(),
                name: name.to_string(),
            })
    }

    /// Return all registered group names, sorted.
    pub fn group_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.groups.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    /// Return the operations of one group in registration order.
    pub fn group(&self, group: &str) -> Result<Vec<OperationDescriptor>> {
        self.groups
            .get(group)
            .map(|e| e.value().clone())
            .ok_or_else(|| RegistryError::GroupNotFound {
                group: group.to_string(),
            })
    }

    /// Snapshot the whole registry: groups sorted by name, operations in
    /// registration order within each group.
    pub fn snapshot(&self) -> Vec<(String, Vec<OperationDescriptor>)> {
        let mut all: Vec<(String, Vec<OperationDescriptor>)> = self
            .groups
            .iter()
            .map(|e| (e.key().clone(), e.value().clone()))
            .collect();
        all.sort_by(|a, b| a.0.cmp(&b.0));
        all
    }

    /// Total number of registered operations across all groups.
    pub fn count(&self) -> usize {
        self.groups.iter().map(|e| e.value().len()).sum()
    }
}
