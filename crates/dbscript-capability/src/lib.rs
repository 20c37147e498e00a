//! dbscript capability layer.
//!
//! Turns a flat [`OperationRegistry`](dbscript_registry::OperationRegistry)
//! into the namespaced, aliased, positional-argument-aware call surface that
//! scripts (and direct callers) invoke:
//!
//! - **[`naming`]** -- derives canonical camelCase method names from raw
//!   registry identifiers (`core_read_query` -> `readQuery`).
//! - **[`aliases`]** -- per-group alias tables and the predicate deciding
//!   which aliases `help()` surfaces.
//! - **[`args`]** -- positional-argument normalization: ordered call
//!   arguments in, the operation's named-parameter object out.
//! - **[`binding`]** -- [`CapabilityBinding`], the immutable name-to-handler
//!   surface built once per registry snapshot.
//! - **[`manifest`]** -- [`Manifest`], the names-only projection of a
//!   binding that crosses the isolation boundary at session spawn.
//! - **[`error`]** -- [`CapabilityError`] enumerates every failure mode.

pub mod aliases;
pub mod args;
pub mod binding;
pub mod error;
pub mod manifest;
pub mod naming;

// Re-export the most commonly used types at the crate root.
pub use aliases::AliasTable;
pub use args::{CallConventions, MethodArgSpec};
pub use binding::{BindingOptions, CapabilityBinding, GroupBinding};
pub use error::{CapabilityError, Result};
pub use manifest::{Manifest, ManifestAlias, ManifestGroup};
pub use naming::NamingRules;
