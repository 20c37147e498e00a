//! dbscript operation registry.
//!
//! This crate is the seam between the scripted-execution subsystem and the
//! hundreds of individual SQL-generating tool handlers that live outside it:
//!
//! - **[`registry`]** -- [`OperationRegistry`] and [`OperationDescriptor`]
//!   group every handler by its group tag and hand out deterministic
//!   snapshots for the capability layer to bind.
//! - **[`context`]** -- [`RequestContext`] and [`ContextFactory`] mint the
//!   fresh per-call context every handler receives.
//! - **[`error`]** -- [`RegistryError`] enumerates every failure mode.
//!
//! All public types are `Send + Sync` and designed for use within a
//! multi-threaded tokio runtime.

pub mod context;
pub mod error;
pub mod registry;

// Re-export the most commonly used types at the crate root.
pub use context::{ContextFactory, RequestContext, SystemContextFactory};
pub use error::{RegistryError, Result};
pub use registry::{FnOperation, Operation, OperationDescriptor, OperationRegistry};
