//! Sandboxed script execution for database operations.
//!
//! An agent submits one JavaScript script; this crate runs it in an
//! embedded engine whose only reachable surface is the capability binding
//! it was admitted with, and returns a single structured verdict:
//!
//! - **[`executor`]** -- [`ScriptExecutor`] admits sessions (size and
//!   concurrency limits), spawns the worker thread, serves capability
//!   calls, and enforces the wall-clock deadline.
//! - **`runtime`** (private) -- builds the per-session engine context:
//!   capability root, `help()` introspection, no-op console, denylist.
//! - **[`bridge`]** -- [`RpcBridge`], the worker-side blocking half of the
//!   request/response channel pair.
//! - **[`protocol`]** -- [`RpcRequest`], [`RpcResponse`], and
//!   [`ExecutionResult`], the three wire shapes.
//! - **[`config`]** -- [`SandboxConfig`] limits and defaults.
//! - **[`error`]** -- [`SandboxError`] orchestrator-level failures.
//!
//! Script-visible failures (a rejected capability call, a thrown error)
//! never surface as Rust errors: they become the failure form of
//! [`ExecutionResult`], with operation error strings passed through
//! verbatim so scripts can match on them.

pub mod bridge;
pub mod config;
pub mod error;
pub mod executor;
pub mod protocol;
mod runtime;

// Re-export the most commonly used types at the crate root.
pub use bridge::{BridgeFault, RpcBridge};
pub use config::SandboxConfig;
pub use error::{Result, SandboxError};
pub use executor::ScriptExecutor;
pub use protocol::{ExecutionResult, RpcRequest, RpcResponse};
