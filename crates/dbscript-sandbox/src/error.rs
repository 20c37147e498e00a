//! Sandbox error types.
//!
//! All orchestrator-level failures surface through [`SandboxError`]. These
//! never reach script code: the executor normalizes them into the same
//! structured [`ExecutionResult`](crate::protocol::ExecutionResult) failure
//! shape the caller gets for an uncaught script exception.

/// Unified error type for the script-execution sandbox.
#[derive(Debug, thiserror::Error)]
pub enum SandboxError {
    /// The session exceeded its wall-clock deadline.
    #[error("timeout: execution exceeded {limit_ms}ms")]
    Timeout {
        /// The configured limit in milliseconds.
        limit_ms: u64,
    },

    /// The worker thread could not be spawned, or exited without posting a
    /// result (e.g. it panicked).
    #[error("worker error: {0}")]
    Worker(String),

    /// Submitted script text exceeds the configured size limit.
    #[error("script too large: {size} bytes (limit {limit})")]
    CodeTooLarge { size: usize, limit: usize },

    /// Too many sessions are already running.
    #[error("concurrency limit reached: {max} sessions")]
    ConcurrencyLimit { max: usize },
}

/// Convenience alias used throughout the sandbox crate.
pub type Result<T> = std::result::Result<T, SandboxError>;
