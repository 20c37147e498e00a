//! Sandbox configuration.
//!
//! [`SandboxConfig`] controls the limits applied to every execution session.
//! Sensible defaults are provided via the [`Default`] implementation, and a
//! builder-style API allows callers to customise individual fields fluently.

use std::time::Duration;

/// Limits and naming for the script-execution sandbox.
#[derive(Debug, Clone)]
pub struct SandboxConfig {
    /// Wall-clock deadline applied when the caller does not pass one, in
    /// milliseconds.
    ///
    /// Default: **5 000 ms**.
    pub default_timeout_ms: u64,

    /// Maximum size of submitted script text in bytes.
    ///
    /// Default: **64 KiB**.
    pub max_code_size: usize,

    /// Maximum concurrently running sessions. Submissions beyond this fail
    /// fast with a structured concurrency error rather than queueing.
    ///
    /// Default: **8**.
    pub max_concurrent: usize,

    /// Engine-interior bound on loop iterations, the script-engine analogue
    /// of fuel metering: a CPU-bound loop terminates deterministically even
    /// though the worker thread cannot be killed from outside.
    ///
    /// Default: **10 000 000**.
    pub loop_iteration_limit: u64,

    /// Engine-interior recursion depth bound.
    ///
    /// Default: **512**.
    pub recursion_limit: usize,

    /// Name of the global capability root object scripts see (`mysql.core.
    /// readQuery(...)` has a root of `mysql`).
    ///
    /// Default: **`db`**.
    pub root_namespace: String,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            default_timeout_ms: 5000,
            max_code_size: 64 * 1024,
            max_concurrent: 8,
            loop_iteration_limit: 10_000_000,
            recursion_limit: 512,
            root_namespace: "db".to_string(),
        }
    }
}

impl SandboxConfig {
    /// Create a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the default wall-clock deadline (in milliseconds).
    #[must_use]
    pub fn with_default_timeout_ms(mut self, ms: u64) -> Self {
        self.default_timeout_ms = ms;
        self
    }

    /// Set the maximum script size (in bytes).
    #[must_use]
    pub fn with_max_code_size(mut self, bytes: usize) -> Self {
        self.max_code_size = bytes;
        self
    }

    /// Set the maximum number of concurrent sessions.
    #[must_use]
    pub fn with_max_concurrent(mut self, sessions: usize) -> Self {
        self.max_concurrent = sessions;
        self
    }

    /// Set the loop-iteration limit.
    #[must_use]
    pub fn with_loop_iteration_limit(mut self, iterations: u64) -> Self {
        self.loop_iteration_limit = iterations;
        self
    }

    /// Set the recursion depth limit.
    #[must_use]
    pub fn with_recursion_limit(mut self, depth: usize) -> Self {
        self.recursion_limit = depth;
        self
    }

    /// Set the name of the capability root object.
    #[must_use]
    pub fn with_root_namespace(mut self, name: impl Into<String>) -> Self {
        self.root_namespace = name.into();
        self
    }

    /// The default deadline as a [`Duration`].
    #[must_use]
    pub fn default_timeout(&self) -> Duration {
        Duration::from_millis(self.default_timeout_ms)
    }
}
