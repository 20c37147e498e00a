//! Per-call request contexts.
//!
//! Every capability invocation receives a fresh [`RequestContext`] minted by a
//! [`ContextFactory`]. The sandbox layer treats the context as opaque: it is
//! created immediately before the handler runs and dropped when the handler
//! returns, never inspected or persisted across calls.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Context handed to an operation handler for a single invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestContext {
    /// Unique, time-ordered identifier for this invocation (UUID v7).
    pub request_id: Uuid,
    /// When the context was minted.
    pub issued_at: DateTime<Utc>,
}

impl RequestContext {
    /// Mint a fresh context.
    #[must_use]
    pub fn new() -> Self {
        Self {
            request_id: Uuid::now_v7(),
            issued_at: Utc::now(),
        }
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Produces a fresh [`RequestContext`] per capability invocation.
///
/// The trait seam exists so embedders can thread connection handles, auth
/// claims, or tracing baggage into their handlers without the sandbox layer
/// knowing the shape.
pub trait ContextFactory: Send + Sync {
    /// Mint a context for one invocation.
    fn fresh(&self) -> RequestContext;
}

/// Default factory: a new v7 id and timestamp per call, nothing else.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemContextFactory;

impl ContextFactory for SystemContextFactory {
    fn fresh(&self) -> RequestContext {
        RequestContext::new()
    }
}
