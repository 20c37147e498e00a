//! Worker-side RPC bridge.
//!
//! [`RpcBridge`] is the only path from sandboxed script code to a real
//! operation handler. Every capability shim calls [`RpcBridge::call`], which
//! allocates a session-local id, posts an [`RpcRequest`], and blocks until
//! the correlated [`RpcResponse`] arrives or the session deadline passes.
//!
//! Blocking is deliberate: the script engine evaluates on one dedicated
//! thread, so a blocking round trip gives the script `await`-able semantics
//! without any engine-side event loop. The orchestrator still serves each
//! request on its own task, keeping the wire contract order-free across ids.

use std::cell::Cell;
use std::sync::mpsc;
use std::time::Instant;

use serde_json::Value;
use tokio::sync::mpsc::UnboundedSender;

use crate::protocol::{RpcRequest, RpcResponse};

/// A failed bridge round trip.
#[derive(Debug, thiserror::Error)]
pub enum BridgeFault {
    /// The operation itself failed; scripts see this as a catchable
    /// exception carrying the handler's message verbatim.
    #[error("{0}")]
    Operation(String),

    /// The channel pair died or the deadline passed mid-call. Terminal for
    /// the session.
    #[error("rpc transport failure: {0}")]
    Transport(String),
}

/// One session's end of the RPC channel pair.
pub struct RpcBridge {
    requests: UnboundedSender<RpcRequest>,
    responses: mpsc::Receiver<RpcResponse>,
    next_id: Cell<u64>,
    deadline: Instant,
}

impl RpcBridge {
    /// Wrap a session's channel ends. `deadline` bounds every blocking wait.
    #[must_use]
    pub fn new(
        requests: UnboundedSender<RpcRequest>,
        responses: mpsc::Receiver<RpcResponse>,
        deadline: Instant,
    ) -> Self {
        Self {
            requests,
            responses,
            next_id: Cell::new(1),
            deadline,
        }
    }

    /// Perform one capability call over the bridge.
    ///
    /// Responses whose id does not match the in-flight request are ignored
    /// (logged, never fatal), upholding the unmatched-id invariant.
    pub fn call(&self, group: &str, method: &str, args: Vec<Value>) -> Result<Value, BridgeFault> {
        let id = self.next_id.get();
        self.next_id.set(id + 1);

        self.requests
            .send(RpcRequest {
                id,
                group: group.to_string(),
                method: method.to_string(),
                args,
            })
            .map_err(|_| BridgeFault::Transport("session channel closed".into()))?;

        loop {
            let remaining = self
                .deadline
                .checked_duration_since(Instant::now())
                .ok_or_else(|| BridgeFault::Transport("session deadline passed".into()))?;

            match self.responses.recv_timeout(remaining) {
                Ok(response) if response.id == id => {
                    return match response.error {
                        Some(message) => Err(BridgeFault::Operation(message)),
                        None => Ok(response.result.unwrap_or(Value::Null)),
                    };
                }
                Ok(response) => {
                    tracing::warn!(
                        expected = id,
                        received = response.id,
                        "ignoring rpc response with unmatched id"
                    );
                }
                Err(mpsc::RecvTimeoutError::Timeout) => {
                    return Err(BridgeFault::Transport("session deadline passed".into()));
                }
                Err(mpsc::RecvTimeoutError::Disconnected) => {
                    return Err(BridgeFault::Transport("session channel closed".into()));
                }
            }
        }
    }
}
