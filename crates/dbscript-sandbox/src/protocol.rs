//! Session wire protocol.
//!
//! The sandboxed runtime and the orchestrator share no memory; everything
//! crosses the boundary as one of three messages: [`RpcRequest`] (worker to
//! orchestrator), [`RpcResponse`] (orchestrator to worker), and a final
//! [`ExecutionResult`] posted exactly once per session.
//!
//! Request ids are allocated sandbox-side from a per-session monotonic
//! counter and are never reused within a session. Correlation is flat:
//! exactly one response per request id, no ordering guarantee across ids.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A capability call crossing from the sandbox to the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcRequest {
    /// Session-local correlation id.
    pub id: u64,
    /// Capability group (e.g. `core`).
    pub group: String,
    /// Canonical method name. Alias calls resolve to their canonical
    /// name before the request is emitted.
    pub method: String,
    /// Ordered call arguments, not yet normalized.
    pub args: Vec<Value>,
}

/// The orchestrator's answer to one [`RpcRequest`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcResponse {
    /// Correlation id copied from the request.
    pub id: u64,
    /// Present on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Present on failure; surfaced to the script as a catchable exception.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RpcResponse {
    /// Successful response.
    #[must_use]
    pub fn ok(id: u64, result: Value) -> Self {
        Self {
            id,
            result: Some(result),
            error: None,
        }
    }

    /// Failed response.
    #[must_use]
    pub fn fail(id: u64, error: impl Into<String>) -> Self {
        Self {
            id,
            result: None,
            error: Some(error.into()),
        }
    }
}

/// The structured outcome of one `execute` call.
///
/// Every path through the sandbox produces this shape: a fulfilled script, a
/// caught or uncaught script exception, a timeout, and every orchestrator
/// failure all normalize into it. The external caller is never left without
/// a structured answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// Whether the script ran to completion.
    pub success: bool,
    /// The script's return value (success only). `None` when the script
    /// returned `undefined`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Failure message (failure only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Script-side stack trace, when one was available.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
}

impl ExecutionResult {
    /// Successful completion.
    #[must_use]
    pub fn ok(result: Option<Value>) -> Self {
        Self {
            success: true,
            result,
            error: None,
            stack: None,
        }
    }

    /// Failure without a stack trace.
    #[must_use]
    pub fn fail(error: impl Into<String>) -> Self {
        Self {
            success: false,
            result: None,
            error: Some(error.into()),
            stack: None,
        }
    }

    /// Failure with a script-side stack trace.
    #[must_use]
    pub fn fail_with_stack(error: impl Into<String>, stack: Option<String>) -> Self {
        Self {
            success: false,
            result: None,
            error: Some(error.into()),
            stack,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn response_constructors() {
        let ok = RpcResponse::ok(7, json!({ "rows": [] }));
        assert_eq!(ok.id, 7);
        assert!(ok.error.is_none());

        let fail = RpcResponse::fail(7, "boom");
        assert_eq!(fail.error.as_deref(), Some("boom"));
        assert!(fail.result.is_none());
    }

    #[test]
    fn result_serialization_omits_empty_fields() {
        let ok = ExecutionResult::ok(Some(json!(1)));
        let json = serde_json::to_value(&ok).unwrap();
        assert_eq!(json, json!({ "success": true, "result": 1 }));

        let fail = ExecutionResult::fail("boom");
        let json = serde_json::to_value(&fail).unwrap();
        assert_eq!(json, json!({ "success": false, "error": "boom" }));
    }

    #[test]
    fn request_round_trips_through_serde() {
        let request = RpcRequest {
            id: 3,
            group: "core".into(),
            method: "readQuery".into(),
            args: vec![json!("SELECT 1")],
        };
        let encoded = serde_json::to_string(&request).unwrap();
        let back: RpcRequest = serde_json::from_str(&encoded).unwrap();
        assert_eq!(back, request);
    }
}
