//! Session orchestration.
//!
//! [`ScriptExecutor`] owns the capability binding, admits sessions against a
//! concurrency limit, and runs each admitted script on a dedicated worker
//! thread (the engine context is not `Send`). While the worker runs, the
//! executor serves its capability requests on the async runtime and enforces
//! the wall-clock deadline; the deadline verdict is authoritative even if the
//! worker later produces a result.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{Semaphore, mpsc, oneshot};
use tracing::Instrument;
use uuid::Uuid;

use dbscript_capability::{CapabilityBinding, Manifest};
use dbscript_registry::{ContextFactory, SystemContextFactory};

use crate::bridge::RpcBridge;
use crate::config::SandboxConfig;
use crate::error::SandboxError;
use crate::protocol::{ExecutionResult, RpcRequest, RpcResponse};
use crate::runtime;

/// Executes agent-submitted scripts against a capability binding.
///
/// Cheap to clone-by-`Arc` and safe to share: each call to
/// [`execute`](Self::execute) is an independent session with its own engine
/// context, channels, and worker thread.
pub struct ScriptExecutor {
    binding: Arc<CapabilityBinding>,
    manifest: Arc<Manifest>,
    contexts: Arc<dyn ContextFactory>,
    config: SandboxConfig,
    sessions: Arc<Semaphore>,
}

impl ScriptExecutor {
    /// Build an executor over a finished binding. The manifest is derived
    /// once here; sessions only ever see the derived names.
    pub fn new(binding: CapabilityBinding, config: SandboxConfig) -> Self {
        let manifest = Manifest::from_binding(config.root_namespace.clone(), &binding);
        Self {
            binding: Arc::new(binding),
            manifest: Arc::new(manifest),
            contexts: Arc::new(SystemContextFactory),
            sessions: Arc::new(Semaphore::new(config.max_concurrent)),
            config,
        }
    }

    /// Replace the per-invocation context factory.
    #[must_use]
    pub fn with_context_factory(mut self, contexts: Arc<dyn ContextFactory>) -> Self {
        self.contexts = contexts;
        self
    }

    /// The reachable surface sessions are built from.
    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    /// Run a script with the configured default timeout.
    pub async fn execute(&self, code: &str) -> ExecutionResult {
        self.execute_with_timeout(code, self.config.default_timeout())
            .await
    }

    /// Run a script with an explicit wall-clock timeout.
    ///
    /// Never errors at the call site: admission failures, timeouts, and
    /// worker faults all normalize into the failure result shape.
    pub async fn execute_with_timeout(&self, code: &str, timeout: Duration) -> ExecutionResult {
        match self.try_execute(code, timeout).await {
            Ok(result) => result,
            Err(e) => ExecutionResult::fail(e.to_string()),
        }
    }

    async fn try_execute(
        &self,
        code: &str,
        timeout: Duration,
    ) -> Result<ExecutionResult, SandboxError> {
        if code.len() > self.config.max_code_size {
            return Err(SandboxError::CodeTooLarge {
                size: code.len(),
                limit: self.config.max_code_size,
            });
        }
        let _permit = Arc::clone(&self.sessions)
            .try_acquire_owned()
            .map_err(|_| SandboxError::ConcurrencyLimit {
                max: self.config.max_concurrent,
            })?;

        let session = Uuid::now_v7();
        let span = tracing::info_span!(
            "script_session",
            %session,
            code_bytes = code.len(),
            timeout_ms = timeout.as_millis() as u64,
        );
        self.run_admitted(code, timeout, session)
            .instrument(span)
            .await
    }

    /// Drive one admitted session to its verdict.
    async fn run_admitted(
        &self,
        code: &str,
        timeout: Duration,
        session: Uuid,
    ) -> Result<ExecutionResult, SandboxError> {
        let deadline = Instant::now() + timeout;
        let limit_ms = timeout.as_millis() as u64;

        let (req_tx, mut req_rx) = mpsc::unbounded_channel();
        let (res_tx, res_rx) = std::sync::mpsc::channel();
        let (done_tx, mut done_rx) = oneshot::channel();

        let bridge = RpcBridge::new(req_tx, res_rx, deadline);
        let manifest = Arc::clone(&self.manifest);
        let config = self.config.clone();
        let script = code.to_string();

        // Dedicated thread: the engine context is !Send. On timeout the
        // thread cannot be killed, but dropping our channel ends unblocks
        // its next bridge wait and it exits on its own.
        std::thread::Builder::new()
            .name(format!("dbscript-{session}"))
            .spawn(move || {
                let result = runtime::run_session(&script, &manifest, bridge, &config);
                let _ = done_tx.send(result);
            })
            .map_err(|e| SandboxError::Worker(e.to_string()))?;

        let sleep = tokio::time::sleep(timeout);
        tokio::pin!(sleep);

        loop {
            tokio::select! {
                () = &mut sleep => {
                    tracing::warn!(limit_ms, "session exceeded its deadline");
                    return Ok(ExecutionResult::fail(
                        SandboxError::Timeout { limit_ms }.to_string(),
                    ));
                }
                result = &mut done_rx => {
                    return Ok(finished(result));
                }
                request = req_rx.recv() => {
                    match request {
                        Some(request) => self.serve(request, res_tx.clone()),
                        // Worker dropped its sender; only a result or the
                        // deadline can end the session now.
                        None => loop {
                            tokio::select! {
                                () = &mut sleep => {
                                    tracing::warn!(limit_ms, "session exceeded its deadline");
                                    return Ok(ExecutionResult::fail(
                                        SandboxError::Timeout { limit_ms }.to_string(),
                                    ));
                                }
                                result = &mut done_rx => {
                                    return Ok(finished(result));
                                }
                            }
                        },
                    }
                }
            }
        }
    }

    /// Dispatch one capability request on the async runtime. The worker is
    /// blocked on the response, so spawning keeps the select loop free to
    /// notice the deadline.
    fn serve(&self, request: RpcRequest, responses: std::sync::mpsc::Sender<RpcResponse>) {
        let binding = Arc::clone(&self.binding);
        let ctx = self.contexts.fresh();
        tokio::spawn(
            async move {
                tracing::debug!(
                    id = request.id,
                    group = %request.group,
                    method = %request.method,
                    "capability call"
                );
                let response = match binding
                    .invoke(&request.group, &request.method, &request.args, ctx)
                    .await
                {
                    Ok(value) => RpcResponse::ok(request.id, value),
                    Err(e) => RpcResponse::fail(request.id, e.to_string()),
                };
                let _ = responses.send(response);
            }
            .in_current_span(),
        );
    }
}

fn finished(result: Result<ExecutionResult, oneshot::error::RecvError>) -> ExecutionResult {
    result.unwrap_or_else(|_| {
        ExecutionResult::fail(
            SandboxError::Worker("worker exited without posting a result".into()).to_string(),
        )
    })
}
