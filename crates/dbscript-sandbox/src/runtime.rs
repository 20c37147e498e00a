//! Sandboxed script runtime.
//!
//! Runs on the session's dedicated worker thread. A fresh [`boa_engine`]
//! context is built per session, populated with exactly three things: the
//! capability root object (rebuilt purely from the manifest's names), a
//! no-op `console`, and an explicit denylist binding ambient host facilities
//! to `undefined`. Every capability method is a shim that forwards over the
//! [`RpcBridge`]; there is no other path from script code to a handler.
//!
//! The script body is evaluated as the body of an async IIFE, so top-level
//! `await` and top-level `return` are legal. Capability shims complete their
//! round trip synchronously, which means the IIFE promise is settled once
//! the job queue drains; its state becomes the session's single
//! [`ExecutionResult`].

use std::rc::Rc;

use boa_engine::builtins::promise::PromiseState;
use boa_engine::object::builtins::{JsArray, JsPromise};
use boa_engine::object::ObjectInitializer;
use boa_engine::property::Attribute;
use boa_engine::{
    Context, JsNativeError, JsObject, JsResult, JsString, JsValue, NativeFunction, Source,
    js_string,
};
use serde_json::Value;

use dbscript_capability::{Manifest, ManifestGroup};

use crate::bridge::{BridgeFault, RpcBridge};
use crate::config::SandboxConfig;
use crate::protocol::ExecutionResult;

/// Ambient names that must not exist inside the sandbox. Most are absent
/// from a bare engine context anyway; binding them to `undefined` makes the
/// denylist explicit and keeps it that way if the engine ever grows a
/// built-in.
const DENIED_GLOBALS: [&str; 12] = [
    "setTimeout",
    "setInterval",
    "clearTimeout",
    "clearInterval",
    "queueMicrotask",
    "fetch",
    "XMLHttpRequest",
    "require",
    "module",
    "exports",
    "process",
    "Deno",
];

/// Run one script to completion inside a fresh engine context.
///
/// Always returns a structured result; every failure mode (setup, syntax,
/// uncaught exception, unserializable result, dangling capability call)
/// normalizes into the failure shape.
pub(crate) fn run_session(
    code: &str,
    manifest: &Manifest,
    bridge: RpcBridge,
    config: &SandboxConfig,
) -> ExecutionResult {
    let mut context = Context::default();
    context
        .runtime_limits_mut()
        .set_loop_iteration_limit(config.loop_iteration_limit);
    context
        .runtime_limits_mut()
        .set_recursion_limit(config.recursion_limit);

    if let Err(e) = install_environment(&mut context, manifest, Rc::new(bridge)) {
        return ExecutionResult::fail(format!("sandbox setup failed: {e}"));
    }

    // Evaluate the script as the body of an async IIFE. A synchronous throw
    // or an engine-limit trip surfaces as a rejected promise or an eval
    // error respectively; both normalize below.
    let wrapped = format!("(async () => {{\n{code}\n}})()");
    let evaluated = match context.eval(Source::from_bytes(wrapped.as_bytes())) {
        Ok(value) => value,
        Err(e) => return ExecutionResult::fail(e.to_string()),
    };
    context.run_jobs();

    settle(&evaluated, &mut context)
}

/// Install the capability root, the no-op console, and the denylist.
fn install_environment(
    context: &mut Context,
    manifest: &Manifest,
    bridge: Rc<RpcBridge>,
) -> JsResult<()> {
    install_console(context)?;
    for name in DENIED_GLOBALS {
        context.register_global_property(
            JsString::from(name),
            JsValue::undefined(),
            Attribute::empty(),
        )?;
    }

    let root = build_root(context, manifest, bridge)?;
    context.register_global_property(
        JsString::from(manifest.root.as_str()),
        root,
        Attribute::ENUMERABLE,
    )?;
    Ok(())
}

/// Scripts may log; nobody listens.
fn install_console(context: &mut Context) -> JsResult<()> {
    let mut console = ObjectInitializer::new(context);
    for name in ["log", "info", "warn", "error", "debug", "trace"] {
        console.function(NativeFunction::from_fn_ptr(noop), JsString::from(name), 0);
    }
    let console = console.build();
    context.register_global_property(js_string!("console"), console, Attribute::ENUMERABLE)
}

fn noop(_this: &JsValue, _args: &[JsValue], _context: &mut Context) -> JsResult<JsValue> {
    Ok(JsValue::undefined())
}

/// Build the capability root object: one namespace object per manifest
/// group plus a `help()` listing group names.
fn build_root(
    context: &mut Context,
    manifest: &Manifest,
    bridge: Rc<RpcBridge>,
) -> JsResult<JsObject> {
    let groups: Vec<(String, JsObject)> = manifest
        .groups
        .iter()
        .map(|group| {
            build_group(context, group, Rc::clone(&bridge)).map(|o| (group.name.clone(), o))
        })
        .collect::<JsResult<_>>()?;

    let mut root = ObjectInitializer::new(context);
    for (name, object) in &groups {
        root.property(
            JsString::from(name.as_str()),
            object.clone(),
            Attribute::ENUMERABLE,
        );
    }
    root.function(help_function(manifest.group_names()), js_string!("help"), 0);
    Ok(root.build())
}

/// Build one group's namespace object: canonical methods, aliases bound to
/// their canonical name (so alias calls emit identical RPC traffic), and
/// the group `help()`.
fn build_group(
    context: &mut Context,
    group: &ManifestGroup,
    bridge: Rc<RpcBridge>,
) -> JsResult<JsObject> {
    let mut object = ObjectInitializer::new(context);
    for method in &group.methods {
        object.function(
            capability_shim(Rc::clone(&bridge), group.name.clone(), method.clone()),
            JsString::from(method.as_str()),
            0,
        );
    }
    for alias in &group.aliases {
        object.function(
            capability_shim(
                Rc::clone(&bridge),
                group.name.clone(),
                alias.canonical.clone(),
            ),
            JsString::from(alias.alias.as_str()),
            0,
        );
    }
    object.function(help_function(group.help_entries()), js_string!("help"), 0);
    Ok(object.build())
}

/// A side-effect-free introspection function returning a fresh array of
/// names on every call. Never touches the bridge.
fn help_function(entries: Vec<String>) -> NativeFunction {
    // SAFETY: the closure captures only plain Rust data, no Gc-managed
    // values.
    unsafe {
        NativeFunction::from_closure(move |_this, _args, context| {
            let values = entries
                .iter()
                .map(|entry| JsValue::from(JsString::from(entry.as_str())));
            Ok(JsArray::from_iter(values, context).into())
        })
    }
}

/// The shim behind every callable method: serialize the arguments, perform
/// one bridge round trip, and either return the deserialized result or
/// throw. A throw rejects only this call; the script can catch it.
fn capability_shim(bridge: Rc<RpcBridge>, group: String, method: String) -> NativeFunction {
    // SAFETY: the closure captures only plain Rust data, no Gc-managed
    // values.
    unsafe {
        NativeFunction::from_closure(move |_this, args, context| {
            let mut payload = Vec::with_capacity(args.len());
            for arg in args {
                if arg.is_undefined() {
                    payload.push(Value::Null);
                } else {
                    payload.push(arg.to_json(context)?);
                }
            }

            match bridge.call(&group, &method, payload) {
                Ok(value) => JsValue::from_json(&value, context),
                Err(BridgeFault::Operation(message)) => {
                    Err(JsNativeError::error().with_message(message).into())
                }
                Err(fault @ BridgeFault::Transport(_)) => {
                    tracing::warn!(
                        group = %group,
                        method = %method,
                        error = %fault,
                        "capability call lost its transport"
                    );
                    Err(JsNativeError::error().with_message(fault.to_string()).into())
                }
            }
        })
    }
}

/// Convert the settled IIFE promise into the session result.
fn settle(value: &JsValue, context: &mut Context) -> ExecutionResult {
    let promise = value
        .as_object()
        .cloned()
        .and_then(|object| JsPromise::from_object(object).ok());
    let Some(promise) = promise else {
        return ExecutionResult::fail("script evaluation did not produce a promise");
    };

    match promise.state() {
        PromiseState::Fulfilled(value) => {
            if value.is_undefined() {
                ExecutionResult::ok(None)
            } else {
                match value.to_json(context) {
                    Ok(json) => ExecutionResult::ok(Some(json)),
                    Err(e) => {
                        ExecutionResult::fail(format!("script result is not serializable: {e}"))
                    }
                }
            }
        }
        PromiseState::Rejected(reason) => rejection(&reason, context),
        // All shims complete synchronously, so a drained job queue with a
        // still-pending promise means a capability call never came back.
        PromiseState::Pending => {
            ExecutionResult::fail("script never settled: a capability call did not complete")
        }
    }
}

/// Extract `{error, stack}` from a rejection value.
fn rejection(reason: &JsValue, context: &mut Context) -> ExecutionResult {
    let mut message = None;
    let mut stack = None;

    if let Some(object) = reason.as_object() {
        if let Ok(value) = object.get(js_string!("message"), context) {
            if !value.is_undefined() && !value.is_null() {
                if let Ok(text) = value.to_string(context) {
                    message = Some(text.to_std_string_escaped());
                }
            }
        }
        if let Ok(value) = object.get(js_string!("stack"), context) {
            if value.is_string() {
                if let Ok(text) = value.to_string(context) {
                    stack = Some(text.to_std_string_escaped());
                }
            }
        }
    }

    let message = message.unwrap_or_else(|| {
        reason
            .to_string(context)
            .map(|text| text.to_std_string_escaped())
            .unwrap_or_else(|_| "unknown script error".to_string())
    });

    ExecutionResult::fail_with_stack(message, stack)
}
