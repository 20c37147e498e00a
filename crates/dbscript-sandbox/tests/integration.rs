//! Integration tests for the dbscript-sandbox crate.
//!
//! These exercise the full submission path: registry -> capability binding
//! -> executor -> engine worker -> capability calls back through the
//! binding, asserting on the structured result and on the handler traffic
//! each script produces.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use serde_json::{Value, json};

use dbscript_capability::{BindingOptions, CapabilityBinding};
use dbscript_registry::{OperationDescriptor, OperationRegistry, RegistryError};
use dbscript_sandbox::{SandboxConfig, ScriptExecutor};

type CallLog = Arc<Mutex<Vec<(String, Value)>>>;

/// Initialize a test subscriber once; honors `RUST_LOG` when set.
fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .compact()
        .try_init();
}

/// Executor over a small registry whose handlers record their traffic.
/// `admin_optimize_table` always fails the way a busy database would.
fn fixture(config: SandboxConfig) -> (ScriptExecutor, CallLog) {
    init_tracing();
    let calls: CallLog = Arc::new(Mutex::new(Vec::new()));
    let registry = OperationRegistry::new();

    let handlers: [(&str, &str, fn() -> dbscript_registry::Result<Value>); 4] = [
        ("core", "core_read_query", || Ok(json!({ "rows": [{"1": 1}] }))),
        ("core", "core_write_query", || Ok(json!({ "affected": 1 }))),
        ("schema", "schema_list_tables", || {
            Ok(json!(["orders", "users"]))
        }),
        ("admin", "admin_optimize_table", || {
            Err(RegistryError::Invocation("lock wait timeout".into()))
        }),
    ];
    for (group, name, handler) in handlers {
        let calls = Arc::clone(&calls);
        let op_name = name.to_string();
        registry
            .register(OperationDescriptor::from_sync_fn(group, name, move |params| {
                calls.lock().unwrap().push((op_name.clone(), params.clone()));
                handler()
            }))
            .unwrap();
    }

    let binding = CapabilityBinding::build(&registry, BindingOptions::defaults()).unwrap();
    (ScriptExecutor::new(binding, config), calls)
}

fn config() -> SandboxConfig {
    SandboxConfig::new().with_root_namespace("mysql")
}

#[tokio::test]
async fn single_query_script_returns_rows() {
    let (executor, calls) = fixture(config());

    let result = executor
        .execute(r#"return await mysql.core.readQuery("SELECT 1");"#)
        .await;

    assert!(result.success, "unexpected failure: {result:?}");
    assert_eq!(result.result, Some(json!({ "rows": [{"1": 1}] })));
    assert_eq!(result.error, None);

    let recorded = calls.lock().unwrap();
    assert_eq!(
        recorded.as_slice(),
        [("core_read_query".to_string(), json!({ "query": "SELECT 1" }))]
    );
}

#[tokio::test]
async fn multi_statement_script_runs_in_order() {
    let (executor, calls) = fixture(config());

    let result = executor
        .execute(
            r#"
            const tables = await mysql.schema.listTables();
            const rows = await mysql.core.readQuery("SELECT 1");
            return { tables, rows };
            "#,
        )
        .await;

    assert!(result.success, "unexpected failure: {result:?}");
    assert_eq!(
        result.result,
        Some(json!({
            "tables": ["orders", "users"],
            "rows": { "rows": [{"1": 1}] },
        }))
    );

    let recorded = calls.lock().unwrap();
    let order: Vec<&str> = recorded.iter().map(|(name, _)| name.as_str()).collect();
    assert_eq!(order, ["schema_list_tables", "core_read_query"]);
}

#[tokio::test]
async fn unawaited_failing_call_still_fails_the_script() {
    let (executor, calls) = fixture(config());

    // No `await`: the call must still fail the session rather than let the
    // script return a bogus success.
    let result = executor
        .execute(
            r#"
            mysql.admin.optimizeTable({ table: "users" });
            return "optimized";
            "#,
        )
        .await;

    assert!(!result.success);
    assert_eq!(result.error.as_deref(), Some("lock wait timeout"));
    assert_eq!(calls.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn caught_operation_error_lets_the_script_continue() {
    let (executor, calls) = fixture(config());

    let result = executor
        .execute(
            r#"
            try {
                await mysql.admin.optimizeTable({ table: "users" });
                return "unreachable";
            } catch (e) {
                const rows = await mysql.core.readQuery("SELECT 1");
                return { message: e.message, rows };
            }
            "#,
        )
        .await;

    assert!(result.success, "unexpected failure: {result:?}");
    assert_eq!(
        result.result,
        Some(json!({
            "message": "lock wait timeout",
            "rows": { "rows": [{"1": 1}] },
        }))
    );
    assert_eq!(calls.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn runaway_capability_loop_is_timed_out() {
    let (executor, _calls) = fixture(config());

    let started = Instant::now();
    let result = executor
        .execute_with_timeout(
            r#"for (;;) { await mysql.core.readQuery("SELECT 1"); }"#,
            Duration::from_millis(100),
        )
        .await;

    assert!(!result.success);
    let error = result.error.unwrap();
    assert!(error.contains("timeout"), "unexpected error: {error}");
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn runaway_cpu_loop_fails_within_bounds() {
    let (executor, _calls) = fixture(config());

    let started = Instant::now();
    let result = executor
        .execute_with_timeout("while (true) {}", Duration::from_millis(100))
        .await;

    // Either the deadline or the engine's iteration limit trips first;
    // both must surface as a prompt failure.
    assert!(!result.success);
    assert!(started.elapsed() < Duration::from_secs(30));
}

#[tokio::test]
async fn help_describes_the_surface_without_handler_traffic() {
    let (executor, calls) = fixture(config());

    let result = executor
        .execute(
            r#"
            return {
                root: mysql.help(),
                core: mysql.core.help(),
                stable: JSON.stringify(mysql.help()) === JSON.stringify(mysql.help()),
            };
            "#,
        )
        .await;

    assert!(result.success, "unexpected failure: {result:?}");
    let value = result.result.unwrap();
    assert_eq!(value["root"], json!(["admin", "core", "schema"]));
    assert_eq!(value["stable"], json!(true));

    let core = value["core"].as_array().unwrap();
    assert!(core.contains(&json!("readQuery")));
    assert!(core.contains(&json!("runQuery")));
    assert!(!core.contains(&json!("coreReadQuery")));

    assert!(calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn alias_and_canonical_scripts_produce_identical_traffic() {
    let (executor, canonical_calls) = fixture(config());
    let canonical = executor
        .execute(r#"return await mysql.core.readQuery("SELECT 1");"#)
        .await;

    let (executor, alias_calls) = fixture(config());
    let aliased = executor
        .execute(r#"return await mysql.core.runQuery("SELECT 1");"#)
        .await;

    assert_eq!(canonical, aliased);
    assert_eq!(
        canonical_calls.lock().unwrap().as_slice(),
        alias_calls.lock().unwrap().as_slice(),
    );
}

#[tokio::test]
async fn oversized_scripts_are_rejected_before_admission() {
    let (executor, calls) = fixture(config().with_max_code_size(32));

    let result = executor
        .execute(r#"return await mysql.core.readQuery("SELECT 1");"#)
        .await;

    assert!(!result.success);
    assert!(result.error.unwrap().contains("script too large"));
    assert!(calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn sessions_over_the_concurrency_limit_fail_fast() {
    let (executor, _calls) = fixture(config().with_max_concurrent(0));

    let result = executor.execute("return 1;").await;

    assert!(!result.success);
    assert!(result.error.unwrap().contains("concurrency limit"));
}

#[tokio::test]
async fn concurrent_sessions_are_independent() {
    let (executor, _calls) = fixture(config());
    let executor = Arc::new(executor);

    let read = {
        let executor = Arc::clone(&executor);
        tokio::spawn(async move {
            executor
                .execute(r#"return await mysql.core.readQuery("SELECT 1");"#)
                .await
        })
    };
    let fail = {
        let executor = Arc::clone(&executor);
        tokio::spawn(async move {
            executor
                .execute(r#"await mysql.admin.optimizeTable({ table: "users" });"#)
                .await
        })
    };

    let (read, fail) = (read.await.unwrap(), fail.await.unwrap());
    assert!(read.success);
    assert_eq!(read.result, Some(json!({ "rows": [{"1": 1}] })));
    assert!(!fail.success);
    assert_eq!(fail.error.as_deref(), Some("lock wait timeout"));
}

#[tokio::test]
async fn script_without_return_yields_no_result() {
    let (executor, _calls) = fixture(config());

    let result = executor
        .execute(r#"await mysql.core.writeQuery("UPDATE t SET x = 1");"#)
        .await;

    assert!(result.success, "unexpected failure: {result:?}");
    assert_eq!(result.result, None);
}

#[tokio::test]
async fn script_thrown_errors_surface_with_their_message() {
    let (executor, _calls) = fixture(config());

    let result = executor
        .execute(r#"throw new Error("business rule violated");"#)
        .await;

    assert!(!result.success);
    assert_eq!(result.error.as_deref(), Some("business rule violated"));
}
