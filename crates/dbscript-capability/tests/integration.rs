//! Integration tests for the dbscript-capability crate.
//!
//! These exercise the full path a direct caller takes: registry snapshot ->
//! binding build -> named/aliased invocation with positional arguments.

use std::sync::{Arc, Mutex};

use serde_json::{Value, json};

use dbscript_capability::{BindingOptions, CapabilityBinding, Manifest, NamingRules};
use dbscript_registry::{OperationDescriptor, OperationRegistry, RequestContext};

/// Registry whose handlers record every parameter object they receive.
fn recording_registry() -> (OperationRegistry, Arc<Mutex<Vec<(String, Value)>>>) {
    let calls: Arc<Mutex<Vec<(String, Value)>>> = Arc::new(Mutex::new(Vec::new()));
    let registry = OperationRegistry::new();

    for (group, name) in [
        ("core", "core_read_query"),
        ("core", "core_write_query"),
        ("schema", "schema_list_tables"),
        ("schema", "schema_describe_table"),
    ] {
        let calls = Arc::clone(&calls);
        let op_name = name.to_string();
        registry
            .register(OperationDescriptor::from_sync_fn(group, name, move |params| {
                calls.lock().unwrap().push((op_name.clone(), params.clone()));
                Ok(json!({ "ok": true }))
            }))
            .unwrap();
    }

    (registry, calls)
}

#[tokio::test]
async fn end_to_end_invocation_with_positional_args() {
    let (registry, calls) = recording_registry();
    let binding = CapabilityBinding::build(&registry, BindingOptions::defaults()).unwrap();

    binding
        .invoke(
            "schema",
            "describeTable",
            &[json!("users"), json!("mydb")],
            RequestContext::new(),
        )
        .await
        .unwrap();

    let recorded = calls.lock().unwrap();
    assert_eq!(
        recorded.as_slice(),
        [(
            "schema_describe_table".to_string(),
            json!({ "table": "users", "database": "mydb" })
        )]
    );
}

#[tokio::test]
async fn alias_and_canonical_produce_identical_handler_traffic() {
    let (registry, calls) = recording_registry();
    let binding = CapabilityBinding::build(&registry, BindingOptions::defaults()).unwrap();

    binding
        .invoke("core", "readQuery", &[json!("SELECT 1")], RequestContext::new())
        .await
        .unwrap();
    binding
        .invoke("core", "runQuery", &[json!("SELECT 1")], RequestContext::new())
        .await
        .unwrap();

    let recorded = calls.lock().unwrap();
    assert_eq!(recorded.len(), 2);
    assert_eq!(recorded[0], recorded[1]);
}

#[tokio::test]
async fn keep_prefix_groups_expose_full_names() {
    let registry = OperationRegistry::new();
    registry
        .register(OperationDescriptor::from_sync_fn(
            "replica",
            "replica_status",
            Ok,
        ))
        .unwrap();

    let options = BindingOptions {
        naming: NamingRules::new().keep_prefix_for("replica"),
        ..BindingOptions::defaults()
    };
    let binding = CapabilityBinding::build(&registry, options).unwrap();

    let group = binding.group("replica").unwrap();
    assert_eq!(group.canonical_names(), ["replicaStatus"]);
    assert!(
        binding
            .invoke("replica", "replicaStatus", &[], RequestContext::new())
            .await
            .is_ok()
    );
}

#[test]
fn manifest_matches_binding_surface() {
    let (registry, _calls) = recording_registry();
    let binding = CapabilityBinding::build(&registry, BindingOptions::defaults()).unwrap();
    let manifest = Manifest::from_binding("mysql", &binding);

    assert_eq!(manifest.group_names(), ["core", "schema"]);
    for (manifest_group, bound_group) in manifest.groups.iter().zip(binding.groups()) {
        assert_eq!(manifest_group.name, bound_group.name());
        assert_eq!(manifest_group.methods, bound_group.canonical_names());
        for alias in &manifest_group.aliases {
            // Every manifest alias resolves to a method the binding serves.
            assert!(manifest_group.methods.contains(&alias.canonical));
        }
    }
}
