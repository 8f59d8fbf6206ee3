//! Integration tests: run the call vectors under tests/fixtures/.
//!
//! Each fixture directory has:
//! - case.json: expression, registry, context, caller and optional config
//! - expect.json: `{"result":"accepted","value":...}` or
//!   `{"result":"rejected","failureClass":...}`
//!
//! Every case runs through `FunctionEngine::invoke` with the stock natives.

use callgate_kernel::builtin::stock_functions;
use callgate_kernel::registry::parse_registry;
use callgate_kernel::{CallerContext, DispatchConfig, FunctionEngine, FunctionRegistry};
use serde_json::{Value, json};
use std::path::PathBuf;
use std::sync::Arc;

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn read_json(path: &std::path::Path) -> Value {
    let text = std::fs::read_to_string(path)
        .unwrap_or_else(|e| panic!("failed to read {}: {e}", path.display()));
    serde_json::from_str(&text).unwrap_or_else(|e| panic!("failed to parse {}: {e}", path.display()))
}

fn run_fixture(name: &str) {
    let dir = fixtures_dir().join(name);
    let case = read_json(&dir.join("case.json"));
    let expected = read_json(&dir.join("expect.json"));

    let snapshot = parse_registry(&case["registry"])
        .unwrap_or_else(|e| panic!("fixture {name}: bad registry: {e}"));
    let config: DispatchConfig = match case.get("config") {
        Some(config) => serde_json::from_value(config.clone())
            .unwrap_or_else(|e| panic!("fixture {name}: bad config: {e}")),
        None => DispatchConfig::default(),
    };
    let caller: CallerContext = serde_json::from_value(case["caller"].clone())
        .unwrap_or_else(|e| panic!("fixture {name}: bad caller: {e}"));
    let context = case["context"]
        .as_object()
        .cloned()
        .unwrap_or_else(|| panic!("fixture {name}: context must be an object"));
    let expr = case["expr"].as_str().expect("missing expr field");

    let engine = FunctionEngine::new(
        Arc::new(FunctionRegistry::new(snapshot)),
        stock_functions(),
        config,
    );
    let actual = match engine.invoke(expr, &context, &caller, None) {
        Ok(value) => json!({ "result": "accepted", "value": value }),
        Err(err) => json!({ "result": "rejected", "failureClass": err.failure_class() }),
    };

    assert_eq!(
        actual,
        expected,
        "\n\nFixture: {name}\n\nGot:\n{}\n\nExpected:\n{}\n",
        serde_json::to_string_pretty(&actual).unwrap(),
        serde_json::to_string_pretty(&expected).unwrap(),
    );
}

#[test]
fn golden_native_is_even() {
    run_fixture("golden_native_is_even");
}

#[test]
fn golden_script_greet() {
    run_fixture("golden_script_greet");
}

#[test]
fn golden_eager_plus() {
    run_fixture("golden_eager_plus");
}

#[test]
fn golden_method_list_admits_caller() {
    run_fixture("golden_method_list_admits_caller");
}

#[test]
fn golden_caller_defaults() {
    run_fixture("golden_caller_defaults");
}

#[test]
fn adversarial_version_too_low() {
    run_fixture("adversarial_version_too_low");
}

#[test]
fn adversarial_unknown_function() {
    run_fixture("adversarial_unknown_function");
}

#[test]
fn adversarial_tag_mismatch() {
    run_fixture("adversarial_tag_mismatch");
}

#[test]
fn adversarial_method_not_allowed() {
    run_fixture("adversarial_method_not_allowed");
}

#[test]
fn adversarial_script_disabled() {
    run_fixture("adversarial_script_disabled");
}

#[test]
fn adversarial_unsupported_kind() {
    run_fixture("adversarial_unsupported_kind");
}

#[test]
fn adversarial_schema_on_remote_call() {
    run_fixture("adversarial_schema_on_remote_call");
}

#[test]
fn adversarial_strict_return_type() {
    run_fixture("adversarial_strict_return_type");
}

#[test]
fn adversarial_wrong_arity() {
    run_fixture("adversarial_wrong_arity");
}

#[test]
fn adversarial_eager_kind_miss() {
    run_fixture("adversarial_eager_kind_miss");
}

#[test]
fn adversarial_negative_version() {
    run_fixture("adversarial_negative_version");
}
