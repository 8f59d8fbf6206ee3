use crate::support::{load_registry_or_exit, print_json_or_exit};
use callgate_kernel::registry::{FUNCTION_REGISTRY_KIND, snapshot_digest};
use callgate_kernel::validate_registry;
use serde_json::json;

const REGISTRY_CHECK_KIND: &str = "callgate.registry_check.v1";

pub fn run(registry: String, json_output: bool) {
    let snapshot = load_registry_or_exit(&registry).snapshot();
    let report = validate_registry(&snapshot);
    let digest = snapshot_digest(&snapshot);

    if json_output {
        print_json_or_exit(
            &json!({
                "schema": 1,
                "checkKind": REGISTRY_CHECK_KIND,
                "registryKind": FUNCTION_REGISTRY_KIND,
                "registryPath": registry,
                "functions": snapshot.len(),
                "digest": digest,
                "result": report.result,
                "failureClasses": report.failure_classes,
                "issues": report.issues,
            }),
            "registry-check",
        );
    } else {
        println!("callgate registry-check");
        println!("  Registry path: {registry}");
        println!("  Functions: {}", snapshot.len());
        println!("  Digest: {digest}");
        println!("  Result: {}", report.result);
        println!("  Failure classes: {}", report.failure_classes.len());
        for issue in &report.issues {
            println!("    [{}] {}: {}", issue.failure_class, issue.path, issue.message);
        }
    }

    if !report.accepted() {
        std::process::exit(1);
    }
}
