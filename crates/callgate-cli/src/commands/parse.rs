use crate::support::{print_json_or_exit, reject};
use callgate_kernel::error::failure_class;
use callgate_kernel::{CallExpression, CallSite};
use serde_json::json;

pub fn run(expr: String, sql: bool, json_output: bool) {
    let site = if sql { CallSite::Sql } else { CallSite::Remote };
    let call = CallExpression::parse(&expr, site).unwrap_or_else(|err| {
        reject(
            failure_class::MALFORMED_EXPRESSION,
            &err.to_string(),
            json_output,
        )
    });

    if json_output {
        print_json_or_exit(
            &json!({
                "result": "accepted",
                "call": call,
                "signatureHint": call.signature_hint(),
            }),
            "parse",
        );
        return;
    }

    println!("callgate parse");
    println!("  Expression: {}", call.expr);
    if let Some(schema) = &call.schema {
        println!("  Schema: {schema}");
    }
    println!("  Method: {}", call.method);
    println!("  Keys: {}", call.raw_keys.len());
    for (index, key) in call.raw_keys.iter().enumerate() {
        println!("    #{index} {key}");
    }
    println!("  Signature: {}", call.signature_hint());
}
