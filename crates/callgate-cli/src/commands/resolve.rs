use crate::support::{load_context_or_exit, load_raw_or_exit, print_json_or_exit};
use callgate_kernel::{ValueKind, resolve_arg};
use serde_json::json;

pub fn run(token: String, context: String, raw: Option<String>, json_output: bool) {
    let context = load_context_or_exit(&context);
    let raw = load_raw_or_exit(raw.as_deref());
    let value = resolve_arg(&token, &context, raw.as_ref());
    let kind = ValueKind::of(&value);

    if json_output {
        print_json_or_exit(
            &json!({
                "token": token,
                "rawLookup": raw.is_some(),
                "value": value,
                "kind": kind.type_name(),
            }),
            "resolve",
        );
        return;
    }

    println!("{value}");
}
