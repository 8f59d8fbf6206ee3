use crate::support::{
    load_config_or_exit, load_context_or_exit, load_raw_or_exit, load_registry_or_exit,
    print_json_or_exit, reject,
};
use callgate_kernel::builtin::stock_functions;
use callgate_kernel::{
    ArgResolution, BoundCall, CallExpression, CallSite, CallerContext, FunctionEngine,
    RequestMethod,
};
use serde_json::json;
use std::sync::Arc;
use tracing::debug;

pub struct Args {
    pub expr: String,
    pub registry: String,
    pub context: String,
    pub config: Option<String>,
    pub raw: Option<String>,
    pub method: RequestMethod,
    pub tag: Option<String>,
    pub version: i64,
    pub eager: bool,
    pub strict: bool,
    pub json: bool,
}

pub fn run(args: Args) {
    let mut config = load_config_or_exit(args.config.as_deref());
    if args.eager {
        config.resolution = ArgResolution::Eager;
    }
    if args.strict {
        config.strict_return_types = true;
    }

    let registry = Arc::new(load_registry_or_exit(&args.registry));
    debug!(
        path = %args.registry,
        functions = registry.len(),
        digest = %registry.digest(),
        "loaded function registry"
    );
    let context = load_context_or_exit(&args.context);
    let raw = load_raw_or_exit(args.raw.as_deref());
    let caller = CallerContext::new(args.method, args.tag, args.version);

    let engine = FunctionEngine::new(Arc::clone(&registry), stock_functions(), config);
    let value = engine
        .invoke(&args.expr, &context, &caller, raw.as_ref())
        .unwrap_or_else(|err| reject(err.failure_class(), &err.to_string(), args.json));

    if args.json {
        let resolved_call = CallExpression::parse(&args.expr, CallSite::Remote)
            .ok()
            .map(|call| {
                BoundCall::bind(call, &context, ArgResolution::Eager, raw.as_ref())
                    .to_call_string(true, None)
            });
        print_json_or_exit(
            &json!({
                "result": "accepted",
                "expr": args.expr,
                "resolvedCall": resolved_call,
                "caller": caller,
                "registryDigest": registry.digest(),
                "value": value,
            }),
            "invoke",
        );
        return;
    }

    println!("{value}");
}
