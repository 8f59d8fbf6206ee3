//! End-to-end call pipeline: parse, authorize, dispatch, verify.

use crate::config::DispatchConfig;
use crate::dispatch::Dispatcher;
use crate::error::CallError;
use crate::expr::{CallExpression, CallSite};
use crate::gate::{CallerContext, authorize, check_remote_enabled};
use crate::native::NativeFunctions;
use crate::registry::FunctionRegistry;
use crate::resolve::{JsonObject, RawLiterals};
use crate::script::{RhaiRuntime, ScriptRuntime, SharedScriptRuntime};
use crate::verify::verify_return;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

/// A configured function-call engine.
///
/// The registry is shared so an operator can swap its snapshot while calls
/// are in flight; each call reads one snapshot from start to finish.
#[derive(Debug)]
pub struct FunctionEngine {
    registry: Arc<FunctionRegistry>,
    dispatcher: Dispatcher,
    config: DispatchConfig,
}

impl FunctionEngine {
    pub fn new(
        registry: Arc<FunctionRegistry>,
        natives: NativeFunctions,
        config: DispatchConfig,
    ) -> Self {
        let runtime = RhaiRuntime::with_max_operations(config.script_max_operations);
        Self::with_script_runtime(registry, natives, Box::new(runtime), config)
    }

    pub fn with_script_runtime(
        registry: Arc<FunctionRegistry>,
        natives: NativeFunctions,
        runtime: Box<dyn ScriptRuntime>,
        config: DispatchConfig,
    ) -> Self {
        Self {
            registry,
            dispatcher: Dispatcher::new(natives, SharedScriptRuntime::new(runtime)),
            config,
        }
    }

    pub fn registry(&self) -> &Arc<FunctionRegistry> {
        &self.registry
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Run one remote call expression against `context`.
    ///
    /// `raw` opts this call into raw-literal lookup; pass `None` otherwise.
    pub fn invoke(
        &self,
        expr: &str,
        context: &JsonObject,
        caller: &CallerContext,
        raw: Option<&RawLiterals>,
    ) -> Result<Value, CallError> {
        check_remote_enabled(expr, &self.config).inspect_err(|denial| {
            warn!(failure_class = denial.failure_class(), "{denial}");
        })?;

        let call = CallExpression::parse(expr, CallSite::Remote)?;
        debug!(function = %call.method, keys = ?call.raw_keys, "parsed call expression");

        let snapshot = self.registry.snapshot();
        let entry = authorize(&call.method, snapshot.get(&call.method), caller, &self.config)
            .inspect_err(|denial| {
                warn!(
                    function = %call.method,
                    failure_class = denial.failure_class(),
                    caller_method = %caller.method,
                    caller_version = caller.version,
                    "{denial}"
                );
            })?;

        let result =
            self.dispatcher
                .dispatch(entry, &call, context, self.config.resolution, raw)?;

        verify_return(
            &call.method,
            &result,
            entry.declared_return_type.as_deref(),
            self.config.strict_return_types,
        )?;
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ArgResolution;
    use crate::error::{DispatchError, GateDenial, failure_class};
    use crate::registry::RegistryEntry;
    use serde_json::json;

    fn context(value: Value) -> JsonObject {
        value.as_object().cloned().unwrap_or_default()
    }

    fn engine(config: DispatchConfig) -> FunctionEngine {
        let registry = FunctionRegistry::from_entries([
            ("isEven", RegistryEntry::native().returns("Boolean")),
            ("plus", RegistryEntry::native().returns("String")),
            (
                "greet",
                RegistryEntry::script(r#"fn greet(name) { "hi " + name }"#),
            ),
        ]);
        FunctionEngine::new(Arc::new(registry), crate::builtin::stock_functions(), config)
    }

    #[test]
    fn invokes_registered_native_function() {
        let result = engine(DispatchConfig::default()).invoke(
            "isEven(n)",
            &context(json!({"n": 4})),
            &CallerContext::default(),
            None,
        );
        assert_eq!(result, Ok(json!(true)));
    }

    #[test]
    fn remote_switch_is_checked_before_parsing() {
        let config = DispatchConfig {
            enable_remote: false,
            ..DispatchConfig::default()
        };
        let err = engine(config)
            .invoke("not a call", &JsonObject::new(), &CallerContext::default(), None)
            .expect_err("remote disabled");
        assert_eq!(
            err,
            CallError::Denied(GateDenial::RemoteDisabled {
                function: "not a call".to_string()
            })
        );
    }

    #[test]
    fn schema_qualified_remote_call_is_malformed() {
        let err = engine(DispatchConfig::default())
            .invoke("s.isEven(n)", &JsonObject::new(), &CallerContext::default(), None)
            .expect_err("schema not allowed");
        assert_eq!(err.failure_class(), failure_class::MALFORMED_EXPRESSION);
    }

    #[test]
    fn strict_mode_reports_declared_type_mismatch() {
        let config = DispatchConfig {
            resolution: ArgResolution::Eager,
            strict_return_types: true,
            ..DispatchConfig::default()
        };
        let engine = engine(config);
        let err = engine
            .invoke("plus(1,2)", &JsonObject::new(), &CallerContext::default(), None)
            .expect_err("number is not a string");
        assert_eq!(err.failure_class(), failure_class::RETURN_TYPE_MISMATCH);

        let lenient = FunctionEngine::new(
            Arc::clone(engine.registry()),
            crate::builtin::stock_functions(),
            DispatchConfig {
                resolution: ArgResolution::Eager,
                ..DispatchConfig::default()
            },
        );
        assert_eq!(
            lenient.invoke("plus(1,2)", &JsonObject::new(), &CallerContext::default(), None),
            Ok(json!(3))
        );
    }

    #[test]
    fn script_functions_run_through_the_pipeline() {
        let result = engine(DispatchConfig::default()).invoke(
            "greet('world')",
            &JsonObject::new(),
            &CallerContext::default(),
            None,
        );
        assert_eq!(result, Ok(json!("hi world")));
    }

    #[test]
    fn registry_swap_is_seen_by_later_calls() {
        let engine = engine(DispatchConfig::default());
        engine.registry().replace(Default::default());
        let err = engine
            .invoke(
                "isEven(n)",
                &context(json!({"n": 4})),
                &CallerContext::default(),
                None,
            )
            .expect_err("registry emptied");
        assert_eq!(
            err,
            CallError::Denied(GateDenial::UnknownFunction {
                function: "isEven".to_string()
            })
        );
    }

    #[test]
    fn dispatch_faults_surface_through_call_error() {
        let err = engine(DispatchConfig::default())
            .invoke(
                "isEven(n)",
                &context(json!({"n": "four"})),
                &CallerContext::default(),
                None,
            )
            .expect_err("not a number");
        assert!(matches!(err, CallError::Dispatch(DispatchError::Target(_))));
    }
}
