//! Dispatcher: runs an authorized call on its native or script backend.

use crate::config::ArgResolution;
use crate::error::DispatchError;
use crate::expr::CallExpression;
use crate::native::{Lookup, NativeFunctions, typed_signature};
use crate::registry::{ExecutionKind, RegistryEntry};
use crate::resolve::{BoundCall, JsonObject, RawLiterals};
use crate::script::SharedScriptRuntime;
use serde_json::Value;
use tracing::debug;

#[derive(Debug, Default)]
pub struct Dispatcher {
    natives: NativeFunctions,
    scripts: SharedScriptRuntime,
}

impl Dispatcher {
    pub fn new(natives: NativeFunctions, scripts: SharedScriptRuntime) -> Self {
        Self { natives, scripts }
    }

    /// Dispatch `call`, which must already have passed the gate for `entry`.
    ///
    /// Native calls bind arguments with `resolution`; script calls always
    /// bind eagerly because scripts only take values.
    pub fn dispatch(
        &self,
        entry: &RegistryEntry,
        call: &CallExpression,
        context: &JsonObject,
        resolution: ArgResolution,
        raw: Option<&RawLiterals>,
    ) -> Result<Value, DispatchError> {
        match &entry.execution_kind {
            ExecutionKind::Script => {
                let bound = BoundCall::bind(call.clone(), context, ArgResolution::Eager, raw);
                self.dispatch_script(entry, &bound)
            }
            _ => {
                let bound = BoundCall::bind(call.clone(), context, resolution, raw);
                self.dispatch_native(&bound)
            }
        }
    }

    pub fn dispatch_native(&self, bound: &BoundCall) -> Result<Value, DispatchError> {
        let call = &bound.call;
        let signature = match bound.resolution {
            ArgResolution::Lazy => call.signature_hint(),
            ArgResolution::Eager => typed_signature(&call.method, &bound.kinds()),
        };

        let overload = match self.natives.lookup(&call.method, &bound.args) {
            Lookup::Found(overload) => overload,
            Lookup::NoArity => {
                return Err(DispatchError::NoSuchCallable {
                    expr: call.expr.clone(),
                    signature,
                    accepted: Vec::new(),
                });
            }
            Lookup::KindMismatch(candidates) => {
                return Err(DispatchError::NoSuchCallable {
                    expr: call.expr.clone(),
                    signature,
                    accepted: candidates
                        .iter()
                        .map(|overload| typed_signature(&call.method, &overload.params))
                        .collect(),
                });
            }
        };

        debug!(function = %call.method, resolution = %bound.resolution, "dispatching native function");
        overload.invoke(&bound.values()).map_err(|err| {
            if err.message().trim().is_empty() {
                DispatchError::ArgumentTypeMismatch {
                    expr: call.expr.clone(),
                    detail: "the function rejected the supplied argument values".to_string(),
                    signature: signature.clone(),
                    accepted: vec![typed_signature(&call.method, &overload.params)],
                }
            } else {
                DispatchError::Target(err.message().to_string())
            }
        })
    }

    pub fn dispatch_script(
        &self,
        entry: &RegistryEntry,
        bound: &BoundCall,
    ) -> Result<Value, DispatchError> {
        let function = &bound.call.method;
        let source = entry
            .script_source
            .as_deref()
            .filter(|source| !source.trim().is_empty())
            .ok_or_else(|| DispatchError::ScriptFunctionMissing {
                function: function.clone(),
                signature: typed_signature(function, &bound.kinds()),
            })?;

        let result = self
            .scripts
            .load_and_call(source, function, &bound.values())
            .map_err(|message| DispatchError::ScriptExecution {
                function: function.clone(),
                message,
            })?;
        debug!(function = %function, result = %result, "script function returned");
        Ok(result)
    }
}
