//! Embedded script runtime.
//!
//! The dispatcher only needs two things from a script engine: load source
//! (redefining any functions it declares) and call a named function with
//! JSON values. [`RhaiRuntime`] implements that over Rhai; tests can inject
//! any other [`ScriptRuntime`].
//!
//! One runtime is shared by every caller. Load and call happen under a
//! single lock so concurrent calls cannot interleave definitions.

use rhai::{AST, Dynamic, Engine, Scope};
use serde_json::Value;
use std::sync::{Mutex, PoisonError};

pub trait ScriptRuntime: Send {
    /// Evaluate `source`, (re)defining the functions it declares.
    fn load(&mut self, source: &str) -> Result<(), String>;

    /// Call a previously loaded function.
    fn call(&mut self, function: &str, args: &[Value]) -> Result<Value, String>;
}

/// Rhai-backed runtime that accumulates function definitions.
pub struct RhaiRuntime {
    engine: Engine,
    functions: AST,
}

impl RhaiRuntime {
    pub fn new() -> Self {
        Self::with_max_operations(None)
    }

    /// Cap the operations a single call may run; `None` is unbounded.
    pub fn with_max_operations(max_operations: Option<u64>) -> Self {
        let mut engine = Engine::new();
        if let Some(max) = max_operations {
            engine.set_max_operations(max);
        }
        Self {
            engine,
            functions: AST::empty(),
        }
    }
}

impl Default for RhaiRuntime {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptRuntime for RhaiRuntime {
    fn load(&mut self, source: &str) -> Result<(), String> {
        let ast = self
            .engine
            .compile(source)
            .map_err(|err| format!("script compilation failed: {err}"))?;
        // Later definitions replace earlier ones with the same name and arity;
        // top-level statements are dropped so reloading has no side effects.
        self.functions = self.functions.merge(&ast.clone_functions_only());
        Ok(())
    }

    fn call(&mut self, function: &str, args: &[Value]) -> Result<Value, String> {
        let args = args
            .iter()
            .map(rhai::serde::to_dynamic)
            .collect::<Result<Vec<Dynamic>, _>>()
            .map_err(|err| format!("argument conversion failed: {err}"))?;
        let mut scope = Scope::new();
        let result: Dynamic = self
            .engine
            .call_fn(&mut scope, &self.functions, function, args)
            .map_err(|err| err.to_string())?;
        rhai::serde::from_dynamic::<Value>(&result)
            .map_err(|err| format!("result conversion failed: {err}"))
    }
}

/// Process-wide runtime handle; load+call is one critical section.
pub struct SharedScriptRuntime {
    inner: Mutex<Box<dyn ScriptRuntime>>,
}

impl SharedScriptRuntime {
    pub fn new(runtime: Box<dyn ScriptRuntime>) -> Self {
        Self {
            inner: Mutex::new(runtime),
        }
    }

    pub fn load_and_call(
        &self,
        source: &str,
        function: &str,
        args: &[Value],
    ) -> Result<Value, String> {
        let mut runtime = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        runtime.load(source)?;
        runtime.call(function, args)
    }
}

impl Default for SharedScriptRuntime {
    fn default() -> Self {
        Self::new(Box::new(RhaiRuntime::new()))
    }
}

impl std::fmt::Debug for SharedScriptRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedScriptRuntime").finish_non_exhaustive()
    }
}
