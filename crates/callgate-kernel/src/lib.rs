//! # Callgate Kernel
//!
//! Textual function calls embedded in requests, resolved and dispatched
//! under a registry whitelist.
//!
//! A call expression such as `isEven(n)` names a function and a list of
//! argument tokens. Tokens resolve against the request's data context, the
//! function must be registered and the caller must satisfy its policy,
//! and only then does the call reach a native callable or a script.
//!
//! ## Pipeline
//!
//! ```text
//! CallExpression::parse   ← `[schema.]method(key0,key1,...)`
//!     │
//! gate::authorize         ← registry entry + caller (method, tag, version)
//!     │
//! Dispatcher::dispatch    ← native overloads (lazy | eager) or Rhai script
//!     │
//! verify_return           ← declared return type, strict mode only
//! ```
//!
//! [`FunctionEngine::invoke`] runs the whole pipeline.

pub mod builtin;
pub mod config;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod expr;
pub mod gate;
pub mod native;
pub mod registry;
pub mod resolve;
pub mod script;
pub mod value;
pub mod verify;

pub use config::{ArgResolution, DispatchConfig};
pub use dispatch::Dispatcher;
pub use engine::FunctionEngine;
pub use error::{
    CallError, ConfigError, DispatchError, GateDenial, MalformedExpression, RegistryError,
    VerifyError,
};
pub use expr::{CallExpression, CallSite};
pub use gate::{CallerContext, RequestMethod};
pub use native::{FunctionError, LazyArgs, NativeFunctions};
pub use registry::{
    ExecutionKind, FunctionRegistry, RegistryEntry, RegistrySnapshot, ValidationReport,
    validate_registry,
};
pub use resolve::{BoundCall, JsonObject, RawLiterals, ResolvedArg, resolve_arg};
pub use script::{RhaiRuntime, ScriptRuntime, SharedScriptRuntime};
pub use value::{DeclaredType, ValueKind};
pub use verify::verify_return;
