//! Native callable table.
//!
//! Native functions are registered under a name together with a parameter
//! kind list, so one name can carry several overloads. Two calling
//! conventions share the table:
//!
//! - lazy: `(request, key0, key1, ...)`, i.e. `[Map, String, String, ...]`;
//!   the callable resolves its keys itself (see [`LazyArgs`]).
//! - eager: one typed value per key, matched against the overload's kinds.

use crate::resolve::{JsonObject, ResolvedArg, resolve_arg};
use crate::value::ValueKind;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Failure raised by a native callable itself.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct FunctionError {
    message: String,
}

impl FunctionError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

pub type NativeFn = Arc<dyn Fn(&[Value]) -> Result<Value, FunctionError> + Send + Sync>;

#[derive(Clone)]
pub struct NativeOverload {
    pub params: Vec<ValueKind>,
    callable: NativeFn,
}

impl NativeOverload {
    pub fn accepts(&self, kinds: &[ValueKind]) -> bool {
        self.params.len() == kinds.len()
            && self
                .params
                .iter()
                .zip(kinds)
                .all(|(param, actual)| param.accepts(*actual))
    }

    pub fn invoke(&self, args: &[Value]) -> Result<Value, FunctionError> {
        (self.callable)(args)
    }
}

impl fmt::Debug for NativeOverload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeOverload")
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

/// Outcome of looking up an overload for a bound argument list.
#[derive(Debug)]
pub enum Lookup<'a> {
    Found(&'a NativeOverload),
    /// No overload of the name takes this many arguments.
    NoArity,
    /// Overloads of this arity exist but none accepts the argument kinds.
    KindMismatch(Vec<&'a NativeOverload>),
}

#[derive(Clone, Default, Debug)]
pub struct NativeFunctions {
    overloads: BTreeMap<String, Vec<NativeOverload>>,
}

impl NativeFunctions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an overload with explicit parameter kinds.
    pub fn register<F>(&mut self, name: &str, params: Vec<ValueKind>, callable: F) -> &mut Self
    where
        F: Fn(&[Value]) -> Result<Value, FunctionError> + Send + Sync + 'static,
    {
        self.overloads
            .entry(name.to_string())
            .or_default()
            .push(NativeOverload {
                params,
                callable: Arc::new(callable),
            });
        self
    }

    /// Register a lazy-convention overload taking `key_count` keys.
    pub fn register_lazy<F>(&mut self, name: &str, key_count: usize, callable: F) -> &mut Self
    where
        F: Fn(&LazyArgs<'_>) -> Result<Value, FunctionError> + Send + Sync + 'static,
    {
        let mut params = vec![ValueKind::Map];
        params.extend(std::iter::repeat_n(ValueKind::String, key_count));
        self.register(name, params, move |args| {
            let args = LazyArgs::from_args(args)?;
            callable(&args)
        })
    }

    pub fn lookup(&self, name: &str, args: &[ResolvedArg]) -> Lookup<'_> {
        let kinds: Vec<ValueKind> = args.iter().map(|arg| arg.kind).collect();
        let same_arity: Vec<&NativeOverload> = self
            .overloads
            .get(name)
            .into_iter()
            .flatten()
            .filter(|overload| overload.params.len() == kinds.len())
            .collect();
        if same_arity.is_empty() {
            return Lookup::NoArity;
        }
        match same_arity.iter().find(|overload| overload.accepts(&kinds)) {
            Some(overload) => Lookup::Found(overload),
            None => Lookup::KindMismatch(same_arity),
        }
    }
}

/// Render `name(Kind, Kind, ...)`.
pub fn typed_signature(name: &str, kinds: &[ValueKind]) -> String {
    let params: Vec<&str> = kinds.iter().map(|kind| kind.type_name()).collect();
    format!("{name}({})", params.join(", "))
}

/// View over lazy-convention arguments `(request, key0, key1, ...)`.
#[derive(Debug, Clone, Copy)]
pub struct LazyArgs<'a> {
    request: &'a JsonObject,
    keys: &'a [Value],
}

impl<'a> LazyArgs<'a> {
    pub fn from_args(args: &'a [Value]) -> Result<Self, FunctionError> {
        match args.split_first() {
            Some((Value::Object(request), keys)) => Ok(Self { request, keys }),
            _ => Err(FunctionError::new(
                "lazy native call must receive the request object as its first argument",
            )),
        }
    }

    pub fn key(&self, index: usize) -> Result<&'a str, FunctionError> {
        self.keys
            .get(index)
            .and_then(Value::as_str)
            .ok_or_else(|| FunctionError::new(format!("missing key argument #{index}")))
    }

    /// Resolve key `index` against the request, literals included.
    pub fn value(&self, index: usize) -> Result<Value, FunctionError> {
        Ok(resolve_arg(self.key(index)?, self.request, None))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn resolved(values: &[Value]) -> Vec<ResolvedArg> {
        values.iter().cloned().map(ResolvedArg::new).collect()
    }

    fn table() -> NativeFunctions {
        let mut natives = NativeFunctions::new();
        natives
            .register("describe", vec![ValueKind::Number], |_| Ok(json!("number")))
            .register("describe", vec![ValueKind::String], |_| Ok(json!("string")))
            .register("describe", vec![ValueKind::Opaque, ValueKind::Opaque], |_| {
                Ok(json!("pair"))
            });
        natives
    }

    #[test]
    fn selects_overload_by_argument_kinds() {
        let natives = table();
        let Lookup::Found(overload) = natives.lookup("describe", &resolved(&[json!("x")])) else {
            panic!("string overload should match");
        };
        assert_eq!(overload.invoke(&[json!("x")]), Ok(json!("string")));

        let Lookup::Found(overload) =
            natives.lookup("describe", &resolved(&[json!({}), Value::Null]))
        else {
            panic!("opaque pair should accept anything");
        };
        assert_eq!(overload.params.len(), 2);
    }

    #[test]
    fn distinguishes_missing_arity_from_kind_mismatch() {
        let natives = table();
        assert!(matches!(
            natives.lookup("describe", &resolved(&[json!(1), json!(2), json!(3)])),
            Lookup::NoArity
        ));
        assert!(matches!(
            natives.lookup("unknown", &resolved(&[])),
            Lookup::NoArity
        ));
        let Lookup::KindMismatch(candidates) =
            natives.lookup("describe", &resolved(&[json!(true)]))
        else {
            panic!("boolean should not match any single-argument overload");
        };
        assert_eq!(candidates.len(), 2);
    }

    #[test]
    fn lazy_overload_resolves_its_own_keys() {
        let mut natives = NativeFunctions::new();
        natives.register_lazy("echo", 2, |args| {
            Ok(json!([args.value(0)?, args.value(1)?, args.key(1)?]))
        });
        let request = json!({"a": 1});
        let args = [request, json!("a"), json!("'lit'")];
        let Lookup::Found(overload) = natives.lookup("echo", &resolved(&args)) else {
            panic!("lazy signature should match");
        };
        assert_eq!(
            overload.params,
            vec![ValueKind::Map, ValueKind::String, ValueKind::String]
        );
        assert_eq!(overload.invoke(&args), Ok(json!([1, "lit", "'lit'"])));
    }

    #[test]
    fn typed_signature_renders_kind_names() {
        assert_eq!(
            typed_signature("plus", &[ValueKind::Number, ValueKind::Map]),
            "plus(Number, JSONObject)"
        );
        assert_eq!(typed_signature("now", &[]), "now()");
    }
}
