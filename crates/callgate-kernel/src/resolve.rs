//! Argument-token resolution.
//!
//! A token is classified and resolved against the current data object in a
//! fixed precedence order; the first rule that applies wins:
//!
//! 1. `` `name` `` raw reference
//! 2. `'text'` string literal
//! 3. raw-literal table hit (only when a table is supplied)
//! 4. named reference (`key` or `@key`) looked up in the context; the words
//!    `true` and `false` are reserved and never treated as names
//! 5. `true` / `false`
//! 6. numeric literal
//! 7. direct context lookup of the whole token
//!
//! Resolution is total: anything unresolved becomes `null`.

use crate::config::ArgResolution;
use crate::error::{MalformedExpression, RegistryError};
use crate::expr::{CallExpression, CallSite, is_name};
use crate::value::ValueKind;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// A JSON object acting as the data context of a call.
pub type JsonObject = Map<String, Value>;

/// Raw SQL-fragment table, keyed by the token that may reference it.
///
/// Passing a table to [`resolve_arg`] is the per-call opt-in to raw lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawLiterals(BTreeMap<String, String>);

impl RawLiterals {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, fragment: impl Into<String>) {
        self.0.insert(key.into(), fragment.into());
    }

    /// Value for `key`. A registered empty fragment echoes the key itself.
    pub fn lookup(&self, key: &str) -> Option<String> {
        self.0.get(key).map(|fragment| {
            if fragment.is_empty() {
                key.to_string()
            } else {
                fragment.clone()
            }
        })
    }

    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, RegistryError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| RegistryError::ReadFile {
            path: path.display().to_string(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| RegistryError::ParseJson {
            path: path.display().to_string(),
            source,
        })
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RawLiterals {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }
}

/// Resolve one argument token.
///
/// `raw` is `Some` only at call sites that explicitly permit raw lookup.
pub fn resolve_arg(token: &str, context: &JsonObject, raw: Option<&RawLiterals>) -> Value {
    if let Some(name) = strip_enclosing(token, '`') {
        if let Some(fragment) = raw.and_then(|table| table.lookup(name)) {
            return Value::String(fragment);
        }
        return lookup(context, name);
    }

    if let Some(text) = strip_enclosing(token, '\'') {
        return Value::String(text.to_string());
    }

    if let Some(fragment) = raw.and_then(|table| table.lookup(token)) {
        return Value::String(fragment);
    }

    let is_boolean_word = matches!(token, "true" | "false");
    if !is_boolean_word && is_name(token.strip_prefix('@').unwrap_or(token)) {
        return lookup(context, token);
    }

    match token {
        "true" => return Value::Bool(true),
        "false" => return Value::Bool(false),
        _ => {}
    }

    if let Some(number) = parse_number(token) {
        return Value::Number(number);
    }

    lookup(context, token)
}

/// One eagerly resolved argument with its signature slot kind.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedArg {
    pub value: Value,
    pub kind: ValueKind,
}

impl ResolvedArg {
    pub fn new(value: Value) -> Self {
        let kind = ValueKind::of(&value);
        Self { value, kind }
    }
}

/// Resolve every key to a typed value.
///
/// The first `null` stops resolution: its slot and every later slot stay
/// `null` and are typed `Opaque`.
pub fn resolve_eager(
    keys: &[String],
    context: &JsonObject,
    raw: Option<&RawLiterals>,
) -> Vec<ResolvedArg> {
    let mut args = Vec::with_capacity(keys.len());
    let mut stopped = false;
    for key in keys {
        if stopped {
            args.push(ResolvedArg::new(Value::Null));
            continue;
        }
        let value = resolve_arg(key, context, raw);
        stopped = value.is_null();
        args.push(ResolvedArg::new(value));
    }
    args
}

/// A parsed call with its arguments bound under one calling convention.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoundCall {
    pub call: CallExpression,
    pub resolution: ArgResolution,
    pub args: Vec<ResolvedArg>,
}

impl BoundCall {
    pub fn bind(
        call: CallExpression,
        context: &JsonObject,
        resolution: ArgResolution,
        raw: Option<&RawLiterals>,
    ) -> Self {
        let args = match resolution {
            ArgResolution::Eager => resolve_eager(&call.raw_keys, context, raw),
            ArgResolution::Lazy => std::iter::once(ResolvedArg::new(Value::Object(context.clone())))
                .chain(
                    call.raw_keys
                        .iter()
                        .map(|key| ResolvedArg::new(Value::String(key.clone()))),
                )
                .collect(),
        };
        Self {
            call,
            resolution,
            args,
        }
    }

    pub fn kinds(&self) -> Vec<ValueKind> {
        self.args.iter().map(|arg| arg.kind).collect()
    }

    pub fn values(&self) -> Vec<Value> {
        self.args.iter().map(|arg| arg.value.clone()).collect()
    }

    /// Render the call back to text, e.g. `count('id',2,true)`.
    ///
    /// With `use_values` the bound values are rendered, otherwise the raw
    /// keys. Booleans and numbers are bare; everything else is wrapped in
    /// `quote` (default `'`). The schema qualifier is not rendered.
    pub fn to_call_string(&self, use_values: bool, quote: Option<&str>) -> String {
        let quote = quote.unwrap_or("'");
        let rendered: Vec<String> = if use_values {
            self.args
                .iter()
                .map(|arg| render_value(&arg.value, quote))
                .collect()
        } else {
            self.call
                .raw_keys
                .iter()
                .map(|key| format!("{quote}{key}{quote}"))
                .collect()
        };
        format!("{}({})", self.call.method, rendered.join(","))
    }
}

fn render_value(value: &Value, quote: &str) -> String {
    match value {
        Value::Bool(_) | Value::Number(_) => value.to_string(),
        Value::String(text) => format!("{quote}{text}{quote}"),
        other => format!("{quote}{other}{quote}"),
    }
}

/// Parse and eagerly bind a SQL-function call, where `schema.` is legal and
/// arguments are always resolved to values.
pub fn bind_sql_call(
    expr: &str,
    context: &JsonObject,
    raw: Option<&RawLiterals>,
) -> Result<BoundCall, MalformedExpression> {
    let call = CallExpression::parse(expr, CallSite::Sql)?;
    Ok(BoundCall::bind(call, context, ArgResolution::Eager, raw))
}

/// Token of the form `<q>inner<q>` with no other `q` inside.
fn strip_enclosing(token: &str, quote: char) -> Option<&str> {
    let inner = token.strip_prefix(quote)?.strip_suffix(quote)?;
    (!inner.contains(quote)).then_some(inner)
}

fn lookup(context: &JsonObject, key: &str) -> Value {
    context.get(key).cloned().unwrap_or(Value::Null)
}

fn parse_number(token: &str) -> Option<Number> {
    if let Ok(int) = token.parse::<i64>() {
        return Some(Number::from(int));
    }
    token.parse::<f64>().ok().and_then(Number::from_f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn context(value: Value) -> JsonObject {
        match value {
            Value::Object(map) => map,
            other => panic!("context fixture must be an object, got {other}"),
        }
    }

    #[test]
    fn backtick_prefers_raw_table_when_permitted() {
        let ctx = context(json!({"k": "from-context"}));
        let raw: RawLiterals = [("k", "X")].into_iter().collect();
        assert_eq!(resolve_arg("`k`", &ctx, Some(&raw)), json!("X"));
        assert_eq!(resolve_arg("`k`", &ctx, None), json!("from-context"));
    }

    #[test]
    fn backtick_falls_back_to_context_on_raw_miss() {
        let ctx = context(json!({"k": 7}));
        let raw = RawLiterals::new();
        assert_eq!(resolve_arg("`k`", &ctx, Some(&raw)), json!(7));
    }

    #[test]
    fn quoted_literal_ignores_context() {
        let ctx = context(json!({"literal": "shadow", "'literal'": "shadow"}));
        assert_eq!(resolve_arg("'literal'", &ctx, None), json!("literal"));
        assert_eq!(resolve_arg("''", &ctx, None), json!(""));
    }

    #[test]
    fn malformed_quotes_are_not_literals() {
        let ctx = context(json!({"a'b'": 1}));
        assert_eq!(resolve_arg("'a'b'", &ctx, None), Value::Null);
        assert_eq!(resolve_arg("a'b'", &ctx, None), json!(1));
    }

    #[test]
    fn raw_table_entry_with_empty_value_echoes_key() {
        let ctx = JsonObject::new();
        let raw: RawLiterals = [("now()", ""), ("total", "SUM(amount)")].into_iter().collect();
        assert_eq!(resolve_arg("now()", &ctx, Some(&raw)), json!("now()"));
        assert_eq!(resolve_arg("total", &ctx, Some(&raw)), json!("SUM(amount)"));
        assert_eq!(resolve_arg("now()", &ctx, None), Value::Null);
    }

    #[test]
    fn named_references_keep_the_at_prefix_for_lookup() {
        let ctx = context(json!({"id": 3, "@role": "ADMIN"}));
        assert_eq!(resolve_arg("id", &ctx, None), json!(3));
        assert_eq!(resolve_arg("@role", &ctx, None), json!("ADMIN"));
        assert_eq!(resolve_arg("missing", &ctx, None), Value::Null);
    }

    #[test]
    fn booleans_and_numbers() {
        let ctx = JsonObject::new();
        assert_eq!(resolve_arg("true", &ctx, None), json!(true));
        assert_eq!(resolve_arg("false", &ctx, None), json!(false));
        assert_eq!(resolve_arg("3.14", &ctx, None), json!(3.14));
        assert_eq!(resolve_arg("-2", &ctx, None), json!(-2));
        assert_eq!(resolve_arg("1e3", &ctx, None), json!(1000.0));
    }

    #[test]
    fn boolean_words_are_not_named_references() {
        let ctx = context(json!({"true": "shadowed", "false": "shadowed"}));
        assert_eq!(resolve_arg("true", &ctx, None), json!(true));
        assert_eq!(resolve_arg("false", &ctx, None), json!(false));
        assert_eq!(resolve_arg("@true", &ctx, None), Value::Null);
    }

    #[test]
    fn non_finite_numbers_fall_through_to_lookup() {
        let ctx = context(json!({"NaN": "not-a-number"}));
        assert_eq!(resolve_arg("NaN", &ctx, None), json!("not-a-number"));
        let ctx = context(json!({"-inf": 1}));
        assert_eq!(resolve_arg("-inf", &ctx, None), json!(1));
    }

    #[test]
    fn resolution_is_repeatable() {
        let ctx = context(json!({"n": [1, 2]}));
        for token in ["n", "'n'", "`n`", "4", "x.y", "true"] {
            assert_eq!(resolve_arg(token, &ctx, None), resolve_arg(token, &ctx, None));
        }
    }

    #[test]
    fn eager_resolution_stops_at_first_null() {
        let ctx = context(json!({"a": {"x": 1}, "c": "never"}));
        let keys: Vec<String> = ["a", "missing", "c", "5"].map(String::from).to_vec();
        let args = resolve_eager(&keys, &ctx, None);
        let kinds: Vec<ValueKind> = args.iter().map(|arg| arg.kind).collect();
        assert_eq!(
            kinds,
            vec![
                ValueKind::Map,
                ValueKind::Opaque,
                ValueKind::Opaque,
                ValueKind::Opaque
            ]
        );
        assert_eq!(args[2].value, Value::Null);
        assert_eq!(args[3].value, Value::Null);
    }

    #[test]
    fn lazy_binding_passes_request_then_raw_keys() {
        let ctx = context(json!({"n": 4}));
        let call = CallExpression::parse("isEven(n)", CallSite::Remote).expect("well-formed");
        let bound = BoundCall::bind(call, &ctx, ArgResolution::Lazy, None);
        assert_eq!(bound.kinds(), vec![ValueKind::Map, ValueKind::String]);
        assert_eq!(bound.values(), vec![json!({"n": 4}), json!("n")]);
    }

    #[test]
    fn sql_calls_bind_eagerly_and_render() {
        let ctx = context(json!({"id": 82001, "name": "Lemon", "ok": true}));
        let bound = bind_sql_call("sys.concat(name,id,ok,'x')", &ctx, None).expect("sql call");
        assert_eq!(bound.call.schema.as_deref(), Some("sys"));
        assert_eq!(bound.resolution, ArgResolution::Eager);
        assert_eq!(bound.to_call_string(true, None), "concat('Lemon',82001,true,'x')");
        assert_eq!(
            bound.to_call_string(false, Some("\"")),
            "concat(\"name\",\"id\",\"ok\",\"'x'\")"
        );
    }
}
