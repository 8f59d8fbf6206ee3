//! Stock native functions.
//!
//! Lazy-convention entries take the request plus key strings and resolve the
//! keys themselves; the eager overloads take typed values.

use crate::native::{FunctionError, LazyArgs, NativeFunctions};
use crate::value::ValueKind;
use serde_json::{Number, Value, json};

pub fn stock_functions() -> NativeFunctions {
    let mut natives = NativeFunctions::new();
    natives
        .register_lazy("isEven", 1, |args| {
            let value = args.value(0)?;
            is_even("isEven", &value)
        })
        .register_lazy("isContain", 2, is_contain)
        .register_lazy("count", 1, |args| Ok(json!(count_of(&args.value(0)?))))
        .register_lazy("get", 1, |args| args.value(0))
        .register("isEven", vec![ValueKind::Number], |args| {
            is_even("isEven", &args[0])
        })
        .register(
            "plus",
            vec![ValueKind::Number, ValueKind::Number],
            |args| plus(&args[0], &args[1]),
        );
    natives
}

fn is_even(function: &str, value: &Value) -> Result<Value, FunctionError> {
    value
        .as_i64()
        .map(|n| json!(n % 2 == 0))
        .ok_or_else(|| FunctionError::new(format!("{function}: {value} is not an integer")))
}

fn is_contain(args: &LazyArgs<'_>) -> Result<Value, FunctionError> {
    let needle = args.value(1)?;
    let found = match args.value(0)? {
        Value::Null => false,
        Value::Array(items) => items.contains(&needle),
        Value::Object(map) => needle.as_str().is_some_and(|key| map.contains_key(key)),
        Value::String(text) => needle.as_str().is_some_and(|part| text.contains(part)),
        other => {
            return Err(FunctionError::new(format!(
                "isContain: `{}` resolved to {other}, which is not a container",
                args.key(0)?
            )));
        }
    };
    Ok(Value::Bool(found))
}

fn count_of(value: &Value) -> usize {
    match value {
        Value::Array(items) => items.len(),
        Value::Object(map) => map.len(),
        Value::String(text) => text.chars().count(),
        Value::Null => 0,
        _ => 1,
    }
}

fn plus(left: &Value, right: &Value) -> Result<Value, FunctionError> {
    if let (Some(a), Some(b)) = (left.as_i64(), right.as_i64()) {
        if let Some(sum) = a.checked_add(b) {
            return Ok(json!(sum));
        }
    }
    let sum = left.as_f64().unwrap_or_default() + right.as_f64().unwrap_or_default();
    Number::from_f64(sum)
        .map(Value::Number)
        .ok_or_else(|| FunctionError::new(format!("plus: {left} + {right} is not a finite number")))
}
