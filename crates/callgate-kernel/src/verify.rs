//! Return-type verification against the registry's declared result type.

use crate::error::VerifyError;
use crate::value::{DeclaredType, ValueKind};
use serde_json::Value;

/// Check `result` against `declared`.
///
/// Only enforced when `strict`; otherwise every result passes. A `null`
/// result satisfies a void declaration and nothing else.
pub fn verify_return(
    function: &str,
    result: &Value,
    declared: Option<&str>,
    strict: bool,
) -> Result<(), VerifyError> {
    if !strict {
        return Ok(());
    }

    let mismatch = |actual: &str, declared: &str| VerifyError::ReturnTypeMismatch {
        function: function.to_string(),
        actual: actual.to_string(),
        declared: declared.to_string(),
    };
    let declared_name = declared.map(str::trim).unwrap_or_default();

    match (DeclaredType::resolve(declared), result) {
        (Some(DeclaredType::Void), Value::Null) => Ok(()),
        (Some(DeclaredType::Void), other) => {
            Err(mismatch(ValueKind::of(other).type_name(), "void"))
        }
        (_, Value::Null) => Err(mismatch("void", declared_name)),
        (None, _) => Err(VerifyError::UnresolvableDeclaredType {
            function: function.to_string(),
            declared: declared_name.to_string(),
        }),
        (Some(DeclaredType::Kind(kind)), other) => {
            let actual = ValueKind::of(other);
            if kind.accepts(actual) {
                Ok(())
            } else {
                Err(mismatch(actual.type_name(), kind.type_name()))
            }
        }
    }
}
