//! Value-kind tags.
//!
//! One closed set of kinds drives three things: the type signature of an
//! eagerly resolved argument list, native overload matching, and the
//! return-type diagnostics. Assignability is a plain tag comparison: the
//! `Opaque` kind accepts everything, every other kind accepts only itself.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Classification of a JSON-compatible value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    Boolean,
    Number,
    String,
    Map,
    Sequence,
    /// Generic object slot; also the kind of an unresolved (`null`) argument.
    Opaque,
}

impl ValueKind {
    /// Classify a value. `null` has no concrete kind and maps to `Opaque`.
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Bool(_) => ValueKind::Boolean,
            Value::Number(_) => ValueKind::Number,
            Value::String(_) => ValueKind::String,
            Value::Object(_) => ValueKind::Map,
            Value::Array(_) => ValueKind::Sequence,
            Value::Null => ValueKind::Opaque,
        }
    }

    /// Whether a slot of this kind can receive a value of kind `actual`.
    pub fn accepts(self, actual: ValueKind) -> bool {
        self == ValueKind::Opaque || self == actual
    }

    /// Name used in diagnostics and rendered signatures.
    pub fn type_name(self) -> &'static str {
        match self {
            ValueKind::Boolean => "Boolean",
            ValueKind::Number => "Number",
            ValueKind::String => "String",
            ValueKind::Map => "JSONObject",
            ValueKind::Sequence => "JSONArray",
            ValueKind::Opaque => "Object",
        }
    }

    /// Resolve a declared type name to a kind.
    ///
    /// Package-qualified names (`java.lang.String`, `com.x.JSONObject`) are
    /// resolved by their last segment.
    pub fn from_type_name(name: &str) -> Option<Self> {
        let simple = name.rsplit('.').next().unwrap_or(name).trim();
        let kind = match simple {
            "Object" => ValueKind::Opaque,
            "Boolean" | "boolean" | "bool" => ValueKind::Boolean,
            "Number" | "Integer" | "Long" | "Short" | "Byte" | "Double" | "Float"
            | "BigDecimal" | "BigInteger" | "int" | "long" | "short" | "byte" | "double"
            | "float" | "number" => ValueKind::Number,
            "String" | "CharSequence" | "string" => ValueKind::String,
            "Map" | "JSONObject" | "object" | "map" => ValueKind::Map,
            "List" | "Collection" | "JSONArray" | "array" | "sequence" => ValueKind::Sequence,
            _ => return None,
        };
        Some(kind)
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

/// A registry entry's declared result, after name resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclaredType {
    /// No result (`void`, or no declaration at all).
    Void,
    Kind(ValueKind),
}

impl DeclaredType {
    /// Resolve an optional declared type name.
    ///
    /// Returns `None` when the name is present but names no known type.
    pub fn resolve(name: Option<&str>) -> Option<Self> {
        match name.map(str::trim) {
            None | Some("") | Some("void") | Some("Void") => Some(DeclaredType::Void),
            Some(name) => ValueKind::from_type_name(name).map(DeclaredType::Kind),
        }
    }
}

impl fmt::Display for DeclaredType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeclaredType::Void => f.write_str("void"),
            DeclaredType::Kind(kind) => write!(f, "{kind}"),
        }
    }
}
