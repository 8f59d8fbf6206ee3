//! Call-expression parsing.
//!
//! Grammar: `[schema.]method(key0,key1,...)`. The grammar is flat: argument
//! tokens are split on commas without balancing quotes or parentheses, so
//! nested calls are not expressible.

use crate::error::MalformedExpression;
use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;

/// Where a call expression appears, which decides whether a schema
/// qualifier is legal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CallSite {
    /// Plain remote function call; `schema.` is rejected.
    #[default]
    Remote,
    /// SQL function or stored-procedure call; `schema.` is allowed.
    Sql,
}

impl CallSite {
    fn callee_noun(self) -> &'static str {
        match self {
            CallSite::Remote => "remote function",
            CallSite::Sql => "SQL function/stored procedure",
        }
    }
}

/// Parsed form of a call string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CallExpression {
    /// The original call string.
    pub expr: String,
    pub schema: Option<String>,
    pub method: String,
    /// Unparsed argument tokens, in source order.
    pub raw_keys: Vec<String>,
}

impl CallExpression {
    pub fn parse(expr: &str, site: CallSite) -> Result<Self, MalformedExpression> {
        let start = expr.find('(');
        let end = expr.rfind(')');
        let (start, end) = match (start, end) {
            (Some(start), Some(end)) if start > 0 && end == expr.len() - 1 && end > start => {
                (start, end)
            }
            _ => {
                return Err(malformed(
                    expr,
                    "expected a single call of the form function(key0,key1,...) ending in `)`",
                ));
            }
        };
        let callee = &expr[..start];

        let (schema, method) = match callee.split_once('.') {
            Some((schema, method)) => (Some(schema), method),
            None => (None, callee),
        };

        if !is_name(method) {
            return Err(malformed(
                expr,
                format!(
                    "function name `{method}` must be non-empty and follow {} naming; keys are names looked up in the request",
                    site.callee_noun()
                ),
            ));
        }
        if let Some(schema) = schema {
            if site == CallSite::Remote && !schema.trim().is_empty() {
                return Err(malformed(
                    expr,
                    format!("remote functions may not be qualified with a schema (`{schema}.`)"),
                ));
            }
            if !is_name(schema) {
                return Err(malformed(
                    expr,
                    format!("schema name `{schema}` must be non-empty and follow naming rules"),
                ));
            }
        }

        Ok(Self {
            expr: expr.to_string(),
            schema: schema.map(str::to_string),
            method: method.to_string(),
            raw_keys: split_args(&expr[start + 1..end]),
        })
    }

    /// The lazy-convention signature this call expects of a native target.
    pub fn signature_hint(&self) -> String {
        signature_hint(&self.method, &self.raw_keys)
    }
}

fn malformed(expr: &str, reason: impl Into<String>) -> MalformedExpression {
    MalformedExpression {
        expr: expr.to_string(),
        reason: reason.into(),
    }
}

fn name_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("name regex must compile"))
}

/// Name-token grammar shared by function names, schemas and named references.
pub fn is_name(token: &str) -> bool {
    name_re().is_match(token)
}

/// Split an argument list on commas. An empty list has zero tokens.
pub fn split_args(list: &str) -> Vec<String> {
    if list.trim().is_empty() {
        return Vec::new();
    }
    list.split(',').map(|token| token.trim().to_string()).collect()
}

/// Render `method(JSONObject request, String key0, ...)`.
pub fn signature_hint(method: &str, keys: &[String]) -> String {
    let mut out = format!("{method}(JSONObject request");
    for key in keys {
        out.push_str(", String ");
        out.push_str(key);
    }
    out.push(')');
    out
}
