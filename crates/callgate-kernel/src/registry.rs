//! Function registry: which names are callable, by whom, and how.
//!
//! The registry is the single source of truth for what may be dispatched.
//! It is read-mostly: readers take a cheap `Arc` snapshot, and a refresh
//! swaps in a whole new snapshot so a call never observes a half-applied
//! update.

use crate::error::RegistryError;
use crate::expr::is_name;
use crate::gate::RequestMethod;
use crate::value::DeclaredType;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};

pub mod failure_class {
    pub const REGISTRY_INVALID_NAME: &str = "registry_invalid_name";
    pub const REGISTRY_UNSUPPORTED_KIND: &str = "registry_unsupported_kind";
    pub const REGISTRY_SCRIPT_SOURCE_MISSING: &str = "registry_script_source_missing";
    pub const REGISTRY_NATIVE_HAS_SOURCE: &str = "registry_native_has_source";
    pub const REGISTRY_UNRESOLVABLE_RETURN_TYPE: &str = "registry_unresolvable_return_type";
    pub const REGISTRY_UNKNOWN_METHOD: &str = "registry_unknown_method";
}

pub const FUNCTION_REGISTRY_KIND: &str = "callgate.function_registry.v1";
pub const FUNCTION_REGISTRY_SCHEMA: u64 = 1;

/// How a registered function executes.
///
/// Unknown kinds survive loading so the gate can deny them with a precise
/// reason instead of the whole registry failing to load.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "KindRepr", into = "String")]
pub enum ExecutionKind {
    Native,
    Script,
    Unsupported(String),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum KindRepr {
    Name(String),
    Code(i64),
}

impl From<KindRepr> for ExecutionKind {
    fn from(repr: KindRepr) -> Self {
        match repr {
            KindRepr::Name(name) => match name.as_str() {
                "native" => ExecutionKind::Native,
                "script" => ExecutionKind::Script,
                _ => ExecutionKind::Unsupported(name),
            },
            KindRepr::Code(0) => ExecutionKind::Native,
            KindRepr::Code(1) => ExecutionKind::Script,
            KindRepr::Code(code) => ExecutionKind::Unsupported(code.to_string()),
        }
    }
}

impl From<ExecutionKind> for String {
    fn from(kind: ExecutionKind) -> Self {
        kind.to_string()
    }
}

impl fmt::Display for ExecutionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionKind::Native => f.write_str("native"),
            ExecutionKind::Script => f.write_str("script"),
            ExecutionKind::Unsupported(raw) => f.write_str(raw),
        }
    }
}

/// Policy and dispatch metadata for one callable name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryEntry {
    pub execution_kind: ExecutionKind,
    #[serde(default)]
    pub min_version: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_tag: Option<String>,
    /// Request methods allowed to call; `None` or empty means any.
    #[serde(
        default,
        deserialize_with = "deserialize_methods",
        skip_serializing_if = "Option::is_none"
    )]
    pub allowed_caller_methods: Option<BTreeSet<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub declared_return_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub script_source: Option<String>,
}

impl RegistryEntry {
    pub fn native() -> Self {
        Self::with_kind(ExecutionKind::Native, None)
    }

    pub fn script(source: impl Into<String>) -> Self {
        Self::with_kind(ExecutionKind::Script, Some(source.into()))
    }

    fn with_kind(execution_kind: ExecutionKind, script_source: Option<String>) -> Self {
        Self {
            execution_kind,
            min_version: 0,
            required_tag: None,
            allowed_caller_methods: None,
            declared_return_type: None,
            script_source,
        }
    }

    pub fn min_version(mut self, version: i64) -> Self {
        self.min_version = version;
        self
    }

    pub fn required_tag(mut self, tag: impl Into<String>) -> Self {
        self.required_tag = Some(tag.into());
        self
    }

    pub fn allowed_methods<I, S>(mut self, methods: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_caller_methods = Some(methods.into_iter().map(Into::into).collect());
        self
    }

    pub fn returns(mut self, type_name: impl Into<String>) -> Self {
        self.declared_return_type = Some(type_name.into());
        self
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum MethodsRepr {
    Joined(String),
    List(Vec<String>),
}

fn deserialize_methods<'de, D>(deserializer: D) -> Result<Option<BTreeSet<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let repr = Option::<MethodsRepr>::deserialize(deserializer)?;
    let methods: Option<BTreeSet<String>> = repr.map(|repr| match repr {
        MethodsRepr::Joined(joined) => split_methods(&joined),
        MethodsRepr::List(list) => list
            .iter()
            .map(|method| method.trim())
            .filter(|method| !method.is_empty())
            .map(str::to_string)
            .collect(),
    });
    Ok(methods.filter(|set| !set.is_empty()))
}

fn split_methods(joined: &str) -> BTreeSet<String> {
    joined
        .split(',')
        .map(str::trim)
        .filter(|method| !method.is_empty())
        .map(str::to_string)
        .collect()
}

/// One immutable view of every registered function, keyed by name.
pub type RegistrySnapshot = BTreeMap<String, RegistryEntry>;

#[derive(Debug, Default)]
pub struct FunctionRegistry {
    current: RwLock<Arc<RegistrySnapshot>>,
}

impl FunctionRegistry {
    pub fn new(entries: RegistrySnapshot) -> Self {
        Self {
            current: RwLock::new(Arc::new(entries)),
        }
    }

    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, RegistryEntry)>,
        S: Into<String>,
    {
        Self::new(
            entries
                .into_iter()
                .map(|(name, entry)| (name.into(), entry))
                .collect(),
        )
    }

    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, RegistryError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| RegistryError::ReadFile {
            path: path.display().to_string(),
            source,
        })?;
        let raw: Value = serde_json::from_str(&text).map_err(|source| RegistryError::ParseJson {
            path: path.display().to_string(),
            source,
        })?;
        parse_registry(&raw).map(Self::new)
    }

    /// The current snapshot. Holding it pins that revision for the caller.
    pub fn snapshot(&self) -> Arc<RegistrySnapshot> {
        Arc::clone(&self.current.read().unwrap_or_else(PoisonError::into_inner))
    }

    pub fn get(&self, name: &str) -> Option<RegistryEntry> {
        self.snapshot().get(name).cloned()
    }

    /// Swap in a new snapshot, returning the one it replaced.
    pub fn replace(&self, entries: RegistrySnapshot) -> Arc<RegistrySnapshot> {
        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *current, Arc::new(entries))
    }

    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot().is_empty()
    }

    /// SHA-256 of the canonical JSON of the current snapshot.
    pub fn digest(&self) -> String {
        snapshot_digest(&self.snapshot())
    }
}

pub fn snapshot_digest(snapshot: &RegistrySnapshot) -> String {
    let bytes = serde_json::to_vec(snapshot).unwrap_or_default();
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    format!("{:x}", hasher.finalize())
}

/// Parse either a registry document or a bare `{name: entry}` map.
pub fn parse_registry(raw: &Value) -> Result<RegistrySnapshot, RegistryError> {
    let object = raw
        .as_object()
        .ok_or_else(|| RegistryError::Invalid("registry root must be a JSON object".to_string()))?;

    let functions = match object.get("functions") {
        Some(functions) => {
            if let Some(kind) = object.get("registryKind") {
                if kind.as_str() != Some(FUNCTION_REGISTRY_KIND) {
                    return Err(RegistryError::Invalid(format!(
                        "registryKind must be {FUNCTION_REGISTRY_KIND}, got {kind}"
                    )));
                }
            }
            if let Some(schema) = object.get("schema") {
                if schema.as_u64() != Some(FUNCTION_REGISTRY_SCHEMA) {
                    return Err(RegistryError::Invalid(format!(
                        "schema must be {FUNCTION_REGISTRY_SCHEMA}, got {schema}"
                    )));
                }
            }
            functions
        }
        None => raw,
    };

    let rows = functions
        .as_object()
        .ok_or_else(|| RegistryError::Invalid("functions must be a JSON object".to_string()))?;
    let mut snapshot = RegistrySnapshot::new();
    for (name, row) in rows {
        let entry: RegistryEntry = serde_json::from_value(row.clone())
            .map_err(|err| RegistryError::Invalid(format!("functions.{name}: {err}")))?;
        snapshot.insert(name.clone(), entry);
    }
    Ok(snapshot)
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ValidationIssue {
    pub failure_class: String,
    pub path: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub result: String,
    pub failure_classes: Vec<String>,
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    fn from_issues(mut issues: Vec<ValidationIssue>) -> Self {
        issues.sort_by(|a, b| {
            (&a.path, &a.failure_class, &a.message).cmp(&(&b.path, &b.failure_class, &b.message))
        });
        let failure_classes: Vec<String> = issues
            .iter()
            .map(|issue| issue.failure_class.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        Self {
            result: if issues.is_empty() {
                "accepted".to_string()
            } else {
                "rejected".to_string()
            },
            failure_classes,
            issues,
        }
    }

    pub fn accepted(&self) -> bool {
        self.result == "accepted"
    }
}

fn push_issue(
    issues: &mut Vec<ValidationIssue>,
    failure_class: &str,
    path: String,
    message: String,
) {
    issues.push(ValidationIssue {
        failure_class: failure_class.to_string(),
        path,
        message,
    });
}

/// Static checks over a snapshot, reported rather than thrown.
pub fn validate_registry(snapshot: &RegistrySnapshot) -> ValidationReport {
    let mut issues = Vec::new();
    for (name, entry) in snapshot {
        let base = format!("functions.{name}");
        if !is_name(name) {
            push_issue(
                &mut issues,
                failure_class::REGISTRY_INVALID_NAME,
                base.clone(),
                format!("`{name}` is not a valid function name"),
            );
        }

        let has_source = entry
            .script_source
            .as_deref()
            .is_some_and(|source| !source.trim().is_empty());
        match &entry.execution_kind {
            ExecutionKind::Native if has_source => push_issue(
                &mut issues,
                failure_class::REGISTRY_NATIVE_HAS_SOURCE,
                format!("{base}.scriptSource"),
                "native functions must not carry script source".to_string(),
            ),
            ExecutionKind::Script if !has_source => push_issue(
                &mut issues,
                failure_class::REGISTRY_SCRIPT_SOURCE_MISSING,
                format!("{base}.scriptSource"),
                "script functions require non-empty script source".to_string(),
            ),
            ExecutionKind::Unsupported(kind) => push_issue(
                &mut issues,
                failure_class::REGISTRY_UNSUPPORTED_KIND,
                format!("{base}.executionKind"),
                format!("execution kind `{kind}` must be one of [native, script]"),
            ),
            _ => {}
        }

        if DeclaredType::resolve(entry.declared_return_type.as_deref()).is_none() {
            push_issue(
                &mut issues,
                failure_class::REGISTRY_UNRESOLVABLE_RETURN_TYPE,
                format!("{base}.declaredReturnType"),
                format!(
                    "declared return type `{}` names no known type",
                    entry.declared_return_type.as_deref().unwrap_or_default()
                ),
            );
        }

        for method in entry.allowed_caller_methods.iter().flatten() {
            if method.parse::<RequestMethod>().is_err() {
                push_issue(
                    &mut issues,
                    failure_class::REGISTRY_UNKNOWN_METHOD,
                    format!("{base}.allowedCallerMethods"),
                    format!("unknown request method `{method}`"),
                );
            }
        }
    }
    ValidationReport::from_issues(issues)
}
