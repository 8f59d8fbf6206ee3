//! Error types for call parsing, gating, dispatch and verification.

/// Stable machine-readable names for every failure kind.
pub mod failure_class {
    pub const MALFORMED_EXPRESSION: &str = "malformed_expression";
    pub const REMOTE_DISABLED: &str = "remote_disabled";
    pub const UNKNOWN_FUNCTION: &str = "unknown_function";
    pub const UNSUPPORTED_KIND: &str = "unsupported_kind";
    pub const SCRIPT_DISABLED: &str = "script_disabled";
    pub const VERSION_TOO_LOW: &str = "version_too_low";
    pub const TAG_MISMATCH: &str = "tag_mismatch";
    pub const METHOD_NOT_ALLOWED: &str = "method_not_allowed";
    pub const NO_SUCH_CALLABLE: &str = "no_such_callable";
    pub const SCRIPT_FUNCTION_MISSING: &str = "script_function_missing";
    pub const ARGUMENT_TYPE_MISMATCH: &str = "argument_type_mismatch";
    pub const TARGET_INVOCATION_FAULT: &str = "target_invocation_fault";
    pub const SCRIPT_EXECUTION_FAILED: &str = "script_execution_failed";
    pub const RETURN_TYPE_MISMATCH: &str = "return_type_mismatch";
    pub const UNRESOLVABLE_DECLARED_TYPE: &str = "unresolvable_declared_type";
}

/// The call string violates `[schema.]method(key0,key1,...)`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("malformed call expression `{expr}`: {reason}")]
pub struct MalformedExpression {
    pub expr: String,
    pub reason: String,
}

/// Policy or authorization denial raised before anything is dispatched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GateDenial {
    #[error(
        "remote function calls are disabled; cannot call `{function}` until enable_remote = true"
    )]
    RemoteDisabled { function: String },

    #[error("remote function `{function}` is not registered and may not be called")]
    UnknownFunction { function: String },

    #[error(
        "remote function `{function}` has unsupported execution kind `{kind}`; must be one of [native, script]"
    )]
    UnsupportedKind { function: String, kind: String },

    #[error(
        "remote function `{function}` is a script function but script dispatch is disabled; set enable_script = true to allow it"
    )]
    ScriptDisabled { function: String },

    #[error(
        "caller version {actual} may not call remote function `{function}`; requires version >= {required}"
    )]
    VersionTooLow {
        function: String,
        actual: i64,
        required: i64,
    },

    #[error(
        "caller tag {} may not call remote function `{function}`; requires tag = {required}",
        .actual.as_deref().unwrap_or("null")
    )]
    TagMismatch {
        function: String,
        actual: Option<String>,
        required: String,
    },

    #[error(
        "caller method {actual} may not call remote function `{function}`; method must be one of [{}]",
        .allowed.join(", ")
    )]
    MethodNotAllowed {
        function: String,
        actual: String,
        allowed: Vec<String>,
    },
}

impl GateDenial {
    pub fn failure_class(&self) -> &'static str {
        match self {
            GateDenial::RemoteDisabled { .. } => failure_class::REMOTE_DISABLED,
            GateDenial::UnknownFunction { .. } => failure_class::UNKNOWN_FUNCTION,
            GateDenial::UnsupportedKind { .. } => failure_class::UNSUPPORTED_KIND,
            GateDenial::ScriptDisabled { .. } => failure_class::SCRIPT_DISABLED,
            GateDenial::VersionTooLow { .. } => failure_class::VERSION_TOO_LOW,
            GateDenial::TagMismatch { .. } => failure_class::TAG_MISMATCH,
            GateDenial::MethodNotAllowed { .. } => failure_class::METHOD_NOT_ALLOWED,
        }
    }
}

/// Failures while reaching or running the dispatch target.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DispatchError {
    #[error(
        "no native function matches `{expr}`; expected {signature}{}. Check the function name and argument count, and call it as function(key0,key1,...) without spaces",
        registered_overloads(.accepted)
    )]
    NoSuchCallable {
        expr: String,
        signature: String,
        /// Overloads of the same arity whose kinds did not match.
        accepted: Vec<String>,
    },

    #[error("script function `{function}` has no script source; expected {signature}")]
    ScriptFunctionMissing { function: String, signature: String },

    #[error(
        "argument type mismatch in `{expr}`: {detail}; {signature} accepts [{}]",
        .accepted.join(" | ")
    )]
    ArgumentTypeMismatch {
        expr: String,
        detail: String,
        signature: String,
        accepted: Vec<String>,
    },

    /// The callable itself failed; its message is surfaced unchanged.
    #[error("{0}")]
    Target(String),

    #[error("script function `{function}` failed: {message}")]
    ScriptExecution { function: String, message: String },
}

impl DispatchError {
    pub fn failure_class(&self) -> &'static str {
        match self {
            DispatchError::NoSuchCallable { .. } => failure_class::NO_SUCH_CALLABLE,
            DispatchError::ScriptFunctionMissing { .. } => failure_class::SCRIPT_FUNCTION_MISSING,
            DispatchError::ArgumentTypeMismatch { .. } => failure_class::ARGUMENT_TYPE_MISMATCH,
            DispatchError::Target(_) => failure_class::TARGET_INVOCATION_FAULT,
            DispatchError::ScriptExecution { .. } => failure_class::SCRIPT_EXECUTION_FAILED,
        }
    }
}

fn registered_overloads(accepted: &[String]) -> String {
    if accepted.is_empty() {
        String::new()
    } else {
        format!(" but only [{}] are registered", accepted.join(" | "))
    }
}

/// Diagnostic faults, raised only under strict return-type checking.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VerifyError {
    #[error(
        "remote function `{function}` returned {actual} but the registry declares {declared}"
    )]
    ReturnTypeMismatch {
        function: String,
        actual: String,
        declared: String,
    },

    #[error(
        "remote function `{function}` declares return type `{declared}`, which names no known type"
    )]
    UnresolvableDeclaredType { function: String, declared: String },
}

impl VerifyError {
    pub fn failure_class(&self) -> &'static str {
        match self {
            VerifyError::ReturnTypeMismatch { .. } => failure_class::RETURN_TYPE_MISMATCH,
            VerifyError::UnresolvableDeclaredType { .. } => {
                failure_class::UNRESOLVABLE_DECLARED_TYPE
            }
        }
    }
}

/// Any failure of one end-to-end call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CallError {
    #[error(transparent)]
    Malformed(#[from] MalformedExpression),

    #[error(transparent)]
    Denied(#[from] GateDenial),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error(transparent)]
    Verify(#[from] VerifyError),
}

impl CallError {
    pub fn failure_class(&self) -> &'static str {
        match self {
            CallError::Malformed(_) => failure_class::MALFORMED_EXPRESSION,
            CallError::Denied(denial) => denial.failure_class(),
            CallError::Dispatch(err) => err.failure_class(),
            CallError::Verify(err) => err.failure_class(),
        }
    }
}

/// Errors loading a registry or raw-literal file.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("failed to read file: {path}: {source}")]
    ReadFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid json at {path}: {source}")]
    ParseJson {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid registry: {0}")]
    Invalid(String),
}

/// Errors loading dispatch configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read file: {path}: {source}")]
    ReadFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid toml at {path}: {source}")]
    ParseToml {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}
