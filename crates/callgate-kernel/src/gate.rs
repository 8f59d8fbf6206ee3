//! Access-control gate.
//!
//! The gate is a fail-closed whitelist. An unset restriction leaves that
//! axis open (no tag requirement, no method list), but a function with no
//! registry entry is never callable. Checks run in a fixed order and the
//! first unmet one is reported:
//!
//! 1. remote dispatch enabled (checked before registry lookup)
//! 2. entry exists
//! 3. execution kind supported
//! 4. script dispatch enabled, for script entries
//! 5. caller version >= entry minimum version
//! 6. caller tag equals the required tag, when one is set
//! 7. caller method is in the allowed set, when one is set (ASCII case-insensitive)

use crate::config::DispatchConfig;
use crate::error::GateDenial;
use crate::registry::{ExecutionKind, RegistryEntry};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Verb of the request that encloses a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RequestMethod {
    #[default]
    Get,
    Head,
    Gets,
    Heads,
    Post,
    Put,
    Delete,
    Crud,
}

impl RequestMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            RequestMethod::Get => "GET",
            RequestMethod::Head => "HEAD",
            RequestMethod::Gets => "GETS",
            RequestMethod::Heads => "HEADS",
            RequestMethod::Post => "POST",
            RequestMethod::Put => "PUT",
            RequestMethod::Delete => "DELETE",
            RequestMethod::Crud => "CRUD",
        }
    }
}

impl fmt::Display for RequestMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequestMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "GET" => Ok(RequestMethod::Get),
            "HEAD" => Ok(RequestMethod::Head),
            "GETS" => Ok(RequestMethod::Gets),
            "HEADS" => Ok(RequestMethod::Heads),
            "POST" => Ok(RequestMethod::Post),
            "PUT" => Ok(RequestMethod::Put),
            "DELETE" => Ok(RequestMethod::Delete),
            "CRUD" => Ok(RequestMethod::Crud),
            _ => Err(format!(
                "unknown request method `{s}`; expected one of GET, HEAD, GETS, HEADS, POST, PUT, DELETE, CRUD"
            )),
        }
    }
}

/// Who is asking for the call. Omitted fields default to GET, no tag and
/// version 0.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CallerContext {
    pub method: RequestMethod,
    pub tag: Option<String>,
    pub version: i64,
}

impl CallerContext {
    pub fn new(method: RequestMethod, tag: Option<String>, version: i64) -> Self {
        Self {
            method,
            tag,
            version,
        }
    }
}

/// Step 1; runs before the registry is consulted.
pub fn check_remote_enabled(function: &str, config: &DispatchConfig) -> Result<(), GateDenial> {
    if config.enable_remote {
        Ok(())
    } else {
        Err(GateDenial::RemoteDisabled {
            function: function.to_string(),
        })
    }
}

/// Steps 2-7. Returns the entry that passed.
pub fn authorize<'a>(
    function: &str,
    entry: Option<&'a RegistryEntry>,
    caller: &CallerContext,
    config: &DispatchConfig,
) -> Result<&'a RegistryEntry, GateDenial> {
    let entry = entry.ok_or_else(|| GateDenial::UnknownFunction {
        function: function.to_string(),
    })?;

    match &entry.execution_kind {
        ExecutionKind::Native => {}
        ExecutionKind::Script if config.enable_script => {}
        ExecutionKind::Script => {
            return Err(GateDenial::ScriptDisabled {
                function: function.to_string(),
            });
        }
        ExecutionKind::Unsupported(kind) => {
            return Err(GateDenial::UnsupportedKind {
                function: function.to_string(),
                kind: kind.clone(),
            });
        }
    }

    if caller.version < entry.min_version {
        return Err(GateDenial::VersionTooLow {
            function: function.to_string(),
            actual: caller.version,
            required: entry.min_version,
        });
    }

    if let Some(required) = &entry.required_tag {
        if caller.tag.as_ref() != Some(required) {
            return Err(GateDenial::TagMismatch {
                function: function.to_string(),
                actual: caller.tag.clone(),
                required: required.clone(),
            });
        }
    }

    if let Some(allowed) = entry.allowed_caller_methods.as_ref().filter(|set| !set.is_empty()) {
        let method = caller.method.as_str();
        if !allowed.iter().any(|listed| listed.eq_ignore_ascii_case(method)) {
            return Err(GateDenial::MethodNotAllowed {
                function: function.to_string(),
                actual: caller.method.to_string(),
                allowed: allowed.iter().cloned().collect(),
            });
        }
    }

    Ok(entry)
}
