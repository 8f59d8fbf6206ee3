//! Dispatch toggles.
//!
//! Loaded from TOML; every key is optional:
//!
//! ```toml
//! enable_remote = true
//! enable_script = true
//! resolution = "lazy"          # or "eager"
//! strict_return_types = false
//! script_max_operations = 100000
//! ```

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;

/// How native call arguments are bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArgResolution {
    /// Resolve every key to a typed value and match overloads by value kinds.
    Eager,
    /// Pass `(request, key0, key1, ...)`; the callable resolves keys itself.
    #[default]
    Lazy,
}

impl fmt::Display for ArgResolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgResolution::Eager => f.write_str("eager"),
            ArgResolution::Lazy => f.write_str("lazy"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DispatchConfig {
    pub enable_remote: bool,
    pub enable_script: bool,
    pub resolution: ArgResolution,
    /// Verify results against declared return types.
    pub strict_return_types: bool,
    /// Operation budget per script call; unbounded when absent.
    pub script_max_operations: Option<u64>,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            enable_remote: true,
            enable_script: true,
            resolution: ArgResolution::Lazy,
            strict_return_types: false,
            script_max_operations: None,
        }
    }
}

impl DispatchConfig {
    pub fn from_toml_str(text: &str, origin: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|source| ConfigError::ParseToml {
            path: origin.to_string(),
            source,
        })
    }

    pub fn load_toml(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&text, &path.display().to_string())
    }
}
