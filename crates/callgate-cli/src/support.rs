use callgate_kernel::{
    ConfigError, DispatchConfig, FunctionRegistry, JsonObject, RawLiterals, RegistryError,
};
use serde_json::{Value, json};
use std::fs;

/// Exit status for input files that cannot be read at all.
pub const EXIT_UNREADABLE_INPUT: i32 = 2;

pub fn read_json_file_or_exit(path: &str, label: &str) -> Value {
    let bytes = fs::read(path).unwrap_or_else(|e| {
        eprintln!("error: failed to read {label} at {path}: {e}");
        std::process::exit(EXIT_UNREADABLE_INPUT);
    });
    serde_json::from_slice::<Value>(&bytes).unwrap_or_else(|e| {
        eprintln!("error: failed to parse {label} JSON at {path}: {e}");
        std::process::exit(1);
    })
}

pub fn load_context_or_exit(path: &str) -> JsonObject {
    match read_json_file_or_exit(path, "data context") {
        Value::Object(map) => map,
        other => {
            eprintln!("error: data context at {path} must be a JSON object, got {other}");
            std::process::exit(1);
        }
    }
}

pub fn load_raw_or_exit(path: Option<&str>) -> Option<RawLiterals> {
    let path = path?;
    let raw = RawLiterals::load_json(path)
        .unwrap_or_else(|e| exit_registry_error("raw-literal table", e));
    Some(raw)
}

pub fn load_registry_or_exit(path: &str) -> FunctionRegistry {
    FunctionRegistry::load_json(path)
        .unwrap_or_else(|e| exit_registry_error("function registry", e))
}

fn exit_registry_error(label: &str, err: RegistryError) -> ! {
    eprintln!("error: invalid {label}: {err}");
    let code = match err {
        RegistryError::ReadFile { .. } => EXIT_UNREADABLE_INPUT,
        RegistryError::ParseJson { .. } | RegistryError::Invalid(_) => 1,
    };
    std::process::exit(code);
}

pub fn load_config_or_exit(path: Option<&str>) -> DispatchConfig {
    let Some(path) = path else {
        return DispatchConfig::default();
    };
    DispatchConfig::load_toml(path).unwrap_or_else(|e| {
        eprintln!("error: {e}");
        let code = match e {
            ConfigError::ReadFile { .. } => EXIT_UNREADABLE_INPUT,
            ConfigError::ParseToml { .. } => 1,
        };
        std::process::exit(code);
    })
}

pub fn print_json_or_exit(payload: &Value, label: &str) {
    let rendered = serde_json::to_string_pretty(payload).unwrap_or_else(|err| {
        eprintln!("error: failed to render {label} payload: {err}");
        std::process::exit(2);
    });
    println!("{rendered}");
}

/// Report a rejected call and exit 1.
pub fn reject(failure_class: &str, message: &str, json_output: bool) -> ! {
    if json_output {
        print_json_or_exit(
            &json!({
                "result": "rejected",
                "failureClass": failure_class,
                "message": message,
            }),
            "rejection",
        );
    } else {
        eprintln!("error: {message}");
    }
    std::process::exit(1);
}
