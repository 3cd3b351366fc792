// Variable inputs: repeatable `key=value` flags, flat variable files in
// HCL/JSON/YAML selected by extension, and the process environment.
// An unsupported variable file extension is fatal.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};

use crate::errors::EngineError;

/// Parse repeatable `key=value` assignments; entries without '=' are
/// ignored.
pub fn parse_assignments(items: &[String]) -> HashMap<String, String> {
    let mut out = HashMap::new();
    for item in items {
        if let Some((key, value)) = item.split_once('=') {
            out.insert(key.to_string(), value.to_string());
        }
    }
    out
}

/// Load a flat string→string variable file, format detected by extension.
pub fn load_var_file(path: &Path) -> Result<HashMap<String, String>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read variable file {}", path.display()))?;
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();

    match extension.as_str() {
        "hcl" => hcl::from_str(&raw)
            .with_context(|| format!("failed to parse variable file {}", path.display())),
        "json" => serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse variable file {}", path.display())),
        "yml" | "yaml" => serde_yaml::from_str(&raw)
            .with_context(|| format!("failed to parse variable file {}", path.display())),
        other => Err(EngineError::UnsupportedVarFormat(other.to_string()).into()),
    }
}

/// The process environment as a variable map.
pub fn environment() -> HashMap<String, String> {
    std::env::vars().collect()
}
