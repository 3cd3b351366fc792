// Suite discovery: walk the given roots, load every file with a recognized
// suite extension, honor exclude globs. Any unreadable or unparsable suite
// file is fatal to the whole run.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use glob::Pattern;
use serde_json::Value;
use walkdir::WalkDir;

use crate::errors::EngineError;
use crate::suite::TestSuite;

const SUITE_EXTENSIONS: &[&str] = &["yml", "yaml", "json", "hcl"];

/// Discover and parse every suite under `paths`, skipping `excludes` globs.
pub fn discover(paths: &[PathBuf], excludes: &[String]) -> Result<Vec<TestSuite>> {
    let patterns = excludes
        .iter()
        .map(|raw| Pattern::new(raw).with_context(|| format!("invalid exclude glob '{raw}'")))
        .collect::<Result<Vec<_>>>()?;

    let mut files = Vec::new();
    for root in paths {
        if root.is_file() {
            if has_suite_extension(root) && !is_excluded(root, &patterns) {
                files.push(root.clone());
            }
            continue;
        }
        for entry in WalkDir::new(root).sort_by_file_name() {
            let entry = entry.with_context(|| format!("failed to walk {}", root.display()))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            if has_suite_extension(path) && !is_excluded(path, &patterns) {
                files.push(path.to_path_buf());
            }
        }
    }
    files.sort();
    files.dedup();

    let mut suites = Vec::with_capacity(files.len());
    for file in &files {
        let suite = load_suite(file)?;
        tracing::debug!(suite = %suite.name, path = %file.display(), "loaded test suite");
        suites.push(suite);
    }
    Ok(suites)
}

/// Parse one suite file, auto-detecting the format by extension.
pub fn load_suite(path: &Path) -> Result<TestSuite> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read test suite {}", path.display()))?;
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();

    let value: Value = match extension.as_str() {
        "yml" | "yaml" => serde_yaml::from_str(&raw)
            .with_context(|| format!("failed to parse {}", path.display()))?,
        "json" => serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse {}", path.display()))?,
        "hcl" => hcl::from_str(&raw)
            .with_context(|| format!("failed to parse {}", path.display()))?,
        other => return Err(EngineError::UnsupportedFormat(other.to_string()).into()),
    };

    TestSuite::from_value(path, value)
}

fn has_suite_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| SUITE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

fn is_excluded(path: &Path, patterns: &[Pattern]) -> bool {
    patterns.iter().any(|pattern| {
        pattern.matches_path(path)
            || path
                .file_name()
                .and_then(|n| n.to_str())
                .map(|n| pattern.matches(n))
                .unwrap_or(false)
    })
}
