// Templater: layered `{{.key}}` substitution over opaque documents.
// The variable scope is a flat dotted-key map built by overlaying global,
// suite, and per-case extracted values; later additions overwrite earlier.

use std::collections::{BTreeSet, HashMap};

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde_json::Value;

static PLACEHOLDER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{\{\.([A-Za-z0-9_][A-Za-z0-9_.\-]*)\}\}").expect("valid placeholder regex")
});

/// Variable-substitution engine operating on opaque documents.
///
/// Substitution is a single textual pass: values substituted in are not
/// re-expanded, and placeholders with no binding are left untouched (the
/// pre-run analyzer reports them). Non-string leaves pass through unchanged.
#[derive(Debug, Clone, Default)]
pub struct Templater {
    values: HashMap<String, String>,
}

impl Templater {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge a map under a key prefix; an empty prefix merges at top level.
    /// Later calls overwrite earlier bindings for the same key.
    pub fn add(&mut self, prefix: &str, values: &HashMap<String, String>) {
        for (key, value) in values {
            let full = if prefix.is_empty() {
                key.clone()
            } else {
                format!("{prefix}.{key}")
            };
            self.values.insert(full, value.clone());
        }
    }

    /// Whether a key is currently bound.
    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Snapshot of the current flat scope.
    pub fn values(&self) -> &HashMap<String, String> {
        &self.values
    }

    /// Substitute `{{.key}}` occurrences in a single string.
    pub fn render(&self, input: &str) -> String {
        PLACEHOLDER_RE
            .replace_all(input, |caps: &Captures| match self.values.get(&caps[1]) {
                Some(value) => value.clone(),
                None => caps[0].to_string(),
            })
            .into_owned()
    }

    /// Substitute placeholders in every string leaf of a step document.
    pub fn apply_on_step(&self, step: &Value) -> Value {
        self.apply(step)
    }

    /// Substitute placeholders in every string leaf of a context document.
    pub fn apply_on_context(&self, context: &Value) -> Value {
        self.apply(context)
    }

    fn apply(&self, value: &Value) -> Value {
        match value {
            Value::String(s) => Value::String(self.render(s)),
            Value::Array(items) => Value::Array(items.iter().map(|item| self.apply(item)).collect()),
            Value::Object(map) => Value::Object(
                map.iter()
                    .map(|(key, item)| (key.clone(), self.apply(item)))
                    .collect(),
            ),
            other => other.clone(),
        }
    }
}

/// Collect every `{{.key}}` placeholder left in a document's string leaves.
pub fn placeholders(document: &Value) -> BTreeSet<String> {
    let mut found = BTreeSet::new();
    collect_placeholders(document, &mut found);
    found
}

fn collect_placeholders(value: &Value, found: &mut BTreeSet<String>) {
    match value {
        Value::String(s) => {
            for caps in PLACEHOLDER_RE.captures_iter(s) {
                found.insert(caps[1].to_string());
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_placeholders(item, found);
            }
        }
        Value::Object(map) => {
            for item in map.values() {
                collect_placeholders(item, found);
            }
        }
        _ => {}
    }
}
