// Helpers for the opaque step/context documents.
// Documents are `serde_json::Value` trees regardless of the on-disk format;
// the engine preserves them without knowing their schema.

use std::collections::HashMap;

use serde_json::Value;

/// Flatten a nested `vars` block into dotted string keys.
///
/// Scalars stringify, maps recurse with `parent.child` keys, sequences use
/// the element index as the key segment. `null` flattens to an empty string.
pub fn flatten_vars(vars: &HashMap<String, Value>) -> HashMap<String, String> {
    let mut out = HashMap::new();
    for (key, value) in vars {
        flatten_into(key, value, &mut out);
    }
    out
}

fn flatten_into(key: &str, value: &Value, out: &mut HashMap<String, String>) {
    match value {
        Value::Object(map) => {
            for (child, child_value) in map {
                flatten_into(&format!("{key}.{child}"), child_value, out);
            }
        }
        Value::Array(items) => {
            for (index, item) in items.iter().enumerate() {
                flatten_into(&format!("{key}.{index}"), item, out);
            }
        }
        scalar => {
            out.insert(key.to_string(), stringify(scalar));
        }
    }
}

/// Render a scalar document leaf as a plain string.
pub fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn vars(value: Value) -> HashMap<String, Value> {
        serde_json::from_value(value).expect("vars map")
    }

    #[test]
    fn test_flatten_scalars() {
        let flat = flatten_vars(&vars(json!({"a": "x", "b": 2, "c": true})));
        assert_eq!(flat.get("a"), Some(&"x".to_string()));
        assert_eq!(flat.get("b"), Some(&"2".to_string()));
        assert_eq!(flat.get("c"), Some(&"true".to_string()));
    }

    #[test]
    fn test_flatten_nested_map() {
        let flat = flatten_vars(&vars(json!({"db": {"host": "localhost", "port": 5432}})));
        assert_eq!(flat.get("db.host"), Some(&"localhost".to_string()));
        assert_eq!(flat.get("db.port"), Some(&"5432".to_string()));
    }

    #[test]
    fn test_flatten_sequence() {
        let flat = flatten_vars(&vars(json!({"hosts": ["a", "b"]})));
        assert_eq!(flat.get("hosts.0"), Some(&"a".to_string()));
        assert_eq!(flat.get("hosts.1"), Some(&"b".to_string()));
    }

    #[test]
    fn test_flatten_null() {
        let flat = flatten_vars(&vars(json!({"empty": null})));
        assert_eq!(flat.get("empty"), Some(&String::new()));
    }
}
