// Pre-run variable analysis: for each suite, compute the variables its
// steps still require after templating and the variables its executors and
// extraction patterns will provide. Anything required but satisfied nowhere
// aborts the run before a single executor fires.

use std::collections::{BTreeSet, HashMap};

use serde_json::Value;

use crate::errors::EngineError;
use crate::extract;
use crate::registry::Registry;
use crate::suite::TestSuite;
use crate::templater::{self, Templater};

/// Check every suite; aggregate unsatisfied variables across all of them.
///
/// Executor types the registry cannot resolve contribute nothing to the
/// provided set; the lookup failure itself surfaces at run time as a case
/// error, not here.
pub fn check_variables(
    registry: &Registry,
    globals: &HashMap<String, String>,
    suites: &[TestSuite],
) -> Result<(), EngineError> {
    let mut missing = BTreeSet::new();

    for suite in suites {
        let mut templater = Templater::new();
        templater.add("", globals);
        templater.add("", &suite.vars);

        let mut required = BTreeSet::new();
        let mut provided = BTreeSet::new();

        for case in &suite.test_cases {
            if case.is_skipped() {
                continue;
            }
            for step in &case.steps {
                let rendered = templater.apply_on_step(step);

                if let Some(type_name) = step.get("type").and_then(Value::as_str) {
                    if let Ok(executor) = registry.executor(type_name) {
                        if let Some(zero) = executor.zero_value_result() {
                            for key in zero.keys() {
                                provided.insert(format!("{}.{}", case.name, key));
                            }
                        }
                    }
                }

                if let Some(entries) = rendered.get("extracts").and_then(Value::as_object) {
                    for pattern in entries.values() {
                        if let Some(pattern) = pattern.as_str() {
                            for name in extract::pattern_variables(pattern) {
                                provided.insert(format!("{}.{}", case.name, name));
                            }
                        }
                    }
                }

                // extraction patterns use `{{name=regex}}` tokens, not
                // placeholders; keep that subtree out of the required scan
                let mut scan = rendered;
                if let Some(map) = scan.as_object_mut() {
                    map.remove("extracts");
                }
                for key in templater::placeholders(&scan) {
                    required.insert(key);
                }
            }
        }

        for key in required {
            if !provided.contains(&key) && !templater.contains(&key) {
                tracing::warn!(suite = %suite.name, variable = %key, "missing variable");
                missing.insert(key);
            }
        }
    }

    if missing.is_empty() {
        Ok(())
    } else {
        Err(EngineError::MissingVariables(missing.into_iter().collect()))
    }
}
