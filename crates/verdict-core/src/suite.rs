// Test suite model: a named ordered collection of cases with shared vars.
// Parsed once at discovery, mutated only by its own suite run, frozen after
// reporting. Step documents stay opaque; only `type`, `assertions`, and
// `extracts` are reserved keys.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;

use crate::document;
use crate::templater::Templater;

/// One recorded assertion failure, execution error, or skip reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub value: String,
}

impl Failure {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
        }
    }
}

#[derive(Debug)]
pub struct TestCase {
    pub name: String,
    /// Optional opaque context block; `type` selects the factory.
    pub context: Option<Value>,
    /// Opaque step documents in execution order.
    pub steps: Vec<Value>,
    /// Assertion failures, in evaluation order.
    pub failures: Vec<Failure>,
    /// Execution errors; the first one terminates the case.
    pub errors: Vec<Failure>,
    /// Skip reasons; non-empty means the case never runs.
    pub skipped: Vec<Failure>,
    pub time: Duration,
}

impl TestCase {
    pub fn is_skipped(&self) -> bool {
        !self.skipped.is_empty()
    }

    pub fn has_failed(&self) -> bool {
        !self.failures.is_empty() || !self.errors.is_empty()
    }
}

#[derive(Debug)]
pub struct TestSuite {
    pub name: String,
    /// Source file the suite was parsed from.
    pub path: PathBuf,
    /// Suite vars, flattened to dotted string keys.
    pub vars: HashMap<String, String>,
    pub test_cases: Vec<TestCase>,
    /// Aggregates; monotone once execution starts.
    pub failures: usize,
    pub errors: usize,
    pub skipped: usize,
    pub time: Duration,
    /// Scope snapshot of the last run, including per-case extractions.
    pub templater: Templater,
}

impl TestSuite {
    pub fn has_failed(&self) -> bool {
        self.failures > 0 || self.errors > 0
    }

    /// Build a suite from a parsed document.
    pub fn from_value(path: &Path, value: Value) -> Result<Self> {
        let file: SuiteFile = serde_json::from_value(value)
            .with_context(|| format!("invalid test suite document {}", path.display()))?;

        let test_cases = file
            .testcases
            .into_iter()
            .map(|case| TestCase {
                name: case.name,
                context: case.context,
                steps: case.steps,
                failures: Vec::new(),
                errors: Vec::new(),
                skipped: case.skip.into_iter().map(Failure::new).collect(),
                time: Duration::ZERO,
            })
            .collect();

        Ok(Self {
            name: file.name,
            path: path.to_path_buf(),
            vars: document::flatten_vars(&file.vars),
            test_cases,
            failures: 0,
            errors: 0,
            skipped: 0,
            time: Duration::ZERO,
            templater: Templater::new(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct SuiteFile {
    name: String,
    #[serde(default)]
    vars: HashMap<String, Value>,
    #[serde(default)]
    testcases: Vec<CaseFile>,
}

#[derive(Debug, Deserialize)]
struct CaseFile {
    name: String,
    #[serde(default)]
    context: Option<Value>,
    #[serde(default)]
    skip: Vec<String>,
    #[serde(default)]
    steps: Vec<Value>,
}
