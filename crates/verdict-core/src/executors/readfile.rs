// readfile executor: reads every file matching a glob and returns the
// concatenated content and total size.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde_json::Value;

use crate::context::TestCaseContext;
use crate::executor::{Executor, ExecutorResult};

pub const NAME: &str = "readfile";

/// Step shape:
///
/// ```yaml
/// - type: readfile
///   path: fixtures/*.txt
///   assertions:
///     - result.content contains ready
/// ```
#[derive(Debug, Default)]
pub struct ReadFileExecutor;

#[async_trait]
impl Executor for ReadFileExecutor {
    async fn run(
        &self,
        step: &Value,
        _context: &dyn TestCaseContext,
    ) -> Result<ExecutorResult> {
        let pattern = step
            .get("path")
            .and_then(Value::as_str)
            .context("readfile step requires a 'path' key")?;

        let paths = glob::glob(pattern)
            .with_context(|| format!("invalid readfile glob '{pattern}'"))?;

        let mut content = String::new();
        let mut size = 0u64;
        let mut matched = false;
        for path in paths {
            let path = path.with_context(|| format!("failed to expand glob '{pattern}'"))?;
            let data = tokio::fs::read_to_string(&path)
                .await
                .with_context(|| format!("failed to read {}", path.display()))?;
            size += data.len() as u64;
            content.push_str(&data);
            matched = true;
        }
        if !matched {
            bail!("readfile glob '{pattern}' matched no file");
        }

        let mut result = ExecutorResult::new();
        result.insert("result.content".to_string(), content);
        result.insert("result.size".to_string(), size.to_string());
        Ok(result)
    }

    fn zero_value_result(&self) -> Option<ExecutorResult> {
        let mut result = ExecutorResult::new();
        result.insert("result.content".to_string(), String::new());
        result.insert("result.size".to_string(), String::new());
        Some(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::DefaultContext;
    use serde_json::json;
    use std::fs;

    #[tokio::test]
    async fn test_reads_matching_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join("a.txt"), "hello ").expect("write");
        fs::write(dir.path().join("b.txt"), "world").expect("write");
        let pattern = dir.path().join("*.txt");

        let executor = ReadFileExecutor;
        let context = DefaultContext::default();
        let result = executor
            .run(
                &json!({"type": "readfile", "path": pattern.to_string_lossy()}),
                &context,
            )
            .await
            .expect("runs");
        let content = result.get("result.content").expect("content");
        assert!(content.contains("hello"));
        assert!(content.contains("world"));
        assert_eq!(result.get("result.size"), Some(&"11".to_string()));
    }

    #[tokio::test]
    async fn test_no_match_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let pattern = dir.path().join("*.none");

        let executor = ReadFileExecutor;
        let context = DefaultContext::default();
        let err = executor
            .run(
                &json!({"type": "readfile", "path": pattern.to_string_lossy()}),
                &context,
            )
            .await
            .expect_err("no files");
        assert!(err.to_string().contains("matched no file"));
    }

    #[tokio::test]
    async fn test_missing_path_key_is_an_error() {
        let executor = ReadFileExecutor;
        let context = DefaultContext::default();
        let err = executor
            .run(&json!({"type": "readfile"}), &context)
            .await
            .expect_err("no path");
        assert!(err.to_string().contains("requires a 'path' key"));
    }
}
