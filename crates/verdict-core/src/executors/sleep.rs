// sleep executor: pauses the owning worker for a fixed duration.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;

use crate::context::TestCaseContext;
use crate::executor::{Executor, ExecutorResult};

pub const NAME: &str = "sleep";

/// Step shape:
///
/// ```yaml
/// - type: sleep
///   duration_ms: 100
/// ```
#[derive(Debug, Default)]
pub struct SleepExecutor;

#[async_trait]
impl Executor for SleepExecutor {
    async fn run(
        &self,
        step: &Value,
        _context: &dyn TestCaseContext,
    ) -> Result<ExecutorResult> {
        let duration_ms = step
            .get("duration_ms")
            .and_then(Value::as_u64)
            .context("sleep step requires a numeric 'duration_ms' key")?;

        tokio::time::sleep(Duration::from_millis(duration_ms)).await;

        let mut result = ExecutorResult::new();
        result.insert("result.duration_ms".to_string(), duration_ms.to_string());
        Ok(result)
    }

    fn zero_value_result(&self) -> Option<ExecutorResult> {
        let mut result = ExecutorResult::new();
        result.insert("result.duration_ms".to_string(), String::new());
        Some(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::DefaultContext;
    use serde_json::json;
    use std::time::Instant;

    #[tokio::test]
    async fn test_sleeps_at_least_the_requested_duration() {
        let executor = SleepExecutor;
        let context = DefaultContext::default();
        let started = Instant::now();
        let result = executor
            .run(&json!({"type": "sleep", "duration_ms": 20}), &context)
            .await
            .expect("runs");
        assert!(started.elapsed() >= Duration::from_millis(20));
        assert_eq!(result.get("result.duration_ms"), Some(&"20".to_string()));
    }

    #[tokio::test]
    async fn test_missing_duration_is_an_error() {
        let executor = SleepExecutor;
        let context = DefaultContext::default();
        let err = executor
            .run(&json!({"type": "sleep"}), &context)
            .await
            .expect_err("no duration");
        assert!(err.to_string().contains("duration_ms"));
    }
}
