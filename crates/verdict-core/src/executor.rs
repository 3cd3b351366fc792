// Executor seam: one executor performs one kind of external interaction.
// Polymorphism is by capability set: `run` is required, `zero_value_result`
// is an optional capability (defaulting to `None`) consumed only by the
// pre-run variable analyzer.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde_json::Value;

use crate::context::TestCaseContext;

/// Flat executor output: lowercase dotted keys to stringified values,
/// e.g. `result.code` or `result.systemout`.
pub type ExecutorResult = BTreeMap<String, String>;

#[async_trait]
pub trait Executor: Send + Sync {
    /// Execute a rendered step document.
    ///
    /// Errors returned here terminate the owning case; assertion evaluation
    /// happens in the step runner, not in executors.
    async fn run(
        &self,
        step: &Value,
        context: &dyn TestCaseContext,
    ) -> anyhow::Result<ExecutorResult>;

    /// A template holding every key this executor may produce, used by the
    /// variable analyzer to compute the provided-variable set. `None` opts
    /// out of analysis.
    fn zero_value_result(&self) -> Option<ExecutorResult> {
        None
    }
}

impl std::fmt::Debug for dyn Executor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "dyn Executor")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::DefaultContext;

    struct Minimal;

    #[async_trait]
    impl Executor for Minimal {
        async fn run(
            &self,
            _step: &Value,
            _context: &dyn TestCaseContext,
        ) -> anyhow::Result<ExecutorResult> {
            Ok(ExecutorResult::new())
        }
    }

    #[tokio::test]
    async fn test_zero_value_result_defaults_to_none() {
        let executor = Minimal;
        assert!(executor.zero_value_result().is_none());
        let context = DefaultContext::default();
        let result = executor.run(&Value::Null, &context).await.expect("runs");
        assert!(result.is_empty());
    }
}
