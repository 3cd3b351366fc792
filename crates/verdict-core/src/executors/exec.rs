// exec executor: runs a script through the platform shell and captures
// exit code, stdout, stderr, and wall-clock duration.

use std::time::Instant;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use tokio::process::Command;

use crate::context::TestCaseContext;
use crate::executor::{Executor, ExecutorResult};

pub const NAME: &str = "exec";

/// Step shape:
///
/// ```yaml
/// - type: exec
///   script: echo hello
///   assertions:
///     - result.code eq 0
/// ```
#[derive(Debug, Default)]
pub struct ExecExecutor;

#[async_trait]
impl Executor for ExecExecutor {
    async fn run(
        &self,
        step: &Value,
        _context: &dyn TestCaseContext,
    ) -> Result<ExecutorResult> {
        let script = step
            .get("script")
            .and_then(Value::as_str)
            .context("exec step requires a 'script' key")?;

        let started = Instant::now();
        let output = shell_command(script)
            .output()
            .await
            .with_context(|| format!("failed to run script '{script}'"))?;

        let mut result = ExecutorResult::new();
        result.insert(
            "result.code".to_string(),
            output.status.code().unwrap_or(-1).to_string(),
        );
        result.insert(
            "result.systemout".to_string(),
            String::from_utf8_lossy(&output.stdout).trim_end().to_string(),
        );
        result.insert(
            "result.systemerr".to_string(),
            String::from_utf8_lossy(&output.stderr).trim_end().to_string(),
        );
        result.insert(
            "result.timeseconds".to_string(),
            format!("{:.6}", started.elapsed().as_secs_f64()),
        );
        Ok(result)
    }

    fn zero_value_result(&self) -> Option<ExecutorResult> {
        let mut result = ExecutorResult::new();
        for key in [
            "result.code",
            "result.systemout",
            "result.systemerr",
            "result.timeseconds",
        ] {
            result.insert(key.to_string(), String::new());
        }
        Some(result)
    }
}

#[cfg(windows)]
fn shell_command(script: &str) -> Command {
    let mut command = Command::new("cmd");
    command.args(["/C", script]);
    command
}

#[cfg(not(windows))]
fn shell_command(script: &str) -> Command {
    let mut command = Command::new("sh");
    command.args(["-c", script]);
    command
}
