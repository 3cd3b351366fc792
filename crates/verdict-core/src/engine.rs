// Engine: the run scheduler. Discovers suite files, runs the pre-run
// variable analysis, dispatches suites onto tokio tasks bounded by a
// semaphore of size `parallel`, and aggregates the run report. Within a
// suite execution is strictly sequential; across suites only the event bus
// and the read-only global scope are shared.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::analyzer;
use crate::discovery;
use crate::event::{EventBus, EventSink};
use crate::registry::Registry;
use crate::report::{self, ReportFormat, RunReport};
use crate::suite::TestSuite;
use crate::suite_runner::run_suite;

/// What becomes of the cases a stop-on-failure abort never ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnexecutedPolicy {
    /// Leave them in the report with empty accumulators.
    Report,
    /// Mark each one skipped and count it.
    Skip,
}

#[derive(Debug, Clone)]
pub(crate) struct RunConfig {
    pub stop_on_failure: bool,
    pub step_timeout: Option<Duration>,
    pub unexecuted: UnexecutedPolicy,
}

pub struct Engine {
    registry: Arc<Registry>,
    bus: EventBus,
    variables: HashMap<String, String>,
    parallel: usize,
    stop_on_failure: bool,
    check_variables: bool,
    step_timeout: Option<Duration>,
    unexecuted: UnexecutedPolicy,
    output_dir: Option<PathBuf>,
    output_format: ReportFormat,
}

impl Engine {
    pub fn new(registry: Registry) -> Self {
        Self {
            registry: Arc::new(registry),
            bus: EventBus::new(),
            variables: HashMap::new(),
            parallel: 1,
            stop_on_failure: false,
            check_variables: true,
            step_timeout: None,
            unexecuted: UnexecutedPolicy::Report,
            output_dir: None,
            output_format: ReportFormat::Xml,
        }
    }

    /// Merge variables into the global scope (later calls overwrite).
    pub fn with_variables(mut self, variables: HashMap<String, String>) -> Self {
        self.variables.extend(variables);
        self
    }

    /// Suite concurrency bound; clamped to at least 1.
    pub fn with_parallel(mut self, parallel: usize) -> Self {
        self.parallel = parallel.max(1);
        self
    }

    pub fn with_stop_on_failure(mut self, stop_on_failure: bool) -> Self {
        self.stop_on_failure = stop_on_failure;
        self
    }

    /// Toggle the pre-run variable analysis.
    pub fn with_check_variables(mut self, check: bool) -> Self {
        self.check_variables = check;
        self
    }

    /// Per-step deadline; expiry is recorded as a case error.
    pub fn with_step_timeout(mut self, timeout: Duration) -> Self {
        self.step_timeout = Some(timeout);
        self
    }

    pub fn with_unexecuted_policy(mut self, policy: UnexecutedPolicy) -> Self {
        self.unexecuted = policy;
        self
    }

    /// Directory for per-suite report files.
    pub fn with_output_dir(mut self, dir: PathBuf) -> Self {
        self.output_dir = Some(dir);
        self
    }

    pub fn with_output_format(mut self, format: ReportFormat) -> Self {
        self.output_format = format;
        self
    }

    /// Attach an event sink; sinks receive every state transition.
    pub fn subscribe(&self, sink: Arc<dyn EventSink>) {
        self.bus.subscribe(sink);
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    /// Run everything: discovery, variable analysis, bounded-parallel suite
    /// execution, and report aggregation.
    pub async fn process(&self, paths: &[PathBuf], excludes: &[String]) -> Result<RunReport> {
        let suites = discovery::discover(paths, excludes)?;
        tracing::info!(suites = suites.len(), "discovered test suites");

        if self.check_variables {
            analyzer::check_variables(&self.registry, &self.variables, &suites)?;
        }

        let suites = self.execute(suites).await?;

        let run_report = RunReport::from_suites(&suites);
        if let Some(dir) = &self.output_dir {
            report::write_suite_reports(dir, &run_report, self.output_format)?;
        }
        Ok(run_report)
    }

    async fn execute(&self, suites: Vec<TestSuite>) -> Result<Vec<TestSuite>> {
        let config = RunConfig {
            stop_on_failure: self.stop_on_failure,
            step_timeout: self.step_timeout,
            unexecuted: self.unexecuted,
        };
        let semaphore = Arc::new(Semaphore::new(self.parallel));

        let mut tasks = JoinSet::new();
        for (index, mut suite) in suites.into_iter().enumerate() {
            let registry = Arc::clone(&self.registry);
            let bus = self.bus.clone();
            let config = config.clone();
            let globals = self.variables.clone();
            let semaphore = Arc::clone(&semaphore);
            tasks.spawn(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .expect("suite semaphore is never closed");
                run_suite(&registry, &bus, &config, &globals, &mut suite).await;
                (index, suite)
            });
        }

        let mut finished = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            finished.push(joined.context("suite task failed")?);
        }
        finished.sort_by_key(|(index, _)| *index);
        Ok(finished.into_iter().map(|(_, suite)| suite).collect())
    }
}
