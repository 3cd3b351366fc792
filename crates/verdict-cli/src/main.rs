// verdict: run declarative integration test suites.
// Parses the command line, wires up the engine with the built-in executors,
// attaches the progress renderer, and maps the run outcome onto exit codes:
// 0 success, 1 operational error, 2 test failures under --strict.

mod progress;
mod summary;

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use verdict_core::report::{self, ReportFormat};
use verdict_core::{executors, vars, Engine, Registry, UnexecutedPolicy};

use crate::progress::{Details, ProgressRenderer};

#[derive(Debug, Parser)]
#[command(name = "verdict", about = "Declarative integration test runner", version)]
struct Cli {
    /// Roots to discover test suites under.
    #[arg(default_value = ".")]
    paths: Vec<PathBuf>,

    /// Inject a variable, e.g. --var token=abc (repeatable).
    #[arg(long = "var", value_name = "KEY=VALUE")]
    var: Vec<String>,

    /// Load variables from an hcl/json/yaml file.
    #[arg(long = "var-from-file", value_name = "FILE")]
    var_from_file: Option<PathBuf>,

    /// Glob of suite files to skip (repeatable).
    #[arg(long, value_name = "GLOB")]
    exclude: Vec<String>,

    /// Output format: xml, json, yaml, or tap.
    #[arg(long, default_value = "xml")]
    format: String,

    /// Merge the process environment into the variable scope.
    #[arg(long)]
    env: bool,

    /// Exit with code 2 if any test fails.
    #[arg(long)]
    strict: bool,

    /// Halt a suite on its first failing case.
    #[arg(long = "stop-on-failure")]
    stop_on_failure: bool,

    /// Mark cases never reached after --stop-on-failure as skipped.
    #[arg(long = "skip-unexecuted")]
    skip_unexecuted: bool,

    /// Skip the pre-run variable analysis.
    #[arg(long = "no-check-variables")]
    no_check_variables: bool,

    /// Number of test suites run in parallel.
    #[arg(long, default_value_t = 1)]
    parallel: usize,

    /// Per-step deadline in seconds.
    #[arg(long = "step-timeout", value_name = "SECONDS")]
    step_timeout: Option<u64>,

    /// Directory for per-suite report files.
    #[arg(long = "output-dir", value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// Verbosity of progress rendering.
    #[arg(long, value_enum, default_value_t = Details::Low)]
    details: Details,

    /// Print a one-line totals summary.
    #[arg(long)]
    resume: bool,

    /// Print every failure and error with its suite and case.
    #[arg(long = "resume-failures")]
    resume_failures: bool,

    /// Log level: debug, info, or warn.
    #[arg(long, default_value = "warn")]
    log: String,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log.clone()));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    match run(cli).await {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("{err:#}");
            std::process::exit(1);
        }
    }
}

async fn run(cli: Cli) -> Result<i32> {
    let format: ReportFormat = cli.format.parse()?;

    let mut variables = HashMap::new();
    if cli.env {
        variables.extend(vars::environment());
    }
    variables.extend(vars::parse_assignments(&cli.var));
    if let Some(file) = &cli.var_from_file {
        variables.extend(vars::load_var_file(file)?);
    }

    let mut registry = Registry::new();
    executors::register_builtins(&mut registry);

    let mut engine = Engine::new(registry)
        .with_variables(variables)
        .with_parallel(cli.parallel)
        .with_stop_on_failure(cli.stop_on_failure)
        .with_check_variables(!cli.no_check_variables)
        .with_output_format(format);
    if cli.skip_unexecuted {
        engine = engine.with_unexecuted_policy(UnexecutedPolicy::Skip);
    }
    if let Some(seconds) = cli.step_timeout {
        engine = engine.with_step_timeout(Duration::from_secs(seconds));
    }
    if let Some(dir) = &cli.output_dir {
        engine = engine.with_output_dir(dir.clone());
    }

    engine.subscribe(Arc::new(ProgressRenderer::new(cli.details)));

    let run_report = engine.process(&cli.paths, &cli.exclude).await?;

    if cli.resume {
        println!("{}", summary::resume_line(&run_report));
    }
    if cli.resume_failures {
        for line in summary::failure_lines(&run_report) {
            println!("{line}");
        }
    }
    if cli.output_dir.is_none() && !cli.resume && !cli.resume_failures {
        println!("{}", report::serialize(&run_report, format)?);
    }

    if cli.strict && run_report.total_ko > 0 {
        return Ok(2);
    }
    Ok(0)
}
