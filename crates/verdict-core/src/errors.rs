// Engine error taxonomy.
// Assertion violations are recorded as case failures and never pass through
// this enum; these are the execution and pre-run errors.

use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    /// A step declared a `type` no executor is registered for.
    #[error("unknown executor type '{0}'")]
    UnknownExecutor(String),

    /// A case context block declared a `type` no factory is registered for.
    #[error("unknown context type '{0}'")]
    UnknownContext(String),

    /// A step ran past the configured per-step deadline.
    #[error("step timed out after {0:?}")]
    Timeout(Duration),

    /// A suite file carries an extension no parser is registered for.
    #[error("unsupported test suite format '{0}'")]
    UnsupportedFormat(String),

    /// A variable file carries an extension no parser is registered for.
    #[error("unsupported variable file format '{0}'")]
    UnsupportedVarFormat(String),

    /// An output format name the report serializer does not know.
    #[error("unsupported output format '{0}'")]
    UnsupportedReportFormat(String),

    /// Variables required by the suites but satisfied nowhere, aggregated
    /// across the whole run by the pre-run analyzer.
    #[error("missing variables: {}", .0.join(", "))]
    MissingVariables(Vec<String>),
}
