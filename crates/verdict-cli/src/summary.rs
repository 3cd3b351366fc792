// Run summaries printed after the report is aggregated.

use verdict_core::report::RunReport;

/// One-line totals summary for --resume.
pub fn resume_line(report: &RunReport) -> String {
    format!(
        "Total:{} TotalOK:{} TotalKO:{} TotalSkipped:{} TotalTestSuite:{}",
        report.total,
        report.total_ok,
        report.total_ko,
        report.total_skipped,
        report.total_test_suites
    )
}

/// One line per failure or error for --resume-failures.
pub fn failure_lines(report: &RunReport) -> Vec<String> {
    let mut lines = Vec::new();
    for suite in &report.test_suites {
        for case in &suite.test_cases {
            for message in case.errors.iter().chain(case.failures.iter()) {
                lines.push(format!("{}/{}: {}", suite.name, case.name, message));
            }
        }
    }
    lines
}
