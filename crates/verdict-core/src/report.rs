// Run reports: aggregate totals plus per-suite and per-case detail,
// serialized as JUnit XML (default), JSON, YAML, or TAP. Suite/case nesting
// and timings are preserved across all formats.

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use quick_junit::{NonSuccessKind, TestCaseStatus};
use serde::Serialize;

use crate::errors::EngineError;
use crate::suite::TestSuite;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Xml,
    Json,
    Yaml,
    Tap,
}

impl ReportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Xml => "xml",
            Self::Json => "json",
            Self::Yaml => "yaml",
            Self::Tap => "tap",
        }
    }
}

impl FromStr for ReportFormat {
    type Err = EngineError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.to_ascii_lowercase().as_str() {
            "xml" => Ok(Self::Xml),
            "json" => Ok(Self::Json),
            "yaml" | "yml" => Ok(Self::Yaml),
            "tap" => Ok(Self::Tap),
            other => Err(EngineError::UnsupportedReportFormat(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CaseStatus {
    Success,
    Failure,
    Skipped,
}

#[derive(Debug, Clone, Serialize)]
pub struct CaseReport {
    pub name: String,
    pub status: CaseStatus,
    pub time_in_seconds: f64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SuiteReport {
    pub name: String,
    pub total: usize,
    pub failures: usize,
    pub errors: usize,
    pub skipped: usize,
    pub time_in_seconds: f64,
    pub test_cases: Vec<CaseReport>,
}

/// Aggregate report for one run. Totals count cases, not individual
/// failures.
#[derive(Debug, Serialize)]
pub struct RunReport {
    pub total: usize,
    pub total_ok: usize,
    pub total_ko: usize,
    pub total_skipped: usize,
    pub total_test_suites: usize,
    pub test_suites: Vec<SuiteReport>,
}

impl RunReport {
    pub fn from_suites(suites: &[TestSuite]) -> Self {
        let test_suites: Vec<SuiteReport> = suites.iter().map(suite_report).collect();
        let mut report = Self {
            total: 0,
            total_ok: 0,
            total_ko: 0,
            total_skipped: 0,
            total_test_suites: test_suites.len(),
            test_suites,
        };
        for suite in &report.test_suites {
            for case in &suite.test_cases {
                report.total += 1;
                match case.status {
                    CaseStatus::Success => report.total_ok += 1,
                    CaseStatus::Failure => report.total_ko += 1,
                    CaseStatus::Skipped => report.total_skipped += 1,
                }
            }
        }
        report
    }
}

fn suite_report(suite: &TestSuite) -> SuiteReport {
    SuiteReport {
        name: suite.name.clone(),
        total: suite.test_cases.len(),
        failures: suite.failures,
        errors: suite.errors,
        skipped: suite.skipped,
        time_in_seconds: suite.time.as_secs_f64(),
        test_cases: suite
            .test_cases
            .iter()
            .map(|case| {
                let status = if case.has_failed() {
                    CaseStatus::Failure
                } else if case.is_skipped() {
                    CaseStatus::Skipped
                } else {
                    CaseStatus::Success
                };
                CaseReport {
                    name: case.name.clone(),
                    status,
                    time_in_seconds: case.time.as_secs_f64(),
                    failures: case.failures.iter().map(|f| f.value.clone()).collect(),
                    errors: case.errors.iter().map(|f| f.value.clone()).collect(),
                    skipped: case.skipped.iter().map(|f| f.value.clone()).collect(),
                }
            })
            .collect(),
    }
}

/// Serialize a report in the given format.
pub fn serialize(report: &RunReport, format: ReportFormat) -> Result<String> {
    match format {
        ReportFormat::Json => {
            serde_json::to_string_pretty(report).context("failed to serialize JSON report")
        }
        ReportFormat::Yaml => {
            serde_yaml::to_string(report).context("failed to serialize YAML report")
        }
        ReportFormat::Xml => to_junit(report)
            .to_string()
            .map_err(|err| anyhow!("failed to serialize JUnit report: {err}")),
        ReportFormat::Tap => Ok(to_tap(report)),
    }
}

/// Write one report file per suite into `dir`, named
/// `test_results_<suite>.<ext>`.
pub fn write_suite_reports(dir: &Path, report: &RunReport, format: ReportFormat) -> Result<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create output directory {}", dir.display()))?;
    for suite in &report.test_suites {
        let single = RunReport {
            total: suite.test_cases.len(),
            total_ok: count_status(suite, CaseStatus::Success),
            total_ko: count_status(suite, CaseStatus::Failure),
            total_skipped: count_status(suite, CaseStatus::Skipped),
            total_test_suites: 1,
            test_suites: vec![suite.clone()],
        };
        let body = serialize(&single, format)?;
        let file = dir.join(format!(
            "test_results_{}.{}",
            sanitize(&single.test_suites[0].name),
            format.extension()
        ));
        std::fs::write(&file, body)
            .with_context(|| format!("failed to write report {}", file.display()))?;
        tracing::debug!(path = %file.display(), "wrote suite report");
    }
    Ok(())
}

fn count_status(suite: &SuiteReport, status: CaseStatus) -> usize {
    suite
        .test_cases
        .iter()
        .filter(|case| case.status == status)
        .count()
}

fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

fn to_junit(report: &RunReport) -> quick_junit::Report {
    let mut junit = quick_junit::Report::new("verdict");
    junit.set_timestamp(Utc::now());
    let mut suites = Vec::with_capacity(report.test_suites.len());
    for suite in &report.test_suites {
        let mut junit_suite = quick_junit::TestSuite::new(suite.name.clone());
        junit_suite.set_time(Duration::from_secs_f64(suite.time_in_seconds));
        for case in &suite.test_cases {
            let status = match case.status {
                CaseStatus::Success => TestCaseStatus::success(),
                CaseStatus::Skipped => {
                    let mut status = TestCaseStatus::skipped();
                    if let Some(reason) = case.skipped.first() {
                        status.set_message(reason.clone());
                    }
                    status
                }
                CaseStatus::Failure => {
                    let kind = if case.errors.is_empty() {
                        NonSuccessKind::Failure
                    } else {
                        NonSuccessKind::Error
                    };
                    let mut status = TestCaseStatus::non_success(kind);
                    if let Some(first) = case.errors.first().or_else(|| case.failures.first()) {
                        status.set_message(first.clone());
                    }
                    status
                }
            };
            let mut junit_case = quick_junit::TestCase::new(case.name.clone(), status);
            junit_case.set_classname(suite.name.clone());
            junit_case.set_time(Duration::from_secs_f64(case.time_in_seconds));
            junit_suite.add_test_case(junit_case);
        }
        suites.push(junit_suite);
    }
    junit.add_test_suites(suites);
    junit
}

fn to_tap(report: &RunReport) -> String {
    let mut out = String::from("TAP version 13\n");
    out.push_str(&format!("1..{}\n", report.total));
    let mut index = 0;
    for suite in &report.test_suites {
        for case in &suite.test_cases {
            index += 1;
            let line = match case.status {
                CaseStatus::Success => format!("ok {} - {}/{}\n", index, suite.name, case.name),
                CaseStatus::Skipped => format!(
                    "ok {} - {}/{} # SKIP {}\n",
                    index,
                    suite.name,
                    case.name,
                    case.skipped.first().map(String::as_str).unwrap_or_default()
                ),
                CaseStatus::Failure => {
                    format!("not ok {} - {}/{}\n", index, suite.name, case.name)
                }
            };
            out.push_str(&line);
            for message in case.errors.iter().chain(case.failures.iter()) {
                out.push_str(&format!("# {message}\n"));
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::suite::{Failure, TestCase};
    use crate::templater::Templater;
    use std::collections::HashMap;

    fn sample_suites() -> Vec<TestSuite> {
        let good = TestCase {
            name: "good".to_string(),
            context: None,
            steps: Vec::new(),
            failures: Vec::new(),
            errors: Vec::new(),
            skipped: Vec::new(),
            time: Duration::from_millis(120),
        };
        let bad = TestCase {
            name: "bad".to_string(),
            context: None,
            steps: Vec::new(),
            failures: vec![Failure::new("assertion 'result.code eq 0' failed")],
            errors: Vec::new(),
            skipped: Vec::new(),
            time: Duration::from_millis(30),
        };
        let off = TestCase {
            name: "off".to_string(),
            context: None,
            steps: Vec::new(),
            failures: Vec::new(),
            errors: Vec::new(),
            skipped: vec![Failure::new("not ready")],
            time: Duration::ZERO,
        };
        vec![TestSuite {
            name: "smoke suite".to_string(),
            path: "smoke.yml".into(),
            vars: HashMap::new(),
            test_cases: vec![good, bad, off],
            failures: 1,
            errors: 0,
            skipped: 1,
            time: Duration::from_millis(150),
            templater: Templater::new(),
        }]
    }

    #[test]
    fn test_totals_count_cases() {
        let suites = sample_suites();
        let report = RunReport::from_suites(&suites);
        assert_eq!(report.total, 3);
        assert_eq!(report.total_ok, 1);
        assert_eq!(report.total_ko, 1);
        assert_eq!(report.total_skipped, 1);
        assert_eq!(report.total_test_suites, 1);
    }

    #[test]
    fn test_json_and_yaml_round_counts() {
        let report = RunReport::from_suites(&sample_suites());
        let json = serialize(&report, ReportFormat::Json).expect("json");
        assert!(json.contains("\"total_ok\": 1"));
        assert!(json.contains("\"smoke suite\""));
        let yaml = serialize(&report, ReportFormat::Yaml).expect("yaml");
        assert!(yaml.contains("total_ko: 1"));
    }

    #[test]
    fn test_junit_xml_structure() {
        let report = RunReport::from_suites(&sample_suites());
        let xml = serialize(&report, ReportFormat::Xml).expect("xml");
        assert!(xml.contains("<testsuite"));
        assert!(xml.contains("smoke suite"));
        assert!(xml.contains("<failure"));
        assert!(xml.contains("<skipped"));
    }

    #[test]
    fn test_tap_output() {
        let report = RunReport::from_suites(&sample_suites());
        let tap = serialize(&report, ReportFormat::Tap).expect("tap");
        assert!(tap.starts_with("TAP version 13\n1..3\n"));
        assert!(tap.contains("ok 1 - smoke suite/good"));
        assert!(tap.contains("not ok 2 - smoke suite/bad"));
        assert!(tap.contains("# SKIP not ready"));
    }

    #[test]
    fn test_write_suite_reports_names_files_after_suites() {
        let report = RunReport::from_suites(&sample_suites());
        let dir = tempfile::tempdir().expect("tempdir");
        write_suite_reports(dir.path(), &report, ReportFormat::Json).expect("writes");
        let file = dir.path().join("test_results_smoke_suite.json");
        let body = std::fs::read_to_string(file).expect("file exists");
        assert!(body.contains("\"total_test_suites\": 1"));
    }

    #[test]
    fn test_format_from_str() {
        assert_eq!("xml".parse::<ReportFormat>().expect("xml"), ReportFormat::Xml);
        assert_eq!("TAP".parse::<ReportFormat>().expect("tap"), ReportFormat::Tap);
        assert!("csv".parse::<ReportFormat>().is_err());
    }
}
