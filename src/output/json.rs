//! JSON output formatter.
//!
//! Produces a pretty-printed JSON document containing run metadata, a
//! severity summary, per-check results, and the full violation list.

use crate::report::RunReport;

#[derive(serde::Serialize)]
struct JsonOutput<'a> {
    target: &'a str,
    timestamp: &'a str,
    status: &'a crate::report::RunStatus,
    passed: bool,
    summary: Summary,
    checks: &'a [crate::report::CheckResult],
    violations: &'a [crate::report::Violation],
}

#[derive(serde::Serialize)]
struct Summary {
    errors: usize,
    warnings: usize,
    info: usize,
}

/// Formats a [`RunReport`] as pretty-printed JSON.
///
/// # Panics
///
/// Panics if the report cannot be serialized (should not happen with valid data).
pub fn format(report: &RunReport) -> String {
    let output = JsonOutput {
        target: &report.target,
        timestamp: &report.timestamp,
        status: &report.status,
        passed: report.passed,
        summary: {
            // Single pass over violations instead of three separate iterations.
            let (errors, warnings, info) = report.count_by_severity();
            Summary {
                errors,
                warnings,
                info,
            }
        },
        checks: &report.check_results,
        violations: &report.violations,
    };

    serde_json::to_string_pretty(&output).expect("JSON serialization failed")
}
