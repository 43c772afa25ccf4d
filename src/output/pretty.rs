//! Human-readable colored text formatter.
//!
//! Produces a terminal-friendly report with ANSI color codes, showing
//! per-check statuses, individual violations with source locations, and a
//! one-line summary.

use crate::report::{RunReport, RunStatus, Severity};
use colored::Colorize;

/// Formats a [`RunReport`] as human-readable, ANSI-colored text.
///
/// Sections rendered (in order):
/// 1. **Header** — rules directory and timestamp.
/// 2. **Checks** — per-check pass/fail/skip status.
/// 3. **Violations** — severity, code, location, rule/example context.
/// 4. **Summary** — overall status and severity counts.
pub fn format(report: &RunReport) -> String {
    let mut out = String::new();

    // Header
    out.push_str(&format!(
        "\n{}\n",
        format!("  Rulebook Check: {}  ", report.target)
            .bold()
            .on_blue()
            .white()
    ));
    out.push_str(&format!("  Timestamp: {}\n\n", report.timestamp));

    // Per-check results
    out.push_str(&format!("{}\n", "Checks".bold().underline()));
    for result in &report.check_results {
        let icon = if result.skipped {
            "SKIP".dimmed().to_string()
        } else {
            // Single pass: determine both flags simultaneously.
            let (has_err, has_warn) =
                result
                    .violations
                    .iter()
                    .fold((false, false), |(e, w), v| match v.severity {
                        Severity::Error => (true, w),
                        Severity::Warning => (e, true),
                        Severity::Info => (e, w),
                    });
            if has_err {
                "FAIL".red().bold().to_string()
            } else if has_warn {
                "WARN".yellow().bold().to_string()
            } else {
                "PASS".green().bold().to_string()
            }
        };

        let detail = if result.skipped {
            result
                .skip_reason
                .as_deref()
                .unwrap_or("skipped")
                .dimmed()
                .to_string()
        } else {
            format!(
                "{} violations, {} files checked",
                result.violations.len(),
                result.files_checked
            )
        };

        out.push_str(&format!(
            "  [{icon}] {name:<16} {detail}\n",
            name = result.check_name,
        ));
    }
    out.push('\n');

    // Violations
    if !report.violations.is_empty() {
        out.push_str(&format!("{}\n", "Violations".bold().underline()));
        for v in &report.violations {
            let severity_str = match v.severity {
                Severity::Error => "ERROR".red().bold().to_string(),
                Severity::Warning => " WARN".yellow().bold().to_string(),
                Severity::Info => " INFO".blue().to_string(),
            };

            out.push_str(&format!(
                "  [{severity_str}] {code:<32} {message}\n",
                code = v.code.dimmed(),
                message = v.message,
            ));

            // Enough context to locate the problem without verbosity flags:
            // file, rule title, and example label on one dimmed line.
            let mut context = Vec::new();
            if let Some(file) = &v.file {
                context.push(file.display().to_string());
            }
            if let Some(title) = &v.rule_title {
                context.push(format!("rule: {title}"));
            }
            if let Some(label) = &v.example_label {
                context.push(format!("example: {label}"));
            }
            if !context.is_empty() {
                out.push_str(&format!("         {}\n", context.join("  ·  ").dimmed()));
            }
            if let Some(detail) = &v.detail {
                for line in detail.lines().take(4) {
                    out.push_str(&format!("         > {}\n", line.dimmed()));
                }
            }
        }
        out.push('\n');
    }

    // Summary
    let status_str = match report.status {
        RunStatus::Passed => "PASSED".green().bold().to_string(),
        RunStatus::Warning => "WARNING".yellow().bold().to_string(),
        RunStatus::Failed => "FAILED".red().bold().to_string(),
    };

    let (errors, warnings, info) = report.count_by_severity();
    out.push_str(&format!(
        "Result: {status_str}  |  {errors} errors, {warnings} warnings, {info} info\n",
    ));

    out
}
