use std::fmt;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Info => write!(f, "info"),
        }
    }
}

/// One validation finding, with enough context to locate and fix the
/// problem without re-running with extra verbosity.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Violation {
    /// Stable code in `check/slug` form (e.g. `sql/denied-file-function`).
    pub code: String,
    pub message: String,
    pub severity: Severity,
    pub file: Option<PathBuf>,
    /// Title of the offending rule, when the violation is rule-scoped.
    pub rule_title: Option<String>,
    /// Label of the offending example, when the violation is example-scoped.
    pub example_label: Option<String>,
    /// Underlying error text — verbatim engine stderr, probe failure cause.
    pub detail: Option<String>,
    pub remediation: Option<String>,
}

#[derive(Debug, serde::Serialize)]
pub struct CheckResult {
    pub check_name: String,
    pub violations: Vec<Violation>,
    pub files_checked: usize,
    pub skipped: bool,
    pub skip_reason: Option<String>,
    pub duration_ms: u64,
}

impl CheckResult {
    pub fn skipped(name: &str, reason: &str) -> Self {
        CheckResult {
            check_name: name.to_string(),
            violations: vec![],
            files_checked: 0,
            skipped: true,
            skip_reason: Some(reason.to_string()),
            duration_ms: 0,
        }
    }
}

#[derive(Debug, serde::Serialize)]
pub struct RunReport {
    /// Display path of the rules directory that was checked.
    pub target: String,
    pub timestamp: String,
    pub status: RunStatus,
    pub files_checked: usize,
    pub check_results: Vec<CheckResult>,
    pub violations: Vec<Violation>,
    pub passed: bool,
}

impl RunReport {
    pub fn from_results(target: &str, results: Vec<CheckResult>, strict: bool) -> Self {
        let files_checked: usize = results.iter().map(|r| r.files_checked).sum();

        let violations: Vec<Violation> = results
            .iter()
            .flat_map(|r| r.violations.iter().cloned())
            .collect();

        let status = compute_status(&violations, strict);
        let passed = matches!(status, RunStatus::Passed);

        RunReport {
            target: target.to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            status,
            files_checked,
            check_results: results,
            violations,
            passed,
        }
    }

    pub fn error_count(&self) -> usize {
        self.violations
            .iter()
            .filter(|v| v.severity == Severity::Error)
            .count()
    }

    /// Count errors, warnings, and info findings in a single pass.
    ///
    /// Returns `(errors, warnings, info)`. Prefer this over three separate
    /// filter-count passes when all values are needed at the same time.
    pub fn count_by_severity(&self) -> (usize, usize, usize) {
        self.violations
            .iter()
            .fold((0, 0, 0), |(e, w, i), v| match v.severity {
                Severity::Error => (e + 1, w, i),
                Severity::Warning => (e, w + 1, i),
                Severity::Info => (e, w, i + 1),
            })
    }
}

#[derive(Debug, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Passed,
    Warning,
    Failed,
}

fn compute_status(violations: &[Violation], strict: bool) -> RunStatus {
    // Single pass: track both flags simultaneously.
    let (has_errors, has_warnings) =
        violations
            .iter()
            .fold((false, false), |(e, w), v| match v.severity {
                Severity::Error => (true, w),
                Severity::Warning => (e, true),
                Severity::Info => (e, w),
            });

    if has_errors {
        RunStatus::Failed
    } else if has_warnings {
        if strict {
            RunStatus::Failed
        } else {
            RunStatus::Warning
        }
    } else {
        RunStatus::Passed
    }
}
