use ch_rulebook::report::{CheckResult, RunReport, RunStatus, Severity, Violation};

fn violation(severity: Severity) -> Violation {
    Violation {
        code: "structure/missing-title".to_string(),
        message: "Rule has no title".to_string(),
        severity,
        file: None,
        rule_title: None,
        example_label: None,
        detail: None,
        remediation: None,
    }
}

fn check_result(violations: Vec<Violation>) -> CheckResult {
    CheckResult {
        check_name: "structure".to_string(),
        violations,
        files_checked: 3,
        skipped: false,
        skip_reason: None,
        duration_ms: 5,
    }
}

#[test]
fn run_with_no_violations_passes() {
    let report = RunReport::from_results("rules", vec![check_result(vec![])], false);
    assert!(report.passed);
    assert!(matches!(report.status, RunStatus::Passed));
    assert_eq!(report.files_checked, 3);
}

#[test]
fn any_error_fails_the_run() {
    let report = RunReport::from_results(
        "rules",
        vec![check_result(vec![violation(Severity::Error)])],
        false,
    );
    assert!(!report.passed);
    assert!(matches!(report.status, RunStatus::Failed));
    assert_eq!(report.error_count(), 1);
}

#[test]
fn warnings_alone_do_not_fail_without_strict() {
    let report = RunReport::from_results(
        "rules",
        vec![check_result(vec![violation(Severity::Warning)])],
        false,
    );
    assert!(!report.passed);
    assert!(matches!(report.status, RunStatus::Warning));
}

#[test]
fn strict_mode_promotes_warnings_to_failure() {
    let report = RunReport::from_results(
        "rules",
        vec![check_result(vec![violation(Severity::Warning)])],
        true,
    );
    assert!(matches!(report.status, RunStatus::Failed));
}

#[test]
fn info_findings_never_affect_status() {
    let report = RunReport::from_results(
        "rules",
        vec![check_result(vec![violation(Severity::Info)])],
        true,
    );
    assert!(report.passed);
}

#[test]
fn violations_aggregate_across_checks() {
    let report = RunReport::from_results(
        "rules",
        vec![
            check_result(vec![violation(Severity::Error)]),
            check_result(vec![violation(Severity::Warning), violation(Severity::Info)]),
        ],
        false,
    );
    assert_eq!(report.violations.len(), 3);
    assert_eq!(report.count_by_severity(), (1, 1, 1));
    assert_eq!(report.files_checked, 6);
}

#[test]
fn skipped_check_result_carries_its_reason() {
    let result = CheckResult::skipped("sql", "unsupported platform: freebsd/x86_64");
    assert!(result.skipped);
    assert_eq!(
        result.skip_reason.as_deref(),
        Some("unsupported platform: freebsd/x86_64")
    );
    assert!(result.violations.is_empty());

    // A skipped check never fails the run.
    let report = RunReport::from_results("rules", vec![result], false);
    assert!(report.passed);
}
