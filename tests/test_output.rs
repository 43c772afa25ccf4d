use ch_rulebook::output::{format_report, OutputFormat};
use ch_rulebook::report::{CheckResult, RunReport, Severity, Violation};
use std::path::PathBuf;

fn sample_report() -> RunReport {
    let violation = Violation {
        code: "sql/denied-file-function".to_string(),
        message: "file() table function — file-system access from example SQL".to_string(),
        severity: Severity::Error,
        file: Some(PathBuf::from("rules/ingest-denied-function.md")),
        rule_title: Some("Stage imports through a staging table".to_string()),
        example_label: Some("Incorrect".to_string()),
        detail: None,
        remediation: Some("Replace file() with an inline table".to_string()),
    };
    let result = CheckResult {
        check_name: "sql".to_string(),
        violations: vec![violation],
        files_checked: 4,
        skipped: false,
        skip_reason: None,
        duration_ms: 12,
    };
    RunReport::from_results("rules", vec![result], false)
}

#[test]
fn pretty_output_shows_violation_and_context() {
    let text = format_report(&sample_report(), &OutputFormat::Pretty);
    assert!(text.contains("sql/denied-file-function"));
    assert!(text.contains("rule: Stage imports through a staging table"));
    assert!(text.contains("example: Incorrect"));
    assert!(text.contains("FAILED"));
}

#[test]
fn json_output_is_valid_and_carries_the_pass_flag() {
    let text = format_report(&sample_report(), &OutputFormat::Json);
    let parsed: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(parsed["passed"], serde_json::Value::Bool(false));
    assert_eq!(parsed["summary"]["errors"], 1);
    assert_eq!(
        parsed["violations"][0]["code"],
        "sql/denied-file-function"
    );
}

#[test]
fn sarif_output_is_valid_2_1_0() {
    let text = format_report(&sample_report(), &OutputFormat::Sarif);
    let parsed: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(parsed["version"], "2.1.0");
    assert_eq!(
        parsed["runs"][0]["results"][0]["ruleId"],
        "sql/denied-file-function"
    );
    assert_eq!(parsed["runs"][0]["tool"]["driver"]["name"], "ch-rulebook");
}
