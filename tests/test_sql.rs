use std::path::Path;
use std::sync::Mutex;

use ch_rulebook::checks::sql::{scan_denied, strip_sql_comments, validate_rules};
use ch_rulebook::engine::{EngineError, SqlEngine};
use ch_rulebook::rule::{Example, Rule};

/// Records every snippet submitted and returns a programmed response.
struct FakeEngine {
    submitted: Mutex<Vec<String>>,
    error: Option<String>,
}

impl FakeEngine {
    fn ok() -> Self {
        FakeEngine {
            submitted: Mutex::new(vec![]),
            error: None,
        }
    }

    fn failing(stderr: &str) -> Self {
        FakeEngine {
            submitted: Mutex::new(vec![]),
            error: Some(stderr.to_string()),
        }
    }

    fn submissions(&self) -> Vec<String> {
        self.submitted.lock().unwrap().clone()
    }
}

impl SqlEngine for FakeEngine {
    fn validate(&self, sql: &str) -> Result<(), EngineError> {
        self.submitted.lock().unwrap().push(sql.to_string());
        match &self.error {
            Some(stderr) => Err(EngineError::Query(stderr.clone())),
            None => Ok(()),
        }
    }
}

fn rule_with_sql(label: &str, code: &str) -> Rule {
    Rule {
        id: "query-test".to_string(),
        file: Path::new("rules/query-test.md").to_path_buf(),
        title: "Test rule".to_string(),
        impact: Some(ch_rulebook::rule::Impact::Medium),
        impact_raw: Some("MEDIUM".to_string()),
        impact_description: None,
        tags: vec![],
        explanation: "Prose.".to_string(),
        examples: vec![Example {
            label: label.to_string(),
            language: Some("sql".to_string()),
            code: code.to_string(),
        }],
        reference: None,
    }
}

// ── deny-list ────────────────────────────────────────────────────────────────

#[test]
fn file_function_is_denied_without_reaching_the_engine() {
    let engine = FakeEngine::ok();
    let rules = vec![rule_with_sql(
        "Incorrect",
        "SELECT * FROM file('/etc/passwd', 'CSV')",
    )];

    let violations = validate_rules(&rules, &engine);

    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].code, "sql/denied-file-function");
    assert_eq!(violations[0].example_label.as_deref(), Some("Incorrect"));
    assert!(
        engine.submissions().is_empty(),
        "denied snippet must never be submitted to the engine"
    );
}

#[test]
fn deny_list_matches_mixed_case() {
    assert!(scan_denied("SELECT * FROM FILE('/x', 'CSV')").is_some());
    assert!(scan_denied("select * from File ('/x', 'CSV')").is_some());
}

#[test]
fn deny_list_matches_across_newlines_before_the_paren() {
    assert!(scan_denied("SELECT * FROM file\n  ('/x', 'CSV')").is_some());
}

#[test]
fn deny_list_cannot_be_bypassed_with_comment_splicing() {
    // Comment stripping reassembles the token before matching.
    assert!(scan_denied("SELECT * FROM fi/**/le('/x', 'CSV')").is_some());
    assert!(scan_denied("SELECT * FROM file/* split */('/x', 'CSV')").is_some());
}

#[test]
fn construct_only_mentioned_in_a_comment_is_not_denied() {
    assert!(scan_denied("-- file('/x') would be dangerous\nSELECT 1").is_none());
    assert!(scan_denied("/* url('http://x') */ SELECT 1").is_none());
}

#[test]
fn every_deny_category_matches() {
    for sql in [
        "SELECT * FROM url('http://evil/x', 'CSV')",
        "SELECT * FROM s3('http://bucket/x', 'CSV')",
        "SELECT * FROM remote('other:9000', db.table)",
        "SELECT * FROM mysql('host:3306', 'db', 't', 'u', 'p')",
        "SELECT * FROM executable('cat /etc/passwd', 'TSV', 'a String')",
        "SELECT * FROM cluster('default', db.table)",
        "SELECT * FROM clusterAllReplicas('default', db.table)",
        "SELECT * FROM input('a String')",
        "SELECT sleep(3)",
        "SELECT sleepEachRow(1) FROM numbers(10)",
        "SELECT throwIf(number = 5) FROM numbers(10)",
    ] {
        assert!(scan_denied(sql).is_some(), "expected deny-list match: {sql}");
    }
}

#[test]
fn plain_ddl_passes_the_deny_list() {
    // ALTER is not on the deny-list — the sandbox flags block it instead.
    assert!(scan_denied("ALTER TABLE foo UPDATE x = 1 WHERE 1").is_none());
}

#[test]
fn benign_identifiers_do_not_false_positive() {
    // "profile" contains "file"; the word boundary must hold.
    assert!(scan_denied("SELECT profile('x')").is_none());
    assert!(scan_denied("SELECT file_count FROM numbers(1)").is_none());
}

// ── engine submission ────────────────────────────────────────────────────────

#[test]
fn engine_error_is_surfaced_verbatim() {
    let stderr = "Code: 497. DB::Exception: readonly mode";
    let engine = FakeEngine::failing(stderr);
    let rules = vec![rule_with_sql("Correct", "ALTER TABLE foo UPDATE x=1 WHERE 1")];

    let violations = validate_rules(&rules, &engine);

    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].code, "sql/engine-error");
    assert_eq!(violations[0].detail.as_deref(), Some(stderr));
    assert_eq!(violations[0].rule_title.as_deref(), Some("Test rule"));
}

#[test]
fn clean_sql_is_submitted_and_passes() {
    let engine = FakeEngine::ok();
    let rules = vec![rule_with_sql("Correct", "SELECT number FROM numbers(10)")];

    let violations = validate_rules(&rules, &engine);

    assert!(violations.is_empty());
    assert_eq!(engine.submissions(), vec!["SELECT number FROM numbers(10)"]);
}

#[test]
fn non_sql_examples_are_skipped() {
    let engine = FakeEngine::ok();
    let mut rule = rule_with_sql("Incorrect", "ignored");
    rule.examples[0].language = Some("python".to_string());
    rule.examples[0].code = "print('file(/etc/passwd)')".to_string();

    let violations = validate_rules(&[rule], &engine);

    assert!(violations.is_empty());
    assert!(engine.submissions().is_empty());
}

#[test]
fn untagged_examples_default_to_sql() {
    let engine = FakeEngine::ok();
    let mut rule = rule_with_sql("Correct", "SELECT 1");
    rule.examples[0].language = None;

    validate_rules(&[rule], &engine);

    assert_eq!(engine.submissions().len(), 1);
}

#[test]
fn all_failing_snippets_are_reported_not_just_the_first() {
    let engine = FakeEngine::ok();
    let mut rules = vec![
        rule_with_sql("Incorrect", "SELECT * FROM file('/a', 'CSV')"),
        rule_with_sql("Incorrect", "SELECT * FROM url('http://b', 'CSV')"),
    ];
    rules[1].id = "query-other".to_string();

    let violations = validate_rules(&rules, &engine);

    assert_eq!(violations.len(), 2);
}

// ── comment stripping ────────────────────────────────────────────────────────

#[test]
fn strips_line_comments_to_end_of_line() {
    assert_eq!(
        strip_sql_comments("SELECT 1 -- trailing\nFROM numbers(1)"),
        "SELECT 1 \nFROM numbers(1)"
    );
}

#[test]
fn strips_block_comments_inline() {
    assert_eq!(strip_sql_comments("SELECT/* x */ 1"), "SELECT 1");
}

#[test]
fn unterminated_block_comment_swallows_the_rest() {
    assert_eq!(strip_sql_comments("SELECT 1 /* open"), "SELECT 1 ");
}
