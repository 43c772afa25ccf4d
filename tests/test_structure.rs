use std::path::Path;

use ch_rulebook::checks::structure::{validate_rule, StructureCheck};
use ch_rulebook::checks::{Check, CheckContext};
use ch_rulebook::config::Config;
use ch_rulebook::report::Severity;
use ch_rulebook::rule::{Example, Rule};

fn run_fixture(fixture: &str) -> ch_rulebook::report::CheckResult {
    let config = Config::default();
    let rules_dir = Path::new("tests/fixtures").join(fixture);
    let ctx = CheckContext {
        rules_dir: &rules_dir,
        skill_dir: &rules_dir,
        config: &config,
    };
    StructureCheck.run(&ctx)
}

fn rule_with_examples(examples: Vec<Example>) -> Rule {
    Rule {
        id: "schema-test".to_string(),
        file: Path::new("rules/schema-test.md").to_path_buf(),
        title: "Test rule".to_string(),
        impact: Some(ch_rulebook::rule::Impact::High),
        impact_raw: Some("HIGH".to_string()),
        impact_description: None,
        tags: vec![],
        explanation: "Some explanation.".to_string(),
        examples,
        reference: None,
    }
}

fn example(label: &str, code: &str) -> Example {
    Example {
        label: label.to_string(),
        language: Some("sql".to_string()),
        code: code.to_string(),
    }
}

#[test]
fn clean_rules_have_no_violations() {
    let result = run_fixture("rules-clean");
    assert!(!result.skipped);
    assert_eq!(result.files_checked, 3);
    assert!(
        result.violations.is_empty(),
        "Expected no violations, got: {:?}",
        result.violations
    );
}

#[test]
fn rule_without_examples_yields_exactly_one_violation() {
    // impact: CRITICAL but no code block at all — one violation citing the
    // missing examples, not three separate example complaints.
    let result = run_fixture("rules-dirty");
    let for_file: Vec<_> = result
        .violations
        .iter()
        .filter(|v| {
            v.file
                .as_ref()
                .map(|f| f.ends_with("schema-missing-examples.md"))
                .unwrap_or(false)
        })
        .collect();
    assert_eq!(for_file.len(), 1, "got: {for_file:?}");
    assert_eq!(for_file[0].code, "structure/missing-examples");
    assert_eq!(for_file[0].severity, Severity::Error);
}

#[test]
fn invalid_impact_is_reported_with_raw_value() {
    let result = run_fixture("rules-dirty");
    let v = result
        .violations
        .iter()
        .find(|v| v.code == "structure/invalid-impact")
        .expect("expected an invalid-impact violation");
    assert!(v.message.contains("SEVERE"));
}

#[test]
fn all_dirty_rules_are_reported_in_one_batch() {
    // Two structurally broken rules among four files — both reported, and
    // the structurally clean files contribute nothing.
    let result = run_fixture("rules-dirty");
    assert_eq!(result.files_checked, 4);
    assert_eq!(result.violations.len(), 2, "got: {:?}", result.violations);
}

#[test]
fn missing_negative_example_is_flagged() {
    let rule = rule_with_examples(vec![example("Correct", "SELECT 1")]);
    let mut violations = Vec::new();
    validate_rule(&mut violations, &rule);
    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].code, "structure/missing-negative-example");
}

#[test]
fn missing_positive_example_is_flagged() {
    let rule = rule_with_examples(vec![example("Incorrect", "SELECT 1")]);
    let mut violations = Vec::new();
    validate_rule(&mut violations, &rule);
    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].code, "structure/missing-positive-example");
}

#[test]
fn all_empty_code_blocks_are_flagged() {
    let rule = rule_with_examples(vec![example("Incorrect", "  "), example("Correct", "")]);
    let mut violations = Vec::new();
    validate_rule(&mut violations, &rule);
    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].code, "structure/empty-code");
}

#[test]
fn missing_title_and_explanation_are_independent_checks() {
    let mut rule = rule_with_examples(vec![
        example("Incorrect", "SELECT 1"),
        example("Correct", "SELECT 2"),
    ]);
    rule.title = String::new();
    rule.explanation = "   ".to_string();

    let mut violations = Vec::new();
    validate_rule(&mut violations, &rule);

    let codes: Vec<&str> = violations.iter().map(|v| v.code.as_str()).collect();
    assert!(codes.contains(&"structure/missing-title"));
    assert!(codes.contains(&"structure/missing-explanation"));
}

#[test]
fn malformed_rule_file_does_not_abort_the_batch() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("schema-broken.md"),
        "---\nno colon here\n---\nProse.\n",
    )
    .unwrap();
    std::fs::write(
        dir.path().join("schema-missing-bits.md"),
        "---\ntitle: Valid but incomplete\nimpact: HIGH\n---\nProse.\n",
    )
    .unwrap();

    let config = Config::default();
    let ctx = CheckContext {
        rules_dir: dir.path(),
        skill_dir: dir.path(),
        config: &config,
    };
    let result = StructureCheck.run(&ctx);

    let codes: Vec<&str> = result.violations.iter().map(|v| v.code.as_str()).collect();
    // The broken file is reported as a parse error AND the other file's
    // structural problem is still found.
    assert!(codes.contains(&"parse/malformed-rule"));
    assert!(codes.contains(&"structure/missing-examples"));
}
