//! Structural validation of parsed rules.
//!
//! Checks every rule against the content contract: non-empty title and
//! explanation, a recognized impact level, a negative and a positive
//! example, and at least one example with actual code. Violations are
//! accumulated across the whole rule set before reporting — a single
//! malformed rule never masks problems in the others.
//!
//! # Codes
//!
//! | ID | Sev | What it checks |
//! |----|-----|----------------|
//! | `structure/missing-title` | Error | Title must be non-empty |
//! | `structure/missing-explanation` | Error | Explanation must be non-empty |
//! | `structure/invalid-impact` | Error | Impact ∈ CRITICAL/HIGH/MEDIUM/LOW |
//! | `structure/missing-examples` | Error | Rule has no code examples at all |
//! | `structure/missing-negative-example` | Error | ≥1 negative-labeled example |
//! | `structure/missing-positive-example` | Error | ≥1 positive-labeled example |
//! | `structure/empty-code` | Error | ≥1 example with non-empty code |

use crate::checks::{load_rules, Check, CheckContext, CodeInfo};
use crate::report::{CheckResult, Severity, Violation};
use crate::rule::Rule;
use std::time::Instant;

fn emit(violations: &mut Vec<Violation>, rule: &Rule, code: &str, message: &str, remediation: &str) {
    violations.push(Violation {
        code: code.to_string(),
        message: message.to_string(),
        severity: Severity::Error,
        file: Some(rule.file.clone()),
        rule_title: if rule.title.is_empty() {
            None
        } else {
            Some(rule.title.clone())
        },
        example_label: None,
        detail: None,
        remediation: Some(remediation.to_string()),
    });
}

/// Validates one rule against the content contract, appending every
/// violation found. Checks are independent; none short-circuits another.
pub fn validate_rule(violations: &mut Vec<Violation>, rule: &Rule) {
    if rule.title.trim().is_empty() {
        emit(
            violations,
            rule,
            "structure/missing-title",
            "Rule has no title",
            "Add a 'title:' frontmatter key or a '# ' heading",
        );
    }

    if rule.explanation.trim().is_empty() {
        emit(
            violations,
            rule,
            "structure/missing-explanation",
            "Rule has no explanation prose",
            "Add explanatory prose between the title and the first example",
        );
    }

    if rule.impact.is_none() {
        let message = match &rule.impact_raw {
            Some(raw) => format!("Impact '{raw}' is not one of CRITICAL, HIGH, MEDIUM, LOW"),
            None => "Rule has no impact level".to_string(),
        };
        emit(
            violations,
            rule,
            "structure/invalid-impact",
            &message,
            "Set 'impact:' to one of CRITICAL, HIGH, MEDIUM, LOW",
        );
    }

    // A rule with no examples at all gets exactly one example-related
    // violation; the per-kind checks below only apply once examples exist.
    if rule.examples.is_empty() {
        emit(
            violations,
            rule,
            "structure/missing-examples",
            "Rule has no code examples",
            "Add at least an 'Incorrect' and a 'Correct' example with code blocks",
        );
        return;
    }

    if !rule.has_negative_example() {
        emit(
            violations,
            rule,
            "structure/missing-negative-example",
            "Rule has no negative example (label containing 'incorrect', 'wrong', or 'bad')",
            "Add an example labeled 'Incorrect' showing the anti-pattern",
        );
    }

    if !rule.has_positive_example() {
        emit(
            violations,
            rule,
            "structure/missing-positive-example",
            "Rule has no positive example (label containing 'correct', 'good', 'usage', or 'example')",
            "Add an example labeled 'Correct' showing the recommended form",
        );
    }

    if !rule.has_code() {
        emit(
            violations,
            rule,
            "structure/empty-code",
            "Every code block in the rule is empty",
            "Fill in the example code blocks",
        );
    }
}

/// Content-contract validator for the parsed rule set.
///
/// See the [module-level documentation](self) for the full code table.
pub struct StructureCheck;

impl Check for StructureCheck {
    fn name(&self) -> &'static str {
        "structure"
    }

    fn description(&self) -> &'static str {
        "Rule content contract: title, explanation, impact, before/after examples"
    }

    fn is_available(&self) -> bool {
        true
    }

    fn run(&self, ctx: &CheckContext) -> CheckResult {
        let start = Instant::now();
        let (rules, mut violations) = load_rules(ctx.rules_dir);
        let files_checked = rules.len() + violations.len();

        for rule in &rules {
            validate_rule(&mut violations, rule);
        }

        CheckResult {
            check_name: self.name().to_string(),
            violations,
            files_checked,
            skipped: false,
            skip_reason: None,
            duration_ms: start.elapsed().as_millis() as u64,
        }
    }
}

/// Returns the [`CodeInfo`] catalogue for every structural code.
pub fn codes() -> Vec<CodeInfo> {
    vec![
        CodeInfo {
            id: "structure/missing-title",
            severity: "error",
            check: "structure",
            message: "Rule has no title",
            remediation: "Add a 'title:' frontmatter key or a '# ' heading",
        },
        CodeInfo {
            id: "structure/missing-explanation",
            severity: "error",
            check: "structure",
            message: "Rule has no explanation prose",
            remediation: "Add explanatory prose between the title and the first example",
        },
        CodeInfo {
            id: "structure/invalid-impact",
            severity: "error",
            check: "structure",
            message: "Impact level is missing or unrecognized",
            remediation: "Set 'impact:' to one of CRITICAL, HIGH, MEDIUM, LOW",
        },
        CodeInfo {
            id: "structure/missing-examples",
            severity: "error",
            check: "structure",
            message: "Rule has no code examples",
            remediation: "Add at least an 'Incorrect' and a 'Correct' example with code blocks",
        },
        CodeInfo {
            id: "structure/missing-negative-example",
            severity: "error",
            check: "structure",
            message: "Rule has no negative example",
            remediation: "Add an example labeled 'Incorrect' showing the anti-pattern",
        },
        CodeInfo {
            id: "structure/missing-positive-example",
            severity: "error",
            check: "structure",
            message: "Rule has no positive example",
            remediation: "Add an example labeled 'Correct' showing the recommended form",
        },
        CodeInfo {
            id: "structure/empty-code",
            severity: "error",
            check: "structure",
            message: "Every code block in the rule is empty",
            remediation: "Fill in the example code blocks",
        },
    ]
}
