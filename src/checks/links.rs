//! Internal cross-reference checking.
//!
//! Scans the raw text of every rule file for Markdown links and verifies
//! that relative (non-HTTP) targets resolve inside the rule set. Targets
//! naming a file must match an existing rule filename exactly. Anchor-only
//! targets get a best-effort prefix heuristic and never hard-fail: the
//! anchor vocabulary of a compiled document is wider than the rule set
//! (generated section headings, table of contents), so an unrecognized
//! anchor is an info-level note rather than an error.

use crate::checks::{collect_rule_files, Check, CheckContext, CodeInfo};
use crate::report::{CheckResult, Severity, Violation};
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;
use std::time::Instant;

/// `[text](target)` — captures the target up to the first `)` or space.
static RE_MD_LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[[^\]]*\]\(([^)\s]+)[^)]*\)").unwrap());

fn is_external(target: &str) -> bool {
    target.starts_with("http://") || target.starts_with("https://")
}

/// Returns `true` when the last path segment carries a file extension.
fn has_file_extension(path: &str) -> bool {
    path.rsplit('/')
        .next()
        .map(|seg| {
            seg.rfind('.')
                .map(|i| i > 0 && i + 1 < seg.len())
                .unwrap_or(false)
        })
        .unwrap_or(false)
}

/// Best-effort anchor plausibility: an anchor that equals a rule id or
/// starts with a known filename prefix (the part of any id before its
/// first `-`) is assumed to point at generated content.
fn anchor_is_plausible(anchor: &str, rule_ids: &HashSet<String>, prefixes: &HashSet<String>) -> bool {
    let slug = anchor.trim_start_matches('#').to_lowercase();
    if rule_ids.contains(&slug) {
        return true;
    }
    prefixes.iter().any(|p| slug.starts_with(p.as_str()))
}

/// Internal link checker over the raw rule file text.
pub struct InternalLinkCheck;

impl Check for InternalLinkCheck {
    fn name(&self) -> &'static str {
        "links"
    }

    fn description(&self) -> &'static str {
        "Internal cross-reference resolution inside the rule set"
    }

    fn is_available(&self) -> bool {
        true
    }

    fn run(&self, ctx: &CheckContext) -> CheckResult {
        let start = Instant::now();
        let files = collect_rule_files(ctx.rules_dir);

        let filenames: HashSet<String> = files
            .iter()
            .filter_map(|p| p.file_name().map(|n| n.to_string_lossy().to_string()))
            .collect();
        let rule_ids: HashSet<String> = files
            .iter()
            .filter_map(|p| p.file_stem().map(|s| s.to_string_lossy().to_lowercase()))
            .collect();
        let prefixes: HashSet<String> = rule_ids
            .iter()
            .filter_map(|id| id.split('-').next().map(|p| p.to_string()))
            .collect();

        let mut violations = Vec::new();

        for file in &files {
            let content = match std::fs::read_to_string(file) {
                Ok(c) => c,
                Err(e) => {
                    violations.push(Violation {
                        code: "links/read-error".to_string(),
                        message: format!("Could not read file: {e}"),
                        severity: Severity::Info,
                        file: Some(file.clone()),
                        rule_title: None,
                        example_label: None,
                        detail: None,
                        remediation: Some(
                            "Check file permissions and ensure the file is valid UTF-8".to_string(),
                        ),
                    });
                    continue;
                }
            };

            for cap in RE_MD_LINK.captures_iter(&content) {
                let target = &cap[1];
                if is_external(target) {
                    continue;
                }

                if let Some(anchor) = target.strip_prefix('#') {
                    // Anchors are checked best-effort and never fail the run.
                    if !anchor_is_plausible(anchor, &rule_ids, &prefixes) {
                        violations.push(Violation {
                            code: "links/unknown-anchor".to_string(),
                            message: format!("Anchor '#{anchor}' matches no rule or section prefix"),
                            severity: Severity::Info,
                            file: Some(file.clone()),
                            rule_title: None,
                            example_label: None,
                            detail: None,
                            remediation: Some(
                                "Verify the anchor against the compiled document".to_string(),
                            ),
                        });
                    }
                    continue;
                }

                // Strip any trailing anchor before resolving the file part.
                let path_part = target.split('#').next().unwrap_or(target);
                if !has_file_extension(path_part) {
                    continue;
                }

                let filename = path_part.rsplit('/').next().unwrap_or(path_part);
                if !filenames.contains(filename) {
                    violations.push(Violation {
                        code: "links/broken-file-link".to_string(),
                        message: format!("Link target '{target}' matches no rule file"),
                        severity: Severity::Error,
                        file: Some(file.clone()),
                        rule_title: None,
                        example_label: None,
                        detail: None,
                        remediation: Some(
                            "Point the link at an existing rule file or remove it".to_string(),
                        ),
                    });
                }
            }
        }

        CheckResult {
            check_name: self.name().to_string(),
            violations,
            files_checked: files.len(),
            skipped: false,
            skip_reason: None,
            duration_ms: start.elapsed().as_millis() as u64,
        }
    }
}

pub fn codes() -> Vec<CodeInfo> {
    vec![
        CodeInfo {
            id: "links/broken-file-link",
            severity: "error",
            check: "links",
            message: "Relative link target matches no rule file",
            remediation: "Point the link at an existing rule file or remove it",
        },
        CodeInfo {
            id: "links/unknown-anchor",
            severity: "info",
            check: "links",
            message: "Anchor link matches no rule or section prefix (best-effort check)",
            remediation: "Verify the anchor against the compiled document",
        },
        CodeInfo {
            id: "links/read-error",
            severity: "info",
            check: "links",
            message: "Rule file could not be read",
            remediation: "Check file permissions and ensure the file is valid UTF-8",
        },
    ]
}
