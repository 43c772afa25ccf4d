//! Pluggable validation checks.
//!
//! Every check implements the [`Check`] trait. Checks fall into two
//! categories:
//!
//! - **Self-contained**: [`structure`], [`links`].
//! - **External-facing**: [`sql`] (needs the ClickHouse engine binary),
//!   [`external_links`] (needs network access).
//!
//! Use [`all_checks`] to obtain all registered checks and [`all_codes`]
//! to list every violation code they define. Checks are independent
//! quality gates: they share no state, run in any order, and each
//! accumulates every violation in its domain before reporting.

pub mod external_links;
pub mod links;
pub mod sql;
pub mod structure;

use crate::config::Config;
use crate::parser;
use crate::report::{CheckResult, Severity, Violation};
use crate::rule::Rule;
use std::path::{Path, PathBuf};

/// Inputs shared by every check invocation.
pub struct CheckContext<'a> {
    /// Directory of rule files.
    pub rules_dir: &'a Path,
    /// Root of the skill tree (documentation scanned for external links).
    pub skill_dir: &'a Path,
    pub config: &'a Config,
}

/// A pluggable validation check.
///
/// Checks run sequentially in registration order; a check whose
/// [`is_available`](Check::is_available) returns `false` is recorded as
/// skipped rather than failed.
pub trait Check: Send + Sync {
    /// Returns the check's unique identifier (e.g., `"structure"`, `"sql"`).
    fn name(&self) -> &'static str;

    /// Returns a short, human-readable description of the check.
    fn description(&self) -> &'static str;

    /// Returns `true` if the check can run in this environment.
    ///
    /// Self-contained checks always return `true`. The SQL check reports
    /// whether the current platform has a published engine build.
    fn is_available(&self) -> bool;

    /// Executes the check.
    ///
    /// Returns a [`CheckResult`] containing any violations and run metadata.
    fn run(&self, ctx: &CheckContext) -> CheckResult;
}

/// Returns every registered [`Check`] implementation.
///
/// The returned order is the execution order: self-contained checks first,
/// then the engine-backed and network-backed ones.
pub fn all_checks() -> Vec<Box<dyn Check>> {
    vec![
        Box::new(structure::StructureCheck),
        Box::new(sql::SqlCheck),
        Box::new(links::InternalLinkCheck),
        Box::new(external_links::ExternalLinkCheck),
    ]
}

/// Collects the rule files directly under `dir`, sorted by filename.
///
/// Only `*.md` files count; names beginning with an underscore are
/// templates/metadata and are skipped. The sort makes every downstream
/// consumer — validators and the compiler alike — deterministic.
pub fn collect_rule_files(dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return vec![];
    };

    let mut files: Vec<PathBuf> = entries
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().map(|t| t.is_file()).unwrap_or(false))
        .map(|e| e.path())
        .filter(|p| {
            p.extension().map(|e| e == "md").unwrap_or(false)
                && !p
                    .file_name()
                    .map(|n| n.to_string_lossy().starts_with('_'))
                    .unwrap_or(false)
        })
        .collect();

    files.sort();
    files
}

/// Parses every rule file under `dir`.
///
/// A malformed file becomes a `parse/malformed-rule` violation and the
/// batch continues — one broken rule never hides problems in the others.
pub fn load_rules(dir: &Path) -> (Vec<Rule>, Vec<Violation>) {
    let mut rules = Vec::new();
    let mut violations = Vec::new();

    for file in collect_rule_files(dir) {
        match parser::parse_rule_file(&file) {
            Ok(rule) => rules.push(rule),
            Err(e) => violations.push(Violation {
                code: "parse/malformed-rule".to_string(),
                message: e.message.clone(),
                severity: Severity::Error,
                file: Some(e.file.clone()),
                rule_title: None,
                example_label: None,
                detail: None,
                remediation: Some(
                    "Fix the frontmatter ('key: value' lines between '---' delimiters) and close every code fence".to_string(),
                ),
            }),
        }
    }

    (rules, violations)
}

/// Metadata for a single violation code.
///
/// Returned by [`all_codes`] and used by the `list-codes` and `explain`
/// CLI commands. Each check module exposes a `codes()` function that
/// returns a `Vec<CodeInfo>`.
pub struct CodeInfo {
    /// Unique code (e.g., `"sql/denied-file-function"`).
    pub id: &'static str,
    /// Severity as a string (`"error"`, `"warning"`, `"info"`).
    pub severity: &'static str,
    /// Check that emits this code.
    pub check: &'static str,
    /// Short description of what the code means.
    pub message: &'static str,
    /// Guidance on how to fix a violation.
    pub remediation: &'static str,
}

/// Aggregates [`CodeInfo`] from every check module.
pub fn all_codes() -> Vec<CodeInfo> {
    let mut codes = vec![CodeInfo {
        id: "parse/malformed-rule",
        severity: "error",
        check: "structure",
        message: "Rule file could not be parsed",
        remediation:
            "Fix the frontmatter ('key: value' lines between '---' delimiters) and close every code fence",
    }];
    codes.extend(structure::codes());
    codes.extend(sql::codes());
    codes.extend(links::codes());
    codes.extend(external_links::codes());
    codes
}
