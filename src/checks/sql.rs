//! Sandboxed SQL verification of rule examples.
//!
//! Every SQL-labeled (or untagged) example is screened against a deny-list
//! of dangerous ClickHouse constructs and, only if clean, submitted to the
//! sandboxed engine (see [`crate::engine`]). The deny-list scan runs on a
//! comment-stripped, whitespace-normalized copy of the snippet so a call
//! cannot be hidden inside a comment (`fi/**/le(...)`) or behind a
//! newline between the function name and its parenthesis.
//!
//! A deny-list match is a security violation: the snippet is reported and
//! never executed. Engine-reported exceptions are surfaced verbatim so
//! the author sees exactly what the engine saw.

use crate::checks::{load_rules, Check, CheckContext, CodeInfo};
use crate::engine::{ClickHouseLocal, EngineError, SqlEngine};
use crate::report::{CheckResult, Severity, Violation};
use crate::rule::Rule;
use regex::Regex;
use std::sync::LazyLock;
use std::time::Instant;

pub struct DenyPattern {
    pub id: &'static str,
    regex: &'static LazyLock<Regex>,
    pub message: &'static str,
    pub remediation: &'static str,
}

// File-system access

static RE_DENY_FILE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\bfile\s*\(").unwrap());

// Network-fetch table functions

static RE_DENY_FETCH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(url|s3|s3cluster|gcs|azureblobstorage|hdfs)\s*\(").unwrap()
});

// Remote-database table functions

static RE_DENY_REMOTE_DB: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(remote|remotesecure|mysql|postgresql|mongodb|sqlite|jdbc|odbc)\s*\(")
        .unwrap()
});

// Command execution

static RE_DENY_EXEC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bexecutable\s*\(").unwrap());

// Cluster / remote execution

static RE_DENY_CLUSTER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bcluster(allreplicas)?\s*\(").unwrap());

// Stdin

static RE_DENY_INPUT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\binput\s*\(").unwrap());

// Timing side channels

static RE_DENY_SLEEP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bsleep(eachrow)?\s*\(").unwrap());

// Error-based exfiltration

static RE_DENY_THROW: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bthrowif\s*\(").unwrap());

static DENY_PATTERNS: &[DenyPattern] = &[
    DenyPattern {
        id: "sql/denied-file-function",
        regex: &RE_DENY_FILE,
        message: "file() table function — file-system access from example SQL",
        remediation: "Replace file() with an inline table or the numbers() generator",
    },
    DenyPattern {
        id: "sql/denied-fetch-function",
        regex: &RE_DENY_FETCH,
        message: "Network-fetch table function (url/s3/gcs/azureBlobStorage/hdfs)",
        remediation: "Example SQL must not reach external storage; use inline data",
    },
    DenyPattern {
        id: "sql/denied-remote-database",
        regex: &RE_DENY_REMOTE_DB,
        message: "Remote-database table function (remote/mysql/postgresql/...)",
        remediation: "Example SQL must not connect to other databases",
    },
    DenyPattern {
        id: "sql/denied-executable",
        regex: &RE_DENY_EXEC,
        message: "executable() table function — command execution",
        remediation: "Example SQL must not invoke external commands",
    },
    DenyPattern {
        id: "sql/denied-cluster-function",
        regex: &RE_DENY_CLUSTER,
        message: "cluster()/clusterAllReplicas() — remote cluster execution",
        remediation: "Example SQL must run standalone; remove cluster functions",
    },
    DenyPattern {
        id: "sql/denied-stdin",
        regex: &RE_DENY_INPUT,
        message: "input() table function — reads from stdin",
        remediation: "Use literal VALUES or the numbers() generator instead",
    },
    DenyPattern {
        id: "sql/denied-sleep",
        regex: &RE_DENY_SLEEP,
        message: "sleep()/sleepEachRow() — timing function",
        remediation: "Remove timing functions from example SQL",
    },
    DenyPattern {
        id: "sql/denied-throwif",
        regex: &RE_DENY_THROW,
        message: "throwIf() — error-based exfiltration primitive",
        remediation: "Remove throwIf() from example SQL",
    },
];

/// Strips `--` line comments and `/* */` block comments.
///
/// An unterminated block comment swallows the rest of the input, matching
/// how the engine itself would read it. Runs before deny-list matching so
/// a construct spliced with comments (`fi/**/le(`) reassembles into its
/// detectable form.
pub fn strip_sql_comments(sql: &str) -> String {
    let bytes = sql.as_bytes();
    let mut out = String::with_capacity(sql.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'/' && i + 1 < bytes.len() && bytes[i + 1] == b'*' {
            match sql[i + 2..].find("*/") {
                Some(end) => i += 2 + end + 2,
                None => break,
            }
        } else if bytes[i] == b'-' && i + 1 < bytes.len() && bytes[i + 1] == b'-' {
            match sql[i..].find('\n') {
                Some(end) => i += end, // keep the newline as a separator
                None => break,
            }
        } else {
            // Advance one full character, not one byte.
            let ch_len = sql[i..].chars().next().map(char::len_utf8).unwrap_or(1);
            out.push_str(&sql[i..i + ch_len]);
            i += ch_len;
        }
    }

    out
}

/// Collapses every whitespace run (including newlines) to a single space.
fn normalize_whitespace(sql: &str) -> String {
    sql.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Scans a snippet against the deny-list after comment stripping and
/// whitespace normalization. Returns the first matching pattern.
pub fn scan_denied(sql: &str) -> Option<&'static DenyPattern> {
    let cleaned = normalize_whitespace(&strip_sql_comments(sql));
    DENY_PATTERNS.iter().find(|p| p.regex.is_match(&cleaned))
}

/// Validates every SQL example in `rules` against `engine`, serially.
///
/// The deny-list runs first; a matching snippet is reported as a security
/// violation and never reaches the engine. All failing snippets are
/// reported, not just the first.
pub fn validate_rules(rules: &[Rule], engine: &dyn SqlEngine) -> Vec<Violation> {
    let mut violations = Vec::new();

    for rule in rules {
        for example in &rule.examples {
            if !example.is_sql() || example.code.trim().is_empty() {
                continue;
            }

            if let Some(pattern) = scan_denied(&example.code) {
                violations.push(Violation {
                    code: pattern.id.to_string(),
                    message: pattern.message.to_string(),
                    severity: Severity::Error,
                    file: Some(rule.file.clone()),
                    rule_title: Some(rule.title.clone()),
                    example_label: Some(example.label.clone()),
                    detail: None,
                    remediation: Some(pattern.remediation.to_string()),
                });
                continue;
            }

            match engine.validate(&example.code) {
                Ok(()) => {}
                Err(EngineError::Query(stderr)) => violations.push(Violation {
                    code: "sql/engine-error".to_string(),
                    message: "SQL example rejected by the engine".to_string(),
                    severity: Severity::Error,
                    file: Some(rule.file.clone()),
                    rule_title: Some(rule.title.clone()),
                    example_label: Some(example.label.clone()),
                    detail: Some(stderr),
                    remediation: Some("Fix the SQL so it parses and runs read-only".to_string()),
                }),
                Err(e) => violations.push(Violation {
                    code: "sql/engine-invocation-failed".to_string(),
                    message: format!("Could not invoke the SQL engine: {e}"),
                    severity: Severity::Warning,
                    file: Some(rule.file.clone()),
                    rule_title: Some(rule.title.clone()),
                    example_label: Some(example.label.clone()),
                    detail: None,
                    remediation: Some("Check the engine cache and re-run".to_string()),
                }),
            }
        }
    }

    violations
}

/// Sandboxed SQL verification of rule examples.
///
/// Examples with no language tag or a `sql` tag are checked; other
/// languages are skipped. Requires an engine build for the current
/// platform; elsewhere the check is skipped with a warning and the run
/// still succeeds — SQL correctness is best-effort, not the core
/// structural contract.
pub struct SqlCheck;

impl Check for SqlCheck {
    fn name(&self) -> &'static str {
        "sql"
    }

    fn description(&self) -> &'static str {
        "SQL example verification via sandboxed clickhouse local (external tool)"
    }

    fn is_available(&self) -> bool {
        crate::engine::platform_supported()
    }

    fn run(&self, ctx: &CheckContext) -> CheckResult {
        let start = Instant::now();
        let (rules, mut violations) = load_rules(ctx.rules_dir);
        let files_checked = rules.len();

        // Acquired once per run, reused for every snippet. A failed
        // acquisition degrades to a skip: SQL validation must not block
        // unrelated CI work.
        let engine = match ClickHouseLocal::acquire(&ctx.config.engine) {
            Ok(engine) => engine,
            Err(e) => {
                eprintln!("Warning: SQL check skipped: {e}");
                return CheckResult::skipped(self.name(), &e.to_string());
            }
        };

        violations.extend(validate_rules(&rules, &engine));

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

pub fn codes() -> Vec<CodeInfo> {
    let mut codes: Vec<CodeInfo> = DENY_PATTERNS
        .iter()
        .map(|p| CodeInfo {
            id: p.id,
            severity: "error",
            check: "sql",
            message: p.message,
            remediation: p.remediation,
        })
        .collect();
    codes.push(CodeInfo {
        id: "sql/engine-error",
        severity: "error",
        check: "sql",
        message: "SQL example rejected by the engine",
        remediation: "Fix the SQL so it parses and runs read-only",
    });
    codes.push(CodeInfo {
        id: "sql/engine-invocation-failed",
        severity: "warning",
        check: "sql",
        message: "The SQL engine could not be invoked",
        remediation: "Check the engine cache and re-run",
    });
    codes
}
