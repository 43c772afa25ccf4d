//! Check orchestration.
//!
//! [`run_checks`] is the entry point for validating a rule set. It loads
//! every registered [`Check`](crate::checks::Check), filters by the
//! config toggles and the optional `--only` selector, and executes them
//! **sequentially** in registration order — the pipeline is serial by
//! design; the external link checker manages its own bounded concurrency
//! internally. Checks whose environment is unavailable are recorded as
//! skipped, and the run still succeeds unless a real violation exists.

use crate::checks::{self, CheckContext};
use crate::report::{CheckResult, RunReport};

/// Runs the configured checks against the rule set.
///
/// # Examples
///
/// ```rust,no_run
/// use std::path::Path;
/// use ch_rulebook::{checks::CheckContext, config::Config, runner};
///
/// let config = Config::load(None).unwrap();
/// let ctx = CheckContext {
///     rules_dir: Path::new("rules"),
///     skill_dir: Path::new("."),
///     config: &config,
/// };
/// let report = runner::run_checks(&ctx, None);
/// std::process::exit(if report.passed { 0 } else { 1 });
/// ```
pub fn run_checks(ctx: &CheckContext, only: Option<&str>) -> RunReport {
    let all = checks::all_checks();

    let active: Vec<_> = all
        .into_iter()
        .filter(|c| match only {
            Some(name) => c.name() == name,
            None => ctx.config.is_check_enabled(c.name()),
        })
        .collect();

    let results: Vec<CheckResult> = active
        .iter()
        .map(|check| {
            if check.is_available() {
                check.run(ctx)
            } else {
                CheckResult::skipped(
                    check.name(),
                    &format!("{} is unavailable in this environment", check.name()),
                )
            }
        })
        .collect();

    let target = ctx.rules_dir.display().to_string();
    RunReport::from_results(&target, results, ctx.config.strict.enabled)
}
