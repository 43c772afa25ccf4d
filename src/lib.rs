//! # ch-rulebook
//!
//! Validation and compilation toolkit for ClickHouse best-practice rule sets.
//!
//! `ch-rulebook` parses a directory of structured Markdown rule files,
//! validates them (content contract, sandboxed SQL verification, internal
//! and external link checking), and deterministically compiles them into a
//! single versioned reference document.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use std::path::Path;
//! use ch_rulebook::{checks::CheckContext, config::Config, output, runner};
//!
//! let config = Config::load(None).expect("failed to load config");
//! let ctx = CheckContext {
//!     rules_dir: Path::new("rules"),
//!     skill_dir: Path::new("."),
//!     config: &config,
//! };
//! let report = runner::run_checks(&ctx, None);
//!
//! if report.passed {
//!     println!("All checks passed!");
//! } else {
//!     let text = output::format_report(&report, &output::OutputFormat::Pretty);
//!     print!("{text}");
//! }
//! ```
//!
//! ## Architecture
//!
//! The crate is organized around a pipeline:
//!
//! 1. **[`parser`]** — turn rule files into [`rule::Rule`] records.
//! 2. **[`checks`]** — pluggable [`checks::Check`] trait with built-in
//!    implementations (structure, sql, links, external_links).
//! 3. **[`runner`]** — execute checks sequentially and collect results.
//! 4. **[`report`]** — core data types ([`report::Violation`], [`report::RunReport`]).
//! 5. **[`output`]** — format reports as pretty text, JSON, or [SARIF].
//! 6. **[`compile`]** — build the numbered, cross-linked reference document.
//!
//! ## Checks
//!
//! | Check | External dependency | Description |
//! |-------|--------------------|-------------|
//! | `structure` | — | Rule content contract |
//! | `sql` | [clickhouse local] | Sandboxed SQL verification |
//! | `links` | — | Internal cross-reference resolution |
//! | `external_links` | network | URL liveness with retry/backoff |
//!
//! [SARIF]: https://sarifweb.azurewebsites.net/
//! [clickhouse local]: https://clickhouse.com/docs/operations/utilities/clickhouse-local

pub mod checks;
pub mod compile;
pub mod config;
pub mod engine;
pub mod output;
pub mod parser;
pub mod report;
pub mod rule;
pub mod runner;
