//! External URL liveness checking.
//!
//! Harvests every absolute HTTP(S) URL from the Markdown and JSON files
//! under the skill tree, deduplicates them, and probes each with a
//! HEAD-then-GET protocol under a fixed timeout, retrying with escalating
//! backoff. URLs are processed in fixed-size concurrent batches — bounded
//! outbound pressure, sub-linear wall-clock time. This is the only
//! concurrency-bearing check in the pipeline.
//!
//! Requests within a batch race; batches run in submission order and a
//! progress line is printed after each. Results are re-sorted
//! (failures first, then lexical) before reporting, so presentation
//! order is independent of completion order.

use crate::checks::{Check, CheckContext, CodeInfo};
use crate::config::NetworkConfig;
use crate::report::{CheckResult, Severity, Violation};
use rayon::prelude::*;
use regex::Regex;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use std::time::{Duration, Instant};
use walkdir::WalkDir;

/// Ceiling on JSON nesting during the URL walk. Typical inputs are
/// shallow; the bound exists so pathological nesting cannot exhaust the
/// stack.
const MAX_JSON_DEPTH: usize = 32;

static RE_MD_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[[^\]]*\]\((https?://[^)\s]+)[^)]*\)").unwrap());

/// Outcome of probing one external URL.
#[derive(Debug, Clone, serde::Serialize)]
pub struct LinkCheckResult {
    pub url: String,
    pub success: bool,
    pub status: Option<u16>,
    pub error: Option<String>,
    /// First file the URL was observed in.
    pub source: PathBuf,
    pub retries_used: u32,
}

/// Collects `.md` and `.json` files under `root`, skipping files whose
/// name begins with an underscore (templates/metadata).
pub fn collect_doc_files(root: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.path().to_path_buf())
        .filter(|p| {
            let ext_ok = p
                .extension()
                .map(|e| {
                    let e = e.to_string_lossy().to_lowercase();
                    e == "md" || e == "json"
                })
                .unwrap_or(false);
            let name_ok = !p
                .file_name()
                .map(|n| n.to_string_lossy().starts_with('_'))
                .unwrap_or(false);
            ext_ok && name_ok
        })
        .collect();
    files.sort();
    files
}

fn is_http_url(s: &str) -> bool {
    s.starts_with("http://") || s.starts_with("https://")
}

/// Extracts absolute URLs from one file's content, Markdown or JSON.
pub fn extract_urls(path: &Path, content: &str) -> Vec<String> {
    let is_json = path
        .extension()
        .map(|e| e.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if is_json {
        let mut urls = Vec::new();
        if let Ok(value) = serde_json::from_str::<serde_json::Value>(content) {
            walk_json(&value, 0, &mut urls);
        }
        urls
    } else {
        RE_MD_URL
            .captures_iter(content)
            .map(|cap| cap[1].to_string())
            .collect()
    }
}

fn walk_json(value: &serde_json::Value, depth: usize, urls: &mut Vec<String>) {
    if depth > MAX_JSON_DEPTH {
        return;
    }
    match value {
        serde_json::Value::String(s) if is_http_url(s) => urls.push(s.clone()),
        serde_json::Value::Array(items) => {
            for item in items {
                walk_json(item, depth + 1, urls);
            }
        }
        serde_json::Value::Object(map) => {
            for item in map.values() {
                walk_json(item, depth + 1, urls);
            }
        }
        _ => {}
    }
}

/// Harvests and deduplicates URLs across `files`. A URL seen in several
/// files is checked once; the first observed source is retained for
/// reporting.
pub fn harvest_urls(files: &[PathBuf]) -> Vec<(String, PathBuf)> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut ordered: Vec<(String, PathBuf)> = Vec::new();

    for file in files {
        let Ok(content) = std::fs::read_to_string(file) else {
            continue;
        };
        for url in extract_urls(file, &content) {
            if seen.insert(url.clone()) {
                ordered.push((url, file.clone()));
            }
        }
    }

    ordered
}

/// Extracts the host portion of an absolute URL, lowercased.
fn url_host(url: &str) -> Option<String> {
    let rest = url.strip_prefix("https://").or_else(|| url.strip_prefix("http://"))?;
    let host = rest.split(['/', '?', '#']).next()?;
    // Strip userinfo and port.
    let host = host.rsplit('@').next()?;
    let host = host.split(':').next()?;
    if host.is_empty() {
        None
    } else {
        Some(host.to_lowercase())
    }
}

/// Returns `true` when the URL's host is allowlisted (skip probing).
///
/// Matching per host: exact match OR host ends with `.<entry>`
/// (subdomain). Empty entries are ignored to prevent `ends_with(".")`
/// matching any FQDN.
pub fn host_is_allowlisted(url: &str, allowed: &[String]) -> bool {
    let Some(host) = url_host(url) else {
        return false;
    };
    allowed.iter().filter(|e| !e.is_empty()).any(|entry| {
        host == *entry
            || host
                .strip_suffix(entry.as_str())
                .is_some_and(|prefix| prefix.ends_with('.'))
    })
}

/// Classifies a transport error into a stable, user-facing cause.
fn classify_error(e: &reqwest::Error) -> String {
    if e.is_timeout() {
        return "Request timeout".to_string();
    }
    // reqwest surfaces DNS failures inside the connect error chain; the
    // message is the only discriminator available.
    let text = e.to_string();
    if e.is_connect() {
        if text.contains("dns") || text.contains("resolve") {
            return "DNS resolution failed".to_string();
        }
        return "Connection failed".to_string();
    }
    text
}

/// One attempt: HEAD, falling back to GET on any non-success.
///
/// Returns `Ok(status)` for the terminal response and `Err(cause)` when
/// both requests failed at the transport level.
fn attempt(client: &reqwest::blocking::Client, url: &str) -> Result<u16, String> {
    let head = client.head(url).send();
    if let Ok(resp) = &head {
        if resp.status().is_success() {
            return Ok(resp.status().as_u16());
        }
    }

    // Many servers reject HEAD (405, 403) while serving GET fine.
    match client.get(url).send() {
        Ok(resp) => Ok(resp.status().as_u16()),
        Err(e) => match head {
            // Prefer the HEAD status when GET also failed at transport level.
            Ok(resp) => Ok(resp.status().as_u16()),
            Err(_) => Err(classify_error(&e)),
        },
    }
}

fn backoff_delay(cfg: &NetworkConfig, retry_index: usize) -> Duration {
    let ms = cfg
        .backoff_ms
        .get(retry_index)
        .or(cfg.backoff_ms.last())
        .copied()
        .unwrap_or(1_000);
    Duration::from_millis(ms)
}

/// Probes one URL with the full retry budget.
pub fn probe_url(
    client: &reqwest::blocking::Client,
    url: &str,
    source: &Path,
    cfg: &NetworkConfig,
) -> LinkCheckResult {
    let mut last_status: Option<u16> = None;
    let mut last_error: Option<String> = None;

    for attempt_no in 0..=cfg.max_retries {
        if attempt_no > 0 {
            std::thread::sleep(backoff_delay(cfg, attempt_no as usize - 1));
        }

        match attempt(client, url) {
            Ok(status) if (200..300).contains(&status) => {
                return LinkCheckResult {
                    url: url.to_string(),
                    success: true,
                    status: Some(status),
                    error: None,
                    source: source.to_path_buf(),
                    retries_used: attempt_no,
                };
            }
            Ok(status) => {
                last_status = Some(status);
                last_error = Some(format!("HTTP {status}"));
            }
            Err(cause) => {
                last_error = Some(cause);
            }
        }
    }

    LinkCheckResult {
        url: url.to_string(),
        success: false,
        status: last_status,
        error: last_error,
        source: source.to_path_buf(),
        retries_used: cfg.max_retries,
    }
}

/// Sorts results failures-first, then lexically by URL.
pub fn sort_results(results: &mut [LinkCheckResult]) {
    results.sort_by(|a, b| a.success.cmp(&b.success).then(a.url.cmp(&b.url)));
}

fn truncate_for_display(url: &str, max: usize) -> String {
    if url.chars().count() <= max {
        return url.to_string();
    }
    let cut: String = url.chars().take(max.saturating_sub(3)).collect();
    format!("{cut}...")
}

/// Renders the full result table: all links, truncated for display,
/// failures first.
pub fn format_summary(results: &[LinkCheckResult]) -> String {
    let mut out = String::new();
    let failed = results.iter().filter(|r| !r.success).count();
    out.push_str(&format!(
        "External links: {} checked, {} failed\n",
        results.len(),
        failed
    ));
    for r in results {
        let mark = if r.success { "ok  " } else { "FAIL" };
        let status = r
            .status
            .map(|s| s.to_string())
            .unwrap_or_else(|| "-".to_string());
        out.push_str(&format!(
            "  [{mark}] {status:>4}  {url}\n",
            url = truncate_for_display(&r.url, 72)
        ));
    }
    out
}

/// External URL liveness check over the whole skill tree.
pub struct ExternalLinkCheck;

impl Check for ExternalLinkCheck {
    fn name(&self) -> &'static str {
        "external_links"
    }

    fn description(&self) -> &'static str {
        "External URL liveness probing with retry/backoff (network)"
    }

    fn is_available(&self) -> bool {
        true
    }

    fn run(&self, ctx: &CheckContext) -> CheckResult {
        let start = Instant::now();
        let files = collect_doc_files(ctx.skill_dir);
        let urls: Vec<(String, PathBuf)> = harvest_urls(&files)
            .into_iter()
            .filter(|(url, _)| !host_is_allowlisted(url, &ctx.config.allowlist.domains))
            .collect();

        let client = match reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(ctx.config.network.timeout_secs))
            .user_agent(concat!("ch-rulebook/", env!("CARGO_PKG_VERSION")))
            .build()
        {
            Ok(c) => c,
            Err(e) => {
                return CheckResult::skipped(self.name(), &format!("HTTP client failed: {e}"));
            }
        };

        let batch_size = ctx.config.network.batch_size.max(1);
        let mut results: Vec<LinkCheckResult> = Vec::with_capacity(urls.len());

        // Batches run in submission order; URLs within a batch race.
        for batch in urls.chunks(batch_size) {
            let batch_results: Vec<LinkCheckResult> = batch
                .par_iter()
                .map(|(url, source)| probe_url(&client, url, source, &ctx.config.network))
                .collect();
            results.extend(batch_results);
            eprintln!("  checked {}/{} external links", results.len(), urls.len());
        }

        sort_results(&mut results);
        if !results.is_empty() {
            eprint!("{}", format_summary(&results));
        }

        let violations: Vec<Violation> = results
            .iter()
            .filter(|r| !r.success)
            .map(|r| Violation {
                code: "external/unreachable-url".to_string(),
                message: format!(
                    "{} unreachable after {} retries ({})",
                    r.url,
                    r.retries_used,
                    r.error.as_deref().unwrap_or("unknown cause"),
                ),
                severity: Severity::Error,
                file: Some(r.source.clone()),
                rule_title: None,
                example_label: None,
                detail: r.error.clone(),
                remediation: Some("Update or remove the dead link".to_string()),
            })
            .collect();

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
    vec![CodeInfo {
        id: "external/unreachable-url",
        severity: "error",
        check: "external_links",
        message: "External URL unreachable or non-2xx after exhausting retries",
        remediation: "Update or remove the dead link",
    }]
}
