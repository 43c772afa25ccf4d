//! Rule file parser.
//!
//! Turns one rule file's raw text into a [`Rule`] record or a descriptive
//! [`ParseError`]. A rule file is a `---`-delimited frontmatter block of
//! `key: value` pairs followed by a Markdown body whose fenced code blocks
//! become [`Example`]s, each labeled by the nearest preceding heading or
//! bold label.
//!
//! # Frontmatter parsing
//!
//! A lightweight line-based subset parser is used instead of a full YAML
//! crate. It supports scalar `key: value` pairs, flow sequences
//! (`[a, b]`), and block sequences (`- item`) for the `tags` key, which
//! covers everything the rule file format requires. Recognized keys:
//! `title`, `impact`, `impactDescription`, `tags`, `reference`.
//!
//! Parse errors are localized to one file and carry the offending line
//! number; callers report them per-file and continue with the rest of the
//! batch.

use crate::rule::{Example, Rule};
use std::path::{Path, PathBuf};

/// A malformed rule file. Localized to one file, never aborts the batch.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{}: {message}", .file.display())]
pub struct ParseError {
    pub file: PathBuf,
    pub message: String,
}

impl ParseError {
    fn new(file: &Path, message: impl Into<String>) -> Self {
        ParseError {
            file: file.to_path_buf(),
            message: message.into(),
        }
    }
}

/// Frontmatter fields in raw string form.
#[derive(Debug, Default)]
struct Frontmatter {
    title: Option<String>,
    impact: Option<String>,
    impact_description: Option<String>,
    tags: Vec<String>,
    reference: Option<String>,
    /// Number of lines consumed, including both `---` delimiters.
    consumed: usize,
}

/// Reads a rule file from disk and parses it.
pub fn parse_rule_file(path: &Path) -> Result<Rule, ParseError> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| ParseError::new(path, format!("failed to read file: {e}")))?;
    parse_rule(path, &content)
}

/// Parses one rule file's raw text into a [`Rule`].
///
/// Pure read-and-transform; no side effects.
pub fn parse_rule(path: &Path, content: &str) -> Result<Rule, ParseError> {
    let id = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();

    let fm = parse_frontmatter(path, content)?;
    let body: Vec<&str> = content.lines().skip(fm.consumed).collect();

    let (body_title, explanation, examples) = parse_body(path, &body)?;

    // Frontmatter title takes precedence over the body's `# ` heading.
    let title = fm.title.or(body_title).unwrap_or_default();

    let impact = fm.impact.as_deref().and_then(|s| s.parse().ok());

    Ok(Rule {
        id,
        file: path.to_path_buf(),
        title,
        impact,
        impact_raw: fm.impact,
        impact_description: fm.impact_description,
        tags: fm.tags,
        explanation,
        examples,
        reference: fm.reference,
    })
}

/// Parses the leading `---` block. Absent frontmatter is not an error —
/// everything then comes from the body.
fn parse_frontmatter(path: &Path, content: &str) -> Result<Frontmatter, ParseError> {
    let mut fm = Frontmatter::default();

    let mut lines = content.lines().enumerate();
    match lines.next() {
        Some((_, first)) if first.trim() == "---" => {}
        _ => return Ok(fm),
    }

    // The key whose block-sequence items we are currently collecting.
    let mut current_key: Option<String> = None;
    let mut closed = false;

    for (idx, line) in lines {
        // 1-indexed for display; also equals the count of lines consumed
        // so far, since `idx` counts from the opening delimiter at 0.
        let line_num = idx + 1;
        fm.consumed = line_num;

        if line.trim() == "---" {
            closed = true;
            break;
        }
        if line.trim().is_empty() {
            continue;
        }

        // Block-sequence item: `  - value` (indented) or `- value`.
        let is_list_item = line.starts_with("  - ")
            || line.starts_with("\t- ")
            || (line.starts_with("- ") && current_key.is_some());
        if is_list_item {
            let item = line
                .trim_start_matches(|c: char| c.is_whitespace())
                .strip_prefix("- ")
                .unwrap_or("")
                .trim();
            if current_key.as_deref() == Some("tags") && !item.is_empty() {
                fm.tags.push(item.to_string());
            }
            continue;
        }

        let Some((key, val)) = parse_kv(line) else {
            return Err(ParseError::new(
                path,
                format!("malformed frontmatter at line {line_num}: expected 'key: value', got '{line}'"),
            ));
        };
        current_key = Some(key.clone());
        let val = val.trim();

        match key.as_str() {
            "title" if !val.is_empty() => fm.title = Some(val.to_string()),
            "impact" if !val.is_empty() => fm.impact = Some(val.to_string()),
            "impactDescription" | "impact_description" if !val.is_empty() => {
                fm.impact_description = Some(val.to_string());
            }
            "reference" if !val.is_empty() => fm.reference = Some(val.to_string()),
            "tags" => {
                if val.starts_with('[') && val.ends_with(']') {
                    // Flow sequence: `tags: [schema, performance]`
                    let inner = &val[1..val.len() - 1];
                    fm.tags.extend(
                        inner
                            .split(',')
                            .map(|t| t.trim().to_string())
                            .filter(|t| !t.is_empty()),
                    );
                } else if !val.is_empty() {
                    // Comma-separated scalar: `tags: schema, performance`
                    fm.tags.extend(
                        val.split(',')
                            .map(|t| t.trim().to_string())
                            .filter(|t| !t.is_empty()),
                    );
                }
                // Empty value means a block sequence follows (handled above).
            }
            _ => {}
        }
    }

    if !closed {
        return Err(ParseError::new(path, "frontmatter block is not closed with '---'"));
    }

    Ok(fm)
}

/// Split a `key: value` line into `(key, value)`.
///
/// Keys must start at column zero and contain no whitespace before the
/// colon; the value is everything after the first `:`.
fn parse_kv(line: &str) -> Option<(String, String)> {
    if line.starts_with(|c: char| c.is_whitespace()) {
        return None;
    }
    let colon_pos = line.find(':')?;
    let key = line[..colon_pos].trim();
    if key.is_empty() || key.contains(char::is_whitespace) {
        return None;
    }
    let after = &line[colon_pos + 1..];
    let value = after.strip_prefix(' ').unwrap_or(after);
    Some((key.to_string(), value.to_string()))
}

/// Walks the body: captures the `# ` title, the explanation prose, and the
/// ordered example list.
fn parse_body(
    path: &Path,
    lines: &[&str],
) -> Result<(Option<String>, String, Vec<Example>), ParseError> {
    let mut title: Option<String> = None;
    let mut explanation_lines: Vec<&str> = Vec::new();
    let mut examples: Vec<Example> = Vec::new();

    // Label state: the nearest preceding heading or bold label.
    let mut current_label: Option<String> = None;

    // Fence state.
    let mut in_fence = false;
    let mut fence_language: Option<String> = None;
    let mut fence_code: Vec<&str> = Vec::new();

    for &line in lines {
        if in_fence {
            if line.trim_start().starts_with("```") {
                examples.push(Example {
                    label: current_label.clone().unwrap_or_default(),
                    language: fence_language.take(),
                    code: fence_code.join("\n"),
                });
                fence_code.clear();
                in_fence = false;
            } else {
                fence_code.push(line);
            }
            continue;
        }

        let trimmed = line.trim();

        if let Some(rest) = trimmed.strip_prefix("```") {
            in_fence = true;
            let lang = rest.trim();
            fence_language = if lang.is_empty() {
                None
            } else {
                Some(lang.to_string())
            };
            continue;
        }

        if let Some(rest) = trimmed.strip_prefix("# ") {
            if title.is_none() {
                title = Some(rest.trim().to_string());
                continue;
            }
        }

        // `##` and deeper headings label the examples that follow.
        if trimmed.starts_with("##") {
            let text = trimmed.trim_start_matches('#').trim();
            if !text.is_empty() {
                current_label = Some(text.to_string());
            }
            continue;
        }

        // Bold labels: `**Incorrect**` or `**Correct:**` on their own line.
        if let Some(inner) = trimmed
            .strip_prefix("**")
            .and_then(|s| s.strip_suffix("**"))
        {
            let text = inner.trim_end_matches(':').trim();
            if !text.is_empty() {
                current_label = Some(text.to_string());
                continue;
            }
        }

        // Prose before the first label and the first fence is the explanation.
        if current_label.is_none() && examples.is_empty() && !trimmed.is_empty() {
            explanation_lines.push(trimmed);
        }
    }

    if in_fence {
        return Err(ParseError::new(path, "unterminated code fence"));
    }

    Ok((title, explanation_lines.join("\n"), examples))
}
