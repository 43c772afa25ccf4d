//! Core data types for the rule set.
//!
//! A [`Rule`] is one best-practice entry parsed from a Markdown rule file;
//! its [`Example`]s are the labeled code blocks found in the body. Both are
//! immutable once parsed — validators and the compiler only read them.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Impact level of a rule, ordered from highest to lowest effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Impact {
    Critical,
    High,
    Medium,
    Low,
}

impl fmt::Display for Impact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Impact::Critical => write!(f, "CRITICAL"),
            Impact::High => write!(f, "HIGH"),
            Impact::Medium => write!(f, "MEDIUM"),
            Impact::Low => write!(f, "LOW"),
        }
    }
}

impl FromStr for Impact {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "critical" => Ok(Impact::Critical),
            "high" => Ok(Impact::High),
            "medium" => Ok(Impact::Medium),
            "low" => Ok(Impact::Low),
            _ => Err(()),
        }
    }
}

/// How an example label classifies within a rule's before/after structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExampleKind {
    /// The "don't do this" case.
    Negative,
    /// The "do this instead" case.
    Positive,
    /// Label matched neither synonym set.
    Unclassified,
}

/// Label synonyms for the negative (anti-pattern) case.
const NEGATIVE_LABELS: &[&str] = &["incorrect", "wrong", "bad"];

/// Label synonyms for the positive (recommended) case.
const POSITIVE_LABELS: &[&str] = &["correct", "good", "usage", "example"];

/// Classifies a label against the synonym tables, case-insensitively.
///
/// Negative synonyms are checked first so that a label like
/// "Incorrect usage" classifies as negative even though it also contains
/// a positive synonym.
pub fn classify_label(label: &str) -> ExampleKind {
    let lower = label.to_lowercase();
    if NEGATIVE_LABELS.iter().any(|s| lower.contains(s)) {
        return ExampleKind::Negative;
    }
    if POSITIVE_LABELS.iter().any(|s| lower.contains(s)) {
        return ExampleKind::Positive;
    }
    ExampleKind::Unclassified
}

/// One labeled code illustration inside a rule.
#[derive(Debug, Clone, serde::Serialize)]
pub struct Example {
    /// Heading or bold-label text the code block appeared under.
    pub label: String,
    /// Declared code-fence language tag, if any.
    pub language: Option<String>,
    /// Raw source text of the fenced block.
    pub code: String,
}

impl Example {
    pub fn kind(&self) -> ExampleKind {
        classify_label(&self.label)
    }

    /// Returns `true` if this example should be submitted to the SQL engine.
    ///
    /// A missing language tag defaults to SQL — the rule set is a ClickHouse
    /// knowledge base and untagged fences are overwhelmingly SQL.
    pub fn is_sql(&self) -> bool {
        match &self.language {
            None => true,
            Some(lang) => lang.eq_ignore_ascii_case("sql"),
        }
    }
}

/// One best-practice entry.
#[derive(Debug, Clone, serde::Serialize)]
pub struct Rule {
    /// File stem; stable and unique within the rule set.
    pub id: String,
    /// Path of the source rule file.
    pub file: PathBuf,
    /// Imperative statement; frontmatter wins over the body heading.
    pub title: String,
    /// Parsed impact, `None` when missing or unrecognized.
    pub impact: Option<Impact>,
    /// Raw impact text as written, kept for diagnostics.
    pub impact_raw: Option<String>,
    /// Optional free-text quantification of the impact.
    pub impact_description: Option<String>,
    /// Free-text labels; order as written, order is not significant.
    pub tags: Vec<String>,
    /// Prose body before the first example.
    pub explanation: String,
    /// Code examples in document order.
    pub examples: Vec<Example>,
    /// Optional external reference URL.
    pub reference: Option<String>,
}

impl Rule {
    pub fn has_negative_example(&self) -> bool {
        self.examples
            .iter()
            .any(|e| e.kind() == ExampleKind::Negative)
    }

    pub fn has_positive_example(&self) -> bool {
        self.examples
            .iter()
            .any(|e| e.kind() == ExampleKind::Positive)
    }

    /// Returns `true` if at least one example carries non-empty code.
    pub fn has_code(&self) -> bool {
        self.examples.iter().any(|e| !e.code.trim().is_empty())
    }
}
