//! Deterministic document compilation.
//!
//! Groups the rule set into ranked sections by filename prefix, assigns
//! hierarchical numbering, and renders one Markdown reference document
//! with a generated table of contents and a trailing references list.
//! The output is a pure function of the rule files and the manifest —
//! rebuilding unchanged inputs is byte-identical. The only mutation in
//! the whole pipeline is the optional patch-level version bump, a
//! read-modify-write against the manifest with no caching.

use crate::checks::collect_rule_files;
use crate::parser;
use crate::rule::{Impact, Rule};
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    #[error("failed to read manifest {path}: {source}")]
    ManifestIo {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse manifest {path}: {message}")]
    ManifestParse { path: String, message: String },
    #[error("{0}")]
    Parse(#[from] parser::ParseError),
    /// A rule file matched no declared section prefix. Hard stop:
    /// silently dropping content from the compiled output would be a
    /// correctness failure, not a quality warning.
    #[error("orphan rule '{file}' matches no section prefix")]
    OrphanRule { file: String },
    #[error("invalid version '{version}': {message}")]
    Version { version: String, message: String },
    #[error("failed to write {path}: {source}")]
    OutputIo {
        path: String,
        source: std::io::Error,
    },
}

/// Book-level metadata from the manifest.
#[derive(Debug, Clone, serde::Deserialize, serde::Serialize)]
pub struct BookMeta {
    pub title: String,
    pub version: String,
    pub organization: String,
    #[serde(rename = "abstract")]
    pub summary: String,
}

/// One section definition: a named, ranked grouping of rules sharing a
/// filename prefix.
#[derive(Debug, Clone, serde::Deserialize, serde::Serialize)]
pub struct SectionDef {
    pub name: String,
    pub prefix: String,
    pub impact: Impact,
    pub description: String,
    pub rank: u32,
}

/// The rulebook manifest: `[book]` metadata plus `[[section]]` entries.
#[derive(Debug, Clone, serde::Deserialize, serde::Serialize)]
pub struct Manifest {
    pub book: BookMeta,
    #[serde(rename = "section")]
    pub sections: Vec<SectionDef>,
}

impl Manifest {
    pub fn load(path: &Path) -> Result<Manifest, CompileError> {
        let content = std::fs::read_to_string(path).map_err(|e| CompileError::ManifestIo {
            path: path.display().to_string(),
            source: e,
        })?;
        toml::from_str(&content).map_err(|e| CompileError::ManifestParse {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    fn store(&self, path: &Path) -> Result<(), CompileError> {
        let content = toml::to_string_pretty(self).map_err(|e| CompileError::ManifestParse {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        std::fs::write(path, content).map_err(|e| CompileError::OutputIo {
            path: path.display().to_string(),
            source: e,
        })
    }
}

/// Bumps the manifest's patch version and persists it.
///
/// The manifest is re-read immediately before the bump — no cached copy
/// is trusted — so repeated invocations never act on stale state.
/// Returns the new version string.
pub fn bump_version(manifest_path: &Path) -> Result<String, CompileError> {
    let mut manifest = Manifest::load(manifest_path)?;

    let mut version = semver::Version::parse(&manifest.book.version).map_err(|e| {
        CompileError::Version {
            version: manifest.book.version.clone(),
            message: e.to_string(),
        }
    })?;
    version.patch += 1;

    manifest.book.version = version.to_string();
    manifest.store(manifest_path)?;
    Ok(manifest.book.version)
}

/// A section populated with its rules, ready to render.
struct BoundSection<'a> {
    def: &'a SectionDef,
    rules: Vec<Rule>,
}

/// Groups parsed rules into sections by longest-prefix match.
///
/// Rules arrive sorted by filename (see [`collect_rule_files`]), which
/// fixes their order — and therefore their numbering — within each
/// section. An unmatched rule aborts compilation.
fn bind_sections<'a>(
    manifest: &'a Manifest,
    rules: Vec<Rule>,
) -> Result<Vec<BoundSection<'a>>, CompileError> {
    let mut sections: Vec<BoundSection> = manifest
        .sections
        .iter()
        .map(|def| BoundSection { def, rules: vec![] })
        .collect();
    sections.sort_by_key(|s| s.def.rank);

    for rule in rules {
        let filename = rule
            .file
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        // Longest prefix wins so "schema-types-" beats "schema-".
        let best = sections
            .iter_mut()
            .filter(|s| filename.starts_with(&s.def.prefix))
            .max_by_key(|s| s.def.prefix.len());

        match best {
            Some(section) => section.rules.push(rule),
            None => return Err(CompileError::OrphanRule { file: filename }),
        }
    }

    Ok(sections)
}

/// GitHub-style anchor slug for a heading. Used for both the TOC links
/// and the headings themselves, so they always agree.
fn slugify(heading: &str) -> String {
    heading
        .to_lowercase()
        .chars()
        .filter_map(|c| {
            if c.is_alphanumeric() {
                Some(c)
            } else if c == ' ' || c == '-' {
                Some('-')
            } else {
                None
            }
        })
        .collect()
}

/// Compiles the rule set against the manifest into one Markdown document.
pub fn compile(rules_dir: &Path, manifest: &Manifest) -> Result<String, CompileError> {
    let mut rules = Vec::new();
    for file in collect_rule_files(rules_dir) {
        rules.push(parser::parse_rule_file(&file)?);
    }
    let sections = bind_sections(manifest, rules)?;

    let mut out = String::new();
    out.push_str(&format!("# {}\n\n", manifest.book.title));
    out.push_str(&format!(
        "*{}* — version {}\n\n",
        manifest.book.organization, manifest.book.version
    ));
    out.push_str(&format!("> {}\n\n", manifest.book.summary));

    // Table of contents. Anchors come from the same slug function as the
    // headings below, so every link resolves.
    out.push_str("## Table of Contents\n\n");
    for section in &sections {
        let heading = format!("{}. {}", section.def.rank, section.def.name);
        out.push_str(&format!("- [{heading}](#{})\n", slugify(&heading)));
        for (i, rule) in section.rules.iter().enumerate() {
            let heading = format!("{}.{} {}", section.def.rank, i + 1, rule.title);
            out.push_str(&format!("  - [{heading}](#{})\n", slugify(&heading)));
        }
    }
    out.push('\n');

    // Sections and rules.
    let mut references: Vec<(String, String)> = Vec::new();
    for section in &sections {
        out.push_str(&format!("## {}. {}\n\n", section.def.rank, section.def.name));
        out.push_str(&format!("{}\n\n", section.def.description));

        for (i, rule) in section.rules.iter().enumerate() {
            let number = format!("{}.{}", section.def.rank, i + 1);
            out.push_str(&format!("### {number} {}\n\n", rule.title));

            if let Some(impact) = rule.impact {
                match &rule.impact_description {
                    Some(desc) => out.push_str(&format!("**Impact: {impact}** — {desc}\n\n")),
                    None => out.push_str(&format!("**Impact: {impact}**\n\n")),
                }
            }

            if !rule.tags.is_empty() {
                out.push_str(&format!("*Tags: {}*\n\n", rule.tags.join(", ")));
            }

            out.push_str(&format!("{}\n\n", rule.explanation));

            for example in &rule.examples {
                if !example.label.is_empty() {
                    out.push_str(&format!("**{}**\n\n", example.label));
                }
                let lang = example.language.as_deref().unwrap_or("sql");
                out.push_str(&format!("```{lang}\n{}\n```\n\n", example.code));
            }

            if let Some(reference) = &rule.reference {
                out.push_str(&format!("Reference: <{reference}>\n\n"));
                references.push((number, reference.clone()));
            }
        }
    }

    if !references.is_empty() {
        out.push_str("## References\n\n");
        for (number, url) in &references {
            out.push_str(&format!("- {number}: <{url}>\n"));
        }
    }

    Ok(out)
}

/// Compiles and writes the document to `output`, creating parent
/// directories as needed.
pub fn build_to_file(
    rules_dir: &Path,
    manifest: &Manifest,
    output: &Path,
) -> Result<(), CompileError> {
    let document = compile(rules_dir, manifest)?;
    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| CompileError::OutputIo {
                path: parent.display().to_string(),
                source: e,
            })?;
        }
    }
    std::fs::write(output, document).map_err(|e| CompileError::OutputIo {
        path: output.display().to_string(),
        source: e,
    })
}
