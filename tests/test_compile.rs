use std::path::Path;

use ch_rulebook::compile::{bump_version, compile, CompileError, Manifest};

fn manifest() -> Manifest {
    Manifest::load(Path::new("tests/fixtures/rulebook.toml")).unwrap()
}

fn clean_rules() -> &'static Path {
    Path::new("tests/fixtures/rules-clean")
}

#[test]
fn manifest_loads_book_and_sections() {
    let m = manifest();
    assert_eq!(m.book.title, "ClickHouse Best Practices");
    assert_eq!(m.book.version, "1.4.2");
    assert_eq!(m.sections.len(), 3);
    assert_eq!(m.sections[0].prefix, "schema-");
}

#[test]
fn compiling_twice_is_byte_identical() {
    let m = manifest();
    let first = compile(clean_rules(), &m).unwrap();
    let second = compile(clean_rules(), &m).unwrap();
    assert_eq!(first, second);
}

#[test]
fn sections_are_ordered_by_rank_and_rules_numbered_within() {
    let doc = compile(clean_rules(), &manifest()).unwrap();

    let schema = doc.find("## 1. Schema Design").unwrap();
    let query = doc.find("## 2. Query Patterns").unwrap();
    let ingest = doc.find("## 3. Data Ingestion").unwrap();
    assert!(schema < query && query < ingest);

    assert!(doc.contains("### 1.1 Use LowCardinality for repetitive string columns"));
    assert!(doc.contains("### 2.1 Select only the columns you need"));
    assert!(doc.contains("### 3.1 Batch inserts instead of writing row by row"));
}

#[test]
fn toc_anchors_match_the_generated_headings() {
    let doc = compile(clean_rules(), &manifest()).unwrap();

    assert!(doc.contains("- [1. Schema Design](#1-schema-design)"));
    assert!(doc.contains(
        "  - [1.1 Use LowCardinality for repetitive string columns](#11-use-lowcardinality-for-repetitive-string-columns)"
    ));
    assert!(doc.contains("  - [2.1 Select only the columns you need](#21-select-only-the-columns-you-need)"));
}

#[test]
fn document_carries_metadata_impact_and_references() {
    let doc = compile(clean_rules(), &manifest()).unwrap();

    assert!(doc.starts_with("# ClickHouse Best Practices\n"));
    assert!(doc.contains("*Acme Data Platform* — version 1.4.2"));
    assert!(doc.contains("> Curated schema, query, and ingestion guidance"));
    assert!(doc.contains("**Impact: HIGH** — Cuts storage 3-10x"));
    assert!(doc.contains("**Impact: CRITICAL** — Small inserts create part explosions"));
    assert!(doc.contains("## References"));
    assert!(doc.contains(
        "- 1.1: <https://clickhouse.com/docs/sql-reference/data-types/lowcardinality>"
    ));
}

#[test]
fn examples_render_in_original_order_with_language_fences() {
    let doc = compile(clean_rules(), &manifest()).unwrap();

    let incorrect = doc.find("**Bad usage**").unwrap();
    let correct = doc.find("**Correct usage**").unwrap();
    assert!(incorrect < correct);
    assert!(doc.contains("```python\nfor row in rows:"));
}

#[test]
fn orphan_rule_is_a_hard_stop() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("zzz-unmatched-rule.md"),
        "---\ntitle: Orphan\nimpact: LOW\n---\nProse.\n\n**Incorrect**\n\n```sql\nSELECT 1\n```\n",
    )
    .unwrap();

    let err = compile(dir.path(), &manifest()).unwrap_err();
    match err {
        CompileError::OrphanRule { file } => assert_eq!(file, "zzz-unmatched-rule.md"),
        other => panic!("expected OrphanRule, got: {other}"),
    }
}

#[test]
fn rules_with_identical_titles_stay_distinct_entries() {
    let dir = tempfile::tempdir().unwrap();
    for name in ["schema-first.md", "schema-second.md"] {
        std::fs::write(
            dir.path().join(name),
            "---\ntitle: Shared title\nimpact: LOW\n---\nProse.\n\n**Incorrect**\n\n```sql\nSELECT 1\n```\n\n**Correct**\n\n```sql\nSELECT 2\n```\n",
        )
        .unwrap();
    }

    let doc = compile(dir.path(), &manifest()).unwrap();
    assert!(doc.contains("### 1.1 Shared title"));
    assert!(doc.contains("### 1.2 Shared title"));
}

#[test]
fn adding_a_rule_renumbers_only_its_own_section() {
    let dir = tempfile::tempdir().unwrap();
    for file in std::fs::read_dir(clean_rules()).unwrap() {
        let file = file.unwrap();
        std::fs::copy(file.path(), dir.path().join(file.file_name())).unwrap();
    }

    let m = manifest();
    let before = compile(dir.path(), &m).unwrap();

    std::fs::write(
        dir.path().join("query-aaa-new-rule.md"),
        "---\ntitle: Added rule\nimpact: LOW\n---\nProse.\n\n**Incorrect**\n\n```sql\nSELECT 1\n```\n\n**Correct**\n\n```sql\nSELECT 2\n```\n",
    )
    .unwrap();
    let after = compile(dir.path(), &m).unwrap();

    // The new file sorts first within the query section and takes 2.1;
    // the existing query rule shifts to 2.2.
    assert!(after.contains("### 2.1 Added rule"));
    assert!(after.contains("### 2.2 Select only the columns you need"));

    // Other sections' numbering is untouched.
    for line in ["### 1.1 Use LowCardinality", "### 3.1 Batch inserts"] {
        assert!(before.contains(line) && after.contains(line));
    }
}

#[test]
fn bump_version_is_a_persisted_patch_increment() {
    let dir = tempfile::tempdir().unwrap();
    let manifest_path = dir.path().join("rulebook.toml");
    std::fs::copy("tests/fixtures/rulebook.toml", &manifest_path).unwrap();

    assert_eq!(bump_version(&manifest_path).unwrap(), "1.4.3");
    // The bump re-reads persisted state, so a second invocation continues
    // from 1.4.3 rather than re-bumping a cached 1.4.2.
    assert_eq!(bump_version(&manifest_path).unwrap(), "1.4.4");

    let reloaded = Manifest::load(&manifest_path).unwrap();
    assert_eq!(reloaded.book.version, "1.4.4");
    // Section definitions survive the round-trip.
    assert_eq!(reloaded.sections.len(), 3);
}

#[test]
fn invalid_version_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let manifest_path = dir.path().join("rulebook.toml");
    let content = std::fs::read_to_string("tests/fixtures/rulebook.toml")
        .unwrap()
        .replace("1.4.2", "not-a-version");
    std::fs::write(&manifest_path, content).unwrap();

    let err = bump_version(&manifest_path).unwrap_err();
    assert!(matches!(err, CompileError::Version { .. }));
}
