//! Sandboxed SQL engine integration.
//!
//! The SQL validator never links a database — it shells out to
//! `clickhouse local`, a single-binary engine, with every write path
//! disabled. The engine is modeled as an injected capability
//! ([`SqlEngine`]) so the validator logic is unit-testable with a fake;
//! [`ClickHouseLocal`] is the real implementation.
//!
//! # Acquisition
//!
//! The binary is pinned to the version in [`EngineConfig`] and cached
//! under its cache directory. When absent it is downloaded from the
//! release URL for the current platform. Only linux/x86_64 and
//! macos/aarch64 are supported; on any other platform acquisition fails
//! with [`EngineError::UnsupportedPlatform`] and the SQL check degrades
//! to a skip — SQL verification is best-effort, not a gate for unrelated
//! CI work.
//!
//! # Sandbox
//!
//! Every invocation passes a fixed restrictive flag set: `--readonly=2`,
//! DDL and introspection functions disabled, execution time / memory /
//! row-scan caps, and file/schema path roots pointed at a non-existent
//! directory. The caps are enforced by the engine itself; the caller has
//! no secondary timeout.

use crate::config::EngineConfig;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("unsupported platform: {0}")]
    UnsupportedPlatform(String),
    #[error("failed to download engine: {0}")]
    Download(String),
    #[error("failed to invoke engine: {0}")]
    Io(#[from] std::io::Error),
    /// The engine reported a query exception; carries the verbatim stderr.
    #[error("{0}")]
    Query(String),
}

/// Capability interface for validating one SQL statement.
///
/// Implementers **must** be [`Send`] + [`Sync`]; the real implementation
/// is shared for the whole run.
pub trait SqlEngine: Send + Sync {
    /// Validates `sql`, returning `Err(EngineError::Query(_))` with the
    /// engine's error text when the statement is rejected.
    fn validate(&self, sql: &str) -> Result<(), EngineError>;
}

/// Returns `true` when the current platform has a published engine build.
pub fn platform_supported() -> bool {
    platform_segment().is_ok()
}

/// Returns the release path segment for the current platform, or `Err`
/// for anything outside the two supported targets.
fn platform_segment() -> Result<&'static str, EngineError> {
    match (std::env::consts::OS, std::env::consts::ARCH) {
        ("linux", "x86_64") => Ok("linux-amd64"),
        ("macos", "aarch64") => Ok("macos-arm64"),
        (os, arch) => Err(EngineError::UnsupportedPlatform(format!("{os}/{arch}"))),
    }
}

/// `clickhouse local` wrapper with the pinned binary and sandbox caps.
pub struct ClickHouseLocal {
    binary: PathBuf,
    config: EngineConfig,
}

impl ClickHouseLocal {
    /// Locates the pinned engine binary, downloading it if absent.
    ///
    /// Idempotent: once the versioned binary exists in the cache it is
    /// reused for every subsequent run.
    pub fn acquire(config: &EngineConfig) -> Result<Self, EngineError> {
        let segment = platform_segment()?;
        let binary = config
            .cache_dir
            .join(format!("clickhouse-{}", config.version));

        if !binary.exists() {
            let url = format!(
                "{}/v{}/{}/clickhouse",
                config.download_base.trim_end_matches('/'),
                config.version,
                segment
            );
            download_binary(&url, &binary)?;
        }

        Ok(ClickHouseLocal {
            binary,
            config: config.clone(),
        })
    }

    /// Builds an engine wrapper around an existing binary without
    /// downloading. Used by `check-tools` and tests.
    pub fn with_binary(binary: PathBuf, config: &EngineConfig) -> Self {
        ClickHouseLocal {
            binary,
            config: config.clone(),
        }
    }

    /// Path the pinned binary is cached at, whether or not it exists yet.
    pub fn cache_path(config: &EngineConfig) -> PathBuf {
        config
            .cache_dir
            .join(format!("clickhouse-{}", config.version))
    }
}

fn download_binary(url: &str, dest: &Path) -> Result<(), EngineError> {
    if let Some(parent) = dest.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| EngineError::Download(format!("cannot create cache dir: {e}")))?;
    }

    eprintln!("Fetching SQL engine from {url} ...");
    let response = reqwest::blocking::get(url)
        .map_err(|e| EngineError::Download(format!("{url}: {e}")))?;
    if !response.status().is_success() {
        return Err(EngineError::Download(format!(
            "{url}: HTTP {}",
            response.status().as_u16()
        )));
    }
    let bytes = response
        .bytes()
        .map_err(|e| EngineError::Download(format!("{url}: {e}")))?;

    // Write to a sibling temp file, then rename so a failed download never
    // leaves a half-written binary at the cached path.
    let mut tmp = tempfile::NamedTempFile::new_in(dest.parent().unwrap_or(Path::new(".")))
        .map_err(|e| EngineError::Download(format!("cannot create temp file: {e}")))?;
    tmp.write_all(&bytes)
        .map_err(|e| EngineError::Download(format!("cannot write binary: {e}")))?;
    tmp.persist(dest)
        .map_err(|e| EngineError::Download(format!("cannot persist binary: {e}")))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(dest, std::fs::Permissions::from_mode(0o755))
            .map_err(|e| EngineError::Download(format!("cannot set exec bit: {e}")))?;
    }

    Ok(())
}

impl SqlEngine for ClickHouseLocal {
    fn validate(&self, sql: &str) -> Result<(), EngineError> {
        // NamedTempFile is removed on drop, which covers every exit path
        // out of this function including engine and I/O failures.
        let mut query_file = tempfile::NamedTempFile::new()?;
        query_file.write_all(sql.as_bytes())?;
        query_file.flush()?;

        let output = Command::new(&self.binary)
            .arg("local")
            .arg("--queries-file")
            .arg(query_file.path())
            .arg("--readonly=2")
            .arg("--allow_ddl=0")
            .arg("--allow_introspection_functions=0")
            .arg(format!(
                "--max_execution_time={}",
                self.config.max_execution_time_secs
            ))
            .arg(format!("--max_memory_usage={}", self.config.max_memory_bytes))
            .arg(format!("--max_rows_to_read={}", self.config.max_rows_to_read))
            .arg("--user_files_path=/nonexistent/ch-rulebook")
            .arg("--format_schema_path=/nonexistent/ch-rulebook")
            .output()?;

        let stderr = String::from_utf8_lossy(&output.stderr);

        // The engine communicates query failures through stderr exception
        // markers; exit status alone is not reliable across versions.
        if stderr.contains("Exception") || stderr.contains("Code:") {
            return Err(EngineError::Query(stderr.trim().to_string()));
        }
        if !output.status.success() && !stderr.trim().is_empty() {
            return Err(EngineError::Query(stderr.trim().to_string()));
        }

        Ok(())
    }
}
