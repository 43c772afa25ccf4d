//! Configuration loading and management.
//!
//! Provides types for the TOML-based configuration file. All fields carry
//! sensible defaults so the file can be omitted entirely.
//!
//! # Configuration file
//!
//! The default configuration file is `ch-rulebook.toml` in the current
//! working directory. Use [`Config::load`] to read it:
//!
//! ```rust,no_run
//! use ch_rulebook::config::Config;
//!
//! let config = Config::load(None).expect("failed to load config");
//! assert!(config.is_check_enabled("structure"));
//! ```

use std::path::{Path, PathBuf};

/// Main configuration for the validation and build pipeline.
///
/// Loaded from a TOML file (typically `ch-rulebook.toml`).
#[derive(Debug, Clone, Default, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct Config {
    /// Input/output locations.
    pub paths: PathsConfig,
    /// SQL engine pin, cache, and sandbox resource caps.
    pub engine: EngineConfig,
    /// External link probing: timeout, batch size, retry/backoff.
    pub network: NetworkConfig,
    /// Per-check on/off toggles.
    pub checks: ChecksConfig,
    /// Domains the external link checker skips.
    pub allowlist: AllowlistConfig,
    /// When strict mode is enabled, warnings are promoted to failures.
    pub strict: StrictConfig,
}

/// Input and output locations, relative to the working directory.
#[derive(Debug, Clone, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Directory of rule files.
    pub rules: PathBuf,
    /// Root of the skill tree (documentation scanned for external links).
    pub skill: PathBuf,
    /// Rulebook manifest: book metadata and section definitions.
    pub manifest: PathBuf,
    /// Compiled document destination.
    pub output: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        PathsConfig {
            rules: PathBuf::from("rules"),
            skill: PathBuf::from("."),
            manifest: PathBuf::from("rulebook.toml"),
            output: PathBuf::from("dist/clickhouse-best-practices.md"),
        }
    }
}

/// SQL engine acquisition and sandbox settings.
///
/// The engine binary is pinned to `version` and cached under `cache_dir`;
/// the `max_*` caps are passed to every invocation as engine flags.
#[derive(Debug, Clone, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Pinned ClickHouse version.
    pub version: String,
    /// Where the downloaded binary is cached.
    pub cache_dir: PathBuf,
    /// Base URL for release downloads.
    pub download_base: String,
    /// Per-query execution time cap, seconds.
    pub max_execution_time_secs: u64,
    /// Per-query memory cap, bytes.
    pub max_memory_bytes: u64,
    /// Per-query row scan cap.
    pub max_rows_to_read: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            version: "25.3.2.39".to_string(),
            cache_dir: PathBuf::from(".cache/ch-rulebook"),
            download_base: "https://builds.clickhouse.com/stable".to_string(),
            max_execution_time_secs: 10,
            max_memory_bytes: 512 * 1024 * 1024,
            max_rows_to_read: 1_000_000,
        }
    }
}

/// External link probing settings.
#[derive(Debug, Clone, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Per-attempt timeout, seconds.
    pub timeout_secs: u64,
    /// URLs probed concurrently per batch.
    pub batch_size: usize,
    /// Additional attempts per URL after the first.
    pub max_retries: u32,
    /// Escalating delays between attempts, milliseconds. When retries
    /// outnumber entries the last delay repeats.
    pub backoff_ms: Vec<u64>,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        NetworkConfig {
            timeout_secs: 10,
            batch_size: 10,
            max_retries: 3,
            backoff_ms: vec![500, 1_500, 4_000],
        }
    }
}

/// Per-check on/off toggles. Every check defaults to **enabled**.
///
/// # Examples
///
/// ```toml
/// [checks]
/// external_links = false   # skip network probing in offline CI
/// ```
#[derive(Debug, Clone, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct ChecksConfig {
    /// Content-contract validation of parsed rules.
    pub structure: bool,
    /// Sandboxed SQL verification of rule examples.
    pub sql: bool,
    /// Internal cross-reference resolution.
    pub links: bool,
    /// External URL liveness probing.
    pub external_links: bool,
}

impl Default for ChecksConfig {
    fn default() -> Self {
        ChecksConfig {
            structure: true,
            sql: true,
            links: true,
            external_links: true,
        }
    }
}

/// Domains the external link checker never probes.
///
/// Entries are normalized to lowercase at load time via
/// [`AllowlistConfig::normalize`] so the checker can compare without
/// per-URL allocation.
#[derive(Debug, Clone, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct AllowlistConfig {
    /// Hosts to skip (placeholders and local addresses by default).
    pub domains: Vec<String>,
}

impl AllowlistConfig {
    /// Normalizes all entries to lowercase in-place.
    pub fn normalize(&mut self) {
        for s in &mut self.domains {
            *s = s.to_lowercase();
        }
    }
}

impl Default for AllowlistConfig {
    fn default() -> Self {
        // Values are already lowercase; normalize() is a no-op for the default.
        AllowlistConfig {
            domains: vec![
                "localhost".to_string(),
                "127.0.0.1".to_string(),
                "example.com".to_string(),
            ],
        }
    }
}

/// Strict-mode configuration.
///
/// When [`enabled`](StrictConfig::enabled) is `true`, any warning-level
/// finding fails the run.
#[derive(Debug, Clone, Default, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct StrictConfig {
    /// Set to `true` to treat warnings as errors.
    pub enabled: bool,
}

impl Config {
    /// Loads configuration from a TOML file.
    ///
    /// Resolution order:
    /// 1. If `path` is `Some`, load from that file (error if missing).
    /// 2. If `path` is `None`, try `ch-rulebook.toml` in the current directory.
    /// 3. If that file does not exist either, return [`Config::default()`].
    ///
    /// # Errors
    ///
    /// Returns `Err(String)` when the explicit path does not exist, the file
    /// cannot be read, or the TOML content fails to parse.
    pub fn load(path: Option<&Path>) -> Result<Config, String> {
        let config_path = if let Some(p) = path {
            if p.exists() {
                Some(p.to_path_buf())
            } else {
                return Err(format!("Config file not found: {}", p.display()));
            }
        } else {
            let default_path = Path::new("ch-rulebook.toml");
            if default_path.exists() {
                Some(default_path.to_path_buf())
            } else {
                None
            }
        };

        match config_path {
            Some(path) => {
                let content = std::fs::read_to_string(&path)
                    .map_err(|e| format!("Failed to read config {}: {}", path.display(), e))?;
                let mut config: Config = toml::from_str(&content)
                    .map_err(|e| format!("Failed to parse config {}: {}", path.display(), e))?;
                // Normalize allowlist entries once at load time so the link
                // checker can skip per-URL lowercasing.
                config.allowlist.normalize();
                Ok(config)
            }
            None => Ok(Config::default()),
        }
    }

    /// Returns `true` if the named check is enabled.
    ///
    /// Unknown check names are considered enabled (returns `true`).
    ///
    /// # Examples
    ///
    /// ```
    /// use ch_rulebook::config::Config;
    ///
    /// let config = Config::default();
    /// assert!(config.is_check_enabled("sql"));
    /// assert!(config.is_check_enabled("unknown_check"));
    /// ```
    pub fn is_check_enabled(&self, name: &str) -> bool {
        match name {
            "structure" => self.checks.structure,
            "sql" => self.checks.sql,
            "links" => self.checks.links,
            "external_links" => self.checks.external_links,
            _ => true,
        }
    }
}
