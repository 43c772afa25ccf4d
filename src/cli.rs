use clap::{Parser, Subcommand};
use ch_rulebook::output::OutputFormat;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "ch-rulebook",
    version,
    about = "Validate and compile ClickHouse best-practice rule sets"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run validation checks against a rules directory
    Check {
        /// Path to the rules directory (default from config)
        path: Option<PathBuf>,

        /// Run a single check instead of all enabled ones
        #[arg(long, value_parser = ["structure", "sql", "links", "external_links"])]
        only: Option<String>,

        /// Output format
        #[arg(long, short, default_value = "pretty", value_enum)]
        format: OutputFormat,

        /// Write output to file instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,

        /// Treat warnings as errors
        #[arg(long)]
        strict: bool,

        /// Custom config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Compile the rule set into the reference document
    Build {
        /// Path to the rules directory (default from config)
        path: Option<PathBuf>,

        /// Rulebook manifest path (default from config)
        #[arg(long)]
        manifest: Option<PathBuf>,

        /// Output document path (default from config)
        #[arg(long, short)]
        output: Option<PathBuf>,

        /// Bump the patch version before compiling and persist it
        #[arg(long)]
        upgrade: bool,

        /// Custom config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Check which checks can run in this environment
    CheckTools,

    /// List all violation codes with descriptions
    ListCodes,

    /// Show full explanation for a violation code
    Explain {
        /// Violation code (e.g., "sql/denied-file-function")
        code: String,
    },
}
