//! CLI commands and argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Bounded pagination over HTTP and SQL sources
#[derive(Parser, Debug)]
#[command(name = "bounded-pager")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Source definition file (YAML)
    #[arg(short, long, global = true)]
    pub definition: Option<PathBuf>,

    /// Configuration file (JSON) for `{{ config.* }}` templates
    #[arg(short = 'C', long, global = true)]
    pub config: Option<PathBuf>,

    /// Inline config JSON (takes precedence over --config)
    #[arg(long, global = true)]
    pub config_json: Option<String>,

    /// Output format
    #[arg(short, long, global = true, default_value = "json")]
    pub format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch rows up to the configured cap
    Fetch {
        /// Rows per page (overrides the definition)
        #[arg(long, allow_negative_numbers = true)]
        batch_size: Option<i64>,

        /// Maximum rows to return (overrides the definition)
        #[arg(long, allow_negative_numbers = true)]
        max_rows: Option<i64>,

        /// Write rows to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Fetch a single row to test the source
    Check,

    /// Validate the source definition
    Validate,

    /// Print the resolved definition with secrets masked
    Show,
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// One JSON value per line
    Json,
    /// Pretty-printed JSON
    Pretty,
}
