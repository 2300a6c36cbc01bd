//! CLI argument definitions using clap
//!
//! Commands:
//! - rowcrc verify --schema <path> [--row <path>] [--config <path>]
//! - rowcrc batch --schema <path> [--config <path>]
//! - rowcrc compute --schema <path> [--row <path>] [--config <path>]
//! - rowcrc columns --schema <path> [--config <path>]

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::observability::Severity;

/// rowcrc - verify row-level checksums of change events
#[derive(Parser, Debug)]
#[command(name = "rowcrc")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Minimum severity of log lines written to stderr
    #[arg(long, global = true, default_value = "info", value_parser = parse_severity)]
    pub log_level: Severity,

    #[command(subcommand)]
    pub command: Command,
}

/// Arguments shared by every command
#[derive(Args, Debug, Clone)]
pub struct SchemaArgs {
    /// Path to the Avro record schema (JSON)
    #[arg(long)]
    pub schema: PathBuf,

    /// Path to an optional verifier configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Verify the checksum of a single row
    Verify {
        #[command(flatten)]
        schema: SchemaArgs,

        /// Path to the row (Avro JSON); stdin when omitted
        #[arg(long)]
        row: Option<PathBuf>,
    },

    /// Verify one row per stdin line
    Batch {
        #[command(flatten)]
        schema: SchemaArgs,
    },

    /// Print the recomputed checksum of a row
    Compute {
        #[command(flatten)]
        schema: SchemaArgs,

        /// Path to the row (Avro JSON); stdin when omitted
        #[arg(long)]
        row: Option<PathBuf>,
    },

    /// Print the column descriptors extracted from a schema
    Columns {
        #[command(flatten)]
        schema: SchemaArgs,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

fn parse_severity(s: &str) -> Result<Severity, String> {
    Severity::parse(s).ok_or_else(|| format!("unknown log level '{}'", s))
}
