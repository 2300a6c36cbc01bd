//! CLI module for rowcrc
//!
//! Provides command-line interface for:
//! - verify: Check one row against its embedded checksum
//! - batch: Check one row per stdin line
//! - compute: Print the recomputed checksum of a row
//! - columns: Print the descriptors extracted from a schema

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command, SchemaArgs};
pub use commands::{run, run_command, verify_lines, BatchSummary, Session};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{error_response, ok_response, read_document, read_json_file, write_json, write_response};
