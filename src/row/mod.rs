//! Decoded change-event rows
//!
//! Rows are produced by an external payload decoder. This module holds
//! the loosely-typed value model and an Avro-JSON ingestion path used by
//! the command-line tools.

mod errors;
mod value;

pub use errors::{RowError, RowResult};
pub use value::{DecodedRow, DecodedValue};
