//! Row ingestion errors

use thiserror::Error;

/// Result type for row ingestion
pub type RowResult<T> = Result<T, RowError>;

/// Errors converting an external row representation into a `DecodedRow`
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RowError {
    #[error("Row is not a JSON object")]
    NotAnObject,

    #[error("Column '{column}': cannot decode JSON {kind}")]
    UnsupportedJson { column: String, kind: String },

    #[error("Column '{column}': code point U+{code_point:04X} is not a byte")]
    InvalidBytes { column: String, code_point: u32 },
}

impl RowError {
    pub(crate) fn unsupported(column: &str, kind: &str) -> Self {
        RowError::UnsupportedJson {
            column: column.to_string(),
            kind: kind.to_string(),
        }
    }
}
