//! Checksum error taxonomy
//!
//! Every failure aborts verification of the record. None of these are
//! retried or recovered internally; the caller decides what to do with
//! the record.

use thiserror::Error;

use crate::schema::{SchemaError, TypeTag};

/// Result type for checksum operations
pub type ChecksumResult<T> = Result<T, ChecksumError>;

/// Error kinds as seen by the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed schema description
    Schema,
    /// Logical type name or type tag with no encoding rule
    UnsupportedType,
    /// Declared column absent from the decoded row
    MissingValue,
    /// Value representation does not fit its type tag
    Encoding,
    /// Row encoded fine but the recomputed checksum disagrees
    ChecksumMismatch,
}

impl ErrorKind {
    /// Returns the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Schema => "SCHEMA",
            ErrorKind::UnsupportedType => "UNSUPPORTED_TYPE",
            ErrorKind::MissingValue => "MISSING_VALUE",
            ErrorKind::Encoding => "ENCODING",
            ErrorKind::ChecksumMismatch => "CHECKSUM_MISMATCH",
        }
    }
}

/// Checksum computation and verification errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChecksumError {
    #[error("{0}")]
    Schema(#[from] SchemaError),

    #[error("Column '{column}': no checksum encoding for type {tag}")]
    UnsupportedType { column: String, tag: TypeTag },

    #[error("Column '{column}': not present in decoded row")]
    MissingValue { column: String },

    #[error("Column '{column}' of type {tag}: {reason} (value: {value})")]
    Encoding {
        column: String,
        tag: TypeTag,
        value: String,
        reason: String,
    },

    #[error("Checksum column '{column}': {reason} (value: {value})")]
    MalformedChecksum {
        column: String,
        value: String,
        reason: String,
    },

    #[error("Checksum mismatch: expected {expected}, actual {actual}")]
    Mismatch { expected: u64, actual: u32 },
}

impl ChecksumError {
    /// Returns the error kind
    pub fn kind(&self) -> ErrorKind {
        match self {
            ChecksumError::Schema(e) if e.is_unsupported_type() => ErrorKind::UnsupportedType,
            ChecksumError::Schema(_) => ErrorKind::Schema,
            ChecksumError::UnsupportedType { .. } => ErrorKind::UnsupportedType,
            ChecksumError::MissingValue { .. } => ErrorKind::MissingValue,
            ChecksumError::Encoding { .. } | ChecksumError::MalformedChecksum { .. } => {
                ErrorKind::Encoding
            }
            ChecksumError::Mismatch { .. } => ErrorKind::ChecksumMismatch,
        }
    }

    /// Returns the error code string
    pub fn code(&self) -> &'static str {
        match self {
            ChecksumError::Schema(e) => e.code().code(),
            ChecksumError::UnsupportedType { .. } => "ROWCRC_UNSUPPORTED_TYPE",
            ChecksumError::MissingValue { .. } => "ROWCRC_MISSING_VALUE",
            ChecksumError::Encoding { .. } => "ROWCRC_ENCODING_FAILED",
            ChecksumError::MalformedChecksum { .. } => "ROWCRC_MALFORMED_CHECKSUM",
            ChecksumError::Mismatch { .. } => "ROWCRC_CHECKSUM_MISMATCH",
        }
    }

    /// Column the error is tied to, if any
    pub fn column(&self) -> Option<&str> {
        match self {
            ChecksumError::Schema(e) => e.field(),
            ChecksumError::UnsupportedType { column, .. }
            | ChecksumError::MissingValue { column }
            | ChecksumError::Encoding { column, .. }
            | ChecksumError::MalformedChecksum { column, .. } => Some(column),
            ChecksumError::Mismatch { .. } => None,
        }
    }

    /// Whether the error signals upstream data-integrity loss
    pub fn is_integrity_violation(&self) -> bool {
        self.kind() == ErrorKind::ChecksumMismatch
    }
}
