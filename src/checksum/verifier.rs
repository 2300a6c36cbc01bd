//! Row checksum verification
//!
//! Recomputes the row checksum over the descriptor sequence and compares it
//! with the value the source embedded in the checksum metadata column.
//!
//! Verification is a pure computation: no I/O, no shared state, no retries.
//! Rows may be verified concurrently as long as each call owns its
//! accumulator, which `verify` guarantees.

use serde_json::Value;

use super::accumulator::ChecksumAccumulator;
use super::config::VerifierConfig;
use super::encoder::parse_decimal_u64;
use super::errors::{ChecksumError, ChecksumResult};
use crate::row::{DecodedRow, DecodedValue};
use crate::schema::{extract_descriptors_until, ColumnDescriptor, SchemaResult};

/// Successful verification outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verification {
    /// No expected checksum in the row; nothing was computed
    Skipped,
    /// Recomputed checksum equals the expected one
    Matched { checksum: u32 },
}

impl Verification {
    /// The recomputed checksum, if one was computed
    pub fn checksum(&self) -> Option<u32> {
        match self {
            Verification::Skipped => None,
            Verification::Matched { checksum } => Some(*checksum),
        }
    }

    /// Whether verification actually ran
    pub fn was_verified(&self) -> bool {
        matches!(self, Verification::Matched { .. })
    }
}

/// Verifies rows against the checksum embedded by the source.
#[derive(Debug, Clone, Default)]
pub struct RowVerifier {
    config: VerifierConfig,
}

impl RowVerifier {
    /// Creates a verifier with the given configuration.
    pub fn new(config: VerifierConfig) -> Self {
        Self { config }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &VerifierConfig {
        &self.config
    }

    /// Extracts descriptors, stopping at the configured operation column.
    pub fn descriptors(&self, schema: &Value) -> SchemaResult<Vec<ColumnDescriptor>> {
        extract_descriptors_until(schema, &self.config.operation_column)
    }

    /// Reads the expected checksum from the metadata column.
    ///
    /// Returns `None` when the column is absent or holds an empty string,
    /// meaning no verification was requested.
    pub fn expected_checksum(&self, row: &DecodedRow) -> ChecksumResult<Option<u64>> {
        let column = &self.config.checksum_column;
        let Some(raw) = row.get(column) else {
            return Ok(None);
        };

        let malformed = |reason: &str| ChecksumError::MalformedChecksum {
            column: column.clone(),
            value: raw.to_string(),
            reason: reason.to_string(),
        };

        match raw.unwrap_union() {
            DecodedValue::String(s) if s.is_empty() => Ok(None),
            DecodedValue::String(s) => parse_decimal_u64(s)
                .map(Some)
                .ok_or_else(|| malformed("not an unsigned decimal integer")),
            _ => Err(malformed("expected a decimal string")),
        }
    }

    /// Recomputes the row checksum regardless of the metadata column.
    pub fn compute(&self, row: &DecodedRow, descriptors: &[ColumnDescriptor]) -> ChecksumResult<u32> {
        let zone = &self.config.timestamp_zone;
        let mut acc = ChecksumAccumulator::new();
        for descriptor in descriptors {
            acc.update_column(descriptor, row.get(&descriptor.name), zone)?;
        }
        Ok(acc.finalize())
    }

    /// Verifies one row.
    ///
    /// # Errors
    ///
    /// - `MalformedChecksum` if the expected value is not a decimal string
    /// - `MissingValue`, `Encoding` or `UnsupportedType` from any column
    /// - `Mismatch` if the recomputed checksum differs from the expected one
    pub fn verify(&self, row: &DecodedRow, descriptors: &[ColumnDescriptor]) -> ChecksumResult<Verification> {
        let Some(expected) = self.expected_checksum(row)? else {
            return Ok(Verification::Skipped);
        };

        let actual = self.compute(row, descriptors)?;
        if u64::from(actual) != expected {
            return Err(ChecksumError::Mismatch { expected, actual });
        }

        Ok(Verification::Matched { checksum: actual })
    }
}

/// Verifies one row with the default configuration.
pub fn verify(row: &DecodedRow, descriptors: &[ColumnDescriptor]) -> ChecksumResult<Verification> {
    RowVerifier::default().verify(row, descriptors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checksum::{ErrorKind, CHECKSUM_COLUMN};
    use crate::schema::TypeTag;

    fn descriptors() -> Vec<ColumnDescriptor> {
        vec![
            ColumnDescriptor::new("id", TypeTag::Long),
            ColumnDescriptor::new("name", TypeTag::Varchar),
        ]
    }

    fn canonical_checksum(id: u64, name: &[u8]) -> u32 {
        let mut bytes = id.to_le_bytes().to_vec();
        bytes.extend_from_slice(&(name.len() as u32).to_le_bytes());
        bytes.extend_from_slice(name);
        crc32fast::hash(&bytes)
    }

    #[test]
    fn test_absent_checksum_skips() {
        // columns are not even looked at
        let row = DecodedRow::new();
        assert_eq!(verify(&row, &descriptors()).unwrap(), Verification::Skipped);
    }

    #[test]
    fn test_empty_checksum_skips() {
        let row = DecodedRow::new().with(CHECKSUM_COLUMN, "");
        let outcome = verify(&row, &descriptors()).unwrap();
        assert_eq!(outcome, Verification::Skipped);
        assert!(!outcome.was_verified());
        assert_eq!(outcome.checksum(), None);
    }

    #[test]
    fn test_match() {
        let expected = canonical_checksum(5, b"abc");
        let row = DecodedRow::new()
            .with("id", 5i32)
            .with("name", "abc")
            .with(CHECKSUM_COLUMN, expected.to_string());

        let outcome = verify(&row, &descriptors()).unwrap();
        assert_eq!(outcome, Verification::Matched { checksum: expected });
        assert!(outcome.was_verified());
    }

    #[test]
    fn test_mismatch_carries_both_values() {
        let actual = canonical_checksum(5, b"abc");
        let expected = u64::from(actual) + 1;
        let row = DecodedRow::new()
            .with("id", 5i32)
            .with("name", "abc")
            .with(CHECKSUM_COLUMN, expected.to_string());

        let err = verify(&row, &descriptors()).unwrap_err();
        assert_eq!(err, ChecksumError::Mismatch { expected, actual });
        assert_eq!(err.kind(), ErrorKind::ChecksumMismatch);
    }

    #[test]
    fn test_expected_wider_than_u32_never_matches() {
        let actual = canonical_checksum(5, b"abc");
        let expected = u64::from(actual) | (1 << 32);
        let row = DecodedRow::new()
            .with("id", 5i32)
            .with("name", "abc")
            .with(CHECKSUM_COLUMN, expected.to_string());
        assert!(verify(&row, &descriptors()).is_err());
    }

    #[test]
    fn test_malformed_expected() {
        for bad in ["abc", "-1", "1.0", " 12"] {
            let row = DecodedRow::new().with(CHECKSUM_COLUMN, bad);
            let err = verify(&row, &descriptors()).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Encoding, "{:?}", bad);
        }

        let row = DecodedRow::new().with(CHECKSUM_COLUMN, 12i64);
        assert_eq!(verify(&row, &descriptors()).unwrap_err().kind(), ErrorKind::Encoding);
    }

    #[test]
    fn test_wrapped_expected_is_unwrapped() {
        let expected = canonical_checksum(1, b"x");
        let row = DecodedRow::new()
            .with("id", 1i64)
            .with("name", "x")
            .with(
                CHECKSUM_COLUMN,
                DecodedValue::union("string", DecodedValue::String(expected.to_string())),
            );
        assert!(verify(&row, &descriptors()).is_ok());
    }

    #[test]
    fn test_missing_column_fails() {
        let row = DecodedRow::new().with("id", 1i64).with(CHECKSUM_COLUMN, "1");
        let err = verify(&row, &descriptors()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingValue);
        assert_eq!(err.column(), Some("name"));
    }

    #[test]
    fn test_custom_checksum_column() {
        let config = VerifierConfig {
            checksum_column: "_crc".into(),
            ..VerifierConfig::default()
        };
        let verifier = RowVerifier::new(config);
        let expected = canonical_checksum(7, b"q");
        let row = DecodedRow::new()
            .with("id", 7i64)
            .with("name", "q")
            .with("_crc", expected.to_string());

        assert_eq!(
            verifier.verify(&row, &descriptors()).unwrap(),
            Verification::Matched { checksum: expected }
        );
        assert_eq!(verifier.config().checksum_column, "_crc");
    }

    #[test]
    fn test_compute_ignores_metadata() {
        let row = DecodedRow::new().with("id", 5i64).with("name", "abc");
        let verifier = RowVerifier::default();
        assert_eq!(
            verifier.compute(&row, &descriptors()).unwrap(),
            canonical_checksum(5, b"abc")
        );
        assert_eq!(verifier.compute(&row, &[]).unwrap(), 0);
    }
}
