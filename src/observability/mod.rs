//! Observability subsystem
//!
//! Structured JSON logging of verification outcomes.
//!
//! # Principles
//!
//! 1. Observability is read-only
//! 2. No side effects on checksum computation
//! 3. No async or background threads
//! 4. Deterministic output
//!
//! The checksum engine itself never logs; callers log the outcome of each
//! record through these helpers.

mod events;
mod logger;

pub use events::Event;
pub use logger::{Logger, Severity};

use crate::checksum::{ChecksumError, Verification};

/// Log a lifecycle event with fields at its own severity
pub fn log_event(event: Event, fields: &[(&str, &str)]) {
    Logger::log(event.severity(), event.as_str(), fields);
}

/// Log the outcome of verifying one record
pub fn log_outcome(record: &str, outcome: &Result<Verification, ChecksumError>) {
    match outcome {
        Ok(Verification::Matched { checksum }) => {
            let checksum = checksum.to_string();
            log_event(
                Event::ChecksumVerified,
                &[("record", record), ("checksum", &checksum)],
            );
        }
        Ok(Verification::Skipped) => {
            log_event(Event::ChecksumSkipped, &[("record", record)]);
        }
        Err(ChecksumError::Mismatch { expected, actual }) => {
            let expected = expected.to_string();
            let actual = actual.to_string();
            log_event(
                Event::ChecksumMismatch,
                &[("record", record), ("expected", &expected), ("actual", &actual)],
            );
        }
        Err(e) => {
            let message = e.to_string();
            log_event(
                Event::RecordRejected,
                &[
                    ("record", record),
                    ("code", e.code()),
                    ("kind", e.kind().as_str()),
                    ("column", e.column().unwrap_or("")),
                    ("message", &message),
                ],
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_outcome_variants() {
        // verifies no panic for every outcome shape
        log_outcome("1", &Ok(Verification::Skipped));
        log_outcome("2", &Ok(Verification::Matched { checksum: 7 }));
        log_outcome("3", &Err(ChecksumError::Mismatch { expected: 1, actual: 2 }));
        log_outcome(
            "4",
            &Err(ChecksumError::MissingValue {
                column: "id".into(),
            }),
        );
    }
}
