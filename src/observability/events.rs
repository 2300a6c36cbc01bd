//! Observable events
//!
//! Events are explicit and typed; their names are stable log keys.

use std::fmt;

use super::logger::Severity;

/// Observable events in a verification run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// Configuration file loaded
    ConfigLoaded,
    /// Schema read and descriptors extracted
    SchemaLoaded,
    /// Row checksum recomputed and matched
    ChecksumVerified,
    /// Row carried no expected checksum
    ChecksumSkipped,
    /// Recomputed checksum disagrees with the embedded one
    ChecksumMismatch,
    /// Row could not be verified (schema, missing value, encoding)
    RecordRejected,
    /// Batch finished
    BatchComplete,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::SchemaLoaded => "SCHEMA_LOADED",
            Event::ChecksumVerified => "CHECKSUM_VERIFIED",
            Event::ChecksumSkipped => "CHECKSUM_SKIPPED",
            Event::ChecksumMismatch => "CHECKSUM_MISMATCH",
            Event::RecordRejected => "RECORD_REJECTED",
            Event::BatchComplete => "BATCH_COMPLETE",
        }
    }

    /// Severity the event is logged at
    pub fn severity(&self) -> Severity {
        match self {
            Event::ChecksumVerified | Event::ChecksumSkipped => Severity::Trace,
            Event::ConfigLoaded | Event::SchemaLoaded | Event::BatchComplete => Severity::Info,
            Event::RecordRejected => Severity::Warn,
            Event::ChecksumMismatch => Severity::Error,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_events_have_string_representation() {
        let events = [
            Event::ConfigLoaded,
            Event::SchemaLoaded,
            Event::ChecksumVerified,
            Event::ChecksumSkipped,
            Event::ChecksumMismatch,
            Event::RecordRejected,
            Event::BatchComplete,
        ];

        for event in events {
            let s = event.as_str();
            assert!(!s.is_empty());
            assert!(s.chars().all(|c| c.is_uppercase() || c == '_'));
        }
    }

    #[test]
    fn test_mismatch_is_loudest() {
        assert_eq!(Event::ChecksumMismatch.severity(), Severity::Error);
        assert!(Event::RecordRejected.severity() < Event::ChecksumMismatch.severity());
        assert_eq!(Event::ChecksumVerified.severity(), Severity::Trace);
    }
}
