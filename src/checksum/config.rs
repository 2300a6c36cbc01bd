//! Verifier configuration
//!
//! Loaded from an optional JSON file; every field has a default matching
//! the change-event format:
//!
//! ```json
//! {
//!   "checksum_column": "_tidb_row_level_checksum",
//!   "operation_column": "_tidb_op",
//!   "timestamp_zone": "local"
//! }
//! ```

use std::fmt;
use std::fs;
use std::path::Path;

use chrono::{FixedOffset, Local, NaiveDateTime, Offset, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::schema::OPERATION_COLUMN;

/// Default name of the checksum metadata column
pub const CHECKSUM_COLUMN: &str = "_tidb_row_level_checksum";

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Time zone TIMESTAMP values are interpreted in before UTC conversion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TimestampZone {
    /// Process-local time zone
    #[default]
    Local,
    /// Fixed offset east of UTC
    Fixed(FixedOffset),
}

impl TimestampZone {
    /// UTC
    pub fn utc() -> Self {
        TimestampZone::Fixed(Utc.fix())
    }

    /// Parses `local`, `UTC`/`Z`, or a `±HH:MM` offset.
    pub fn parse(s: &str) -> Result<Self, String> {
        match s {
            "local" => return Ok(TimestampZone::Local),
            "UTC" | "Z" => return Ok(TimestampZone::utc()),
            _ => {}
        }

        let invalid = || format!("invalid timestamp zone '{}', expected local, UTC or ±HH:MM", s);

        let (sign, rest) = match s.as_bytes().first() {
            Some(b'+') => (1, &s[1..]),
            Some(b'-') => (-1, &s[1..]),
            _ => return Err(invalid()),
        };
        let (hours, minutes) = rest.split_once(':').ok_or_else(invalid)?;
        let two_digits = |p: &str| p.len() == 2 && p.bytes().all(|b| b.is_ascii_digit());
        if !two_digits(hours) || !two_digits(minutes) {
            return Err(invalid());
        }
        let hours: i32 = hours.parse().map_err(|_| invalid())?;
        let minutes: i32 = minutes.parse().map_err(|_| invalid())?;
        if minutes >= 60 {
            return Err(invalid());
        }

        FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
            .map(TimestampZone::Fixed)
            .ok_or_else(invalid)
    }

    /// Interprets a wall-clock time in this zone and converts it to UTC.
    ///
    /// Returns `None` for a local time skipped by a DST transition. An
    /// ambiguous local time resolves to the earlier instant.
    pub fn to_utc(&self, naive: &NaiveDateTime) -> Option<NaiveDateTime> {
        match self {
            TimestampZone::Local => Local
                .from_local_datetime(naive)
                .earliest()
                .map(|t| t.with_timezone(&Utc).naive_utc()),
            TimestampZone::Fixed(offset) => offset
                .from_local_datetime(naive)
                .earliest()
                .map(|t| t.with_timezone(&Utc).naive_utc()),
        }
    }
}

impl fmt::Display for TimestampZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimestampZone::Local => write!(f, "local"),
            TimestampZone::Fixed(offset) => write!(f, "{}", offset),
        }
    }
}

impl TryFrom<String> for TimestampZone {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        TimestampZone::parse(&s)
    }
}

impl From<TimestampZone> for String {
    fn from(zone: TimestampZone) -> Self {
        zone.to_string()
    }
}

/// Verifier configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifierConfig {
    /// Row column carrying the expected checksum as a decimal string
    #[serde(default = "default_checksum_column")]
    pub checksum_column: String,

    /// Schema field marking the start of pipeline metadata columns
    #[serde(default = "default_operation_column")]
    pub operation_column: String,

    /// Zone TIMESTAMP values are interpreted in
    #[serde(default)]
    pub timestamp_zone: TimestampZone,
}

fn default_checksum_column() -> String {
    CHECKSUM_COLUMN.to_string()
}

fn default_operation_column() -> String {
    OPERATION_COLUMN.to_string()
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            checksum_column: default_checksum_column(),
            operation_column: default_operation_column(),
            timestamp_zone: TimestampZone::default(),
        }
    }
}

impl VerifierConfig {
    /// Load configuration from file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        let config: VerifierConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Same configuration with a different timestamp zone
    pub fn with_timestamp_zone(mut self, zone: TimestampZone) -> Self {
        self.timestamp_zone = zone;
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.checksum_column.is_empty() {
            return Err(ConfigError::Invalid("checksum_column must not be empty".into()));
        }
        if self.operation_column.is_empty() {
            return Err(ConfigError::Invalid("operation_column must not be empty".into()));
        }
        if self.checksum_column == self.operation_column {
            return Err(ConfigError::Invalid(format!(
                "checksum_column and operation_column are both '{}'",
                self.checksum_column
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn naive(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, mo, d)
            .unwrap()
            .and_hms_opt(h, mi, s)
            .unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = VerifierConfig::default();
        assert_eq!(config.checksum_column, "_tidb_row_level_checksum");
        assert_eq!(config.operation_column, "_tidb_op");
        assert_eq!(config.timestamp_zone, TimestampZone::Local);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zone_parse() {
        assert_eq!(TimestampZone::parse("local").unwrap(), TimestampZone::Local);
        assert_eq!(TimestampZone::parse("UTC").unwrap(), TimestampZone::utc());
        assert_eq!(
            TimestampZone::parse("+08:00").unwrap(),
            TimestampZone::Fixed(FixedOffset::east_opt(8 * 3600).unwrap())
        );
        assert_eq!(
            TimestampZone::parse("-05:30").unwrap(),
            TimestampZone::Fixed(FixedOffset::west_opt(5 * 3600 + 1800).unwrap())
        );
        assert!(TimestampZone::parse("+8").is_err());
        assert!(TimestampZone::parse("08:00").is_err());
        assert!(TimestampZone::parse("+08:75").is_err());
        assert!(TimestampZone::parse("++8:00").is_err());
        assert!(TimestampZone::parse("Asia/Shanghai").is_err());
    }

    #[test]
    fn test_zone_display_round_trips() {
        let zone = TimestampZone::parse("+08:00").unwrap();
        assert_eq!(zone.to_string(), "+08:00");
        assert_eq!(TimestampZone::Local.to_string(), "local");
    }

    #[test]
    fn test_fixed_zone_to_utc() {
        let zone = TimestampZone::parse("+08:00").unwrap();
        assert_eq!(
            zone.to_utc(&naive(2023, 1, 1, 8, 0, 0)),
            Some(naive(2023, 1, 1, 0, 0, 0))
        );
        assert_eq!(
            TimestampZone::utc().to_utc(&naive(2023, 6, 1, 12, 30, 0)),
            Some(naive(2023, 6, 1, 12, 30, 0))
        );
    }

    #[test]
    fn test_load_partial_file_uses_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"timestamp_zone": "+02:00"}}"#).unwrap();

        let config = VerifierConfig::load(file.path()).unwrap();
        assert_eq!(config.checksum_column, CHECKSUM_COLUMN);
        assert_eq!(config.timestamp_zone, TimestampZone::parse("+02:00").unwrap());
    }

    #[test]
    fn test_load_rejects_bad_zone() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"timestamp_zone": "mars"}}"#).unwrap();
        assert!(matches!(
            VerifierConfig::load(file.path()),
            Err(ConfigError::Json(_))
        ));
    }

    #[test]
    fn test_load_rejects_clashing_columns() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"checksum_column": "_op", "operation_column": "_op"}}"#).unwrap();
        assert!(matches!(
            VerifierConfig::load(file.path()),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::TempDir::new().unwrap();
        assert!(matches!(
            VerifierConfig::load(&dir.path().join("absent.json")),
            Err(ConfigError::Io(_))
        ));
    }
}
