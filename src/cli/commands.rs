//! Command implementations
//!
//! Every command opens a session (config + schema), then reads rows as Avro
//! JSON. Results go to stdout as JSON lines; log lines go to stderr.

use std::path::Path;

use serde_json::{json, Value};

use super::args::{Cli, Command, SchemaArgs};
use super::errors::{CliError, CliResult};
use super::io::{
    error_response, ok_response, read_document, read_json_file, read_lines, write_json, write_response,
};
use crate::checksum::{ChecksumError, RowVerifier, Verification, VerifierConfig};
use crate::observability::{log_event, log_outcome, Event, Logger};
use crate::row::DecodedRow;
use crate::schema::ColumnDescriptor;

/// Run the CLI with parsed arguments
pub fn run() -> CliResult<()> {
    let cli = Cli::parse_args();
    Logger::set_min_severity(cli.log_level);
    run_command(cli.command)
}

/// Run a specific command
pub fn run_command(command: Command) -> CliResult<()> {
    match command {
        Command::Verify { schema, row } => run_verify(&schema, row.as_deref()),
        Command::Batch { schema } => run_batch(&schema),
        Command::Compute { schema, row } => run_compute(&schema, row.as_deref()),
        Command::Columns { schema } => run_columns(&schema),
    }
}

/// A loaded verifier plus the descriptors of one schema
#[derive(Debug)]
pub struct Session {
    verifier: RowVerifier,
    descriptors: Vec<ColumnDescriptor>,
}

impl Session {
    /// Load the optional config and the schema from disk
    pub fn open(args: &SchemaArgs) -> CliResult<Self> {
        let config = match &args.config {
            Some(path) => {
                let config = VerifierConfig::load(path)?;
                let zone = config.timestamp_zone.to_string();
                log_event(
                    Event::ConfigLoaded,
                    &[("path", &path.display().to_string()), ("timestamp_zone", &zone)],
                );
                config
            }
            None => VerifierConfig::default(),
        };

        let schema = read_json_file(&args.schema)?;
        let session = Self::from_schema(RowVerifier::new(config), &schema)?;

        let columns = session.descriptors.len().to_string();
        log_event(
            Event::SchemaLoaded,
            &[("path", &args.schema.display().to_string()), ("columns", &columns)],
        );
        Ok(session)
    }

    /// Build a session from an already parsed schema
    pub fn from_schema(verifier: RowVerifier, schema: &Value) -> CliResult<Self> {
        let descriptors = verifier.descriptors(schema)?;
        Ok(Self {
            verifier,
            descriptors,
        })
    }

    pub fn descriptors(&self) -> &[ColumnDescriptor] {
        &self.descriptors
    }

    /// Decode an Avro JSON row against the session's columns
    pub fn decode(&self, row: &Value) -> CliResult<DecodedRow> {
        Ok(DecodedRow::from_json(row, &self.descriptors)?)
    }

    /// Verify a decoded row
    pub fn verify(&self, row: &DecodedRow) -> Result<Verification, ChecksumError> {
        self.verifier.verify(row, &self.descriptors)
    }

    /// Recompute the checksum of a decoded row
    pub fn compute(&self, row: &DecodedRow) -> Result<u32, ChecksumError> {
        self.verifier.compute(row, &self.descriptors)
    }

    /// Verify one JSON row and build its response line
    ///
    /// Returns the response and whether the record passed.
    pub fn check_record(&self, record: &str, row: &Value) -> (Value, bool) {
        let decoded = match self.decode(row) {
            Ok(decoded) => decoded,
            Err(e) => {
                log_event(
                    Event::RecordRejected,
                    &[("record", record), ("code", e.code_str()), ("message", e.message())],
                );
                return (error_response(e.code_str(), e.message()), false);
            }
        };

        let outcome = self.verify(&decoded);
        log_outcome(record, &outcome);
        match outcome {
            Ok(verification) => (ok_response(verification_json(&verification)), true),
            Err(e) => (error_response(e.code(), &e.to_string()), false),
        }
    }
}

fn verification_json(verification: &Verification) -> Value {
    json!({
        "verified": verification.was_verified(),
        "checksum": verification.checksum(),
    })
}

fn descriptor_json(descriptor: &ColumnDescriptor) -> Value {
    json!({
        "name": descriptor.name,
        "logical_type": descriptor.logical_type,
        "type_code": descriptor.tag.code(),
        "type_name": descriptor.tag.type_name(),
        "unsigned": descriptor.unsigned,
        "nullable": descriptor.nullable,
        "allowed": descriptor.allowed,
    })
}

/// Tally of a batch run
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchSummary {
    pub verified: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl BatchSummary {
    pub fn total(&self) -> usize {
        self.verified + self.skipped + self.failed
    }

    fn record(&mut self, response: &Value, passed: bool) {
        if !passed {
            self.failed += 1;
        } else if response["data"]["verified"] == Value::Bool(true) {
            self.verified += 1;
        } else {
            self.skipped += 1;
        }
    }
}

/// Verify every line and write one response per line
pub fn verify_lines<I, F>(session: &Session, lines: I, mut emit: F) -> CliResult<BatchSummary>
where
    I: IntoIterator<Item = CliResult<String>>,
    F: FnMut(&Value) -> CliResult<()>,
{
    let mut summary = BatchSummary::default();

    for (index, line) in lines.into_iter().enumerate() {
        let line = line?;
        let record = (index + 1).to_string();

        let (response, passed) = match serde_json::from_str::<Value>(&line) {
            Ok(row) => session.check_record(&record, &row),
            Err(e) => {
                let err = CliError::from(e);
                log_event(
                    Event::RecordRejected,
                    &[("record", &record), ("code", err.code_str()), ("message", err.message())],
                );
                (error_response(err.code_str(), err.message()), false)
            }
        };

        summary.record(&response, passed);
        emit(&response)?;
    }

    Ok(summary)
}

fn run_verify(args: &SchemaArgs, row: Option<&Path>) -> CliResult<()> {
    let session = Session::open(args)?;
    let row = read_document(row)?;

    let (response, passed) = session.check_record("1", &row);
    write_json(&response)?;
    if passed {
        Ok(())
    } else {
        Err(CliError::verification_failed(
            response["message"].as_str().unwrap_or("verification failed"),
        ))
    }
}

fn run_batch(args: &SchemaArgs) -> CliResult<()> {
    let session = Session::open(args)?;
    let summary = verify_lines(&session, read_lines(), write_json)?;

    let total = summary.total().to_string();
    let verified = summary.verified.to_string();
    let skipped = summary.skipped.to_string();
    let failed = summary.failed.to_string();
    log_event(
        Event::BatchComplete,
        &[
            ("records", &total),
            ("verified", &verified),
            ("skipped", &skipped),
            ("failed", &failed),
        ],
    );

    if summary.failed > 0 {
        return Err(CliError::verification_failed(format!(
            "{} of {} records failed",
            summary.failed,
            summary.total()
        )));
    }
    Ok(())
}

fn run_compute(args: &SchemaArgs, row: Option<&Path>) -> CliResult<()> {
    let session = Session::open(args)?;
    let row = session.decode(&read_document(row)?)?;
    let checksum = session.compute(&row)?;
    write_response(json!({ "checksum": checksum }))
}

fn run_columns(args: &SchemaArgs) -> CliResult<()> {
    let session = Session::open(args)?;
    let columns: Vec<Value> = session.descriptors().iter().map(descriptor_json).collect();
    write_response(Value::Array(columns))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;
    use tempfile::NamedTempFile;

    fn schema() -> Value {
        json!({
            "type": "record",
            "name": "t",
            "fields": [
                {"name": "id", "type": {"type": "int", "connect.parameters": {"tidb_type": "INT"}}},
                {"name": "name", "type": ["null", {"type": "string", "connect.parameters": {"tidb_type": "TEXT"}}]},
                {"name": "_tidb_op", "type": "string"},
                {"name": "_tidb_row_level_checksum", "type": "string"}
            ]
        })
    }

    fn checksum_of(session: &Session, row: &Value) -> u32 {
        session.compute(&session.decode(row).unwrap()).unwrap()
    }

    fn session() -> Session {
        Session::from_schema(RowVerifier::default(), &schema()).unwrap()
    }

    #[test]
    fn test_check_record_matches() {
        let session = session();
        let row = json!({"id": 5, "name": {"string": "abc"}});
        let expected = checksum_of(&session, &row);

        let row = json!({
            "id": 5,
            "name": {"string": "abc"},
            "_tidb_op": "c",
            "_tidb_row_level_checksum": expected.to_string()
        });
        let (response, passed) = session.check_record("1", &row);
        assert!(passed);
        assert_eq!(response["status"], "ok");
        assert_eq!(response["data"]["verified"], true);
        assert_eq!(response["data"]["checksum"], expected);
    }

    #[test]
    fn test_check_record_mismatch() {
        let session = session();
        let row = json!({
            "id": 5,
            "name": {"string": "abc"},
            "_tidb_row_level_checksum": "1"
        });
        let (response, passed) = session.check_record("1", &row);
        assert!(!passed);
        assert_eq!(response["code"], "ROWCRC_CHECKSUM_MISMATCH");
    }

    #[test]
    fn test_check_record_rejects_non_object() {
        let (response, passed) = session().check_record("1", &json!([1, 2]));
        assert!(!passed);
        assert_eq!(response["code"], "ROWCRC_CLI_ROW_ERROR");
    }

    #[test]
    fn test_verify_lines_tally() {
        let session = session();
        let good = json!({"id": 1, "name": null});
        let checksum = checksum_of(&session, &good);

        let lines = vec![
            Ok(json!({"id": 1, "name": null, "_tidb_row_level_checksum": checksum.to_string()}).to_string()),
            Ok(json!({"id": 2, "name": null}).to_string()),
            Ok("{not json".to_string()),
            Ok(json!({"id": 3, "name": null, "_tidb_row_level_checksum": "7"}).to_string()),
        ];

        let mut responses = Vec::new();
        let summary = verify_lines(&session, lines, |response| {
            responses.push(response.clone());
            Ok(())
        })
        .unwrap();

        assert_eq!(
            summary,
            BatchSummary {
                verified: 1,
                skipped: 1,
                failed: 2
            }
        );
        assert_eq!(summary.total(), 4);
        assert_eq!(responses.len(), 4);
        assert_eq!(responses[2]["code"], "ROWCRC_CLI_IO_ERROR");
    }

    #[test]
    fn test_session_open_reads_files() {
        let mut schema_file = NamedTempFile::new().unwrap();
        write!(schema_file, "{}", schema()).unwrap();
        let mut config_file = NamedTempFile::new().unwrap();
        write!(config_file, r#"{{"timestamp_zone": "UTC"}}"#).unwrap();

        let args = SchemaArgs {
            schema: schema_file.path().to_path_buf(),
            config: Some(config_file.path().to_path_buf()),
        };
        let session = Session::open(&args).unwrap();
        let names: Vec<&str> = session.descriptors().iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["id", "name"]);
    }

    #[test]
    fn test_session_open_bad_schema() {
        let mut schema_file = NamedTempFile::new().unwrap();
        write!(
            schema_file,
            "{}",
            json!({"fields": [{"name": "g", "type": {"type": "string", "connect.parameters": {"tidb_type": "GEOMETRY"}}}]})
        )
        .unwrap();

        let args = SchemaArgs {
            schema: schema_file.path().to_path_buf(),
            config: None,
        };
        let err = Session::open(&args).unwrap_err();
        assert_eq!(err.code_str(), "ROWCRC_CLI_SCHEMA_ERROR");
    }

    #[test]
    fn test_descriptor_json() {
        let session = session();
        let value = descriptor_json(&session.descriptors()[1]);
        assert_eq!(value["name"], "name");
        assert_eq!(value["logical_type"], "TEXT");
        assert_eq!(value["nullable"], true);
        assert_eq!(value["type_code"], 0x0f);
    }
}
