//! rowcrc - row-level checksum verification for TiDB change events
//!
//! Recomputes the CRC32 that TiDB embeds in each Avro-encoded change event
//! and compares it with the `_tidb_row_level_checksum` metadata column.
//!
//! - `schema`: column descriptors from the Avro record schema
//! - `row`: decoded row values
//! - `checksum`: normalization, canonical encoding, accumulation, verification
//! - `wire`: the schema-registry envelope around record values
//! - `observability`: structured logging of outcomes
//! - `cli`: the `rowcrc` command

pub mod checksum;
pub mod cli;
pub mod observability;
pub mod row;
pub mod schema;
pub mod wire;
