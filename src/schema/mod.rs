//! Schema subsystem
//!
//! Turns the change-event schema description into the ordered column
//! descriptors that drive checksum computation.
//!
//! # Design Principles
//!
//! - Descriptor order is schema-declared order
//! - Extraction stops at the operation-marker column
//! - Unknown logical types are fatal, never coerced
//! - Descriptors are built once per schema and read-only afterwards

mod descriptor;
mod errors;
mod types;

pub use descriptor::{
    extract_descriptors, extract_descriptors_until, ColumnDescriptor, OPERATION_COLUMN,
};
pub use errors::{SchemaError, SchemaErrorCode, SchemaResult};
pub use types::{map_logical_type, LogicalType, TypeTag};
