//! Column descriptor extraction from change-event schemas
//!
//! The schema description is the Avro record schema published with each
//! change event. Its `fields` list is ordered by column ID, which is also
//! the checksum accumulation order. Each data column carries its source
//! type under `connect.parameters`:
//!
//! ```json
//! {"name": "id", "type": {"type": "int", "connect.parameters": {"tidb_type": "INT"}}}
//! {"name": "c", "type": ["null", {"type": "string", "connect.parameters": {"tidb_type": "ENUM", "allowed": "a,b"}}]}
//! ```
//!
//! The operation-marker column and everything after it are pipeline
//! metadata and never become descriptors.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use super::errors::{SchemaError, SchemaResult};
use super::types::{map_logical_type, TypeTag};

/// Default name of the operation-marker column
pub const OPERATION_COLUMN: &str = "_tidb_op";

/// Key holding the type parameters inside a field type
const PARAMETERS_KEY: &str = "connect.parameters";

/// Parameter holding the logical source type name
const LOGICAL_TYPE_PARAM: &str = "tidb_type";

/// Parameter holding the comma-separated enum/set labels
const ALLOWED_PARAM: &str = "allowed";

/// Widest set the source database can declare
const MAX_SET_MEMBERS: usize = 64;

/// One data column of a change-event schema
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDescriptor {
    /// Column name, also the key into the decoded row
    pub name: String,
    /// Storage type driving normalization and encoding
    pub tag: TypeTag,
    /// Logical type name as declared by the source, empty when built by hand
    pub logical_type: String,
    /// Whether the logical type was declared UNSIGNED
    pub unsigned: bool,
    /// Whether the field type is a nullable union
    pub nullable: bool,
    /// Avro primitive type carrying the value (`int`, `string`, `bytes`, ...)
    pub wire_type: Option<String>,
    /// All string-valued type parameters
    pub parameters: BTreeMap<String, String>,
    /// Ordered enum/set labels; empty for every other type
    pub allowed: Vec<String>,
}

impl ColumnDescriptor {
    /// Create a non-nullable descriptor with no parameters
    pub fn new(name: impl Into<String>, tag: TypeTag) -> Self {
        Self {
            name: name.into(),
            tag,
            logical_type: String::new(),
            unsigned: false,
            nullable: false,
            wire_type: None,
            parameters: BTreeMap::new(),
            allowed: Vec::new(),
        }
    }

    /// Mark the descriptor nullable
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Set the ordered enum/set labels
    pub fn with_allowed<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed = labels.into_iter().map(Into::into).collect();
        self
    }

    /// Set the Avro wire type
    pub fn with_wire_type(mut self, wire_type: impl Into<String>) -> Self {
        self.wire_type = Some(wire_type.into());
        self
    }

    /// Whether values arrive as raw bytes on the wire
    pub fn is_binary_on_wire(&self) -> bool {
        self.wire_type.as_deref() == Some("bytes")
    }

    /// Whether values arrive as floating point on the wire
    pub fn is_float_on_wire(&self) -> bool {
        matches!(self.wire_type.as_deref(), Some("float") | Some("double"))
    }
}

/// Extracts the ordered descriptor sequence, stopping at the default
/// operation-marker column.
pub fn extract_descriptors(schema: &Value) -> SchemaResult<Vec<ColumnDescriptor>> {
    extract_descriptors_until(schema, OPERATION_COLUMN)
}

/// Extracts the ordered descriptor sequence, stopping before the first
/// field named `operation_column`.
///
/// Fields at or after the marker are not inspected at all, so their types
/// may be anything.
pub fn extract_descriptors_until(
    schema: &Value,
    operation_column: &str,
) -> SchemaResult<Vec<ColumnDescriptor>> {
    let fields = schema
        .get("fields")
        .ok_or_else(|| SchemaError::malformed("missing 'fields'"))?
        .as_array()
        .ok_or_else(|| SchemaError::malformed("'fields' is not a list"))?;

    let mut descriptors = Vec::with_capacity(fields.len());
    for (position, field) in fields.iter().enumerate() {
        let field = field.as_object().ok_or_else(|| {
            SchemaError::malformed(format!("field at position {} is not an object", position))
        })?;

        let name = field.get("name").and_then(Value::as_str).ok_or_else(|| {
            SchemaError::malformed(format!("field at position {} has no name", position))
        })?;

        if name == operation_column {
            break;
        }

        descriptors.push(extract_field(name, field)?);
    }

    Ok(descriptors)
}

/// Builds one descriptor from a field entry.
fn extract_field(name: &str, field: &Map<String, Value>) -> SchemaResult<ColumnDescriptor> {
    let (type_info, nullable) = match field.get("type") {
        // nullable columns carry their type parameters inside a union
        Some(Value::Array(union)) => {
            let found = union.iter().find_map(Value::as_object).ok_or_else(|| {
                SchemaError::malformed_field(name, "nullable union carries no type parameters")
            })?;
            (found, true)
        }
        Some(Value::Object(map)) => (map, false),
        Some(other) => {
            return Err(SchemaError::malformed_field(
                name,
                format!("type must be an object or a union, got {}", other),
            ))
        }
        None => return Err(SchemaError::malformed_field(name, "missing 'type'")),
    };

    let holder = type_info
        .get(PARAMETERS_KEY)
        .and_then(Value::as_object)
        .ok_or_else(|| SchemaError::malformed_field(name, "missing 'connect.parameters'"))?;

    let logical_type = holder
        .get(LOGICAL_TYPE_PARAM)
        .and_then(Value::as_str)
        .ok_or_else(|| SchemaError::malformed_field(name, "missing 'tidb_type' parameter"))?;

    let mapped = map_logical_type(logical_type)
        .ok_or_else(|| SchemaError::unsupported_type(logical_type).in_field(name))?;

    let parameters: BTreeMap<String, String> = holder
        .iter()
        .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
        .collect();

    let allowed = if mapped.tag.is_labelled() {
        let labels = parameters.get(ALLOWED_PARAM).ok_or_else(|| {
            SchemaError::malformed_field(name, "enum/set column has no 'allowed' parameter")
        })?;
        let labels: Vec<String> = labels.split(',').map(str::to_string).collect();
        if mapped.tag == TypeTag::Set && labels.len() > MAX_SET_MEMBERS {
            return Err(SchemaError::malformed_field(
                name,
                format!("set declares {} members, at most {} allowed", labels.len(), MAX_SET_MEMBERS),
            ));
        }
        labels
    } else {
        Vec::new()
    };

    Ok(ColumnDescriptor {
        name: name.to_string(),
        tag: mapped.tag,
        logical_type: logical_type.to_string(),
        unsigned: mapped.unsigned,
        nullable,
        wire_type: type_info.get("type").and_then(Value::as_str).map(str::to_string),
        parameters,
        allowed,
    })
}
