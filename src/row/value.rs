//! Loosely-typed decoded row values
//!
//! A decoded row is what the payload decoder hands over: column name to a
//! value whose concrete shape depends on the wire payload. Nullable columns
//! arrive wrapped in a single-entry union keyed by the branch type name.

use std::collections::HashMap;
use std::fmt;

use serde_json::Value;

use super::errors::{RowError, RowResult};
use crate::schema::ColumnDescriptor;

/// One decoded column value
#[derive(Debug, Clone, PartialEq)]
pub enum DecodedValue {
    /// SQL NULL
    Null,
    Boolean(bool),
    Int32(i32),
    UInt32(u32),
    Int64(i64),
    UInt64(u64),
    Float32(f32),
    Float64(f64),
    String(String),
    Bytes(Vec<u8>),
    /// Nullable-union wrapper: branch type name and the wrapped value
    Union(String, Box<DecodedValue>),
}

impl DecodedValue {
    /// Wrap a value in a nullable union under `branch`
    pub fn union(branch: impl Into<String>, value: DecodedValue) -> Self {
        DecodedValue::Union(branch.into(), Box::new(value))
    }

    /// Returns the shape name for error messages
    pub fn kind_name(&self) -> &'static str {
        match self {
            DecodedValue::Null => "null",
            DecodedValue::Boolean(_) => "boolean",
            DecodedValue::Int32(_) => "int32",
            DecodedValue::UInt32(_) => "uint32",
            DecodedValue::Int64(_) => "int64",
            DecodedValue::UInt64(_) => "uint64",
            DecodedValue::Float32(_) => "float32",
            DecodedValue::Float64(_) => "float64",
            DecodedValue::String(_) => "string",
            DecodedValue::Bytes(_) => "bytes",
            DecodedValue::Union(..) => "union",
        }
    }

    /// Strips one level of nullable-union wrapping
    pub fn unwrap_union(&self) -> &DecodedValue {
        match self {
            DecodedValue::Union(_, inner) => inner,
            other => other,
        }
    }
}

impl fmt::Display for DecodedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodedValue::Null => write!(f, "null"),
            DecodedValue::Boolean(v) => write!(f, "{}", v),
            DecodedValue::Int32(v) => write!(f, "{}", v),
            DecodedValue::UInt32(v) => write!(f, "{}", v),
            DecodedValue::Int64(v) => write!(f, "{}", v),
            DecodedValue::UInt64(v) => write!(f, "{}", v),
            DecodedValue::Float32(v) => write!(f, "{}", v),
            DecodedValue::Float64(v) => write!(f, "{}", v),
            DecodedValue::String(v) => write!(f, "{:?}", v),
            DecodedValue::Bytes(v) => {
                write!(f, "0x")?;
                for b in v {
                    write!(f, "{:02x}", b)?;
                }
                Ok(())
            }
            DecodedValue::Union(branch, inner) => write!(f, "{{{:?}: {}}}", branch, inner),
        }
    }
}

impl From<i32> for DecodedValue {
    fn from(v: i32) -> Self {
        DecodedValue::Int32(v)
    }
}

impl From<u32> for DecodedValue {
    fn from(v: u32) -> Self {
        DecodedValue::UInt32(v)
    }
}

impl From<i64> for DecodedValue {
    fn from(v: i64) -> Self {
        DecodedValue::Int64(v)
    }
}

impl From<u64> for DecodedValue {
    fn from(v: u64) -> Self {
        DecodedValue::UInt64(v)
    }
}

impl From<f32> for DecodedValue {
    fn from(v: f32) -> Self {
        DecodedValue::Float32(v)
    }
}

impl From<f64> for DecodedValue {
    fn from(v: f64) -> Self {
        DecodedValue::Float64(v)
    }
}

impl From<&str> for DecodedValue {
    fn from(v: &str) -> Self {
        DecodedValue::String(v.to_string())
    }
}

impl From<String> for DecodedValue {
    fn from(v: String) -> Self {
        DecodedValue::String(v)
    }
}

impl From<Vec<u8>> for DecodedValue {
    fn from(v: Vec<u8>) -> Self {
        DecodedValue::Bytes(v)
    }
}

/// A decoded change-event row
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecodedRow {
    columns: HashMap<String, DecodedValue>,
}

impl DecodedRow {
    /// Create an empty row
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, name: impl Into<String>, value: impl Into<DecodedValue>) -> Self {
        self.insert(name, value);
        self
    }

    /// Insert or replace a column value
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<DecodedValue>) {
        self.columns.insert(name.into(), value.into());
    }

    /// Look up a column value
    pub fn get(&self, name: &str) -> Option<&DecodedValue> {
        self.columns.get(name)
    }

    /// Remove a column, returning its value
    pub fn remove(&mut self, name: &str) -> Option<DecodedValue> {
        self.columns.remove(name)
    }

    /// Number of columns, metadata included
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Whether the row holds no columns
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Converts an Avro-JSON encoded row object.
    ///
    /// Descriptors supply the wire type of described columns so that
    /// `bytes` strings become raw bytes, numbers in `float` columns become
    /// single-precision floats and numbers in `double` columns become
    /// double-precision floats. Undescribed columns (pipeline metadata) convert generically.
    pub fn from_json(value: &Value, descriptors: &[ColumnDescriptor]) -> RowResult<Self> {
        let object = value.as_object().ok_or(RowError::NotAnObject)?;

        let mut row = DecodedRow::new();
        for (name, raw) in object {
            let hint = descriptors
                .iter()
                .find(|d| d.name == *name)
                .map(WireHint::of)
                .unwrap_or(WireHint::Other);
            row.insert(name.clone(), convert_json(name, raw, hint)?);
        }
        Ok(row)
    }
}

impl FromIterator<(String, DecodedValue)> for DecodedRow {
    fn from_iter<T: IntoIterator<Item = (String, DecodedValue)>>(iter: T) -> Self {
        Self {
            columns: iter.into_iter().collect(),
        }
    }
}

/// How a JSON scalar should be read for one column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WireHint {
    Binary,
    /// Avro `float`: single precision, widened only when encoded
    Float,
    Double,
    Other,
}

impl WireHint {
    fn of(descriptor: &ColumnDescriptor) -> Self {
        if descriptor.is_binary_on_wire() {
            WireHint::Binary
        } else if descriptor.is_float_on_wire() {
            WireHint::of_branch(descriptor.wire_type.as_deref().unwrap_or("double"), WireHint::Double)
        } else {
            WireHint::Other
        }
    }

    fn of_branch(branch: &str, fallback: WireHint) -> Self {
        match branch {
            "bytes" => WireHint::Binary,
            "float" => WireHint::Float,
            "double" => WireHint::Double,
            "null" => fallback,
            _ => WireHint::Other,
        }
    }
}

fn convert_json(column: &str, raw: &Value, hint: WireHint) -> RowResult<DecodedValue> {
    match raw {
        Value::Null => Ok(DecodedValue::Null),
        Value::Bool(b) => Ok(DecodedValue::Boolean(*b)),
        Value::Number(n) => {
            match (hint, n.as_f64()) {
                (WireHint::Float, Some(f)) => return Ok(DecodedValue::Float32(f as f32)),
                (WireHint::Double, Some(f)) => return Ok(DecodedValue::Float64(f)),
                _ => {}
            }
            if let Some(i) = n.as_i64() {
                Ok(DecodedValue::Int64(i))
            } else if let Some(u) = n.as_u64() {
                Ok(DecodedValue::UInt64(u))
            } else if let Some(f) = n.as_f64() {
                Ok(DecodedValue::Float64(f))
            } else {
                Err(RowError::unsupported(column, "number"))
            }
        }
        Value::String(s) if hint == WireHint::Binary => {
            Ok(DecodedValue::Bytes(avro_json_bytes(column, s)?))
        }
        Value::String(s) => Ok(DecodedValue::String(s.clone())),
        Value::Object(map) if map.len() == 1 => {
            let (branch, inner) = map
                .iter()
                .next()
                .ok_or_else(|| RowError::unsupported(column, "object"))?;
            let inner = convert_json(column, inner, WireHint::of_branch(branch, hint))?;
            Ok(DecodedValue::union(branch.clone(), inner))
        }
        Value::Object(_) => Err(RowError::unsupported(column, "multi-entry object")),
        Value::Array(_) => Err(RowError::unsupported(column, "array")),
    }
}

/// Avro JSON carries bytes as a string of code points U+0000..=U+00FF,
/// one per byte.
fn avro_json_bytes(column: &str, s: &str) -> RowResult<Vec<u8>> {
    s.chars()
        .map(|c| {
            u8::try_from(u32::from(c)).map_err(|_| RowError::InvalidBytes {
                column: column.to_string(),
                code_point: u32::from(c),
            })
        })
        .collect()
}
