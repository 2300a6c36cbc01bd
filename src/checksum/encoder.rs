//! Canonical byte encoding of column values
//!
//! Reproduces the byte layout the source database feeds into its row
//! checksum:
//!
//! | Types                                   | Bytes                                  |
//! |-----------------------------------------|----------------------------------------|
//! | tiny, short, int24, long, longlong, year| u64 little-endian                      |
//! | float, double                           | f64 bits little-endian, NaN/Inf → 0.0  |
//! | enum, set                               | ordinal as u64 little-endian           |
//! | bit                                     | big-endian bytes as u64 little-endian  |
//! | varchar, string, blobs                  | u32 LE length + raw bytes              |
//! | timestamp                               | UTC `YYYY-MM-DD HH:MM:SS`, length-prefixed |
//! | date, datetime, duration, newdate       | text as-is, length-prefixed            |
//! | newdecimal, json                        | text as-is, length-prefixed            |
//! | null, geometry                          | nothing                                |
//!
//! NULL values contribute nothing for every type.

use chrono::NaiveDateTime;

use super::config::TimestampZone;
use super::errors::ChecksumError;
use super::normalize::NormalizedValue;
use crate::row::DecodedValue;
use crate::schema::{ColumnDescriptor, TypeTag};

const TIMESTAMP_PARSE_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Why a value could not be encoded
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncodeFault {
    /// The type tag has no checksum rule
    Unsupported,
    /// The value representation does not fit the type tag
    Invalid(String),
}

impl EncodeFault {
    fn invalid(reason: impl Into<String>) -> Self {
        EncodeFault::Invalid(reason.into())
    }

    /// Attach column context
    pub fn into_error(self, descriptor: &ColumnDescriptor, raw: Option<&DecodedValue>) -> ChecksumError {
        match self {
            EncodeFault::Unsupported => ChecksumError::UnsupportedType {
                column: descriptor.name.clone(),
                tag: descriptor.tag,
            },
            EncodeFault::Invalid(reason) => ChecksumError::Encoding {
                column: descriptor.name.clone(),
                tag: descriptor.tag,
                value: raw.map(ToString::to_string).unwrap_or_default(),
                reason,
            },
        }
    }
}

/// Encoding rule for one family of type tags
pub type EncodeFn = fn(&mut Vec<u8>, &NormalizedValue<'_>, &TimestampZone) -> Result<(), EncodeFault>;

/// Looks up the encoding rule for a type tag.
pub fn encoder_for(tag: TypeTag) -> Option<EncodeFn> {
    let rule: EncodeFn = match tag {
        TypeTag::Tiny
        | TypeTag::Short
        | TypeTag::Int24
        | TypeTag::Long
        | TypeTag::Longlong
        | TypeTag::Year => encode_integer,
        TypeTag::Float | TypeTag::Double => encode_float,
        TypeTag::Enum | TypeTag::Set => encode_ordinal,
        TypeTag::Bit => encode_bit,
        TypeTag::Varchar
        | TypeTag::VarString
        | TypeTag::String
        | TypeTag::TinyBlob
        | TypeTag::MediumBlob
        | TypeTag::LongBlob
        | TypeTag::Blob => encode_binary,
        TypeTag::Timestamp => encode_timestamp,
        TypeTag::Datetime | TypeTag::Date | TypeTag::Duration | TypeTag::NewDate => encode_text,
        TypeTag::NewDecimal | TypeTag::Json => encode_text,
        TypeTag::Null | TypeTag::Geometry => encode_nothing,
        TypeTag::Decimal => return None,
    };
    Some(rule)
}

/// Appends the canonical bytes of `value` to `buf`.
pub fn encode_value(
    buf: &mut Vec<u8>,
    value: &NormalizedValue<'_>,
    tag: TypeTag,
    zone: &TimestampZone,
) -> Result<(), EncodeFault> {
    if value.is_null() {
        return Ok(());
    }
    let rule = encoder_for(tag).ok_or(EncodeFault::Unsupported)?;
    rule(buf, value, zone)
}

fn encode_integer(buf: &mut Vec<u8>, value: &NormalizedValue<'_>, _: &TimestampZone) -> Result<(), EncodeFault> {
    // signed values keep their two's complement bit pattern at 64 bits
    let v = match *value {
        NormalizedValue::Int32(v) => v as u64,
        NormalizedValue::UInt32(v) => u64::from(v),
        NormalizedValue::Int64(v) => v as u64,
        NormalizedValue::UInt64(v) => v,
        NormalizedValue::Text(s) => parse_decimal_u64(s)
            .ok_or_else(|| EncodeFault::invalid("integer string is not an unsigned decimal"))?,
        _ => return Err(EncodeFault::invalid("expected an integer")),
    };
    buf.extend_from_slice(&v.to_le_bytes());
    Ok(())
}

fn encode_float(buf: &mut Vec<u8>, value: &NormalizedValue<'_>, _: &TimestampZone) -> Result<(), EncodeFault> {
    let v = match *value {
        NormalizedValue::Float32(v) => f64::from(v),
        NormalizedValue::Float64(v) => v,
        _ => return Err(EncodeFault::invalid("expected a floating point value")),
    };
    let v = if v.is_finite() { v } else { 0.0 };
    buf.extend_from_slice(&v.to_bits().to_le_bytes());
    Ok(())
}

fn encode_ordinal(buf: &mut Vec<u8>, value: &NormalizedValue<'_>, _: &TimestampZone) -> Result<(), EncodeFault> {
    match *value {
        NormalizedValue::Ordinal(v) => {
            buf.extend_from_slice(&v.to_le_bytes());
            Ok(())
        }
        _ => Err(EncodeFault::invalid("enum/set value was not resolved to an ordinal")),
    }
}

fn encode_bit(buf: &mut Vec<u8>, value: &NormalizedValue<'_>, _: &TimestampZone) -> Result<(), EncodeFault> {
    match *value {
        NormalizedValue::Bytes(bytes) => {
            let v = binary_literal_to_u64(bytes)
                .ok_or_else(|| EncodeFault::invalid("bit value has more than 8 significant bytes"))?;
            buf.extend_from_slice(&v.to_le_bytes());
            Ok(())
        }
        _ => Err(EncodeFault::invalid("expected raw bytes")),
    }
}

fn encode_binary(buf: &mut Vec<u8>, value: &NormalizedValue<'_>, _: &TimestampZone) -> Result<(), EncodeFault> {
    match *value {
        NormalizedValue::Text(s) => append_length_value(buf, s.as_bytes()),
        NormalizedValue::Bytes(b) => append_length_value(buf, b),
        _ => return Err(EncodeFault::invalid("expected text or raw bytes")),
    }
    Ok(())
}

fn encode_timestamp(buf: &mut Vec<u8>, value: &NormalizedValue<'_>, zone: &TimestampZone) -> Result<(), EncodeFault> {
    let NormalizedValue::Text(s) = *value else {
        return Err(EncodeFault::invalid("expected a timestamp string"));
    };
    let local = NaiveDateTime::parse_from_str(s, TIMESTAMP_PARSE_FORMAT)
        .map_err(|e| EncodeFault::invalid(format!("malformed timestamp: {}", e)))?;
    let utc = zone
        .to_utc(&local)
        .ok_or_else(|| EncodeFault::invalid(format!("timestamp does not exist in zone {}", zone)))?;
    append_length_value(buf, utc.format(TIMESTAMP_FORMAT).to_string().as_bytes());
    Ok(())
}

fn encode_text(buf: &mut Vec<u8>, value: &NormalizedValue<'_>, _: &TimestampZone) -> Result<(), EncodeFault> {
    match *value {
        NormalizedValue::Text(s) => {
            append_length_value(buf, s.as_bytes());
            Ok(())
        }
        _ => Err(EncodeFault::invalid("expected its textual form")),
    }
}

fn encode_nothing(_: &mut Vec<u8>, _: &NormalizedValue<'_>, _: &TimestampZone) -> Result<(), EncodeFault> {
    Ok(())
}

/// Appends a u32 little-endian length prefix followed by the bytes.
pub fn append_length_value(buf: &mut Vec<u8>, val: &[u8]) {
    buf.extend_from_slice(&(val.len() as u32).to_le_bytes());
    buf.extend_from_slice(val);
}

/// Reads big-endian bytes as an unsigned integer after trimming leading
/// zero bytes. Returns `None` if more than 8 significant bytes remain.
pub fn binary_literal_to_u64(bytes: &[u8]) -> Option<u64> {
    let start = bytes.iter().position(|&b| b != 0).unwrap_or(bytes.len());
    let significant = &bytes[start..];
    if significant.len() > 8 {
        return None;
    }
    Some(significant.iter().fold(0u64, |acc, &b| (acc << 8) | u64::from(b)))
}

/// Parses an unsigned base-10 integer: ASCII digits only, no sign.
pub fn parse_decimal_u64(s: &str) -> Option<u64> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}
