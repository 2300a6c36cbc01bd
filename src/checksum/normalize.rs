//! Value normalization
//!
//! Strips nullable-union wrapping and resolves enum/set labels to the
//! ordinal the source database stores:
//!
//! - Enum: 1-based position of the label in `allowed`
//! - Set: bitmask with bit `i` set for every listed label at 0-based
//!   position `i`; the empty string is the empty set

use super::errors::{ChecksumError, ChecksumResult};
use crate::row::DecodedValue;
use crate::schema::{ColumnDescriptor, TypeTag};

/// A column value ready for canonical encoding
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NormalizedValue<'a> {
    /// SQL NULL
    Null,
    Boolean(bool),
    Int32(i32),
    UInt32(u32),
    Int64(i64),
    UInt64(u64),
    Float32(f32),
    Float64(f64),
    Text(&'a str),
    Bytes(&'a [u8]),
    /// Resolved enum/set ordinal
    Ordinal(u64),
}

impl NormalizedValue<'_> {
    /// Whether the value is SQL NULL
    pub fn is_null(&self) -> bool {
        matches!(self, NormalizedValue::Null)
    }

    /// Non-negative integer value, if the representation is an integer
    fn as_unsigned(&self) -> Option<u64> {
        match *self {
            NormalizedValue::Int32(v) => u64::try_from(v).ok(),
            NormalizedValue::UInt32(v) => Some(u64::from(v)),
            NormalizedValue::Int64(v) => u64::try_from(v).ok(),
            NormalizedValue::UInt64(v) => Some(v),
            NormalizedValue::Ordinal(v) => Some(v),
            _ => None,
        }
    }
}

/// Normalizes the raw value of one column.
///
/// `raw` is `None` when the column is missing from the decoded row, which
/// is an error; a present NULL passes through for every type.
pub fn normalize<'a>(
    raw: Option<&'a DecodedValue>,
    descriptor: &ColumnDescriptor,
) -> ChecksumResult<NormalizedValue<'a>> {
    let raw = raw.ok_or_else(|| ChecksumError::MissingValue {
        column: descriptor.name.clone(),
    })?;

    let value = match raw.unwrap_union() {
        DecodedValue::Null => NormalizedValue::Null,
        DecodedValue::Boolean(v) => NormalizedValue::Boolean(*v),
        DecodedValue::Int32(v) => NormalizedValue::Int32(*v),
        DecodedValue::UInt32(v) => NormalizedValue::UInt32(*v),
        DecodedValue::Int64(v) => NormalizedValue::Int64(*v),
        DecodedValue::UInt64(v) => NormalizedValue::UInt64(*v),
        DecodedValue::Float32(v) => NormalizedValue::Float32(*v),
        DecodedValue::Float64(v) => NormalizedValue::Float64(*v),
        DecodedValue::String(v) => NormalizedValue::Text(v),
        DecodedValue::Bytes(v) => NormalizedValue::Bytes(v),
        DecodedValue::Union(..) => {
            return Err(encoding_error(descriptor, raw, "nested nullable union"));
        }
    };

    if value.is_null() {
        return Ok(value);
    }

    match descriptor.tag {
        TypeTag::Enum => resolve_enum(value, descriptor)
            .map(NormalizedValue::Ordinal)
            .map_err(|reason| encoding_error(descriptor, raw, &reason)),
        TypeTag::Set => resolve_set(value, descriptor)
            .map(NormalizedValue::Ordinal)
            .map_err(|reason| encoding_error(descriptor, raw, &reason)),
        _ => Ok(value),
    }
}

fn resolve_enum(value: NormalizedValue<'_>, descriptor: &ColumnDescriptor) -> Result<u64, String> {
    let allowed = &descriptor.allowed;

    if let NormalizedValue::Text(label) = value {
        return allowed
            .iter()
            .position(|a| a == label)
            .map(|i| i as u64 + 1)
            .ok_or_else(|| format!("label {:?} is not in enum {:?}", label, allowed));
    }

    let number = value
        .as_unsigned()
        .ok_or_else(|| "enum value must be a label or an ordinal".to_string())?;
    if number == 0 || number > allowed.len() as u64 {
        return Err(format!(
            "ordinal {} outside enum boundary [1, {}]",
            number,
            allowed.len()
        ));
    }
    Ok(number)
}

fn resolve_set(value: NormalizedValue<'_>, descriptor: &ColumnDescriptor) -> Result<u64, String> {
    let allowed = &descriptor.allowed;

    if let NormalizedValue::Text(labels) = value {
        if labels.is_empty() {
            return Ok(0);
        }
        let mut bits = 0u64;
        for label in labels.split(',') {
            let position = allowed
                .iter()
                .position(|a| a == label)
                .ok_or_else(|| format!("label {:?} is not in set {:?}", label, allowed))?;
            let bit = u32::try_from(position)
                .ok()
                .and_then(|p| 1u64.checked_shl(p))
                .ok_or_else(|| format!("label {:?} is beyond the 64th set member", label))?;
            bits |= bit;
        }
        return Ok(bits);
    }

    let bits = value
        .as_unsigned()
        .ok_or_else(|| "set value must be labels or a bitmask".to_string())?;
    if allowed.len() < 64 && bits >> allowed.len() != 0 {
        return Err(format!(
            "bitmask {:#x} has bits beyond the {} set members",
            bits,
            allowed.len()
        ));
    }
    Ok(bits)
}

fn encoding_error(descriptor: &ColumnDescriptor, raw: &DecodedValue, reason: &str) -> ChecksumError {
    ChecksumError::Encoding {
        column: descriptor.name.clone(),
        tag: descriptor.tag,
        value: raw.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checksum::ErrorKind;

    fn enum_column() -> ColumnDescriptor {
        ColumnDescriptor::new("e", TypeTag::Enum).with_allowed(["a", "b", "c"])
    }

    fn set_column() -> ColumnDescriptor {
        ColumnDescriptor::new("s", TypeTag::Set).with_allowed(["x", "y", "z"])
    }

    #[test]
    fn test_missing_value() {
        let err = normalize(None, &ColumnDescriptor::new("id", TypeTag::Long)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingValue);
        assert_eq!(err.column(), Some("id"));
    }

    #[test]
    fn test_union_is_unwrapped() {
        let raw = DecodedValue::union("long", DecodedValue::Int64(9));
        let value = normalize(Some(&raw), &ColumnDescriptor::new("id", TypeTag::Longlong)).unwrap();
        assert_eq!(value, NormalizedValue::Int64(9));
    }

    #[test]
    fn test_nested_union_is_rejected() {
        let raw = DecodedValue::union("a", DecodedValue::union("b", DecodedValue::Int64(1)));
        let err = normalize(Some(&raw), &ColumnDescriptor::new("id", TypeTag::Long)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Encoding);
    }

    #[test]
    fn test_null_passes_through_for_every_type() {
        for descriptor in [enum_column(), set_column(), ColumnDescriptor::new("t", TypeTag::Varchar)] {
            assert!(normalize(Some(&DecodedValue::Null), &descriptor).unwrap().is_null());
            let wrapped = DecodedValue::union("null", DecodedValue::Null);
            assert!(normalize(Some(&wrapped), &descriptor).unwrap().is_null());
        }
    }

    #[test]
    fn test_enum_ordinals_are_one_based() {
        let column = enum_column();
        for (label, ordinal) in [("a", 1), ("b", 2), ("c", 3)] {
            let raw = DecodedValue::from(label);
            assert_eq!(
                normalize(Some(&raw), &column).unwrap(),
                NormalizedValue::Ordinal(ordinal)
            );
        }
    }

    #[test]
    fn test_enum_unknown_label_fails() {
        let raw = DecodedValue::from("d");
        let err = normalize(Some(&raw), &enum_column()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Encoding);
        assert!(err.to_string().contains("\"d\""));

        // labels compare exactly
        let raw = DecodedValue::from("A");
        assert!(normalize(Some(&raw), &enum_column()).is_err());
    }

    #[test]
    fn test_enum_numeric_ordinal() {
        let raw = DecodedValue::UInt64(2);
        assert_eq!(
            normalize(Some(&raw), &enum_column()).unwrap(),
            NormalizedValue::Ordinal(2)
        );
        assert!(normalize(Some(&DecodedValue::UInt64(0)), &enum_column()).is_err());
        assert!(normalize(Some(&DecodedValue::Int64(4)), &enum_column()).is_err());
        assert!(normalize(Some(&DecodedValue::Int32(-1)), &enum_column()).is_err());
        assert!(normalize(Some(&DecodedValue::Float64(1.0)), &enum_column()).is_err());
    }

    #[test]
    fn test_set_bitmask() {
        let column = set_column();
        let cases = [("x", 0b001), ("y", 0b010), ("z", 0b100), ("x,z", 0b101), ("z,x", 0b101), ("y,y", 0b010), ("", 0)];
        for (labels, bits) in cases {
            let raw = DecodedValue::from(labels);
            assert_eq!(
                normalize(Some(&raw), &column).unwrap(),
                NormalizedValue::Ordinal(bits),
                "{:?}",
                labels
            );
        }
    }

    #[test]
    fn test_set_unknown_label_fails() {
        let raw = DecodedValue::from("x,w");
        let err = normalize(Some(&raw), &set_column()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Encoding);
    }

    #[test]
    fn test_set_numeric_bitmask() {
        assert_eq!(
            normalize(Some(&DecodedValue::Int64(0b111)), &set_column()).unwrap(),
            NormalizedValue::Ordinal(0b111)
        );
        assert!(normalize(Some(&DecodedValue::Int64(0b1000)), &set_column()).is_err());
    }

    #[test]
    fn test_wide_set_accepts_high_bit() {
        let labels: Vec<String> = (0..64).map(|i| format!("m{}", i)).collect();
        let column = ColumnDescriptor::new("s", TypeTag::Set).with_allowed(labels);
        let raw = DecodedValue::from("m63,m0");
        assert_eq!(
            normalize(Some(&raw), &column).unwrap(),
            NormalizedValue::Ordinal((1u64 << 63) | 1)
        );
        assert!(normalize(Some(&DecodedValue::UInt64(u64::MAX)), &column).is_ok());
    }

    #[test]
    fn test_set_member_past_64th_is_encoding_error() {
        let labels: Vec<String> = (0..65).map(|i| format!("m{}", i)).collect();
        let column = ColumnDescriptor::new("s", TypeTag::Set).with_allowed(labels);

        let err = normalize(Some(&DecodedValue::from("m64")), &column).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Encoding);
        assert_eq!(err.column(), Some("s"));

        assert_eq!(
            normalize(Some(&DecodedValue::from("m63")), &column).unwrap(),
            NormalizedValue::Ordinal(1u64 << 63)
        );
    }

    #[test]
    fn test_other_types_keep_representation() {
        let raw = DecodedValue::from("123");
        assert_eq!(
            normalize(Some(&raw), &ColumnDescriptor::new("n", TypeTag::Longlong)).unwrap(),
            NormalizedValue::Text("123")
        );
        let raw = DecodedValue::Bytes(vec![1, 2]);
        assert_eq!(
            normalize(Some(&raw), &ColumnDescriptor::new("b", TypeTag::Bit)).unwrap(),
            NormalizedValue::Bytes(&[1, 2])
        );
    }
}
