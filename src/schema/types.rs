//! Column storage types and the logical type mapping table
//!
//! `TypeTag` mirrors the MySQL column storage types by their one-byte
//! protocol code. Logical type names come from the `tidb_type` parameter
//! carried by every column of the change-event schema.

use std::fmt;

/// MySQL column storage type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeTag {
    /// Legacy fixed-point decimal, never produced by the source anymore
    Decimal,
    Tiny,
    Short,
    Long,
    Float,
    Double,
    Null,
    Timestamp,
    Longlong,
    Int24,
    Date,
    /// TIME columns
    Duration,
    Datetime,
    Year,
    NewDate,
    Varchar,
    Bit,
    Json,
    NewDecimal,
    Enum,
    Set,
    TinyBlob,
    MediumBlob,
    LongBlob,
    Blob,
    VarString,
    String,
    Geometry,
}

impl TypeTag {
    /// Returns the MySQL protocol type code
    pub fn code(&self) -> u8 {
        match self {
            TypeTag::Decimal => 0x00,
            TypeTag::Tiny => 0x01,
            TypeTag::Short => 0x02,
            TypeTag::Long => 0x03,
            TypeTag::Float => 0x04,
            TypeTag::Double => 0x05,
            TypeTag::Null => 0x06,
            TypeTag::Timestamp => 0x07,
            TypeTag::Longlong => 0x08,
            TypeTag::Int24 => 0x09,
            TypeTag::Date => 0x0a,
            TypeTag::Duration => 0x0b,
            TypeTag::Datetime => 0x0c,
            TypeTag::Year => 0x0d,
            TypeTag::NewDate => 0x0e,
            TypeTag::Varchar => 0x0f,
            TypeTag::Bit => 0x10,
            TypeTag::Json => 0xf5,
            TypeTag::NewDecimal => 0xf6,
            TypeTag::Enum => 0xf7,
            TypeTag::Set => 0xf8,
            TypeTag::TinyBlob => 0xf9,
            TypeTag::MediumBlob => 0xfa,
            TypeTag::LongBlob => 0xfb,
            TypeTag::Blob => 0xfc,
            TypeTag::VarString => 0xfd,
            TypeTag::String => 0xfe,
            TypeTag::Geometry => 0xff,
        }
    }

    /// Returns the type name for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            TypeTag::Decimal => "decimal",
            TypeTag::Tiny => "tiny",
            TypeTag::Short => "short",
            TypeTag::Long => "long",
            TypeTag::Float => "float",
            TypeTag::Double => "double",
            TypeTag::Null => "null",
            TypeTag::Timestamp => "timestamp",
            TypeTag::Longlong => "longlong",
            TypeTag::Int24 => "int24",
            TypeTag::Date => "date",
            TypeTag::Duration => "duration",
            TypeTag::Datetime => "datetime",
            TypeTag::Year => "year",
            TypeTag::NewDate => "newdate",
            TypeTag::Varchar => "varchar",
            TypeTag::Bit => "bit",
            TypeTag::Json => "json",
            TypeTag::NewDecimal => "newdecimal",
            TypeTag::Enum => "enum",
            TypeTag::Set => "set",
            TypeTag::TinyBlob => "tinyblob",
            TypeTag::MediumBlob => "mediumblob",
            TypeTag::LongBlob => "longblob",
            TypeTag::Blob => "blob",
            TypeTag::VarString => "varstring",
            TypeTag::String => "string",
            TypeTag::Geometry => "geometry",
        }
    }

    /// Whether values of this type are symbolic labels resolved to ordinals
    pub fn is_labelled(&self) -> bool {
        matches!(self, TypeTag::Enum | TypeTag::Set)
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(0x{:02x})", self.type_name(), self.code())
    }
}

/// Result of mapping a logical type name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogicalType {
    /// Storage type used for encoding
    pub tag: TypeTag,
    /// Whether the logical type was declared UNSIGNED
    pub unsigned: bool,
}

/// Fixed allow-list of logical type names.
///
/// Narrow integer widths are all published as `INT`, character types as
/// `TEXT` and binary types as `BLOB`, so this table is complete for the
/// change-event format.
const LOGICAL_TYPES: [(&str, TypeTag, bool); 18] = [
    ("INT", TypeTag::Long, false),
    ("INT UNSIGNED", TypeTag::Long, true),
    ("BIGINT", TypeTag::Longlong, false),
    ("BIGINT UNSIGNED", TypeTag::Longlong, true),
    ("FLOAT", TypeTag::Float, false),
    ("DOUBLE", TypeTag::Double, false),
    ("BIT", TypeTag::Bit, false),
    ("DECIMAL", TypeTag::NewDecimal, false),
    ("TEXT", TypeTag::Varchar, false),
    ("BLOB", TypeTag::LongBlob, false),
    ("ENUM", TypeTag::Enum, false),
    ("SET", TypeTag::Set, false),
    ("JSON", TypeTag::Json, false),
    ("DATE", TypeTag::Date, false),
    ("DATETIME", TypeTag::Datetime, false),
    ("TIMESTAMP", TypeTag::Timestamp, false),
    ("TIME", TypeTag::Duration, false),
    ("YEAR", TypeTag::Year, false),
];

/// Maps a logical type name to its storage type.
///
/// Returns `None` for any name outside the allow-list; callers turn that
/// into an unsupported-type error. There is no fallback.
pub fn map_logical_type(name: &str) -> Option<LogicalType> {
    LOGICAL_TYPES
        .iter()
        .find(|(known, _, _)| *known == name)
        .map(|&(_, tag, unsigned)| LogicalType { tag, unsigned })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allow_list_maps_every_name() {
        for (name, tag, unsigned) in LOGICAL_TYPES {
            let mapped = map_logical_type(name).unwrap();
            assert_eq!(mapped.tag, tag, "{}", name);
            assert_eq!(mapped.unsigned, unsigned, "{}", name);
        }
    }

    #[test]
    fn test_unsigned_variants_share_tag() {
        assert_eq!(map_logical_type("INT").unwrap().tag, TypeTag::Long);
        assert_eq!(map_logical_type("INT UNSIGNED").unwrap().tag, TypeTag::Long);
        assert!(map_logical_type("BIGINT UNSIGNED").unwrap().unsigned);
    }

    #[test]
    fn test_unknown_names_are_rejected() {
        assert!(map_logical_type("GEOMETRY").is_none());
        assert!(map_logical_type("VARCHAR").is_none());
        assert!(map_logical_type("int").is_none());
        assert!(map_logical_type("").is_none());
    }

    #[test]
    fn test_type_codes() {
        assert_eq!(TypeTag::Long.code(), 3);
        assert_eq!(TypeTag::Bit.code(), 16);
        assert_eq!(TypeTag::Geometry.code(), 255);
        assert_eq!(format!("{}", TypeTag::Enum), "enum(0xf7)");
    }

    #[test]
    fn test_labelled_tags() {
        assert!(TypeTag::Enum.is_labelled());
        assert!(TypeTag::Set.is_labelled());
        assert!(!TypeTag::Varchar.is_labelled());
    }
}
