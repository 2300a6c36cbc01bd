//! Schema error types
//!
//! Error codes:
//! - ROWCRC_SCHEMA_MALFORMED: the schema description cannot be read as an
//!   ordered field list with resolvable type parameters
//! - ROWCRC_UNSUPPORTED_TYPE: a logical type name outside the allow-list
//!
//! Both are fatal to every record that uses the schema.

use std::fmt;

/// Schema-specific error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaErrorCode {
    /// Missing or malformed `fields`, or unresolvable type parameters
    RowcrcSchemaMalformed,
    /// Logical type name has no known mapping
    RowcrcUnsupportedType,
}

impl SchemaErrorCode {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            SchemaErrorCode::RowcrcSchemaMalformed => "ROWCRC_SCHEMA_MALFORMED",
            SchemaErrorCode::RowcrcUnsupportedType => "ROWCRC_UNSUPPORTED_TYPE",
        }
    }
}

impl fmt::Display for SchemaErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Schema error type with full context
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaError {
    /// Error code
    code: SchemaErrorCode,
    /// Human-readable message
    message: String,
    /// Field name if the failure is tied to one field
    field: Option<String>,
}

impl SchemaError {
    /// Create a malformed-schema error not tied to a specific field
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self {
            code: SchemaErrorCode::RowcrcSchemaMalformed,
            message: format!("Malformed schema: {}", reason.into()),
            field: None,
        }
    }

    /// Create a malformed-schema error for one field
    pub fn malformed_field(field: impl Into<String>, reason: impl Into<String>) -> Self {
        let field = field.into();
        Self {
            code: SchemaErrorCode::RowcrcSchemaMalformed,
            message: format!("Malformed schema field '{}': {}", field, reason.into()),
            field: Some(field),
        }
    }

    /// Create an unsupported logical type error
    pub fn unsupported_type(logical_type: impl AsRef<str>) -> Self {
        Self {
            code: SchemaErrorCode::RowcrcUnsupportedType,
            message: format!("Unsupported logical type '{}'", logical_type.as_ref()),
            field: None,
        }
    }

    /// Attach the field name to an error raised without one
    pub fn in_field(mut self, field: impl Into<String>) -> Self {
        if self.field.is_none() {
            let field = field.into();
            self.message = format!("{} (field '{}')", self.message, field);
            self.field = Some(field);
        }
        self
    }

    /// Returns the error code
    pub fn code(&self) -> SchemaErrorCode {
        self.code
    }

    /// Returns the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the field name if applicable
    pub fn field(&self) -> Option<&str> {
        self.field.as_deref()
    }

    /// Returns whether the failure is an unknown logical type
    pub fn is_unsupported_type(&self) -> bool {
        self.code == SchemaErrorCode::RowcrcUnsupportedType
    }
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for SchemaError {}

/// Result type for schema operations
pub type SchemaResult<T> = Result<T, SchemaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(SchemaErrorCode::RowcrcSchemaMalformed.code(), "ROWCRC_SCHEMA_MALFORMED");
        assert_eq!(SchemaErrorCode::RowcrcUnsupportedType.code(), "ROWCRC_UNSUPPORTED_TYPE");
    }

    #[test]
    fn test_in_field_attaches_once() {
        let err = SchemaError::unsupported_type("GEOMETRY")
            .in_field("shape")
            .in_field("other");
        assert_eq!(err.field(), Some("shape"));
        assert!(err.message().contains("GEOMETRY"));
        assert!(err.message().contains("shape"));
        assert!(!err.message().contains("other"));
    }

    #[test]
    fn test_display_includes_code() {
        let err = SchemaError::malformed_field("id", "missing connect.parameters");
        let display = format!("{}", err);
        assert!(display.starts_with("ROWCRC_SCHEMA_MALFORMED"));
        assert!(display.contains("'id'"));
        assert!(!err.is_unsupported_type());
    }
}
