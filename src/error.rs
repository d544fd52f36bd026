//! Error types for schema declaration and record access

use thiserror::Error;

/// Result type for schema and record operations
pub type Result<T> = std::result::Result<T, SchemaError>;

/// Schema and record errors
#[derive(Error, Debug)]
pub enum SchemaError {
    /// Malformed field or record type declaration
    #[error("Invalid declaration: {0}")]
    Configuration(String),

    #[error("Invalid field: '{field}' is not declared by {record}")]
    UnknownField { record: String, field: String },

    #[error("({value}, {actual}) is not valid for '{field}' whose declared type is {expected}")]
    TypeMismatch {
        field: String,
        value: String,
        actual: String,
        expected: String,
    },

    #[error("Field not set: '{field}' on {record}")]
    FieldNotSet { record: String, field: String },

    #[error("Unknown record type: {0}")]
    UnknownType(String),

    #[error("Record type already registered: {0}")]
    DuplicateType(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Definition parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl SchemaError {
    pub(crate) fn unknown_field(record: impl Into<String>, field: impl Into<String>) -> Self {
        Self::UnknownField {
            record: record.into(),
            field: field.into(),
        }
    }

    pub(crate) fn type_mismatch(
        field: impl Into<String>,
        value: impl Into<String>,
        actual: impl Into<String>,
        expected: impl Into<String>,
    ) -> Self {
        Self::TypeMismatch {
            field: field.into(),
            value: value.into(),
            actual: actual.into(),
            expected: expected.into(),
        }
    }
}
