use thiserror::Error;

use crate::coerce::CoerceError;

/// Top-level error type for mapping operations.
#[derive(Error, Debug)]
pub enum OrmError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid schema for {type_name}: {reason}")]
    InvalidSchema {
        type_name: &'static str,
        reason: String,
    },

    #[error("Missing primary key on {label}: {reason}")]
    MissingPrimaryKey { label: String, reason: String },

    #[error("Field {field} type mismatch (store type: {source_type}, field type: {target_type})")]
    FieldTypeMismatch {
        field: String,
        source_type: String,
        target_type: String,
    },

    #[error("Unexpected result shape: {0}")]
    UnexpectedResultShape(String),

    #[error("No records found for label {label}")]
    NoRecordsFound { label: String },

    #[error("Store operation failed: {0}")]
    StoreOperationFailed(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl OrmError {
    /// Attach a field name to a field-less coercion failure.
    pub fn field_mismatch(field: &str, err: CoerceError) -> Self {
        Self::FieldTypeMismatch {
            field: field.to_string(),
            source_type: err.source_type,
            target_type: err.target_type,
        }
    }
}

pub type Result<T> = std::result::Result<T, OrmError>;
