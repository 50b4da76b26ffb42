//! Error kinds raised while mapping, coercing, and persisting rows.
//!
//! Everything except [`LoadError::SchemaMismatch`] is fatal to a load run.
//! Mapping never returns a schema mismatch; it is only used to describe
//! unmatched fields in diagnostics.

use thiserror::Error;

use crate::schema::SemanticType;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("field '{field}' has no column titled '{tag}' in the header")]
    SchemaMismatch { field: &'static str, tag: &'static str },

    #[error("field '{field}' (column '{tag}'): cannot convert '{value}' to {expected}")]
    InvalidNumber {
        field: &'static str,
        tag: &'static str,
        value: String,
        expected: SemanticType,
    },

    #[error("field '{field}' declares unsupported type {semantic_type}")]
    UnsupportedType {
        field: &'static str,
        semantic_type: SemanticType,
    },

    #[error("{operation} failed: {message}")]
    Persistence {
        operation: &'static str,
        message: String,
    },
}

/// A row-level failure. `line` is the 1-based line in the input file,
/// counting the header as line 1.
#[derive(Debug, Error)]
#[error("row {line}: {error}")]
pub struct RowFailure {
    pub line: usize,
    #[source]
    pub error: LoadError,
}

impl LoadError {
    pub fn persistence(operation: &'static str, err: impl std::fmt::Display) -> Self {
        LoadError::Persistence {
            operation,
            message: err.to_string(),
        }
    }

    pub fn is_fatal(&self) -> bool {
        !matches!(self, LoadError::SchemaMismatch { .. })
    }
}
