//! Translation errors.
//!
//! Everything here is raised before any SQL reaches the store.

use thiserror::Error;

use crate::model::{ColumnType, FacetType, InvalidIdError};
use crate::types::TypeError;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TranslationError {
    #[error("Failed to parse query: {0}")]
    Parse(String),

    #[error("Unsupported query syntax: {0}")]
    Unsupported(String),

    #[error("Column does not exist: {0}")]
    UnknownColumn(String),

    #[error("Column reference '{0}' is ambiguous: it exists in more than one table")]
    AmbiguousColumn(String),

    #[error("Unknown table: {0}")]
    UnknownTable(String),

    #[error(transparent)]
    InvalidTableId(#[from] InvalidIdError),

    #[error("The JOIN keyword is not supported in this context")]
    JoinNotSupported,

    #[error("Unknown function: {0}")]
    UnknownFunction(String),

    #[error("Function {function} can only be used with a column of type DOUBLE (got {column_type})")]
    NotADoubleColumn {
        function: String,
        column_type: ColumnType,
    },

    #[error("Function {0} can only be used on columns defined in the schema")]
    NotASchemaColumn(String),

    #[error("Column '{column}' is not faceted as {expected:?}")]
    NotFaceted { column: String, expected: FacetType },

    #[error("Invalid filter on '{column}': {reason}")]
    InvalidFilter { column: String, reason: String },

    #[error("{0} must not be negative")]
    NegativePagination(&'static str),

    #[error(transparent)]
    Type(#[from] TypeError),
}

pub type TranslationResult<T> = Result<T, TranslationError>;
