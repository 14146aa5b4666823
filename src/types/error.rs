//! Type system errors.

use thiserror::Error;

use crate::model::ColumnType;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TypeError {
    #[error("Unknown column type: '{0}'")]
    UnknownType(String),

    #[error("Column type {0} requires a maximum size")]
    MissingSize(ColumnType),

    #[error("Column type {column_type} does not accept a maximum size (got {size})")]
    SizeNotAllowed { column_type: ColumnType, size: i64 },

    #[error("Maximum size must be between 1 and {max} (got {size})")]
    InvalidSize { size: i64, max: i64 },

    #[error("Value '{value}' is not a valid {column_type}: {reason}")]
    InvalidValue {
        column_type: ColumnType,
        value: String,
        reason: String,
    },

    #[error("Value of {length} characters exceeds the maximum size of {max_size}")]
    ValueTooLong { length: usize, max_size: i64 },

    #[error("Column type {0} does not support default values")]
    DefaultNotAllowed(ColumnType),

    #[error("Invalid default value '{value}' for {column_type}: {reason}")]
    InvalidDefault {
        column_type: ColumnType,
        value: String,
        reason: String,
    },

    #[error("Row {row_id} has {actual} values but the header has {expected} columns")]
    RowWidth {
        row_id: i64,
        expected: usize,
        actual: usize,
    },
}

impl TypeError {
    /// Argument errors are caught before any schema is touched; the rest
    /// reject values against an otherwise valid schema.
    pub fn is_invalid_argument(&self) -> bool {
        matches!(
            self,
            TypeError::UnknownType(_)
                | TypeError::MissingSize(_)
                | TypeError::SizeNotAllowed { .. }
                | TypeError::InvalidSize { .. }
        )
    }
}

pub type TypeResult<T> = Result<T, TypeError>;
