//! Schema model errors.

use thiserror::Error;

use crate::types::TypeError;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchemaError {
    #[error("Cardinality is required to compare column '{0}'")]
    MissingCardinality(String),

    #[error("A column change needs an old column, a new column, or both")]
    EmptyChange,

    #[error("Column '{0}' appears in more than one index change set")]
    OverlappingIndexChange(String),

    #[error(transparent)]
    Type(#[from] TypeError),
}

pub type SchemaResult<T> = Result<T, SchemaError>;
