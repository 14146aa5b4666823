//! Crate-level errors and scrubbing of driver failures.
//!
//! Failures fall into three classes:
//!
//! | class       | source                                   | when                     |
//! |-------------|------------------------------------------|--------------------------|
//! | Translation | [`TranslationError`]                     | before SQL reaches store |
//! | Schema      | [`TypeError`], [`SchemaError`], settings | before SQL reaches store |
//! | Execution   | [`ExecutionError`]                       | driver reported failure  |
//!
//! Driver messages mention physical names (`_C12_`, `_DBL_C12_`).
//! [`replace_column_names`] rewrites them to display names before a message
//! leaves the crate.

use regex::{Captures, Regex};
use std::collections::HashMap;
use std::sync::LazyLock;
use thiserror::Error;
use tracing::warn;

use crate::config::SettingsError;
use crate::index::DriverError;
use crate::model::{ColumnId, ColumnModel};
use crate::query::TranslationError;
use crate::schema::SchemaError;
use crate::types::TypeError;

/// MySQL `ER_BAD_FIELD_ERROR`.
pub const UNKNOWN_COLUMN_CODE: u16 = 1054;

/// MySQL `ER_TOO_BIG_ROWSIZE`.
pub const ROW_TOO_LARGE_CODE: u16 = 1118;

pub const ROW_TOO_LARGE_MESSAGE: &str =
    "Too much data per column. The maximum size for a row is about 65000 bytes";

static PHYSICAL_COLUMN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"_(DBL_)?C(\d+)_").unwrap());

// ============================================================================
// Execution errors
// ============================================================================

/// A driver failure, classified and scrubbed of physical names.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExecutionError {
    /// The row exceeds the store's per-row byte limit.
    #[error("{}", ROW_TOO_LARGE_MESSAGE)]
    RowTooLarge,

    /// A read referenced a column the store does not have yet.
    #[error("unknown column during read: {0}")]
    SchemaLag(String),

    /// Any other driver failure.
    #[error("{message}")]
    Driver { code: Option<u16>, message: String },
}

impl ExecutionError {
    /// Classify a raw driver failure.
    pub fn from_driver(err: DriverError) -> Self {
        let lower = err.message.to_ascii_lowercase();
        if err.code == Some(ROW_TOO_LARGE_CODE) || lower.contains("row size too large") {
            ExecutionError::RowTooLarge
        } else if err.code == Some(UNKNOWN_COLUMN_CODE) || lower.contains("unknown column") {
            ExecutionError::SchemaLag(err.message)
        } else {
            ExecutionError::Driver {
                code: err.code,
                message: err.message,
            }
        }
    }

    /// Expected while a schema migration is still being applied.
    pub fn is_schema_lag(&self) -> bool {
        matches!(self, ExecutionError::SchemaLag(_))
    }

    /// Rewrite physical column names in the message to display names.
    pub fn scrub(self, models: &HashMap<ColumnId, ColumnModel>) -> Self {
        match self {
            ExecutionError::RowTooLarge => ExecutionError::RowTooLarge,
            ExecutionError::SchemaLag(message) => {
                ExecutionError::SchemaLag(replace_column_names(&message, models))
            }
            ExecutionError::Driver { code, message } => {
                let scrubbed = replace_column_names(&message, models);
                if scrubbed != message {
                    warn!(code = ?code, message = %scrubbed, "rewrote driver error");
                }
                ExecutionError::Driver {
                    code,
                    message: scrubbed,
                }
            }
        }
    }
}

/// Replace every `_C<id>_` and `_DBL_C<id>_` with the column's display name.
///
/// Ids missing from `models` are left untouched.
pub fn replace_column_names(message: &str, models: &HashMap<ColumnId, ColumnModel>) -> String {
    PHYSICAL_COLUMN_RE
        .replace_all(message, |caps: &Captures| {
            caps[2]
                .parse::<ColumnId>()
                .ok()
                .and_then(|id| models.get(&id))
                .map(|model| model.name.clone())
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

/// Index a schema by column id for [`replace_column_names`].
pub fn models_by_id<'a>(models: impl IntoIterator<Item = &'a ColumnModel>) -> HashMap<ColumnId, ColumnModel> {
    models
        .into_iter()
        .map(|model| (model.id, model.clone()))
        .collect()
}

// ============================================================================
// Crate error
// ============================================================================

/// Failure class of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Translation,
    Schema,
    Execution,
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Type(#[from] TypeError),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Translation(#[from] TranslationError),

    #[error(transparent)]
    Execution(#[from] ExecutionError),

    #[error(transparent)]
    Settings(#[from] SettingsError),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Translation(_) => ErrorKind::Translation,
            Error::Type(_) | Error::Schema(_) | Error::Settings(_) => ErrorKind::Schema,
            Error::Execution(_) => ErrorKind::Execution,
        }
    }
}

impl From<DriverError> for Error {
    fn from(err: DriverError) -> Self {
        Error::Execution(ExecutionError::from_driver(err))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
