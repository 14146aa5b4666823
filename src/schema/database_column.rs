//! Physical column descriptors built from live introspection.

use serde::Serialize;
use std::cmp::Ordering;

use super::error::{SchemaError, SchemaResult};
use crate::model::{ColumnId, ColumnType};
use crate::sql::naming;
use crate::sql::token::{Token, TokenStream};
use crate::types::MySqlColumnType;

/// Longest index prefix the store accepts for text columns.
pub const MAX_MYSQL_VARCHAR_INDEX_LENGTH: i64 = 255;

/// One physical column as the store reports it.
///
/// Built per request from `SHOW COLUMNS` / `SHOW INDEX` and never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatabaseColumnInfo {
    pub column_name: String,
    pub mysql_type: Option<MySqlColumnType>,
    pub max_size: Option<i64>,
    pub cardinality: Option<i64>,
    pub has_index: bool,
    pub index_name: Option<String>,
    /// Logical type of the column, when the schema is known.
    pub column_type: Option<ColumnType>,
}

impl DatabaseColumnInfo {
    pub fn new(column_name: impl Into<String>) -> Self {
        Self {
            column_name: column_name.into(),
            mysql_type: None,
            max_size: None,
            cardinality: None,
            has_index: false,
            index_name: None,
            column_type: None,
        }
    }

    pub fn with_type(mut self, mysql_type: MySqlColumnType, max_size: Option<i64>) -> Self {
        self.mysql_type = Some(mysql_type);
        self.max_size = max_size;
        self
    }

    pub fn with_cardinality(mut self, cardinality: i64) -> Self {
        self.cardinality = Some(cardinality);
        self
    }

    pub fn with_index(mut self, index_name: impl Into<String>) -> Self {
        self.has_index = true;
        self.index_name = Some(index_name.into());
        self
    }

    /// Logical column id for `_C<id>_` columns.
    pub fn column_id(&self) -> Option<ColumnId> {
        naming::parse_column_id(&self.column_name)
    }

    /// ROW_ID, ROW_VERSION and the other reserved columns.
    pub fn is_metadata(&self) -> bool {
        naming::is_reserved_column_name(&self.column_name)
    }

    /// Index name this column should carry.
    pub fn expected_index_name(&self) -> String {
        match self.column_id() {
            Some(id) => naming::index_name(id),
            None => format!("{}idx_", self.column_name),
        }
    }

    /// Ascending cardinality order. Both sides must have been measured.
    pub fn compare_cardinality(&self, other: &Self) -> SchemaResult<Ordering> {
        let mine = self
            .cardinality
            .ok_or_else(|| SchemaError::MissingCardinality(self.column_name.clone()))?;
        let theirs = other
            .cardinality
            .ok_or_else(|| SchemaError::MissingCardinality(other.column_name.clone()))?;
        Ok(mine.cmp(&theirs))
    }

    /// Prefix length for an index on this column, if one is needed.
    ///
    /// MEDIUMTEXT is always capped; sized text only when it exceeds the cap.
    pub fn index_prefix_length(&self) -> Option<i64> {
        match self.mysql_type {
            Some(MySqlColumnType::MediumText) => Some(MAX_MYSQL_VARCHAR_INDEX_LENGTH),
            Some(t) if t.is_text() => self
                .max_size
                .filter(|size| *size > MAX_MYSQL_VARCHAR_INDEX_LENGTH)
                .map(|_| MAX_MYSQL_VARCHAR_INDEX_LENGTH),
            _ => None,
        }
    }

    /// `<index name> (<column>[(<prefix>)])`
    pub fn index_definition(&self) -> TokenStream {
        let mut ts = TokenStream::new();
        ts.ident(self.expected_index_name())
            .space()
            .lparen()
            .ident(self.column_name.clone());
        if let Some(prefix) = self.index_prefix_length() {
            ts.lparen().push(Token::LitInt(prefix)).rparen();
        }
        ts.rparen();
        ts
    }
}
