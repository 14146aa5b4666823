//! Deterministic physical naming.
//!
//! Logical ids map to physical identifiers by construction:
//!
//! | logical                 | physical        |
//! |-------------------------|-----------------|
//! | table `syn123`          | `T123`          |
//! | table `syn123.4`        | `T123_4`        |
//! | status table            | `T123S`         |
//! | current-row table       | `T123CR`        |
//! | column 7                | `_C7_`          |
//! | DOUBLE shadow column 7  | `_DBL_C7_`      |
//! | index on column 7       | `_C7_idx_`      |
//! | n-th bind parameter     | `:b<n>`         |
//!
//! Only these functions produce [`Token::Ident`](super::token::Token::Ident)
//! content, which is why identifiers are emitted unquoted.

use regex::Regex;
use std::sync::LazyLock;

use crate::model::{ColumnId, ColumnModel, ColumnType, IdAndVersion};

pub const ROW_ID: &str = "ROW_ID";
pub const ROW_VERSION: &str = "ROW_VERSION";
pub const ROW_ETAG: &str = "ROW_ETAG";
pub const ROW_BENEFACTOR: &str = "ROW_BENEFACTOR";

/// Metadata columns every index table may carry, never part of a schema.
pub const RESERVED_COLUMN_NAMES: [&str; 4] = [ROW_ID, ROW_VERSION, ROW_ETAG, ROW_BENEFACTOR];

/// Bind names used by row DML.
pub const ROW_ID_BIND: &str = "bRI";
pub const ROW_VERSION_BIND: &str = "bRV";

const TABLE_PREFIX: &str = "T";
const COLUMN_PREFIX: &str = "_C";
const COLUMN_POSTFIX: &str = "_";
const DOUBLE_PREFIX: &str = "_DBL";
const INDEX_POSTFIX: &str = "idx_";

static COLUMN_NAME_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^_C(\d+)_$").unwrap());

/// Which physical table of a logical table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableIndexType {
    Index,
    Status,
    CurrentRow,
}

impl TableIndexType {
    pub fn suffix(&self) -> &'static str {
        match self {
            TableIndexType::Index => "",
            TableIndexType::Status => "S",
            TableIndexType::CurrentRow => "CR",
        }
    }
}

/// `T<id>[_<version>]<suffix>`
pub fn table_name(id: &IdAndVersion, kind: TableIndexType) -> String {
    match id.version {
        Some(v) => format!("{}{}_{}{}", TABLE_PREFIX, id.id, v, kind.suffix()),
        None => format!("{}{}{}", TABLE_PREFIX, id.id, kind.suffix()),
    }
}

pub fn index_table_name(id: &IdAndVersion) -> String {
    table_name(id, TableIndexType::Index)
}

/// `_C<id>_`
pub fn column_name(id: ColumnId) -> String {
    format!("{}{}{}", COLUMN_PREFIX, id, COLUMN_POSTFIX)
}

/// `_DBL_C<id>_`
pub fn double_shadow_name(id: ColumnId) -> String {
    format!("{}{}", DOUBLE_PREFIX, column_name(id))
}

/// `_C<id>_idx_`
pub fn index_name(id: ColumnId) -> String {
    format!("{}{}", column_name(id), INDEX_POSTFIX)
}

/// Table alias for the n-th table of a multi-table query.
pub fn table_alias(position: usize) -> String {
    format!("_A{}", position)
}

/// Name of the n-th bind parameter.
pub fn bind_name(sequence: usize) -> String {
    format!("b{}", sequence)
}

/// Recover the column id from `_C<id>_`.
pub fn parse_column_id(name: &str) -> Option<ColumnId> {
    COLUMN_NAME_RE
        .captures(name)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Every physical column a logical column occupies.
pub fn physical_names(model: &ColumnModel) -> Vec<String> {
    let mut names = vec![column_name(model.id)];
    if model.column_type == ColumnType::Double {
        names.push(double_shadow_name(model.id));
    }
    names
}

/// Canonical spelling of a reserved metadata column, matched case-insensitively.
pub fn reserved_column_name(name: &str) -> Option<&'static str> {
    RESERVED_COLUMN_NAMES
        .iter()
        .copied()
        .find(|reserved| reserved.eq_ignore_ascii_case(name))
}

pub fn is_reserved_column_name(name: &str) -> bool {
    reserved_column_name(name).is_some()
}
