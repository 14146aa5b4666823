//! DML (Data Manipulation Language) support.
//!
//! Row writes against an index table are always bound: the statement text
//! depends only on the table schema, and each row contributes one bind map
//! covering every schema column.
//!
//! ```text
//! INSERT INTO T123 (ROW_ID, ROW_VERSION, _C1_) VALUES (:bRI, :bRV, :_C1_)
//!     ON DUPLICATE KEY UPDATE ROW_VERSION = VALUES(ROW_VERSION), _C1_ = VALUES(_C1_)
//! DELETE FROM T123 WHERE ROW_ID IN ( :bRI )
//! ```

use std::collections::BTreeMap;

use super::ddl::{SCHEMA_HASH_COLUMN, SINGLE_KEY_COLUMN};
use super::naming::{self, TableIndexType, ROW_ID, ROW_ID_BIND, ROW_VERSION, ROW_VERSION_BIND};
use super::token::{Token, TokenStream};
use crate::model::{ColumnModel, ColumnType, IdAndVersion, RowSet};
use crate::types::{encode_double, ColumnTypeInfo, DbValue, TypeError, TypeResult};

/// Bind name of the schema hash in the status upsert.
pub const SCHEMA_HASH_BIND: &str = "bSH";

/// Named bind values for one statement execution.
pub type BindMap = BTreeMap<String, DbValue>;

// ============================================================================
// INSERT
// ============================================================================

/// INSERT / REPLACE statement with one VALUES tuple.
#[derive(Debug, Clone)]
#[must_use = "DML statements have no effect until converted to SQL with to_sql()"]
pub struct Insert {
    pub table: String,
    pub replace: bool,
    pub columns: Vec<String>,
    pub values: Vec<Token>,
    /// Columns refreshed by `ON DUPLICATE KEY UPDATE`.
    pub on_duplicate_update: Vec<String>,
}

impl Insert {
    /// Create a new INSERT statement.
    pub fn into(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            replace: false,
            columns: Vec::new(),
            values: Vec::new(),
            on_duplicate_update: Vec::new(),
        }
    }

    /// REPLACE INTO rather than INSERT INTO.
    pub fn replace(mut self) -> Self {
        self.replace = true;
        self
    }

    /// Add a column and its value token.
    pub fn value(mut self, column: impl Into<String>, value: Token) -> Self {
        self.columns.push(column.into());
        self.values.push(value);
        self
    }

    /// Add a column bound by name.
    pub fn bind(self, column: impl Into<String>, bind: impl Into<String>) -> Self {
        let bind = Token::Bind(bind.into());
        self.value(column, bind)
    }

    /// Refresh these columns on a primary key collision.
    pub fn on_duplicate_key_update(
        mut self,
        columns: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.on_duplicate_update = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn to_sql(&self) -> String {
        self.to_tokens().serialize()
    }

    pub fn to_tokens(&self) -> TokenStream {
        let mut ts = TokenStream::new();

        let verb = if self.replace {
            Token::Replace
        } else {
            Token::Insert
        };
        ts.push(verb)
            .space()
            .push(Token::Into)
            .space()
            .ident(self.table.clone())
            .space()
            .lparen();
        for (i, col) in self.columns.iter().enumerate() {
            if i > 0 {
                ts.comma().space();
            }
            ts.ident(col.clone());
        }
        ts.rparen().space().push(Token::Values).space().lparen();
        for (i, value) in self.values.iter().enumerate() {
            if i > 0 {
                ts.comma().space();
            }
            ts.push(value.clone());
        }
        ts.rparen();

        if !self.on_duplicate_update.is_empty() {
            ts.space()
                .push(Token::On)
                .space()
                .push(Token::Duplicate)
                .space()
                .push(Token::Key)
                .space()
                .push(Token::Update);
            for (i, col) in self.on_duplicate_update.iter().enumerate() {
                if i > 0 {
                    ts.comma();
                }
                ts.space()
                    .ident(col.clone())
                    .space()
                    .push(Token::Eq)
                    .space()
                    .push(Token::Values)
                    .lparen()
                    .ident(col.clone())
                    .rparen();
            }
        }

        ts
    }
}

// ============================================================================
// DELETE
// ============================================================================

/// `DELETE FROM <table> WHERE <column> IN ( :<bind> )`
#[derive(Debug, Clone)]
#[must_use = "DML statements have no effect until converted to SQL with to_sql()"]
pub struct Delete {
    pub table: String,
    pub column: String,
    pub bind: String,
}

impl Delete {
    pub fn from(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            column: ROW_ID.to_string(),
            bind: ROW_ID_BIND.to_string(),
        }
    }

    pub fn to_sql(&self) -> String {
        let mut ts = TokenStream::new();
        ts.push(Token::Delete)
            .space()
            .push(Token::From)
            .space()
            .ident(self.table.clone())
            .space()
            .push(Token::Where)
            .space()
            .ident(self.column.clone())
            .space()
            .push(Token::In)
            .space()
            .lparen()
            .space()
            .push(Token::Bind(self.bind.clone()))
            .space()
            .rparen();
        ts.serialize()
    }
}

// ============================================================================
// Row statements
// ============================================================================

/// Upsert writing every column of `schema`.
///
/// Columns a row set leaves out are bound to their default, so an update
/// never keeps a stale value.
pub fn upsert_rows_sql(schema: &[ColumnModel], id: &IdAndVersion) -> String {
    let physical: Vec<String> = schema.iter().flat_map(naming::physical_names).collect();
    let mut insert = Insert::into(naming::index_table_name(id))
        .bind(ROW_ID, ROW_ID_BIND)
        .bind(ROW_VERSION, ROW_VERSION_BIND);
    for name in &physical {
        insert = insert.bind(name.clone(), name.clone());
    }
    let mut refreshed = vec![ROW_VERSION.to_string()];
    refreshed.extend(physical);
    insert.on_duplicate_key_update(refreshed).to_sql()
}

pub fn delete_rows_sql(id: &IdAndVersion) -> String {
    Delete::from(naming::index_table_name(id)).to_sql()
}

/// `REPLACE INTO T<id>S (...) VALUES ('', :bRV, :bSH)`
pub fn upsert_status_sql(id: &IdAndVersion) -> String {
    Insert::into(naming::table_name(id, TableIndexType::Status))
        .replace()
        .value(SINGLE_KEY_COLUMN, Token::LitString(String::new()))
        .bind(ROW_VERSION, ROW_VERSION_BIND)
        .bind(SCHEMA_HASH_COLUMN, SCHEMA_HASH_BIND)
        .to_sql()
}

pub fn status_binds(version: i64, schema_hash: &str) -> BindMap {
    BindMap::from([
        (ROW_VERSION_BIND.to_string(), DbValue::Long(version)),
        (
            SCHEMA_HASH_BIND.to_string(),
            DbValue::Text(schema_hash.to_string()),
        ),
    ])
}

/// Bind maps for a row set, split into upserts and deletions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowBinds {
    pub upserts: Vec<BindMap>,
    pub deleted_row_ids: Vec<i64>,
}

impl RowBinds {
    /// Single bind map for [`delete_rows_sql`], `None` when nothing is deleted.
    pub fn delete_binds(&self) -> Option<BindMap> {
        if self.deleted_row_ids.is_empty() {
            return None;
        }
        Some(BindMap::from([(
            ROW_ID_BIND.to_string(),
            DbValue::LongList(self.deleted_row_ids.clone()),
        )]))
    }
}

/// Convert every row through its column's write parser.
///
/// Binds cover the whole table `schema`. A schema column missing from the
/// row set's headers takes its parsed default, or NULL without one.
/// Header columns outside the schema are ignored.
pub fn row_binds(row_set: &RowSet, schema: &[ColumnModel]) -> TypeResult<RowBinds> {
    let mut binds = RowBinds::default();
    let positions: Vec<Option<usize>> = schema
        .iter()
        .map(|model| row_set.headers.iter().position(|h| h.id == model.id))
        .collect();

    for row in &row_set.rows {
        let Some(values) = &row.values else {
            binds.deleted_row_ids.push(row.row_id);
            continue;
        };
        if values.len() != row_set.headers.len() {
            return Err(TypeError::RowWidth {
                row_id: row.row_id,
                expected: row_set.headers.len(),
                actual: values.len(),
            });
        }

        let mut map = BindMap::new();
        map.insert(ROW_ID_BIND.to_string(), DbValue::Long(row.row_id));
        map.insert(ROW_VERSION_BIND.to_string(), DbValue::Long(row.version_number));
        for (model, position) in schema.iter().zip(&positions) {
            let text = match position {
                Some(i) => values.get(*i).and_then(|v| v.as_deref()),
                None => model.default_value.as_deref(),
            };
            bind_column(&mut map, model, text)?;
        }
        binds.upserts.push(map);
    }
    Ok(binds)
}

/// Parse `text` for `model` and bind it, splitting doubles into value and
/// shadow tag.
fn bind_column(map: &mut BindMap, model: &ColumnModel, text: Option<&str>) -> TypeResult<()> {
    let parsed = match text {
        Some(text) => ColumnTypeInfo::for_type(model.column_type).parse_for_write(text, model.max_size)?,
        None => DbValue::Null,
    };
    let column = naming::column_name(model.id);
    if model.column_type == ColumnType::Double {
        let (stored, tag) = match parsed {
            DbValue::Double(d) => encode_double(d),
            other => (other, None),
        };
        let shadow = tag
            .map(|t| DbValue::Text(t.as_str().to_string()))
            .unwrap_or(DbValue::Null);
        map.insert(column, stored);
        map.insert(naming::double_shadow_name(model.id), shadow);
    } else {
        map.insert(column, parsed);
    }
    Ok(())
}
