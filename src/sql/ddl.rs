//! Table index DDL.
//!
//! Builders for CREATE, ALTER and DROP over the index, status and
//! current-row tables, plus the functions that derive them from a logical
//! schema or a set of column changes.
//!
//! # Examples
//!
//! ```
//! use quarry::model::{ColumnModel, ColumnType, IdAndVersion, TableType};
//! use quarry::sql::ddl::create_table_sql;
//!
//! let schema = vec![ColumnModel::new(1, "score", ColumnType::Integer)];
//! let sql = create_table_sql(&schema, &IdAndVersion::new(123), TableType::Table).unwrap();
//! assert!(sql.starts_with("CREATE TABLE IF NOT EXISTS T123 (ROW_ID BIGINT(20) NOT NULL"));
//! ```

use super::naming::{self, TableIndexType, ROW_BENEFACTOR, ROW_ETAG, ROW_ID, ROW_VERSION};
use super::token::{Token, TokenStream};
use crate::model::{ColumnModel, ColumnType, IdAndVersion, TableType};
use crate::schema::{diff_columns, ChangeKind, ColumnChangeDetails, DatabaseColumnInfo, IndexChange};
use crate::types::{ColumnTypeInfo, NonFiniteTag, TypeResult};

/// Physical type of every ROW_ID / ROW_VERSION style column.
pub const BIGINT_TYPE: &str = "BIGINT(20)";
/// Physical type of ROW_ETAG in views.
pub const ETAG_TYPE: &str = "VARCHAR(36)";
/// Physical type of the status table schema hash.
pub const SCHEMA_HASH_TYPE: &str = "CHAR(64)";
pub const SCHEMA_HASH_COLUMN: &str = "SCHEMA_HASH";
pub const SINGLE_KEY_COLUMN: &str = "single_key";

/// `ENUM('NaN','Infinity','-Infinity') DEFAULT NULL`
pub fn double_shadow_type() -> String {
    let tags: Vec<String> = NonFiniteTag::ALL
        .iter()
        .map(|t| format!("'{}'", t.as_str()))
        .collect();
    format!("ENUM({}) DEFAULT NULL", tags.join(","))
}

// ============================================================================
// CREATE TABLE
// ============================================================================

/// CREATE TABLE statement.
#[derive(Debug, Clone)]
#[must_use = "DDL statements have no effect until converted to SQL with to_sql()"]
pub struct CreateTable {
    pub if_not_exists: bool,
    pub name: String,
    pub columns: Vec<ColumnDef>,
    pub constraints: Vec<TableConstraint>,
}

impl CreateTable {
    /// Create a new CREATE TABLE statement.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            if_not_exists: false,
            name: name.into(),
            columns: Vec::new(),
            constraints: Vec::new(),
        }
    }

    /// Add IF NOT EXISTS clause.
    pub fn if_not_exists(mut self) -> Self {
        self.if_not_exists = true;
        self
    }

    /// Add a column.
    pub fn column(mut self, col: ColumnDef) -> Self {
        self.columns.push(col);
        self
    }

    /// Add multiple columns.
    pub fn columns(mut self, cols: impl IntoIterator<Item = ColumnDef>) -> Self {
        self.columns.extend(cols);
        self
    }

    /// Add a table constraint.
    pub fn constraint(mut self, constraint: TableConstraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    pub fn to_sql(&self) -> String {
        self.to_tokens().serialize()
    }

    /// Convert to token stream.
    pub fn to_tokens(&self) -> TokenStream {
        let mut ts = TokenStream::new();

        ts.push(Token::Create).space().push(Token::Table);
        if self.if_not_exists {
            ts.space()
                .push(Token::If)
                .space()
                .push(Token::Not)
                .space()
                .push(Token::Exists);
        }
        ts.space().ident(self.name.clone()).space().lparen();

        let parts: Vec<TokenStream> = self
            .columns
            .iter()
            .map(ColumnDef::to_tokens)
            .chain(self.constraints.iter().map(TableConstraint::to_tokens))
            .collect();
        ts.comma_separated(&parts);

        ts.rparen();
        ts
    }
}

// ============================================================================
// Column Definition
// ============================================================================

/// Column definition for CREATE TABLE and ALTER TABLE.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDef {
    pub name: String,
    /// Physical type syntax, including any charset and DEFAULT clause.
    pub data_type: String,
    pub not_null: bool,
    pub primary_key: bool,
}

impl ColumnDef {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            not_null: false,
            primary_key: false,
        }
    }

    pub fn not_null(mut self) -> Self {
        self.not_null = true;
        self
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    pub fn to_tokens(&self) -> TokenStream {
        let mut ts = TokenStream::new();
        ts.ident(self.name.clone())
            .space()
            .push(Token::Raw(self.data_type.clone()));
        if self.not_null {
            ts.space().push(Token::Not).space().push(Token::Null);
        }
        if self.primary_key {
            ts.space().push(Token::Primary).space().push(Token::Key);
        }
        ts
    }
}

/// Table-level constraints.
#[derive(Debug, Clone, PartialEq)]
pub enum TableConstraint {
    PrimaryKey(Vec<String>),
    Index(Vec<String>),
}

impl TableConstraint {
    pub fn to_tokens(&self) -> TokenStream {
        let (lead, columns) = match self {
            TableConstraint::PrimaryKey(columns) => {
                (vec![Token::Primary, Token::Space, Token::Key], columns)
            }
            TableConstraint::Index(columns) => (vec![Token::Index], columns),
        };
        let mut ts = TokenStream::new();
        ts.extend(lead).space().lparen();
        let names: Vec<TokenStream> = columns
            .iter()
            .map(|c| {
                let mut part = TokenStream::new();
                part.ident(c.clone());
                part
            })
            .collect();
        ts.comma_separated(&names).rparen();
        ts
    }
}

// ============================================================================
// ALTER TABLE
// ============================================================================

/// ALTER TABLE statement.
#[derive(Debug, Clone)]
#[must_use = "DDL statements have no effect until converted to SQL with to_sql()"]
pub struct AlterTable {
    pub name: String,
    pub actions: Vec<AlterAction>,
}

impl AlterTable {
    /// Create a new ALTER TABLE statement.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            actions: Vec::new(),
        }
    }

    pub fn action(mut self, action: AlterAction) -> Self {
        self.actions.push(action);
        self
    }

    pub fn actions(mut self, actions: impl IntoIterator<Item = AlterAction>) -> Self {
        self.actions.extend(actions);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// `None` when there is nothing to alter.
    pub fn to_sql(&self) -> Option<String> {
        if self.is_empty() {
            return None;
        }
        Some(self.to_tokens().serialize())
    }

    pub fn to_tokens(&self) -> TokenStream {
        let mut ts = TokenStream::new();

        ts.push(Token::Alter)
            .space()
            .push(Token::Table)
            .space()
            .ident(self.name.clone());

        let mut first = true;
        for action in &self.actions {
            if !first {
                ts.comma();
            }
            first = false;
            ts.space().append(&action.to_tokens());
        }

        ts
    }
}

/// ALTER TABLE actions.
#[derive(Debug, Clone, PartialEq)]
pub enum AlterAction {
    AddColumn(ColumnDef),
    ModifyColumn(ColumnDef),
    DropColumn { name: String },
    AddIndex(DatabaseColumnInfo),
    DropIndex { name: String },
    RenameIndex { from: String, to: String },
}

impl AlterAction {
    pub fn to_tokens(&self) -> TokenStream {
        let mut ts = TokenStream::new();

        match self {
            AlterAction::AddColumn(col) => {
                ts.push(Token::Add)
                    .space()
                    .push(Token::Column)
                    .space()
                    .append(&col.to_tokens());
            }
            AlterAction::ModifyColumn(col) => {
                ts.push(Token::Modify)
                    .space()
                    .push(Token::Column)
                    .space()
                    .append(&col.to_tokens());
            }
            AlterAction::DropColumn { name } => {
                ts.push(Token::Drop)
                    .space()
                    .push(Token::Column)
                    .space()
                    .ident(name.clone());
            }
            AlterAction::AddIndex(column) => {
                ts.push(Token::Add)
                    .space()
                    .push(Token::Index)
                    .space()
                    .append(&column.index_definition());
            }
            AlterAction::DropIndex { name } => {
                ts.push(Token::Drop)
                    .space()
                    .push(Token::Index)
                    .space()
                    .ident(name.clone());
            }
            AlterAction::RenameIndex { from, to } => {
                ts.push(Token::Rename)
                    .space()
                    .push(Token::Index)
                    .space()
                    .ident(from.clone())
                    .space()
                    .push(Token::To)
                    .space()
                    .ident(to.clone());
            }
        }

        ts
    }
}

// ============================================================================
// DROP TABLE
// ============================================================================

/// DROP TABLE statement.
#[derive(Debug, Clone)]
#[must_use = "DDL statements have no effect until converted to SQL with to_sql()"]
pub struct DropTable {
    pub if_exists: bool,
    pub name: String,
}

impl DropTable {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            if_exists: false,
            name: name.into(),
        }
    }

    pub fn if_exists(mut self) -> Self {
        self.if_exists = true;
        self
    }

    pub fn to_sql(&self) -> String {
        let mut ts = TokenStream::new();
        ts.push(Token::Drop).space().push(Token::Table);
        if self.if_exists {
            ts.space().push(Token::If).space().push(Token::Exists);
        }
        ts.space().ident(self.name.clone());
        ts.serialize()
    }
}

// ============================================================================
// Schema-driven DDL
// ============================================================================

/// Physical column definitions for one logical column (two for DOUBLE).
pub fn column_definitions(model: &ColumnModel) -> TypeResult<Vec<ColumnDef>> {
    let info = ColumnTypeInfo::for_type(model.column_type);
    let data_type = info.to_physical_type(model.max_size, model.default_value.as_deref())?;
    let mut defs = vec![ColumnDef::new(naming::column_name(model.id), data_type)];
    if model.column_type == ColumnType::Double {
        defs.push(ColumnDef::new(
            naming::double_shadow_name(model.id),
            double_shadow_type(),
        ));
    }
    Ok(defs)
}

fn metadata_columns(table_type: TableType) -> Vec<ColumnDef> {
    let mut columns = vec![
        ColumnDef::new(ROW_ID, BIGINT_TYPE).not_null(),
        ColumnDef::new(ROW_VERSION, BIGINT_TYPE).not_null(),
    ];
    if table_type.is_view() {
        columns.push(ColumnDef::new(ROW_ETAG, ETAG_TYPE).not_null());
        columns.push(ColumnDef::new(ROW_BENEFACTOR, BIGINT_TYPE).not_null());
    }
    columns
}

/// CREATE TABLE for the index table of `id` holding `schema`.
pub fn create_table(
    schema: &[ColumnModel],
    id: &IdAndVersion,
    table_type: TableType,
) -> TypeResult<CreateTable> {
    let mut table = CreateTable::new(naming::index_table_name(id))
        .if_not_exists()
        .columns(metadata_columns(table_type));
    for model in schema {
        table = table.columns(column_definitions(model)?);
    }
    Ok(table.constraint(TableConstraint::PrimaryKey(vec![ROW_ID.to_string()])))
}

pub fn create_table_sql(
    schema: &[ColumnModel],
    id: &IdAndVersion,
    table_type: TableType,
) -> TypeResult<String> {
    Ok(create_table(schema, id, table_type)?.to_sql())
}

/// Status table holding the indexed version and schema hash.
pub fn create_status_table_sql(id: &IdAndVersion) -> String {
    CreateTable::new(naming::table_name(id, TableIndexType::Status))
        .if_not_exists()
        .column(ColumnDef::new(SINGLE_KEY_COLUMN, "ENUM('')").not_null().primary_key())
        .column(ColumnDef::new(ROW_VERSION, BIGINT_TYPE).not_null())
        .column(ColumnDef::new(SCHEMA_HASH_COLUMN, SCHEMA_HASH_TYPE).not_null())
        .to_sql()
}

/// Current-row table mapping each row to its latest indexed version.
pub fn create_current_row_table_sql(id: &IdAndVersion) -> String {
    CreateTable::new(naming::table_name(id, TableIndexType::CurrentRow))
        .if_not_exists()
        .column(ColumnDef::new(ROW_ID, BIGINT_TYPE).not_null().primary_key())
        .column(ColumnDef::new(ROW_VERSION, BIGINT_TYPE).not_null())
        .constraint(TableConstraint::Index(vec![ROW_VERSION.to_string()]))
        .to_sql()
}

pub fn drop_table_sql(id: &IdAndVersion, kind: TableIndexType) -> String {
    DropTable::new(naming::table_name(id, kind))
        .if_exists()
        .to_sql()
}

/// ALTER for a name-set diff: drops first, then whole-column adds.
pub fn alter_table_for_diff(
    old_physical_names: &[String],
    new_schema: &[ColumnModel],
    id: &IdAndVersion,
) -> TypeResult<Option<String>> {
    let diff = diff_columns(old_physical_names, new_schema);
    let mut actions: Vec<AlterAction> = diff
        .to_drop
        .iter()
        .map(|name| AlterAction::DropColumn { name: name.clone() })
        .collect();
    for model in &diff.to_add {
        actions.extend(column_definitions(model)?.into_iter().map(AlterAction::AddColumn));
    }
    Ok(AlterTable::new(naming::index_table_name(id))
        .actions(actions)
        .to_sql())
}

/// CREATE when nothing exists yet, otherwise the ALTER for the diff.
pub fn create_or_alter_table_sql(
    old_physical_names: &[String],
    new_schema: &[ColumnModel],
    id: &IdAndVersion,
    table_type: TableType,
) -> TypeResult<Option<String>> {
    if old_physical_names.is_empty() {
        return create_table_sql(new_schema, id, table_type).map(Some);
    }
    alter_table_for_diff(old_physical_names, new_schema, id)
}

/// ALTER for explicit change details.
///
/// A delete only drops columns the store reported (`old_column_info`).
/// An update keeping the column id modifies it in place and adds or drops
/// the DOUBLE shadow as the type requires; an update across ids is a drop
/// plus an add.
pub fn alter_table_for_changes(
    changes: &[ColumnChangeDetails],
    id: &IdAndVersion,
) -> TypeResult<Option<String>> {
    let mut drops = Vec::new();
    let mut modifies = Vec::new();
    let mut adds = Vec::new();

    for change in changes {
        let exists = change.old_column_info.is_some();
        match (change.kind(), &change.old_column, &change.new_column) {
            (ChangeKind::NoOp, _, _) => {}
            (ChangeKind::Add, _, Some(new)) => {
                adds.extend(column_definitions(new)?);
            }
            (ChangeKind::Delete, Some(old), _) => {
                if exists {
                    drops.extend(naming::physical_names(old));
                }
            }
            (ChangeKind::Update, Some(old), Some(new)) if old.id == new.id && exists => {
                let mut defs = column_definitions(new)?.into_iter();
                if let Some(main) = defs.next() {
                    modifies.push(main);
                }
                let shadow = naming::double_shadow_name(old.id);
                let old_double = old.column_type == ColumnType::Double;
                let new_double = new.column_type == ColumnType::Double;
                if old_double && !new_double {
                    drops.push(shadow);
                } else if new_double && !old_double {
                    adds.extend(defs);
                }
            }
            (ChangeKind::Update, Some(old), Some(new)) => {
                if exists {
                    drops.extend(naming::physical_names(old));
                }
                adds.extend(column_definitions(new)?);
            }
            _ => {}
        }
    }

    let actions = drops
        .into_iter()
        .map(|name| AlterAction::DropColumn { name })
        .chain(modifies.into_iter().map(AlterAction::ModifyColumn))
        .chain(adds.into_iter().map(AlterAction::AddColumn));
    Ok(AlterTable::new(naming::index_table_name(id))
        .actions(actions)
        .to_sql())
}

/// ALTER applying an index change: drops, renames, then adds.
pub fn alter_index_sql(change: &IndexChange, id: &IdAndVersion) -> Option<String> {
    let drops = change.to_remove.iter().filter_map(|c| {
        c.index_name
            .clone()
            .map(|name| AlterAction::DropIndex { name })
    });
    let renames = change.to_rename.iter().map(|r| AlterAction::RenameIndex {
        from: r.from.clone(),
        to: r.to.clone(),
    });
    let adds = change.to_add.iter().cloned().map(AlterAction::AddIndex);
    AlterTable::new(naming::index_table_name(id))
        .actions(drops.chain(renames).chain(adds))
        .to_sql()
}

// ============================================================================
// Introspection
// ============================================================================

/// `SHOW COLUMNS FROM <table>`
pub fn show_columns_sql(table: &str) -> String {
    let mut ts = TokenStream::new();
    ts.push(Token::Show)
        .space()
        .push(Token::Columns)
        .space()
        .push(Token::From)
        .space()
        .ident(table);
    ts.serialize()
}

/// `SHOW INDEX FROM <table>`
pub fn show_index_sql(table: &str) -> String {
    let mut ts = TokenStream::new();
    ts.push(Token::Show)
        .space()
        .push(Token::Index)
        .space()
        .push(Token::From)
        .space()
        .ident(table);
    ts.serialize()
}

/// `SELECT COUNT(DISTINCT c) AS c, ... FROM <table>`, or `None` for no columns.
pub fn cardinality_sql(columns: &[DatabaseColumnInfo], table: &str) -> Option<String> {
    if columns.is_empty() {
        return None;
    }
    let parts: Vec<TokenStream> = columns
        .iter()
        .map(|c| {
            let mut ts = TokenStream::new();
            ts.push(Token::FunctionName("COUNT".into()))
                .lparen()
                .push(Token::Distinct)
                .space()
                .ident(c.column_name.clone())
                .rparen()
                .space()
                .push(Token::As)
                .space()
                .ident(c.column_name.clone());
            ts
        })
        .collect();
    let mut ts = TokenStream::new();
    ts.push(Token::Select)
        .space()
        .comma_separated(&parts)
        .space()
        .push(Token::From)
        .space()
        .ident(table);
    Some(ts.serialize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MySqlColumnType;

    fn id() -> IdAndVersion {
        IdAndVersion::new(123)
    }

    #[test]
    fn test_create_table_with_double() {
        let schema = vec![ColumnModel::new(1, "score", ColumnType::Double)];
        let sql = create_table_sql(&schema, &id(), TableType::Table).unwrap();
        insta::assert_snapshot!(sql, @"CREATE TABLE IF NOT EXISTS T123 (ROW_ID BIGINT(20) NOT NULL, ROW_VERSION BIGINT(20) NOT NULL, _C1_ DOUBLE DEFAULT NULL, _DBL_C1_ ENUM('NaN','Infinity','-Infinity') DEFAULT NULL, PRIMARY KEY (ROW_ID))");
    }

    #[test]
    fn test_create_view_table_has_etag() {
        let sql = create_table_sql(&[], &id(), TableType::EntityView).unwrap();
        assert!(sql.contains("ROW_ETAG VARCHAR(36) NOT NULL"));
        assert!(sql.contains("ROW_BENEFACTOR BIGINT(20) NOT NULL"));
    }

    #[test]
    fn test_create_status_table() {
        insta::assert_snapshot!(create_status_table_sql(&id()), @"CREATE TABLE IF NOT EXISTS T123S (single_key ENUM('') NOT NULL PRIMARY KEY, ROW_VERSION BIGINT(20) NOT NULL, SCHEMA_HASH CHAR(64) NOT NULL)");
    }

    #[test]
    fn test_create_current_row_table() {
        insta::assert_snapshot!(create_current_row_table_sql(&id()), @"CREATE TABLE IF NOT EXISTS T123CR (ROW_ID BIGINT(20) NOT NULL PRIMARY KEY, ROW_VERSION BIGINT(20) NOT NULL, INDEX (ROW_VERSION))");
    }

    #[test]
    fn test_drop_table() {
        assert_eq!(
            drop_table_sql(&IdAndVersion::versioned(5, 2), TableIndexType::Status),
            "DROP TABLE IF EXISTS T5_2S"
        );
    }

    #[test]
    fn test_alter_drops_before_adds() {
        let old = vec!["ROW_ID".to_string(), "_C1_".to_string()];
        let schema = vec![ColumnModel::new(2, "n", ColumnType::Integer)];
        let sql = alter_table_for_diff(&old, &schema, &id()).unwrap().unwrap();
        assert_eq!(
            sql,
            "ALTER TABLE T123 DROP COLUMN _C1_, ADD COLUMN _C2_ BIGINT(20) DEFAULT NULL"
        );
    }

    #[test]
    fn test_alter_no_op() {
        let old = vec!["_C2_".to_string()];
        let schema = vec![ColumnModel::new(2, "renamed", ColumnType::Integer)];
        assert_eq!(alter_table_for_diff(&old, &schema, &id()).unwrap(), None);
    }

    #[test]
    fn test_create_or_alter_creates_when_empty() {
        let schema = vec![ColumnModel::new(2, "n", ColumnType::Integer)];
        let sql = create_or_alter_table_sql(&[], &schema, &id(), TableType::Table)
            .unwrap()
            .unwrap();
        assert!(sql.starts_with("CREATE TABLE"));
    }

    #[test]
    fn test_alter_for_changes() {
        let old = ColumnModel::new(1, "a", ColumnType::Double);
        let new = ColumnModel::new(1, "a", ColumnType::Integer);
        let change = ColumnChangeDetails::new(Some(old), Some(new))
            .unwrap()
            .with_old_column_info(DatabaseColumnInfo::new("_C1_"));
        let sql = alter_table_for_changes(&[change], &id()).unwrap().unwrap();
        assert_eq!(
            sql,
            "ALTER TABLE T123 DROP COLUMN _DBL_C1_, MODIFY COLUMN _C1_ BIGINT(20) DEFAULT NULL"
        );
    }

    #[test]
    fn test_delete_without_live_column_is_skipped() {
        let change = ColumnChangeDetails::delete(ColumnModel::new(1, "a", ColumnType::Integer));
        assert_eq!(alter_table_for_changes(&[change], &id()).unwrap(), None);
    }

    #[test]
    fn test_alter_index_sql() {
        let add = DatabaseColumnInfo::new("_C1_").with_type(MySqlColumnType::MediumText, None);
        let remove = DatabaseColumnInfo::new("_C2_").with_index("_C2_idx_");
        let change = IndexChange::new(vec![add], vec![remove], vec![]).unwrap();
        assert_eq!(
            alter_index_sql(&change, &id()).unwrap(),
            "ALTER TABLE T123 DROP INDEX _C2_idx_, ADD INDEX _C1_idx_ (_C1_(255))"
        );
    }

    #[test]
    fn test_cardinality_sql() {
        let columns = vec![DatabaseColumnInfo::new("_C1_"), DatabaseColumnInfo::new("ROW_ID")];
        assert_eq!(
            cardinality_sql(&columns, "T123").unwrap(),
            "SELECT COUNT(DISTINCT _C1_) AS _C1_, COUNT(DISTINCT ROW_ID) AS ROW_ID FROM T123"
        );
        assert_eq!(cardinality_sql(&[], "T123"), None);
    }

    #[test]
    fn test_show_sql() {
        assert_eq!(show_columns_sql("T1"), "SHOW COLUMNS FROM T1");
        assert_eq!(show_index_sql("T1"), "SHOW INDEX FROM T1");
    }
}
