//! Collaborators consulted during translation.
//!
//! The schema registry and the index description live outside this crate;
//! translation only sees them through these traits.

use std::collections::HashMap;

use crate::model::{ColumnId, ColumnModel, IdAndVersion, TableType};
use crate::sql::naming::{ROW_ETAG, ROW_ID, ROW_VERSION};

use super::error::{TranslationError, TranslationResult};

/// Where a translation is headed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SqlContext {
    /// Interactive single-table queries.
    #[default]
    Query,
    /// Building one index from others; joins are allowed.
    Build,
}

/// Read access to the logical schema registry.
pub trait SchemaProvider: Send + Sync {
    /// Ordered logical columns of a table.
    fn table_schema(&self, id: &IdAndVersion) -> TranslationResult<Vec<ColumnModel>>;

    /// A single logical column by id.
    fn column_model(&self, id: ColumnId) -> TranslationResult<ColumnModel>;
}

/// Schema registry backed by in-memory maps.
///
/// A versioned lookup falls back to the unversioned schema when no
/// snapshot schema was registered.
#[derive(Debug, Clone, Default)]
pub struct InMemorySchemaProvider {
    tables: HashMap<IdAndVersion, Vec<ColumnModel>>,
    columns: HashMap<ColumnId, ColumnModel>,
}

impl InMemorySchemaProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(mut self, id: IdAndVersion, schema: Vec<ColumnModel>) -> Self {
        self.add_table(id, schema);
        self
    }

    pub fn add_table(&mut self, id: IdAndVersion, schema: Vec<ColumnModel>) {
        for column in &schema {
            self.columns.insert(column.id, column.clone());
        }
        self.tables.insert(id, schema);
    }
}

impl SchemaProvider for InMemorySchemaProvider {
    fn table_schema(&self, id: &IdAndVersion) -> TranslationResult<Vec<ColumnModel>> {
        self.tables
            .get(id)
            .or_else(|| self.tables.get(&IdAndVersion::new(id.id)))
            .cloned()
            .ok_or_else(|| TranslationError::UnknownTable(id.to_string()))
    }

    fn column_model(&self, id: ColumnId) -> TranslationResult<ColumnModel> {
        self.columns
            .get(&id)
            .cloned()
            .ok_or_else(|| TranslationError::UnknownColumn(id.to_string()))
    }
}

// ============================================================================
// Index descriptions
// ============================================================================

/// What kind of index backs a table and which metadata it returns.
pub trait IndexDescription: Send + Sync {
    fn id(&self) -> &IdAndVersion;

    fn table_type(&self) -> TableType;

    /// Metadata columns appended to the physical select list.
    fn columns_to_add_to_select(
        &self,
        context: SqlContext,
        include_etag: bool,
        is_aggregate: bool,
    ) -> Vec<&'static str>;
}

/// A plain table, or a materialized view over tables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableIndexDescription {
    id: IdAndVersion,
    table_type: TableType,
}

impl TableIndexDescription {
    pub fn new(id: IdAndVersion) -> Self {
        Self {
            id,
            table_type: TableType::Table,
        }
    }

    pub fn materialized(id: IdAndVersion) -> Self {
        Self {
            id,
            table_type: TableType::MaterializedView,
        }
    }
}

impl IndexDescription for TableIndexDescription {
    fn id(&self) -> &IdAndVersion {
        &self.id
    }

    fn table_type(&self) -> TableType {
        self.table_type
    }

    fn columns_to_add_to_select(
        &self,
        context: SqlContext,
        _include_etag: bool,
        is_aggregate: bool,
    ) -> Vec<&'static str> {
        if context == SqlContext::Build || is_aggregate {
            return Vec::new();
        }
        vec![ROW_ID, ROW_VERSION]
    }
}

/// Entity and submission views, which also carry an etag per row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewIndexDescription {
    id: IdAndVersion,
    table_type: TableType,
}

impl ViewIndexDescription {
    pub fn new(id: IdAndVersion, table_type: TableType) -> Self {
        Self { id, table_type }
    }
}

impl IndexDescription for ViewIndexDescription {
    fn id(&self) -> &IdAndVersion {
        &self.id
    }

    fn table_type(&self) -> TableType {
        self.table_type
    }

    fn columns_to_add_to_select(
        &self,
        context: SqlContext,
        include_etag: bool,
        is_aggregate: bool,
    ) -> Vec<&'static str> {
        if context == SqlContext::Build || is_aggregate {
            return Vec::new();
        }
        let mut columns = vec![ROW_ID, ROW_VERSION];
        if include_etag {
            columns.push(ROW_ETAG);
        }
        columns
    }
}

/// Description matching a table type.
pub fn index_description(id: IdAndVersion, table_type: TableType) -> Box<dyn IndexDescription> {
    match table_type {
        TableType::Table => Box::new(TableIndexDescription::new(id)),
        TableType::MaterializedView => Box::new(TableIndexDescription::materialized(id)),
        TableType::EntityView | TableType::SubmissionView => {
            Box::new(ViewIndexDescription::new(id, table_type))
        }
    }
}
