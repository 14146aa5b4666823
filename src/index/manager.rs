//! Physical table lifecycle: create, introspect, alter, re-index.
//!
//! Callers must serialize schema changes per logical table. Two alters
//! computed from the same stale introspection will race.

use std::collections::HashMap;
use std::future::Future;
use tracing::{debug, info, warn};

use super::connection::{DbRow, DriverError, IndexConnection, TransactionMode};
use super::optimize::calculate_index_optimization;
use crate::error::{models_by_id, Error, ExecutionError, Result};
use crate::model::{ColumnId, ColumnModel, IdAndVersion, TableType};
use crate::query::TranslatedQuery;
use crate::schema::{ColumnChangeDetails, DatabaseColumnInfo, IndexChange};
use crate::sql::ddl;
use crate::sql::dml::BindMap;
use crate::sql::naming::{self, TableIndexType};
use crate::types::MySqlColumnType;

// SHOW COLUMNS / SHOW INDEX labels.
const FIELD: &str = "Field";
const TYPE: &str = "Type";
const KEY: &str = "Key";
const COLUMN_NAME: &str = "Column_name";
const KEY_NAME: &str = "Key_name";

/// Runs DDL and introspection for index tables over one connection.
#[derive(Debug)]
pub struct TableIndexManager<C> {
    connection: C,
}

impl<C: IndexConnection> TableIndexManager<C> {
    pub fn new(connection: C) -> Self {
        Self { connection }
    }

    pub fn connection(&self) -> &C {
        &self.connection
    }

    /// Run `work` inside a transaction, rolling back on failure.
    async fn in_transaction<T>(
        &self,
        mode: TransactionMode,
        work: impl Future<Output = Result<T>>,
    ) -> Result<T> {
        self.connection.begin(mode).await?;
        match work.await {
            Ok(value) => {
                self.connection.commit().await?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback) = self.connection.rollback().await {
                    warn!(error = %rollback, "rollback failed");
                }
                Err(err)
            }
        }
    }

    async fn execute(&self, sql: &str, models: &HashMap<ColumnId, ColumnModel>) -> Result<u64> {
        self.connection
            .execute(sql, &BindMap::new())
            .await
            .map_err(|err| ExecutionError::from_driver(err).scrub(models).into())
    }

    // ========================================================================
    // Tables
    // ========================================================================

    /// Create the index, status and current-row tables when missing.
    ///
    /// The index table starts with metadata columns only; schema columns
    /// arrive through [`alter_table_as_needed`](Self::alter_table_as_needed).
    pub async fn create_table_if_does_not_exist(
        &self,
        id: &IdAndVersion,
        table_type: TableType,
    ) -> Result<()> {
        let statements = [
            ddl::create_table_sql(&[], id, table_type)?,
            ddl::create_status_table_sql(id),
            ddl::create_current_row_table_sql(id),
        ];
        let none = HashMap::new();
        self.in_transaction(TransactionMode::ReadWrite, async {
            for sql in &statements {
                self.execute(sql, &none).await?;
            }
            Ok(())
        })
        .await?;
        info!(table = %id, "created index tables");
        Ok(())
    }

    /// Drop every physical table of `id`.
    pub async fn delete_table(&self, id: &IdAndVersion) -> Result<()> {
        let none = HashMap::new();
        self.in_transaction(TransactionMode::ReadWrite, async {
            for kind in [TableIndexType::Index, TableIndexType::Status, TableIndexType::CurrentRow] {
                self.execute(&ddl::drop_table_sql(id, kind), &none).await?;
            }
            Ok(())
        })
        .await?;
        info!(table = %id, "dropped index tables");
        Ok(())
    }

    // ========================================================================
    // Introspection
    // ========================================================================

    /// Physical columns of the index table with their index names.
    ///
    /// A table that does not exist yet has no columns.
    pub async fn get_database_info(&self, id: &IdAndVersion) -> Result<Vec<DatabaseColumnInfo>> {
        let table = naming::index_table_name(id);
        let show_columns = ddl::show_columns_sql(&table);
        let show_index = ddl::show_index_sql(&table);
        let none = BindMap::new();

        let result = self
            .in_transaction(TransactionMode::ReadOnly, async {
                let (columns, indexes) = futures::try_join!(
                    self.connection.query(&show_columns, &none),
                    self.connection.query(&show_index, &none),
                )?;
                Ok((columns, indexes))
            })
            .await;
        let (columns, indexes) = match result {
            Ok(rows) => rows,
            Err(Error::Execution(ExecutionError::Driver { code, message }))
                if DriverError::new(code, message.clone()).is_missing_table() =>
            {
                debug!(table = %table, "index table does not exist");
                return Ok(Vec::new());
            }
            Err(err) => return Err(err),
        };

        let mut infos: Vec<DatabaseColumnInfo> = columns.iter().filter_map(column_info).collect();
        for row in &indexes {
            let (Some(column), Some(key)) = (row.get_str(COLUMN_NAME), row.get_str(KEY_NAME)) else {
                continue;
            };
            if let Some(info) = infos.iter_mut().find(|i| i.column_name == column) {
                info.has_index = true;
                info.index_name = Some(key.to_string());
            }
        }
        debug!(table = %table, columns = infos.len(), "introspected table");
        Ok(infos)
    }

    /// Fill in the distinct-value count of each column.
    pub async fn provide_cardinality(
        &self,
        infos: &mut [DatabaseColumnInfo],
        id: &IdAndVersion,
    ) -> Result<()> {
        let table = naming::index_table_name(id);
        let Some(sql) = ddl::cardinality_sql(infos, &table) else {
            return Ok(());
        };
        let rows = self
            .in_transaction(TransactionMode::ReadOnly, async {
                Ok(self.connection.query(&sql, &BindMap::new()).await?)
            })
            .await?;
        if let Some(row) = rows.first() {
            for info in infos.iter_mut() {
                info.cardinality = row.get_i64(&info.column_name);
            }
        }
        Ok(())
    }

    // ========================================================================
    // Alteration
    // ========================================================================

    /// Apply column changes to the index table.
    ///
    /// Returns whether an ALTER ran. Driver messages come back with
    /// physical column names replaced by display names.
    pub async fn alter_table_as_needed(
        &self,
        id: &IdAndVersion,
        changes: Vec<ColumnChangeDetails>,
    ) -> Result<bool> {
        let current = self.get_database_info(id).await?;
        let changes: Vec<ColumnChangeDetails> = changes
            .into_iter()
            .map(|change| attach_old_info(change, &current))
            .collect();
        let Some(sql) = ddl::alter_table_for_changes(&changes, id)? else {
            debug!(table = %id, "no column changes");
            return Ok(false);
        };

        let models = models_by_id(
            changes
                .iter()
                .flat_map(|c| c.old_column.iter().chain(c.new_column.iter())),
        );
        info!(table = %id, sql = %sql, "altering table");
        self.in_transaction(TransactionMode::ReadWrite, async {
            self.execute(&sql, &models).await
        })
        .await?;
        Ok(true)
    }

    /// Apply an index change. Returns whether an ALTER ran.
    pub async fn alter_index(&self, id: &IdAndVersion, change: &IndexChange) -> Result<bool> {
        let Some(sql) = ddl::alter_index_sql(change, id) else {
            return Ok(false);
        };
        info!(
            table = %id,
            add = change.to_add.len(),
            remove = change.to_remove.len(),
            rename = change.to_rename.len(),
            "altering indexes"
        );
        let none = HashMap::new();
        self.in_transaction(TransactionMode::ReadWrite, async {
            self.execute(&sql, &none).await
        })
        .await?;
        Ok(true)
    }

    /// Re-balance indexes over `infos`, which must carry cardinalities.
    pub async fn optimize_table_indices(
        &self,
        infos: &[DatabaseColumnInfo],
        id: &IdAndVersion,
        max_indexes: usize,
    ) -> Result<bool> {
        let change = calculate_index_optimization(infos, max_indexes)?;
        if change.is_empty() {
            debug!(table = %id, "indexes already optimal");
            return Ok(false);
        }
        self.alter_index(id, &change).await
    }

    /// Introspect, measure, then re-balance indexes.
    pub async fn optimize_indices(&self, id: &IdAndVersion, max_indexes: usize) -> Result<bool> {
        let mut infos = self.get_database_info(id).await?;
        self.provide_cardinality(&mut infos, id).await?;
        self.optimize_table_indices(&infos, id, max_indexes).await
    }

    // ========================================================================
    // Reads
    // ========================================================================

    /// Run a translated query.
    ///
    /// A column the store does not know yet means a schema change is still
    /// being applied; that read returns no rows instead of failing.
    pub async fn query_rows(
        &self,
        query: &TranslatedQuery,
        schema: &[ColumnModel],
    ) -> Result<Vec<DbRow>> {
        let rows = self
            .in_transaction(TransactionMode::ReadOnly, async {
                Ok(self.connection.query(&query.sql, &query.parameters).await?)
            })
            .await;
        match rows {
            Err(Error::Execution(err)) => {
                let err = err.scrub(&models_by_id(schema));
                if err.is_schema_lag() {
                    warn!(error = %err, "schema not yet applied, returning no rows");
                    Ok(Vec::new())
                } else {
                    Err(err.into())
                }
            }
            other => other,
        }
    }
}

/// Parse one `SHOW COLUMNS` row.
fn column_info(row: &DbRow) -> Option<DatabaseColumnInfo> {
    let name = row.get_str(FIELD)?;
    let mut info = DatabaseColumnInfo::new(name);
    if let (Some(kind), size) = MySqlColumnType::parse_introspected(row.get_str(TYPE).unwrap_or_default()) {
        info = info.with_type(kind, size);
    }
    info.has_index = row.get_str(KEY).is_some_and(|key| !key.is_empty());
    Some(info)
}

/// Attach the live state of a change's old column, when it exists.
fn attach_old_info(change: ColumnChangeDetails, current: &[DatabaseColumnInfo]) -> ColumnChangeDetails {
    let found = change.old_column.as_ref().and_then(|old| {
        let name = naming::column_name(old.id);
        current.iter().find(|info| info.column_name == name).cloned()
    });
    match found {
        Some(info) => change.with_old_column_info(info),
        None => change,
    }
}
