//! Pending column and index change-sets.

use serde::Serialize;
use std::collections::HashSet;

use super::database_column::DatabaseColumnInfo;
use super::error::{SchemaError, SchemaResult};
use crate::model::ColumnModel;
use crate::sql::naming;

/// What a [`ColumnChangeDetails`] amounts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Add,
    Delete,
    Update,
    NoOp,
}

/// A single (old, new) column pair, consumed once to build DDL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnChangeDetails {
    pub old_column: Option<ColumnModel>,
    /// Live state of the old column, when it exists in the store.
    pub old_column_info: Option<DatabaseColumnInfo>,
    pub new_column: Option<ColumnModel>,
}

impl ColumnChangeDetails {
    pub fn new(old_column: Option<ColumnModel>, new_column: Option<ColumnModel>) -> SchemaResult<Self> {
        if old_column.is_none() && new_column.is_none() {
            return Err(SchemaError::EmptyChange);
        }
        Ok(Self {
            old_column,
            old_column_info: None,
            new_column,
        })
    }

    pub fn add(column: ColumnModel) -> Self {
        Self {
            old_column: None,
            old_column_info: None,
            new_column: Some(column),
        }
    }

    pub fn delete(column: ColumnModel) -> Self {
        Self {
            old_column: Some(column),
            old_column_info: None,
            new_column: None,
        }
    }

    pub fn with_old_column_info(mut self, info: DatabaseColumnInfo) -> Self {
        self.old_column_info = Some(info);
        self
    }

    pub fn kind(&self) -> ChangeKind {
        match (&self.old_column, &self.new_column) {
            (None, Some(_)) => ChangeKind::Add,
            (Some(_), None) => ChangeKind::Delete,
            (Some(old), Some(new)) if old == new => ChangeKind::NoOp,
            (Some(_), Some(_)) => ChangeKind::Update,
            // Rejected by the constructor.
            (None, None) => ChangeKind::NoOp,
        }
    }
}

/// Index rename from a stale name to the deterministic one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexRename {
    pub column: DatabaseColumnInfo,
    pub from: String,
    pub to: String,
}

/// Columns to add, remove or rename an index for. The sets are disjoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IndexChange {
    pub to_add: Vec<DatabaseColumnInfo>,
    pub to_remove: Vec<DatabaseColumnInfo>,
    pub to_rename: Vec<IndexRename>,
}

impl IndexChange {
    pub fn new(
        to_add: Vec<DatabaseColumnInfo>,
        to_remove: Vec<DatabaseColumnInfo>,
        to_rename: Vec<IndexRename>,
    ) -> SchemaResult<Self> {
        let mut seen = HashSet::new();
        let names = to_add
            .iter()
            .chain(to_remove.iter())
            .chain(to_rename.iter().map(|r| &r.column))
            .map(|c| c.column_name.as_str());
        for name in names {
            if !seen.insert(name) {
                return Err(SchemaError::OverlappingIndexChange(name.to_string()));
            }
        }
        Ok(Self {
            to_add,
            to_remove,
            to_rename,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_remove.is_empty() && self.to_rename.is_empty()
    }
}

// ============================================================================
// Name-set diff
// ============================================================================

/// Result of diffing existing physical names against a logical schema.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnDiff {
    /// Logical columns whose full definition must be added.
    pub to_add: Vec<ColumnModel>,
    /// Physical column names to drop.
    pub to_drop: Vec<String>,
}

impl ColumnDiff {
    pub fn is_no_op(&self) -> bool {
        self.to_add.is_empty() && self.to_drop.is_empty()
    }

    /// The physical name set after applying drops then adds.
    pub fn apply(&self, old_physical_names: &[String]) -> HashSet<String> {
        let mut names: HashSet<String> = old_physical_names
            .iter()
            .filter(|n| !naming::is_reserved_column_name(n))
            .cloned()
            .collect();
        for drop in &self.to_drop {
            names.remove(drop);
        }
        for add in &self.to_add {
            names.extend(naming::physical_names(add));
        }
        names
    }
}

/// Diff the physical names present in the store against a new schema.
///
/// Identity is the id-derived physical name only, so display-name changes
/// never produce DDL. A logical column with any physical name missing is
/// added whole; its names that are present are dropped first so the add
/// never collides with a leftover half of the column.
pub fn diff_columns(old_physical_names: &[String], new_schema: &[ColumnModel]) -> ColumnDiff {
    let mut remaining: Vec<&String> = old_physical_names
        .iter()
        .filter(|n| !naming::is_reserved_column_name(n))
        .collect();
    let mut to_add = Vec::new();
    for column in new_schema {
        let expected = naming::physical_names(column);
        let all_present = expected.iter().all(|name| remaining.contains(&name));
        if all_present {
            remaining.retain(|name| !expected.contains(name));
        } else {
            to_add.push(column.clone());
        }
    }
    let mut to_drop: Vec<String> = Vec::new();
    for name in remaining {
        if !to_drop.contains(name) {
            to_drop.push(name.clone());
        }
    }
    ColumnDiff { to_add, to_drop }
}
