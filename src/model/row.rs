//! Row payloads written into a table index.

use serde::{Deserialize, Serialize};

use super::column::ColumnModel;
use super::ids::IdAndVersion;

/// One row of a change set. A row without values is a deletion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Row {
    pub row_id: i64,
    pub version_number: i64,
    #[serde(default)]
    pub values: Option<Vec<Option<String>>>,
}

impl Row {
    pub fn new(row_id: i64, version_number: i64, values: Vec<Option<String>>) -> Self {
        Self {
            row_id,
            version_number,
            values: Some(values),
        }
    }

    pub fn deleted(row_id: i64, version_number: i64) -> Self {
        Self {
            row_id,
            version_number,
            values: None,
        }
    }

    pub fn is_deleted(&self) -> bool {
        self.values.is_none()
    }
}

/// A batch of rows sharing one header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RowSet {
    pub table_id: IdAndVersion,
    pub headers: Vec<ColumnModel>,
    pub rows: Vec<Row>,
}
