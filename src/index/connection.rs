//! Connection seam to the relational store.
//!
//! The crate never opens connections itself. Callers hand a
//! [`IndexConnection`] to [`TableIndexManager`](super::TableIndexManager);
//! the store client owns pooling, timeouts and cancellation.

use async_trait::async_trait;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

use crate::sql::dml::BindMap;
use crate::types::DbValue;

/// MySQL `ER_NO_SUCH_TABLE`.
pub const NO_SUCH_TABLE_CODE: u16 = 1146;

/// Result type for driver calls.
pub type DriverResult<T> = Result<T, DriverError>;

/// Failure reported by the store driver, before classification.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct DriverError {
    /// Vendor error code, when the driver exposes one.
    pub code: Option<u16>,
    pub message: String,
}

impl DriverError {
    pub fn new(code: Option<u16>, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Introspecting a table that was never created.
    pub fn is_missing_table(&self) -> bool {
        self.code == Some(NO_SUCH_TABLE_CODE) || self.message.contains("doesn't exist")
    }
}

/// One result row keyed by column label.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DbRow {
    values: BTreeMap<String, DbValue>,
}

impl DbRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, label: impl Into<String>, value: DbValue) -> Self {
        self.values.insert(label.into(), value);
        self
    }

    pub fn get(&self, label: &str) -> Option<&DbValue> {
        self.values.get(label)
    }

    pub fn get_str(&self, label: &str) -> Option<&str> {
        match self.values.get(label) {
            Some(DbValue::Text(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Integer value, accepting numeric text as some drivers return it.
    pub fn get_i64(&self, label: &str) -> Option<i64> {
        match self.values.get(label) {
            Some(DbValue::Long(n)) => Some(*n),
            Some(DbValue::Text(s)) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }
}

impl<K: Into<String>> FromIterator<(K, DbValue)> for DbRow {
    fn from_iter<I: IntoIterator<Item = (K, DbValue)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

/// Access mode of a transaction. Both run at READ COMMITTED.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionMode {
    ReadOnly,
    ReadWrite,
}

impl TransactionMode {
    pub const ISOLATION: &'static str = "READ COMMITTED";

    /// Statement that opens a transaction in this mode.
    pub fn begin_sql(&self) -> String {
        let access = match self {
            TransactionMode::ReadOnly => "READ ONLY",
            TransactionMode::ReadWrite => "READ WRITE",
        };
        format!("START TRANSACTION {}", access)
    }
}

impl fmt::Display for TransactionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionMode::ReadOnly => f.write_str("read-only"),
            TransactionMode::ReadWrite => f.write_str("read-write"),
        }
    }
}

/// A single connection to the store.
///
/// Implementations must be usable from any task. The manager drives one
/// transaction at a time per connection.
#[async_trait]
pub trait IndexConnection: Send + Sync {
    /// Run a statement that returns rows.
    async fn query(&self, sql: &str, parameters: &BindMap) -> DriverResult<Vec<DbRow>>;

    /// Run a statement and return the affected row count.
    async fn execute(&self, sql: &str, parameters: &BindMap) -> DriverResult<u64>;

    /// Open a READ COMMITTED transaction.
    async fn begin(&self, mode: TransactionMode) -> DriverResult<()>;

    async fn commit(&self) -> DriverResult<()>;

    async fn rollback(&self) -> DriverResult<()>;
}
