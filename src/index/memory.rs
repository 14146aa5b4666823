//! Scripted in-memory connection.
//!
//! Answers queries from canned results matched by statement prefix and
//! records every statement and transaction boundary it sees. Used by the
//! CLI dry runs and by tests.

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::connection::{DbRow, DriverError, DriverResult, IndexConnection, TransactionMode};
use crate::sql::dml::BindMap;

#[derive(Debug, Clone)]
enum Response {
    Rows(Vec<DbRow>),
    Fail(DriverError),
}

#[derive(Debug, Default)]
pub struct MemoryConnection {
    responses: Vec<(String, Response)>,
    log: Mutex<Vec<String>>,
}

impl MemoryConnection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer statements starting with `prefix` with `rows`.
    pub fn with_rows(mut self, prefix: impl Into<String>, rows: Vec<DbRow>) -> Self {
        self.responses.push((prefix.into(), Response::Rows(rows)));
        self
    }

    /// Fail statements starting with `prefix`.
    pub fn with_failure(mut self, prefix: impl Into<String>, err: DriverError) -> Self {
        self.responses.push((prefix.into(), Response::Fail(err)));
        self
    }

    /// Everything seen so far, in order.
    pub async fn statements(&self) -> Vec<String> {
        self.log.lock().await.clone()
    }

    async fn respond(&self, sql: &str) -> DriverResult<Vec<DbRow>> {
        self.log.lock().await.push(sql.to_string());
        match self.responses.iter().find(|(prefix, _)| sql.starts_with(prefix.as_str())) {
            Some((_, Response::Rows(rows))) => Ok(rows.clone()),
            Some((_, Response::Fail(err))) => Err(err.clone()),
            None => Ok(Vec::new()),
        }
    }
}

#[async_trait]
impl IndexConnection for MemoryConnection {
    async fn query(&self, sql: &str, _parameters: &BindMap) -> DriverResult<Vec<DbRow>> {
        self.respond(sql).await
    }

    async fn execute(&self, sql: &str, _parameters: &BindMap) -> DriverResult<u64> {
        self.respond(sql).await.map(|rows| rows.len() as u64)
    }

    async fn begin(&self, mode: TransactionMode) -> DriverResult<()> {
        self.log.lock().await.push(mode.begin_sql());
        Ok(())
    }

    async fn commit(&self) -> DriverResult<()> {
        self.log.lock().await.push("COMMIT".to_string());
        Ok(())
    }

    async fn rollback(&self) -> DriverResult<()> {
        self.log.lock().await.push("ROLLBACK".to_string());
        Ok(())
    }
}
