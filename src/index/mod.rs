//! Index table lifecycle against a live store.
//!
//! - [`connection`] - the async seam to the store driver
//! - [`manager`] - create, introspect, alter and re-index tables
//! - [`optimize`] - choosing which columns get secondary indexes
//! - [`memory`] - a scripted connection for dry runs and tests

pub mod connection;
pub mod manager;
pub mod memory;
pub mod optimize;

pub use connection::{DbRow, DriverError, DriverResult, IndexConnection, TransactionMode};
pub use manager::TableIndexManager;
pub use memory::MemoryConnection;
pub use optimize::{calculate_index_optimization, is_indexable};
