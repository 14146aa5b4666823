//! # quarry
//!
//! Translates table queries written against logical column names into
//! parameter-bound MySQL over deterministically named physical tables, and
//! manages the lifecycle of those tables.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │       Query text + request (filters, facets, paging)     │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [query::parser]
//! ┌─────────────────────────────────────────────────────────┐
//! │                  QuerySpecification                      │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [query::edit, query::mapper]
//! ┌─────────────────────────────────────────────────────────┐
//! │    Edited tree + table/column mapping (schema lookup)    │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [query::translator]
//! ┌─────────────────────────────────────────────────────────┐
//! │     TranslatedQuery: SQL with :bN binds + bind map       │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! Alongside translation:
//!
//! - [`types`] maps logical column types to physical storage
//! - [`sql`] renders DDL and DML with the deterministic naming scheme
//! - [`schema`] diffs live columns against logical schemas
//! - [`index`] creates, alters and re-indexes tables over an async connection
//! - [`error`] classifies failures and scrubs physical names from driver text

pub mod config;
pub mod error;
pub mod index;
pub mod model;
pub mod query;
pub mod schema;
pub mod sql;
pub mod types;

pub use error::{Error, ErrorKind, ExecutionError, Result};

// Re-export SQL submodules at crate level
pub use sql::ddl;
pub use sql::dml;
pub use sql::token;
