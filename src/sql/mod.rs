//! SQL generation module.
//!
//! Everything the crate sends to the table index store is built here or
//! from these tokens:
//!
//! - [`naming`] - deterministic physical table, column and bind names
//! - [`ddl`] - CREATE, ALTER and DROP for index, status and current-row tables
//! - [`dml`] - bound row upserts, deletes and the status upsert
//! - [`token`] - token types for SQL generation

pub mod ddl;
pub mod dml;
pub mod naming;
pub mod token;

pub use token::{Token, TokenStream};

pub use ddl::{AlterAction, AlterTable, ColumnDef, CreateTable, DropTable, TableConstraint};

pub use dml::{BindMap, Delete, Insert, RowBinds};
