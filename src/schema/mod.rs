//! Schema model: physical column descriptors and pending change-sets.
//!
//! Everything here is ephemeral. Descriptors come from live introspection,
//! change-sets are consumed once by the DDL generator.

pub mod change;
pub mod database_column;
pub mod error;
pub mod hash;

pub use change::{diff_columns, ChangeKind, ColumnChangeDetails, ColumnDiff, IndexChange, IndexRename};
pub use database_column::{DatabaseColumnInfo, MAX_MYSQL_VARCHAR_INDEX_LENGTH};
pub use error::{SchemaError, SchemaResult};
pub use hash::schema_hash;
