//! Logical model: columns, table identities and row payloads.
//!
//! These types are owned by the caller (the schema registry and the row
//! change pipeline) and are read-only inputs to translation and DDL.

pub mod column;
pub mod ids;
pub mod row;

pub use column::{ColumnId, ColumnModel, ColumnType, FacetType};
pub use ids::{IdAndVersion, InvalidIdError, TableType};
pub use row::{Row, RowSet};
