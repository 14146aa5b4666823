//! Type system: logical column types mapped onto physical storage.
//!
//! - [`column_type`] - the closed logical-to-physical mapping and DDL type syntax
//! - [`value`] - bind values, value parsers and the non-finite double encoding

pub mod column_type;
pub mod error;
pub mod value;

pub use column_type::{max_size_for_type, ColumnTypeInfo, MySqlColumnType, ValueParser};
pub use error::{TypeError, TypeResult};
pub use value::{decode_double, encode_double, DbValue, NonFiniteTag};
