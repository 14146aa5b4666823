//! Schema hashing for the status table.

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::model::{ColumnModel, ColumnType};

/// The parts of a column that shape its physical storage. Display names are
/// left out so a rename never changes the hash.
#[derive(Serialize)]
struct PhysicalShape<'a> {
    id: i64,
    column_type: ColumnType,
    max_size: Option<i64>,
    default_value: Option<&'a str>,
}

/// SHA256 over the ordered physical shape of a schema.
///
/// Returns a 64-character lowercase hexadecimal string.
pub fn schema_hash(schema: &[ColumnModel]) -> Result<String, serde_json::Error> {
    let shapes: Vec<PhysicalShape<'_>> = schema
        .iter()
        .map(|c| PhysicalShape {
            id: c.id,
            column_type: c.column_type,
            max_size: c.max_size,
            default_value: c.default_value.as_deref(),
        })
        .collect();
    let json = serde_json::to_string(&shapes)?;
    let mut hasher = Sha256::new();
    hasher.update(json.as_bytes());
    Ok(format!("{:x}", hasher.finalize()))
}
