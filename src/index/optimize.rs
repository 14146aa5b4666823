//! Index selection under a per-table budget.

use std::cmp::Reverse;

use crate::schema::{DatabaseColumnInfo, IndexChange, IndexRename, SchemaError, SchemaResult};

/// Whether a physical column may carry a secondary index.
///
/// Metadata columns are covered by the primary key and the DOUBLE shadow
/// columns are never filtered on directly.
pub fn is_indexable(info: &DatabaseColumnInfo) -> bool {
    !info.is_metadata() && info.column_id().is_some()
}

/// Work out which indexes to add, drop or rename.
///
/// The primary key occupies one of `max_indexes`. The remaining slots go to
/// the columns with the highest cardinality; ties keep their input order.
/// Every candidate column must have a measured cardinality.
pub fn calculate_index_optimization(
    infos: &[DatabaseColumnInfo],
    max_indexes: usize,
) -> SchemaResult<IndexChange> {
    let mut candidates: Vec<&DatabaseColumnInfo> = infos.iter().filter(|c| is_indexable(c)).collect();
    if let Some(missing) = candidates.iter().find(|c| c.cardinality.is_none()) {
        return Err(SchemaError::MissingCardinality(missing.column_name.clone()));
    }
    candidates.sort_by_key(|c| Reverse(c.cardinality));

    let slots = max_indexes.saturating_sub(1);
    let mut to_add = Vec::new();
    let mut to_remove = Vec::new();
    let mut to_rename = Vec::new();
    for (rank, info) in candidates.into_iter().enumerate() {
        let keep = rank < slots;
        match (keep, info.has_index) {
            (true, false) => to_add.push(info.clone()),
            (false, true) => to_remove.push(info.clone()),
            (true, true) => {
                let expected = info.expected_index_name();
                if let Some(current) = info.index_name.as_deref().filter(|n| *n != expected) {
                    to_rename.push(IndexRename {
                        column: info.clone(),
                        from: current.to_string(),
                        to: expected,
                    });
                }
            }
            (false, false) => {}
        }
    }
    IndexChange::new(to_add, to_remove, to_rename)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql::naming::{ROW_ID, ROW_VERSION};

    /// ROW_ID and ROW_VERSION plus `count` columns of descending cardinality.
    fn infos(count: i64) -> Vec<DatabaseColumnInfo> {
        let mut list = vec![
            DatabaseColumnInfo::new(ROW_ID)
                .with_cardinality(count)
                .with_index("PRIMARY"),
            DatabaseColumnInfo::new(ROW_VERSION).with_cardinality(1),
        ];
        for i in 0..count {
            list.push(DatabaseColumnInfo::new(format!("_C{}_", i)).with_cardinality(count - i));
        }
        list
    }

    fn names(columns: &[DatabaseColumnInfo]) -> Vec<&str> {
        columns.iter().map(|c| c.column_name.as_str()).collect()
    }

    #[test]
    fn test_primary_key_uses_a_slot() {
        let change = calculate_index_optimization(&infos(2), 1).unwrap();
        assert!(change.is_empty());
    }

    #[test]
    fn test_under_budget_adds_all() {
        let change = calculate_index_optimization(&infos(2), 10_000).unwrap();
        assert_eq!(names(&change.to_add), vec!["_C0_", "_C1_"]);
        assert!(change.to_remove.is_empty());
        assert!(change.to_rename.is_empty());
    }

    #[test]
    fn test_wrong_name_is_renamed() {
        let mut list = infos(1);
        list[2] = list[2].clone().with_index("wrongName");
        let change = calculate_index_optimization(&list, 10_000).unwrap();
        assert!(change.to_add.is_empty());
        assert_eq!(change.to_rename.len(), 1);
        assert_eq!(change.to_rename[0].from, "wrongName");
        assert_eq!(change.to_rename[0].to, "_C0_idx_");

        list[2] = list[2].clone().with_index("_C0_idx_");
        assert!(calculate_index_optimization(&list, 10_000).unwrap().is_empty());
    }

    #[test]
    fn test_over_budget_drops() {
        let mut list = infos(1);
        list[2] = list[2].clone().with_index("_C0_idx_");
        let change = calculate_index_optimization(&list, 1).unwrap();
        assert_eq!(names(&change.to_remove), vec!["_C0_"]);
        assert!(change.to_add.is_empty());
    }

    #[test]
    fn test_high_cardinality_replaces_low() {
        let mut list = infos(3);
        list[2] = DatabaseColumnInfo::new("_C0_")
            .with_cardinality(1)
            .with_index("_C0_idx_");
        list[3] = DatabaseColumnInfo::new("_C1_")
            .with_cardinality(3)
            .with_index("wrongName");
        list[4] = DatabaseColumnInfo::new("_C2_").with_cardinality(2);

        let change = calculate_index_optimization(&list, 3).unwrap();
        assert_eq!(names(&change.to_add), vec!["_C2_"]);
        assert_eq!(names(&change.to_remove), vec!["_C0_"]);
        assert_eq!(change.to_rename.len(), 1);
        assert_eq!(change.to_rename[0].column.column_name, "_C1_");
    }

    #[test]
    fn test_shadow_columns_are_skipped() {
        let list = vec![
            DatabaseColumnInfo::new("_C1_").with_cardinality(5),
            DatabaseColumnInfo::new("_DBL_C1_").with_cardinality(9),
        ];
        let change = calculate_index_optimization(&list, 10).unwrap();
        assert_eq!(names(&change.to_add), vec!["_C1_"]);
    }

    #[test]
    fn test_missing_cardinality() {
        let list = vec![DatabaseColumnInfo::new("_C1_")];
        assert_eq!(
            calculate_index_optimization(&list, 10),
            Err(SchemaError::MissingCardinality("_C1_".into()))
        );
    }
}
