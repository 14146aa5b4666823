use quarry::model::{ColumnModel, ColumnType};
use quarry::schema::{
    diff_columns, schema_hash, ChangeKind, ColumnChangeDetails, DatabaseColumnInfo, IndexChange,
    SchemaError,
};
use std::collections::HashSet;

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

#[test]
fn test_identical_schema_is_no_op() {
    let schema = vec![
        ColumnModel::new(1, "score", ColumnType::Double),
        ColumnModel::new(2, "name", ColumnType::String).with_max_size(10),
    ];
    let old = names(&["ROW_ID", "ROW_VERSION", "_C1_", "_DBL_C1_", "_C2_"]);
    assert!(diff_columns(&old, &schema).is_no_op());
}

#[test]
fn test_rename_is_invisible() {
    let old = names(&["_C4_"]);
    let schema = vec![ColumnModel::new(4, "renamed", ColumnType::Integer)];
    assert!(diff_columns(&old, &schema).is_no_op());
}

#[test]
fn test_id_change_is_add_and_drop() {
    let old = names(&["ROW_ID", "_C1_"]);
    let schema = vec![ColumnModel::new(2, "same name", ColumnType::Integer)];
    let diff = diff_columns(&old, &schema);
    assert_eq!(diff.to_drop, names(&["_C1_"]));
    assert_eq!(diff.to_add, schema);
}

#[test]
fn test_half_present_double_is_added_whole() {
    let old = names(&["_C1_"]);
    let schema = vec![ColumnModel::new(1, "score", ColumnType::Double)];
    let diff = diff_columns(&old, &schema);
    assert_eq!(diff.to_add.len(), 1);
    assert_eq!(diff.to_drop, names(&["_C1_"]));

    let applied = diff.apply(&old);
    let expected: HashSet<String> = names(&["_C1_", "_DBL_C1_"]).into_iter().collect();
    assert_eq!(applied, expected);
}

#[test]
fn test_reserved_names_never_dropped() {
    let old = names(&["ROW_ID", "ROW_VERSION", "ROW_ETAG", "ROW_BENEFACTOR"]);
    assert!(diff_columns(&old, &[]).is_no_op());
}

#[test]
fn test_change_kinds() {
    let a = ColumnModel::new(1, "a", ColumnType::Integer);
    assert_eq!(ColumnChangeDetails::add(a.clone()).kind(), ChangeKind::Add);
    assert_eq!(ColumnChangeDetails::delete(a.clone()).kind(), ChangeKind::Delete);
    assert_eq!(
        ColumnChangeDetails::new(Some(a.clone()), Some(a.clone())).unwrap().kind(),
        ChangeKind::NoOp
    );
    assert_eq!(
        ColumnChangeDetails::new(Some(a.clone()), Some(a.clone().with_max_size(3)))
            .unwrap()
            .kind(),
        ChangeKind::Update
    );
    assert_eq!(ColumnChangeDetails::new(None, None), Err(SchemaError::EmptyChange));
}

#[test]
fn test_index_change_sets_are_disjoint() {
    let c1 = DatabaseColumnInfo::new("_C1_");
    let result = IndexChange::new(vec![c1.clone()], vec![c1], vec![]);
    assert_eq!(result, Err(SchemaError::OverlappingIndexChange("_C1_".into())));

    let ok = IndexChange::new(vec![DatabaseColumnInfo::new("_C1_")], vec![], vec![]).unwrap();
    assert!(!ok.is_empty());
    assert!(IndexChange::default().is_empty());
}

#[test]
fn test_schema_hash_tracks_physical_shape() {
    let base = vec![ColumnModel::new(1, "score", ColumnType::Double)];
    let renamed = vec![ColumnModel::new(1, "points", ColumnType::Double)];
    let retyped = vec![ColumnModel::new(1, "score", ColumnType::Integer)];

    let hash = schema_hash(&base).unwrap();
    assert_eq!(hash, schema_hash(&renamed).unwrap());
    assert_ne!(hash, schema_hash(&retyped).unwrap());
    assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
}

#[test]
fn test_cardinality_comparison() {
    let low = DatabaseColumnInfo::new("_C1_").with_cardinality(2);
    let high = DatabaseColumnInfo::new("_C2_").with_cardinality(9);
    assert_eq!(low.compare_cardinality(&high), Ok(std::cmp::Ordering::Less));
    assert_eq!(
        low.compare_cardinality(&DatabaseColumnInfo::new("_C3_")),
        Err(SchemaError::MissingCardinality("_C3_".into()))
    );
}
