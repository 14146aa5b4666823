use quarry::model::{ColumnModel, ColumnType, IdAndVersion, TableType};
use quarry::schema::{ColumnChangeDetails, DatabaseColumnInfo, IndexChange, IndexRename};
use quarry::sql::ddl::{
    alter_index_sql, alter_table_for_changes, alter_table_for_diff, create_or_alter_table_sql,
    create_table_sql, drop_table_sql,
};
use quarry::sql::naming::TableIndexType;
use quarry::types::{MySqlColumnType, TypeError};

fn id() -> IdAndVersion {
    IdAndVersion::new(123)
}

#[test]
fn test_create_table_with_string_and_default() {
    let schema = vec![
        ColumnModel::new(1, "name", ColumnType::String)
            .with_max_size(50)
            .with_default("none"),
        ColumnModel::new(2, "count", ColumnType::Integer),
    ];
    let sql = create_table_sql(&schema, &id(), TableType::Table).unwrap();
    assert_eq!(
        sql,
        "CREATE TABLE IF NOT EXISTS T123 (ROW_ID BIGINT(20) NOT NULL, ROW_VERSION BIGINT(20) NOT NULL, \
         _C1_ VARCHAR(50) CHARACTER SET utf8mb4 COLLATE utf8mb4_0900_ai_ci DEFAULT 'none', \
         _C2_ BIGINT(20) DEFAULT NULL, PRIMARY KEY (ROW_ID))"
    );
}

#[test]
fn test_create_table_rejects_missing_size() {
    let schema = vec![ColumnModel::new(1, "name", ColumnType::Link)];
    assert_eq!(
        create_table_sql(&schema, &id(), TableType::Table),
        Err(TypeError::MissingSize(ColumnType::Link))
    );
}

#[test]
fn test_versioned_table_names() {
    let versioned = IdAndVersion::versioned(123, 4);
    let sql = create_table_sql(&[], &versioned, TableType::Table).unwrap();
    assert!(sql.starts_with("CREATE TABLE IF NOT EXISTS T123_4 ("), "{}", sql);
    assert_eq!(
        drop_table_sql(&versioned, TableIndexType::CurrentRow),
        "DROP TABLE IF EXISTS T123_4CR"
    );
}

#[test]
fn test_alter_for_diff_drops_then_adds() {
    let old = vec!["ROW_ID".to_string(), "_C1_".to_string(), "_C2_".to_string()];
    let schema = vec![
        ColumnModel::new(2, "kept", ColumnType::Integer),
        ColumnModel::new(3, "score", ColumnType::Double),
    ];
    let sql = alter_table_for_diff(&old, &schema, &id()).unwrap().unwrap();
    assert_eq!(
        sql,
        "ALTER TABLE T123 DROP COLUMN _C1_, ADD COLUMN _C3_ DOUBLE DEFAULT NULL, \
         ADD COLUMN _DBL_C3_ ENUM('NaN','Infinity','-Infinity') DEFAULT NULL"
    );
}

#[test]
fn test_create_or_alter() {
    let schema = vec![ColumnModel::new(2, "n", ColumnType::Integer)];
    let existing = vec!["_C2_".to_string()];
    assert_eq!(
        create_or_alter_table_sql(&existing, &schema, &id(), TableType::Table).unwrap(),
        None
    );
}

#[test]
fn test_update_to_double_adds_shadow() {
    let old = ColumnModel::new(1, "a", ColumnType::Integer);
    let new = ColumnModel::new(1, "a", ColumnType::Double);
    let change = ColumnChangeDetails::new(Some(old), Some(new))
        .unwrap()
        .with_old_column_info(DatabaseColumnInfo::new("_C1_"));
    let sql = alter_table_for_changes(&[change], &id()).unwrap().unwrap();
    assert_eq!(
        sql,
        "ALTER TABLE T123 MODIFY COLUMN _C1_ DOUBLE DEFAULT NULL, \
         ADD COLUMN _DBL_C1_ ENUM('NaN','Infinity','-Infinity') DEFAULT NULL"
    );
}

#[test]
fn test_index_prefix_lengths() {
    let short = DatabaseColumnInfo::new("_C1_").with_type(MySqlColumnType::Varchar, Some(50));
    let long = DatabaseColumnInfo::new("_C2_").with_type(MySqlColumnType::Varchar, Some(1000));
    let number = DatabaseColumnInfo::new("_C3_").with_type(MySqlColumnType::BigInt, Some(20));
    let change = IndexChange::new(vec![short, long, number], vec![], vec![]).unwrap();
    assert_eq!(
        alter_index_sql(&change, &id()).unwrap(),
        "ALTER TABLE T123 ADD INDEX _C1_idx_ (_C1_), ADD INDEX _C2_idx_ (_C2_(255)), \
         ADD INDEX _C3_idx_ (_C3_)"
    );
}

#[test]
fn test_index_rename_and_drop() {
    let renamed = DatabaseColumnInfo::new("_C4_").with_index("stale");
    let dropped = DatabaseColumnInfo::new("_C5_").with_index("_C5_idx_");
    let change = IndexChange::new(
        vec![],
        vec![dropped],
        vec![IndexRename {
            column: renamed,
            from: "stale".into(),
            to: "_C4_idx_".into(),
        }],
    )
    .unwrap();
    assert_eq!(
        alter_index_sql(&change, &id()).unwrap(),
        "ALTER TABLE T123 DROP INDEX _C5_idx_, RENAME INDEX stale TO _C4_idx_"
    );
    assert_eq!(alter_index_sql(&IndexChange::default(), &id()), None);
}
