use quarry::index::{DbRow, MemoryConnection, TableIndexManager};
use quarry::model::{ColumnModel, ColumnType, IdAndVersion, TableType};
use quarry::schema::{ColumnChangeDetails, DatabaseColumnInfo};
use quarry::types::DbValue;

fn text(s: &str) -> DbValue {
    DbValue::Text(s.to_string())
}

fn column(field: &str, kind: &str, key: &str) -> DbRow {
    DbRow::new()
        .with("Field", text(field))
        .with("Type", text(kind))
        .with("Key", text(key))
}

fn index(column: &str, key: &str) -> DbRow {
    DbRow::new()
        .with("Column_name", text(column))
        .with("Key_name", text(key))
}

/// ROW_ID, ROW_VERSION and three columns of which `_C1_` is indexed.
fn live_table() -> MemoryConnection {
    MemoryConnection::new()
        .with_rows(
            "SHOW COLUMNS",
            vec![
                column("ROW_ID", "bigint(20)", "PRI"),
                column("ROW_VERSION", "bigint(20)", ""),
                column("_C1_", "varchar(1000)", "MUL"),
                column("_C2_", "bigint(20)", ""),
                column("_C3_", "double", ""),
                column("_DBL_C3_", "enum('NaN','Infinity','-Infinity')", ""),
            ],
        )
        .with_rows(
            "SHOW INDEX",
            vec![index("ROW_ID", "PRIMARY"), index("_C1_", "_C1_idx_")],
        )
        .with_rows(
            "SELECT COUNT(DISTINCT",
            vec![DbRow::new()
                .with("ROW_ID", DbValue::Long(100))
                .with("ROW_VERSION", DbValue::Long(1))
                .with("_C1_", DbValue::Long(3))
                .with("_C2_", text("90"))
                .with("_C3_", DbValue::Long(50))
                .with("_DBL_C3_", DbValue::Long(2))],
        )
}

#[tokio::test]
async fn test_create_tables_in_one_transaction() {
    let manager = TableIndexManager::new(MemoryConnection::new());
    manager
        .create_table_if_does_not_exist(&IdAndVersion::new(5), TableType::Table)
        .await
        .unwrap();
    let log = manager.connection().statements().await;
    assert_eq!(log.len(), 5);
    assert_eq!(log[0], "START TRANSACTION READ WRITE");
    assert!(log[1].starts_with("CREATE TABLE IF NOT EXISTS T5 ("));
    assert!(log[2].starts_with("CREATE TABLE IF NOT EXISTS T5S ("));
    assert!(log[3].starts_with("CREATE TABLE IF NOT EXISTS T5CR ("));
    assert_eq!(log[4], "COMMIT");
}

#[tokio::test]
async fn test_introspection_and_cardinality() {
    let manager = TableIndexManager::new(live_table());
    let id = IdAndVersion::new(5);
    let mut infos = manager.get_database_info(&id).await.unwrap();
    assert_eq!(infos.len(), 6);
    assert!(infos[0].has_index);
    assert_eq!(infos[2].index_name.as_deref(), Some("_C1_idx_"));
    assert_eq!(infos[2].max_size, Some(1000));

    manager.provide_cardinality(&mut infos, &id).await.unwrap();
    assert_eq!(infos[2].cardinality, Some(3));
    assert_eq!(infos[3].cardinality, Some(90));
}

#[tokio::test]
async fn test_optimize_moves_index_to_higher_cardinality() {
    let manager = TableIndexManager::new(live_table());
    let changed = manager.optimize_indices(&IdAndVersion::new(5), 2).await.unwrap();
    assert!(changed);

    let log = manager.connection().statements().await;
    let alter = log
        .iter()
        .find(|s| s.starts_with("ALTER TABLE"))
        .expect("an ALTER was issued");
    assert_eq!(alter, "ALTER TABLE T5 DROP INDEX _C1_idx_, ADD INDEX _C2_idx_ (_C2_)");
}

#[tokio::test]
async fn test_optimize_is_idempotent_within_budget() {
    let manager = TableIndexManager::new(live_table());
    let mut infos = vec![
        DatabaseColumnInfo::new("ROW_ID")
            .with_cardinality(10)
            .with_index("PRIMARY"),
        DatabaseColumnInfo::new("_C1_")
            .with_cardinality(4)
            .with_index("_C1_idx_"),
    ];
    let changed = manager
        .optimize_table_indices(&infos, &IdAndVersion::new(5), 10)
        .await
        .unwrap();
    assert!(!changed);

    infos[1].cardinality = None;
    assert!(manager
        .optimize_table_indices(&infos, &IdAndVersion::new(5), 10)
        .await
        .is_err());
}

#[tokio::test]
async fn test_alter_table_uses_live_columns() {
    let manager = TableIndexManager::new(live_table());
    let changes = vec![
        ColumnChangeDetails::delete(ColumnModel::new(2, "count", ColumnType::Integer)),
        // Never created in the store, so nothing to drop.
        ColumnChangeDetails::delete(ColumnModel::new(9, "ghost", ColumnType::Integer)),
        ColumnChangeDetails::add(ColumnModel::new(4, "flag", ColumnType::Boolean)),
    ];
    let changed = manager
        .alter_table_as_needed(&IdAndVersion::new(5), changes)
        .await
        .unwrap();
    assert!(changed);

    let log = manager.connection().statements().await;
    assert!(log.contains(
        &"ALTER TABLE T5 DROP COLUMN _C2_, ADD COLUMN _C4_ BOOLEAN DEFAULT NULL".to_string()
    ));
    assert_eq!(log.last().map(String::as_str), Some("COMMIT"));
}

#[tokio::test]
async fn test_no_changes_issue_no_alter() {
    let manager = TableIndexManager::new(live_table());
    let changed = manager
        .alter_table_as_needed(
            &IdAndVersion::new(5),
            vec![ColumnChangeDetails::delete(ColumnModel::new(
                9,
                "ghost",
                ColumnType::Integer,
            ))],
        )
        .await
        .unwrap();
    assert!(!changed);
    let log = manager.connection().statements().await;
    assert!(!log.iter().any(|s| s.starts_with("ALTER")));
}

#[tokio::test]
async fn test_delete_table_drops_all_three() {
    let manager = TableIndexManager::new(MemoryConnection::new());
    manager.delete_table(&IdAndVersion::versioned(5, 1)).await.unwrap();
    let log = manager.connection().statements().await;
    assert_eq!(
        log,
        vec![
            "START TRANSACTION READ WRITE",
            "DROP TABLE IF EXISTS T5_1",
            "DROP TABLE IF EXISTS T5_1S",
            "DROP TABLE IF EXISTS T5_1CR",
            "COMMIT",
        ]
    );
}
