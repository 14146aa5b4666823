use quarry::model::{ColumnModel, ColumnType, IdAndVersion, TableType};
use quarry::query::{
    index_description, parse_query, translate, InMemorySchemaProvider, SelectColumnKind,
    TableAndColumnMapper, TranslatedQuery, TranslationError, TranslationOptions,
    TranslationResult,
};
use quarry::types::DbValue;

fn provider() -> InMemorySchemaProvider {
    InMemorySchemaProvider::new().with_table(
        IdAndVersion::new(123),
        vec![
            ColumnModel::new(1, "score", ColumnType::Double),
            ColumnModel::new(2, "name", ColumnType::String).with_max_size(50),
            ColumnModel::new(3, "born", ColumnType::Date),
            ColumnModel::new(7, "with space", ColumnType::Integer),
        ],
    )
}

fn run(sql: &str, table_type: TableType, include_etag: bool) -> TranslationResult<TranslatedQuery> {
    let provider = provider();
    let query = parse_query(sql)?;
    let mapper = TableAndColumnMapper::new(&query, &provider)?;
    let description = index_description(mapper.tables()[0].id, table_type);
    translate(
        &query,
        &mapper,
        description.as_ref(),
        TranslationOptions {
            include_etag,
            ..Default::default()
        },
    )
}

fn translated(sql: &str) -> TranslatedQuery {
    run(sql, TableType::Table, false).unwrap()
}

#[test]
fn test_versioned_table() {
    let result = translated("select name from syn123.4");
    assert_eq!(result.sql, "SELECT _C2_, ROW_ID, ROW_VERSION FROM T123_4");
    assert_eq!(result.single_table_id, Some(IdAndVersion::versioned(123, 4)));
}

#[test]
fn test_quoted_column_name() {
    let result = translated("select \"with space\" from syn123 where \"with space\" = 3");
    assert_eq!(
        result.sql,
        "SELECT _C7_, ROW_ID, ROW_VERSION FROM T123 WHERE _C7_ = :b0"
    );
    assert_eq!(result.parameters.get("b0"), Some(&DbValue::Text("3".into())));
}

#[test]
fn test_select_column_ids_and_kinds() {
    let result = translated("select name, score from syn123");
    let ids: Vec<_> = result.select_columns.iter().map(|c| c.id).collect();
    assert_eq!(ids, vec![Some(2), Some(1)]);
    assert!(result
        .select_columns
        .iter()
        .all(|c| c.kind() == SelectColumnKind::Schema));

    // One column without an id clears them all.
    let result = translated("select name, row_id from syn123");
    let kinds: Vec<_> = result.select_columns.iter().map(|c| c.kind()).collect();
    assert_eq!(kinds, vec![SelectColumnKind::Derived, SelectColumnKind::Metadata]);
}

#[test]
fn test_view_adds_etag_unless_aggregate() {
    let result = run("select name from syn123", TableType::EntityView, true).unwrap();
    assert_eq!(result.sql, "SELECT _C2_, ROW_ID, ROW_VERSION, ROW_ETAG FROM T123");

    let result = run("select count(*) from syn123", TableType::EntityView, true).unwrap();
    assert_eq!(result.sql, "SELECT COUNT(*) FROM T123");
    assert!(!result.includes_row_id_and_version);
}

#[test]
fn test_having_binds_literal() {
    let result = translated("select name, count(*) from syn123 group by name having count(*) > 2");
    assert_eq!(
        result.sql,
        "SELECT _C2_, COUNT(*) FROM T123 GROUP BY _C2_ HAVING COUNT(*) > :b0"
    );
    assert_eq!(result.parameters.get("b0"), Some(&DbValue::Text("2".into())));
}

#[test]
fn test_no_literal_reaches_sql_text() {
    let result = translated(
        "select name from syn123 where name in ('Robert''); DROP TABLE T123;--', 'x') \
         and born between '2020-01-01' and '2020-12-31'",
    );
    assert!(!result.sql.contains("DROP"));
    assert!(!result.sql.contains("2020"));
    assert_eq!(result.parameters.len(), 4);
    assert_eq!(
        result.parameters.get("b0"),
        Some(&DbValue::Text("Robert'); DROP TABLE T123;--".into()))
    );
    assert_eq!(result.parameters.get("b2"), Some(&DbValue::Long(1_577_836_800_000)));
}

#[test]
fn test_row_size_estimate() {
    // 4 bytes per character of a 50 character string, plus a 20 digit integer.
    let result = translated("select name, \"with space\" from syn123");
    assert_eq!(result.max_row_size_bytes, 220);
}

#[test]
fn test_rejected_queries() {
    assert!(matches!(
        run("selec name from syn123", TableType::Table, false),
        Err(TranslationError::Parse(_))
    ));
    assert!(matches!(
        run(
            "select name from syn123 union select name from syn123",
            TableType::Table,
            false
        ),
        Err(TranslationError::Unsupported(_))
    ));
    assert_eq!(
        run("select name from syn999", TableType::Table, false),
        Err(TranslationError::UnknownTable("syn999".into()))
    );
    assert_eq!(
        run("select nickname from syn123", TableType::Table, false),
        Err(TranslationError::UnknownColumn("nickname".into()))
    );
}
