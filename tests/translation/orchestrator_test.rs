use quarry::config::Settings;
use quarry::model::{ColumnModel, FacetType, IdAndVersion};
use quarry::query::ast::SortDirection;
use quarry::query::{
    FacetSelection, InMemorySchemaProvider, QueryOrchestrator, QueryRequest, SortItem,
    TranslationError, NULL_VALUE_KEYWORD,
};
use quarry::types::DbValue;

const SCHEMA: &str = r#"[
    {"id": 1, "name": "score", "type": "DOUBLE"},
    {"id": 2, "name": "kind", "type": "STRING", "maxSize": 20, "facetType": "enumeration"},
    {"id": 3, "name": "born", "type": "DATE", "facetType": "range"}
]"#;

fn orchestrator() -> QueryOrchestrator<InMemorySchemaProvider> {
    let columns: Vec<ColumnModel> = serde_json::from_str(SCHEMA).unwrap();
    assert_eq!(columns[1].facet_type, Some(FacetType::Enumeration));
    let provider = InMemorySchemaProvider::new().with_table(IdAndVersion::new(123), columns);
    QueryOrchestrator::new(provider)
        .with_max_bytes_per_page(Settings::default().query.max_bytes_per_page)
}

#[test]
fn test_null_facet_value() {
    let request = QueryRequest::new("select kind from syn123").with_facet(FacetSelection::Values {
        column: "kind".into(),
        values: vec![NULL_VALUE_KEYWORD.into(), "dog".into()],
    });
    let result = orchestrator().translate(&request).unwrap();
    assert_eq!(
        result.sql,
        "SELECT _C2_, ROW_ID, ROW_VERSION FROM T123 WHERE (_C2_ IS NULL OR _C2_ = :b0) LIMIT :b1"
    );
    assert_eq!(result.parameters.get("b0"), Some(&DbValue::Text("dog".into())));
}

#[test]
fn test_range_facet_binds_typed_bounds() {
    let request = QueryRequest::new("select kind from syn123 where score > 1").with_facet(
        FacetSelection::Range {
            column: "born".into(),
            min: Some("1970-01-02".into()),
            max: Some("1970-01-03".into()),
        },
    );
    let result = orchestrator().translate(&request).unwrap();
    assert_eq!(
        result.sql,
        "SELECT _C2_, ROW_ID, ROW_VERSION FROM T123 WHERE (_C1_ > :b0) AND _C3_ BETWEEN :b1 AND :b2 LIMIT :b3"
    );
    assert_eq!(result.parameters.get("b1"), Some(&DbValue::Long(86_400_000)));
    assert_eq!(result.parameters.get("b2"), Some(&DbValue::Long(172_800_000)));
}

#[test]
fn test_facet_type_is_checked() {
    let request = QueryRequest::new("select kind from syn123").with_facet(FacetSelection::Range {
        column: "kind".into(),
        min: Some("a".into()),
        max: None,
    });
    assert_eq!(
        orchestrator().translate(&request),
        Err(TranslationError::NotFaceted {
            column: "kind".into(),
            expected: FacetType::Range,
        })
    );
}

#[test]
fn test_request_page_is_relative_to_query_page() {
    let request = QueryRequest::new("select kind from syn123 limit 100 offset 10")
        .with_offset(20)
        .with_limit(50);
    let result = orchestrator().translate(&request).unwrap();
    assert_eq!(result.sql, "SELECT _C2_, ROW_ID, ROW_VERSION FROM T123 LIMIT :b0 OFFSET :b1");
    assert_eq!(result.parameters.get("b0"), Some(&DbValue::Long(50)));
    assert_eq!(result.parameters.get("b1"), Some(&DbValue::Long(30)));

    let past_end = QueryRequest::new("select kind from syn123 limit 10").with_offset(20);
    let result = orchestrator().translate(&past_end).unwrap();
    assert_eq!(result.parameters.get("b0"), Some(&DbValue::Long(0)));
    assert_eq!(result.parameters.get("b1"), Some(&DbValue::Long(20)));
}

#[test]
fn test_sort_replaces_order_by() {
    let request = QueryRequest::new("select kind from syn123 order by kind asc, born desc")
        .with_sort(SortItem::new("score", SortDirection::Desc));
    let result = orchestrator().translate(&request).unwrap();
    assert!(
        result.sql.ends_with("ORDER BY _C1_ DESC LIMIT :b0"),
        "{}",
        result.sql
    );
}

#[test]
fn test_count_ignores_paging_and_sort() {
    let request = QueryRequest::new("select kind from syn123 where kind = 'cat' order by kind limit 3")
        .with_offset(5)
        .with_sort(SortItem::new("score", SortDirection::Asc));
    let count = orchestrator().translate_count(&request).unwrap().unwrap();
    assert_eq!(count.sql, "SELECT COUNT(*) FROM T123 WHERE _C2_ = :b0");
    assert_eq!(count.parameters.get("b0"), Some(&DbValue::Text("cat".into())));
}

#[test]
fn test_translated_query_json() {
    let result = orchestrator()
        .translate(&QueryRequest::new("select kind from syn123 limit 1"))
        .unwrap();
    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["sql"], "SELECT _C2_, ROW_ID, ROW_VERSION FROM T123 LIMIT :b0");
    assert_eq!(json["parameters"]["b0"], 1);
    assert_eq!(json["selectColumns"][0]["name"], "kind");
    assert_eq!(json["singleTableId"]["id"], 123);
}
