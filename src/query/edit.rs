//! Request edits applied to a parsed query.
//!
//! Each edit returns a new tree; the input is never modified.

use crate::model::FacetType;

use super::ast::*;
use super::error::{TranslationError, TranslationResult};
use super::mapper::TableAndColumnMapper;
use super::request::{FacetSelection, FilterOperator, QueryFilter, SortItem, NULL_VALUE_KEYWORD};

fn column(name: &str) -> ValueExpression {
    ValueExpression::column(name)
}

fn equals(name: &str, value: &str) -> SearchCondition {
    Predicate::Comparison {
        left: column(name),
        op: ComparisonOperator::Eq,
        right: ValueExpression::string(value),
    }
    .into()
}

fn is_null(name: &str) -> SearchCondition {
    Predicate::IsNull {
        expr: column(name),
        negated: false,
    }
    .into()
}

/// Single condition for one caller filter.
pub fn filter_condition(filter: &QueryFilter) -> TranslationResult<SearchCondition> {
    let no_values = || TranslationError::InvalidFilter {
        column: filter.column.clone(),
        reason: "at least one value is required".into(),
    };
    if filter.values.is_empty() {
        return Err(no_values());
    }
    Ok(match filter.operator {
        FilterOperator::Like => {
            let likes = filter.values.iter().map(|value| {
                SearchCondition::from(Predicate::Like {
                    expr: column(&filter.column),
                    negated: false,
                    pattern: ValueExpression::string(value.as_str()),
                    escape: None,
                })
            });
            SearchCondition::any(likes).ok_or_else(no_values)?.nested()
        }
        FilterOperator::Equal | FilterOperator::In => Predicate::InList {
            expr: column(&filter.column),
            negated: false,
            list: filter
                .values
                .iter()
                .map(|value| ValueExpression::string(value.as_str()))
                .collect(),
        }
        .into(),
    })
}

/// Single condition for one facet selection, `None` when nothing is
/// selected.
pub fn facet_condition(
    selection: &FacetSelection,
    mapper: &TableAndColumnMapper,
) -> TranslationResult<Option<SearchCondition>> {
    let name = selection.column();
    let model = mapper
        .column_model(name)
        .ok_or_else(|| TranslationError::UnknownColumn(name.to_string()))?;
    let expected = match selection {
        FacetSelection::Values { .. } => FacetType::Enumeration,
        FacetSelection::Range { .. } => FacetType::Range,
    };
    if model.facet_type != Some(expected) {
        return Err(TranslationError::NotFaceted {
            column: name.to_string(),
            expected,
        });
    }

    Ok(match selection {
        FacetSelection::Values { values, .. } => SearchCondition::any(values.iter().map(|value| {
            if value == NULL_VALUE_KEYWORD {
                is_null(name)
            } else {
                equals(name, value)
            }
        }))
        .map(SearchCondition::nested),
        FacetSelection::Range { min, max, .. } => {
            let is_null_keyword = |bound: &Option<String>| bound.as_deref() == Some(NULL_VALUE_KEYWORD);
            if is_null_keyword(min) || is_null_keyword(max) {
                return Ok(Some(is_null(name)));
            }
            let bound = |value: &str| ValueExpression::string(value);
            match (min.as_deref(), max.as_deref()) {
                (Some(min), Some(max)) => Some(
                    Predicate::Between {
                        expr: column(name),
                        negated: false,
                        low: bound(min),
                        high: bound(max),
                    }
                    .into(),
                ),
                (Some(min), None) => Some(
                    Predicate::Comparison {
                        left: column(name),
                        op: ComparisonOperator::GtEq,
                        right: bound(min),
                    }
                    .into(),
                ),
                (None, Some(max)) => Some(
                    Predicate::Comparison {
                        left: column(name),
                        op: ComparisonOperator::LtEq,
                        right: bound(max),
                    }
                    .into(),
                ),
                (None, None) => None,
            }
        }
    })
}

/// AND extra conditions onto the WHERE clause, keeping the original
/// clause parenthesized.
pub fn append_conditions(
    query: &QuerySpecification,
    conditions: Vec<SearchCondition>,
) -> QuerySpecification {
    if conditions.is_empty() {
        return query.clone();
    }
    let original = query.where_clause.clone().map(SearchCondition::nested);
    QuerySpecification {
        where_clause: SearchCondition::all(original.into_iter().chain(conditions)),
        ..query.clone()
    }
}

/// Replace ORDER BY with the caller's sort list, when one is given.
pub fn replace_sort(query: &QuerySpecification, sort: &[SortItem]) -> QuerySpecification {
    if sort.is_empty() {
        return query.clone();
    }
    QuerySpecification {
        order_by: sort
            .iter()
            .map(|item| SortSpecification {
                column: ColumnReference::new(item.column.clone()),
                direction: item.direction,
            })
            .collect(),
        ..query.clone()
    }
}

/// Combine the query's pagination with a requested page.
///
/// The request offset is relative to the query's own offset and the
/// query's limit is never raised.
pub fn override_pagination(
    pagination: Option<Pagination>,
    offset: Option<i64>,
    limit: Option<i64>,
) -> TranslationResult<Option<Pagination>> {
    if offset.is_none() && limit.is_none() {
        return Ok(pagination);
    }
    if offset.is_some_and(|o| o < 0) {
        return Err(TranslationError::NegativePagination("offset"));
    }
    if limit.is_some_and(|l| l < 0) {
        return Err(TranslationError::NegativePagination("limit"));
    }
    let request_limit = limit.unwrap_or(i64::MAX);
    let request_offset = offset.unwrap_or(0);
    let query_limit = pagination.map(|p| p.limit).unwrap_or(i64::MAX);
    let query_offset = pagination.and_then(|p| p.offset).unwrap_or(0);

    let query_limit = query_limit.saturating_sub(request_offset).max(0);
    Ok(Some(Pagination {
        limit: request_limit.min(query_limit),
        offset: Some(query_offset.saturating_add(request_offset)),
    }))
}

/// Cap the page size.
///
/// Only lowers a limit. The at-least-one-row floor applies to the computed
/// `max_rows`, so an existing limit below it (including 0) is kept.
pub fn limit_max_rows_per_page(pagination: Option<Pagination>, max_rows: i64) -> Pagination {
    match pagination {
        None => Pagination {
            limit: max_rows,
            offset: None,
        },
        Some(p) if p.limit > max_rows => Pagination {
            limit: max_rows,
            offset: p.offset,
        },
        Some(p) => p,
    }
}

pub fn with_pagination(query: &QuerySpecification, pagination: Option<Pagination>) -> QuerySpecification {
    QuerySpecification {
        pagination,
        ..query.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ColumnModel, ColumnType, IdAndVersion};
    use crate::query::parser::parse_query;
    use crate::query::provider::InMemorySchemaProvider;

    fn mapper() -> TableAndColumnMapper {
        let provider = InMemorySchemaProvider::new().with_table(
            IdAndVersion::new(1),
            vec![
                ColumnModel::new(1, "kind", ColumnType::String)
                    .with_max_size(10)
                    .with_facet(FacetType::Enumeration),
                ColumnModel::new(2, "size", ColumnType::Integer).with_facet(FacetType::Range),
                ColumnModel::new(3, "plain", ColumnType::String).with_max_size(10),
            ],
        );
        TableAndColumnMapper::new(&parse_query("select * from syn1").unwrap(), &provider).unwrap()
    }

    #[test]
    fn test_filters() {
        let like = QueryFilter::new("kind", FilterOperator::Like, &["a%", "b%"]);
        assert_eq!(
            filter_condition(&like).unwrap().to_string(),
            "(\"kind\" LIKE 'a%' OR \"kind\" LIKE 'b%')"
        );
        let equal = QueryFilter::new("kind", FilterOperator::Equal, &["a", "b"]);
        assert_eq!(
            filter_condition(&equal).unwrap().to_string(),
            "\"kind\" IN ('a', 'b')"
        );
        let empty = QueryFilter::new("kind", FilterOperator::In, &[]);
        assert!(matches!(
            filter_condition(&empty),
            Err(TranslationError::InvalidFilter { .. })
        ));
    }

    #[test]
    fn test_value_facets() {
        let mapper = mapper();
        let selection = FacetSelection::Values {
            column: "kind".into(),
            values: vec!["x".into(), NULL_VALUE_KEYWORD.into()],
        };
        assert_eq!(
            facet_condition(&selection, &mapper).unwrap().unwrap().to_string(),
            "(\"kind\" = 'x' OR \"kind\" IS NULL)"
        );
        let empty = FacetSelection::Values {
            column: "kind".into(),
            values: vec![],
        };
        assert_eq!(facet_condition(&empty, &mapper).unwrap(), None);
    }

    #[test]
    fn test_range_facets() {
        let mapper = mapper();
        let range = |min: Option<&str>, max: Option<&str>| FacetSelection::Range {
            column: "size".into(),
            min: min.map(String::from),
            max: max.map(String::from),
        };
        let render = |selection: FacetSelection| {
            facet_condition(&selection, &mapper)
                .unwrap()
                .map(|c| c.to_string())
        };
        assert_eq!(
            render(range(Some("1"), Some("5"))).as_deref(),
            Some("\"size\" BETWEEN '1' AND '5'")
        );
        assert_eq!(render(range(Some("1"), None)).as_deref(), Some("\"size\" >= '1'"));
        assert_eq!(render(range(None, Some("5"))).as_deref(), Some("\"size\" <= '5'"));
        assert_eq!(
            render(range(Some(NULL_VALUE_KEYWORD), None)).as_deref(),
            Some("\"size\" IS NULL")
        );
        assert_eq!(render(range(None, None)), None);
    }

    #[test]
    fn test_facet_validation() {
        let mapper = mapper();
        let wrong_kind = FacetSelection::Range {
            column: "kind".into(),
            min: Some("a".into()),
            max: None,
        };
        assert!(matches!(
            facet_condition(&wrong_kind, &mapper),
            Err(TranslationError::NotFaceted {
                expected: FacetType::Range,
                ..
            })
        ));
        let not_faceted = FacetSelection::Values {
            column: "plain".into(),
            values: vec!["a".into()],
        };
        assert!(facet_condition(&not_faceted, &mapper).is_err());
        let unknown = FacetSelection::Values {
            column: "nope".into(),
            values: vec!["a".into()],
        };
        assert_eq!(
            facet_condition(&unknown, &mapper),
            Err(TranslationError::UnknownColumn("nope".into()))
        );
    }

    #[test]
    fn test_append_conditions_keeps_precedence() {
        let query = parse_query("select * from syn1 where a = 1 or b = 2").unwrap();
        let filter = filter_condition(&QueryFilter::new("c", FilterOperator::Equal, &["x"])).unwrap();
        let edited = append_conditions(&query, vec![filter]);
        assert_eq!(
            edited.to_string(),
            "SELECT * FROM syn1 WHERE (a = 1 OR b = 2) AND \"c\" IN ('x')"
        );
        assert_eq!(parse_query(&edited.to_string()).unwrap(), edited);
        assert_eq!(query.to_string(), "SELECT * FROM syn1 WHERE a = 1 OR b = 2");
    }

    #[test]
    fn test_replace_sort() {
        let query = parse_query("select * from syn1 order by a").unwrap();
        let sorted = replace_sort(&query, &[SortItem::new("b", SortDirection::Desc)]);
        assert_eq!(sorted.to_string(), "SELECT * FROM syn1 ORDER BY \"b\" DESC");
        assert_eq!(replace_sort(&query, &[]), query);
    }

    #[test]
    fn test_override_pagination() {
        let query = Some(Pagination {
            limit: 100,
            offset: Some(10),
        });
        assert_eq!(override_pagination(query, None, None).unwrap(), query);
        assert_eq!(
            override_pagination(query, Some(20), Some(50)).unwrap(),
            Some(Pagination {
                limit: 50,
                offset: Some(30)
            })
        );
        // A larger request limit never raises the query's own.
        assert_eq!(
            override_pagination(query, Some(90), Some(50)).unwrap(),
            Some(Pagination {
                limit: 10,
                offset: Some(100)
            })
        );
        assert_eq!(
            override_pagination(None, None, Some(5)).unwrap(),
            Some(Pagination {
                limit: 5,
                offset: Some(0)
            })
        );
        assert!(override_pagination(None, Some(-1), None).is_err());
    }

    #[test]
    fn test_limit_max_rows_per_page() {
        assert_eq!(
            limit_max_rows_per_page(None, 7),
            Pagination {
                limit: 7,
                offset: None
            }
        );
        let small = Pagination {
            limit: 3,
            offset: Some(1),
        };
        assert_eq!(limit_max_rows_per_page(Some(small), 7), small);
        assert_eq!(limit_max_rows_per_page(Some(small), 2).limit, 2);
    }

    #[test]
    fn test_offset_past_query_limit_keeps_empty_page() {
        let query = Some(Pagination {
            limit: 10,
            offset: None,
        });
        let requested = override_pagination(query, Some(15), None).unwrap();
        assert_eq!(requested.map(|p| p.limit), Some(0));
        let capped = limit_max_rows_per_page(requested, 1);
        assert_eq!(capped.limit, 0);
        assert_eq!(capped.offset, Some(15));
    }
}
