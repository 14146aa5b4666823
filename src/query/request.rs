//! Caller-side query request.

use serde::{Deserialize, Serialize};

use crate::model::TableType;

use super::ast::SortDirection;
use super::provider::SqlContext;

/// Facet value standing for "no value".
pub const NULL_VALUE_KEYWORD: &str = "org.sagebionetworks.UNDEFINED_NULL_NOTSET";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FilterOperator {
    Like,
    Equal,
    In,
}

/// Extra condition AND-ed onto the query's WHERE clause.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryFilter {
    pub column: String,
    pub operator: FilterOperator,
    pub values: Vec<String>,
}

impl QueryFilter {
    pub fn new(column: impl Into<String>, operator: FilterOperator, values: &[&str]) -> Self {
        Self {
            column: column.into(),
            operator,
            values: values.iter().map(|v| v.to_string()).collect(),
        }
    }
}

/// A caller's selection on one facet column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum FacetSelection {
    Values {
        column: String,
        values: Vec<String>,
    },
    Range {
        column: String,
        #[serde(default)]
        min: Option<String>,
        #[serde(default)]
        max: Option<String>,
    },
}

impl FacetSelection {
    pub fn column(&self) -> &str {
        match self {
            FacetSelection::Values { column, .. } | FacetSelection::Range { column, .. } => column,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortItem {
    pub column: String,
    #[serde(default)]
    pub direction: Option<SortDirection>,
}

impl SortItem {
    pub fn new(column: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            column: column.into(),
            direction: Some(direction),
        }
    }
}

/// Everything needed to translate one page of results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryRequest {
    pub sql: String,
    #[serde(default)]
    pub table_type: TableType,
    #[serde(default)]
    pub additional_filters: Vec<QueryFilter>,
    #[serde(default)]
    pub selected_facets: Vec<FacetSelection>,
    #[serde(default)]
    pub sort: Vec<SortItem>,
    #[serde(default)]
    pub offset: Option<i64>,
    #[serde(default)]
    pub limit: Option<i64>,
    #[serde(default)]
    pub max_bytes_per_page: Option<i64>,
    #[serde(default)]
    pub include_etag: bool,
    #[serde(skip)]
    pub context: SqlContext,
}

impl QueryRequest {
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            table_type: TableType::Table,
            additional_filters: Vec::new(),
            selected_facets: Vec::new(),
            sort: Vec::new(),
            offset: None,
            limit: None,
            max_bytes_per_page: None,
            include_etag: false,
            context: SqlContext::Query,
        }
    }

    pub fn with_table_type(mut self, table_type: TableType) -> Self {
        self.table_type = table_type;
        self
    }

    pub fn with_filter(mut self, filter: QueryFilter) -> Self {
        self.additional_filters.push(filter);
        self
    }

    pub fn with_facet(mut self, selection: FacetSelection) -> Self {
        self.selected_facets.push(selection);
        self
    }

    pub fn with_sort(mut self, item: SortItem) -> Self {
        self.sort.push(item);
        self
    }

    pub fn with_offset(mut self, offset: i64) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_max_bytes_per_page(mut self, max_bytes: i64) -> Self {
        self.max_bytes_per_page = Some(max_bytes);
        self
    }

    pub fn with_etag(mut self) -> Self {
        self.include_etag = true;
        self
    }

    pub fn in_context(mut self, context: SqlContext) -> Self {
        self.context = context;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_from_json() {
        let request: QueryRequest = serde_json::from_str(
            r#"{
                "sql": "select * from syn1",
                "tableType": "entity-view",
                "additionalFilters": [{"column": "a", "operator": "LIKE", "values": ["x%"]}],
                "selectedFacets": [
                    {"kind": "values", "column": "b", "values": ["1"]},
                    {"kind": "range", "column": "c", "max": "5"}
                ],
                "sort": [{"column": "a", "direction": "DESC"}],
                "limit": 10
            }"#,
        )
        .unwrap();
        assert_eq!(request.table_type, TableType::EntityView);
        assert_eq!(request.additional_filters[0].operator, FilterOperator::Like);
        assert_eq!(
            request.selected_facets[1],
            FacetSelection::Range {
                column: "c".into(),
                min: None,
                max: Some("5".into())
            }
        );
        assert_eq!(request.sort[0].direction, Some(SortDirection::Desc));
        assert_eq!(request.limit, Some(10));
        assert_eq!(request.context, SqlContext::Query);
    }
}
