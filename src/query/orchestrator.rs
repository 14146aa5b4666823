//! One translation pass per request.
//!
//! Order of operations: parse, map tables and columns, AND in the caller's
//! filters and facet selections, replace the sort, combine pagination,
//! clamp the page to the byte budget, translate. Every step produces a
//! fresh tree.

use tracing::debug;

use super::edit::{
    append_conditions, facet_condition, filter_condition, limit_max_rows_per_page,
    override_pagination, replace_sort, with_pagination,
};
use super::error::{TranslationError, TranslationResult};
use super::mapper::TableAndColumnMapper;
use super::parser::parse_query;
use super::provider::{index_description, SchemaProvider};
use super::request::QueryRequest;
use super::select::{max_row_size_bytes, select_columns};
use super::translator::{derived_columns, translate, translate_count, CountQuery, TranslatedQuery, TranslationOptions};
use super::ast::QuerySpecification;

/// Translates [`QueryRequest`]s against a schema registry.
#[derive(Debug, Clone)]
pub struct QueryOrchestrator<P> {
    provider: P,
    max_bytes_per_page: Option<i64>,
}

impl<P: SchemaProvider> QueryOrchestrator<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            max_bytes_per_page: None,
        }
    }

    /// Byte budget used when a request does not carry its own.
    pub fn with_max_bytes_per_page(mut self, max_bytes: i64) -> Self {
        self.max_bytes_per_page = Some(max_bytes);
        self
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Parse and map the request's query and apply filters and facets.
    pub fn prepare(
        &self,
        request: &QueryRequest,
    ) -> TranslationResult<(QuerySpecification, TableAndColumnMapper)> {
        let query = parse_query(&request.sql)?;
        let mapper = TableAndColumnMapper::new(&query, &self.provider)?;

        let mut conditions = request
            .additional_filters
            .iter()
            .map(filter_condition)
            .collect::<TranslationResult<Vec<_>>>()?;
        for selection in &request.selected_facets {
            if let Some(condition) = facet_condition(selection, &mapper)? {
                conditions.push(condition);
            }
        }
        if !conditions.is_empty() {
            debug!(conditions = conditions.len(), "adding request conditions");
        }
        Ok((append_conditions(&query, conditions), mapper))
    }

    /// Translate one page of results.
    pub fn translate(&self, request: &QueryRequest) -> TranslationResult<TranslatedQuery> {
        let (query, mapper) = self.prepare(request)?;
        let query = replace_sort(&query, &request.sort);

        let mut pagination = override_pagination(query.pagination, request.offset, request.limit)?;
        if let Some(max_bytes) = request.max_bytes_per_page.or(self.max_bytes_per_page) {
            let columns = derived_columns(&query, &mapper);
            let selects = select_columns(&columns, &mapper, query.is_aggregate())?;
            let row_size = max_row_size_bytes(&selects).max(1);
            let max_rows = (max_bytes / row_size).max(1);
            debug!(max_bytes, row_size, max_rows, "clamping page size");
            pagination = Some(limit_max_rows_per_page(pagination, max_rows));
        }
        let query = with_pagination(&query, pagination);

        let table = mapper
            .tables()
            .first()
            .ok_or_else(|| TranslationError::UnknownTable(request.sql.clone()))?;
        let description = index_description(table.id, request.table_type);
        translate(
            &query,
            &mapper,
            description.as_ref(),
            TranslationOptions {
                context: request.context,
                include_etag: request.include_etag,
            },
        )
    }

    /// Count of all rows the request matches, across pages.
    pub fn translate_count(&self, request: &QueryRequest) -> TranslationResult<Option<CountQuery>> {
        let (query, mapper) = self.prepare(request)?;
        translate_count(&query, &mapper, request.context)
    }
}
