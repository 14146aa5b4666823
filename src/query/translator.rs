//! Physical SQL generation.
//!
//! Walks a [`QuerySpecification`] in textual order and emits the physical
//! statement as a [`TokenStream`]. Every literal becomes a `:b<n>` bind
//! recorded in a parameter map owned by the single translation; nothing
//! the caller wrote is ever inlined.

use serde::Serialize;
use tracing::debug;

use crate::model::{ColumnId, ColumnType, IdAndVersion};
use crate::sql::dml::BindMap;
use crate::sql::naming::{self, ROW_ETAG, ROW_ID};
use crate::sql::token::{Token, TokenStream};
use crate::types::{ColumnTypeInfo, DbValue, NonFiniteTag};

use super::ast::*;
use super::error::{TranslationError, TranslationResult};
use super::mapper::{ResolvedColumn, TableAndColumnMapper};
use super::provider::{IndexDescription, SqlContext};
use super::select::{max_row_size_bytes, select_columns, SelectColumn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TranslationOptions {
    pub context: SqlContext,
    /// Return the row etag of views alongside id and version.
    pub include_etag: bool,
}

/// The physical statement for one query, immutable once built.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslatedQuery {
    pub sql: String,
    pub parameters: BindMap,
    pub select_columns: Vec<SelectColumn>,
    pub includes_row_id_and_version: bool,
    pub include_etag: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub single_table_id: Option<IdAndVersion>,
    pub is_aggregate: bool,
    pub max_row_size_bytes: i64,
}

/// Statement counting the rows a query would return across all pages.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountQuery {
    pub sql: String,
    pub parameters: BindMap,
}

/// Expanded select list: `*` becomes one reference per schema column.
pub fn derived_columns(query: &QuerySpecification, mapper: &TableAndColumnMapper) -> Vec<DerivedColumn> {
    match &query.select_list {
        SelectList::Asterisk => mapper.expand_asterisk(),
        SelectList::Columns(columns) => columns.clone(),
    }
}

fn check_context(query: &QuerySpecification, context: SqlContext) -> TranslationResult<()> {
    if !query.from.joins.is_empty() && context != SqlContext::Build {
        return Err(TranslationError::JoinNotSupported);
    }
    Ok(())
}

/// Translate a query into its physical statement.
pub fn translate(
    query: &QuerySpecification,
    mapper: &TableAndColumnMapper,
    description: &dyn IndexDescription,
    options: TranslationOptions,
) -> TranslationResult<TranslatedQuery> {
    check_context(query, options.context)?;

    let is_aggregate = query.is_aggregate();
    let columns = derived_columns(query, mapper);
    let selects = select_columns(&columns, mapper, is_aggregate)?;
    let metadata =
        description.columns_to_add_to_select(options.context, options.include_etag, is_aggregate);

    let mut writer = SqlWriter::new(mapper);
    let mut items = columns
        .iter()
        .map(|column| writer.select_item(column))
        .collect::<TranslationResult<Vec<_>>>()?;
    for name in &metadata {
        items.push(writer.physical(0, name));
    }

    let mut sql = TokenStream::new();
    sql.push(Token::Select).space();
    if query.distinct {
        sql.push(Token::Distinct).space();
    }
    sql.comma_separated(&items);
    sql.space().push(Token::From).space();
    let from = writer.from_clause(&query.from)?;
    sql.append(&from);
    writer.where_clause(&mut sql, query.where_clause.as_ref())?;
    writer.group_by(&mut sql, &query.group_by, &columns)?;
    if let Some(having) = &query.having {
        let condition = writer.condition(having)?;
        sql.space().push(Token::Having).space().append(&condition);
    }
    writer.order_by(&mut sql, &query.order_by, &columns)?;
    if let Some(pagination) = &query.pagination {
        writer.pagination(&mut sql, pagination)?;
    }

    let sql = sql.serialize();
    debug!(sql = %sql, parameters = writer.parameters.len(), "translated query");
    Ok(TranslatedQuery {
        sql,
        parameters: writer.parameters,
        max_row_size_bytes: max_row_size_bytes(&selects),
        select_columns: selects,
        includes_row_id_and_version: metadata.contains(&ROW_ID),
        include_etag: metadata.contains(&ROW_ETAG),
        single_table_id: mapper.single_table_id(),
        is_aggregate,
    })
}

/// Count of all rows matching a query, ignoring pagination.
///
/// `None` for an aggregate without grouping, which always yields one row.
pub fn translate_count(
    query: &QuerySpecification,
    mapper: &TableAndColumnMapper,
    context: SqlContext,
) -> TranslationResult<Option<CountQuery>> {
    check_context(query, context)?;

    let mut writer = SqlWriter::new(mapper);
    let mut sql = TokenStream::new();
    sql.push(Token::Select)
        .space()
        .push(Token::FunctionName(SetFunction::Count.name().into()))
        .lparen();
    if !query.group_by.is_empty() {
        let columns = derived_columns(query, mapper);
        let groups = query
            .group_by
            .iter()
            .map(|column| writer.group_key(column, &columns))
            .collect::<TranslationResult<Vec<_>>>()?;
        sql.push(Token::Distinct).space().comma_separated(&groups);
    } else if query.distinct {
        let values = derived_columns(query, mapper)
            .iter()
            .map(|column| writer.value(&column.expr, None))
            .collect::<TranslationResult<Vec<_>>>()?;
        sql.push(Token::Distinct).space().comma_separated(&values);
    } else if query.select_list.has_aggregate() {
        return Ok(None);
    } else {
        sql.push(Token::Star);
    }
    sql.rparen().space().push(Token::From).space();
    let from = writer.from_clause(&query.from)?;
    sql.append(&from);
    writer.where_clause(&mut sql, query.where_clause.as_ref())?;

    let sql = sql.serialize();
    debug!(sql = %sql, "translated count query");
    Ok(Some(CountQuery {
        sql,
        parameters: writer.parameters,
    }))
}

/// Bind value for a literal, typed by the column it is compared with.
fn literal_value(literal: &Literal, column_type: Option<ColumnType>) -> DbValue {
    match (literal, column_type) {
        (Literal::Null, _) => DbValue::Null,
        (Literal::Boolean(b), _) => DbValue::Bool(*b),
        (_, Some(t @ (ColumnType::Date | ColumnType::Boolean | ColumnType::EntityId))) => {
            let text = literal.text();
            match ColumnTypeInfo::for_type(t).parse_for_write(&text, None) {
                Ok(value) if !value.is_null() => value,
                _ => DbValue::Text(text),
            }
        }
        _ => DbValue::Text(literal.text()),
    }
}

fn comparison_token(op: ComparisonOperator) -> Token {
    match op {
        ComparisonOperator::Eq => Token::Eq,
        ComparisonOperator::NotEq => Token::Ne,
        ComparisonOperator::Lt => Token::Lt,
        ComparisonOperator::Gt => Token::Gt,
        ComparisonOperator::LtEq => Token::Lte,
        ComparisonOperator::GtEq => Token::Gte,
    }
}

fn arithmetic_token(op: ArithmeticOperator) -> Token {
    match op {
        ArithmeticOperator::Add => Token::Plus,
        ArithmeticOperator::Subtract => Token::Minus,
        ArithmeticOperator::Multiply => Token::Mul,
        ArithmeticOperator::Divide => Token::Div,
        ArithmeticOperator::Modulo => Token::Mod,
    }
}

// ============================================================================
// Writer
// ============================================================================

struct SqlWriter<'a> {
    mapper: &'a TableAndColumnMapper,
    parameters: BindMap,
}

impl<'a> SqlWriter<'a> {
    fn new(mapper: &'a TableAndColumnMapper) -> Self {
        Self {
            mapper,
            parameters: BindMap::new(),
        }
    }

    fn bind(&mut self, value: DbValue) -> Token {
        let name = naming::bind_name(self.parameters.len());
        self.parameters.insert(name.clone(), value);
        Token::Bind(name)
    }

    /// `[_A<n>.]<name>`
    fn physical(&self, table: usize, name: &str) -> TokenStream {
        let mut out = TokenStream::new();
        if let Some(qualifier) = self.mapper.table_qualifier(table) {
            out.ident(qualifier).push(Token::Dot);
        }
        out.ident(name);
        out
    }

    fn column(&self, resolved: &ResolvedColumn) -> TokenStream {
        self.physical(resolved.table(), &resolved.physical_name())
    }

    fn column_reference(&self, reference: &ColumnReference) -> TranslationResult<TokenStream> {
        Ok(self.column(&self.mapper.lookup(reference)?))
    }

    /// `CASE WHEN <shadow> IS NULL THEN <value> ELSE <shadow> END`
    fn double_case(&self, table: usize, id: ColumnId) -> TokenStream {
        let value = self.physical(table, &naming::column_name(id));
        let shadow = self.physical(table, &naming::double_shadow_name(id));
        let mut out = TokenStream::new();
        out.push(Token::Case)
            .space()
            .push(Token::When)
            .space()
            .append(&shadow)
            .space()
            .push(Token::Is)
            .space()
            .push(Token::Null)
            .space()
            .push(Token::Then)
            .space()
            .append(&value)
            .space()
            .push(Token::Else)
            .space()
            .append(&shadow)
            .space()
            .push(Token::End);
        out
    }

    fn select_item(&mut self, column: &DerivedColumn) -> TranslationResult<TokenStream> {
        if let Some(reference) = column.expr.as_column() {
            if let ResolvedColumn::Schema { table, model } = self.mapper.lookup(reference)? {
                if model.column_type == ColumnType::Double {
                    let mut out = self.double_case(table, model.id);
                    out.space().push(Token::As).space();
                    match (&column.alias, self.mapper.table_qualifier(table)) {
                        (Some(alias), _) => out.push(Token::QuotedIdent(alias.clone())),
                        (None, Some(qualifier)) => {
                            out.ident(format!("{}{}", qualifier, naming::column_name(model.id)))
                        }
                        (None, None) => out.ident(naming::column_name(model.id)),
                    };
                    return Ok(out);
                }
            }
        }
        let mut out = self.value(&column.expr, None)?;
        if let Some(alias) = &column.alias {
            out.space()
                .push(Token::As)
                .space()
                .push(Token::QuotedIdent(alias.clone()));
        }
        Ok(out)
    }

    fn table(&self, position: usize) -> TranslationResult<TokenStream> {
        let info = self
            .mapper
            .tables()
            .get(position)
            .ok_or_else(|| TranslationError::UnknownTable(position.to_string()))?;
        let mut out = TokenStream::new();
        out.ident(info.translated_name.clone());
        if let Some(alias) = &info.translated_alias {
            out.space().ident(alias.clone());
        }
        Ok(out)
    }

    fn from_clause(&mut self, from: &FromClause) -> TranslationResult<TokenStream> {
        let mut out = self.table(0)?;
        for (i, join) in from.joins.iter().enumerate() {
            out.space();
            match join.kind {
                JoinKind::Inner => out.push(Token::Join),
                JoinKind::LeftOuter => out.push(Token::Left).space().push(Token::Join),
                JoinKind::RightOuter => out.push(Token::Right).space().push(Token::Join),
            };
            let table = self.table(i + 1)?;
            let on = self.condition(&join.on)?;
            out.space()
                .append(&table)
                .space()
                .push(Token::On)
                .space()
                .append(&on);
        }
        Ok(out)
    }

    fn where_clause(
        &mut self,
        sql: &mut TokenStream,
        condition: Option<&SearchCondition>,
    ) -> TranslationResult<()> {
        if let Some(condition) = condition {
            let condition = self.condition(condition)?;
            sql.space().push(Token::Where).space().append(&condition);
        }
        Ok(())
    }

    /// A grouping name that is not a column stands for the select
    /// expression carrying that alias.
    fn group_key(
        &mut self,
        group: &ColumnReference,
        columns: &[DerivedColumn],
    ) -> TranslationResult<TokenStream> {
        match self.mapper.lookup(group) {
            Ok(resolved) => Ok(self.column(&resolved)),
            Err(TranslationError::UnknownColumn(name)) if group.qualifier.is_none() => {
                match columns.iter().find(|c| c.alias.as_deref() == Some(name.as_str())) {
                    Some(aliased) => self.value(&aliased.expr, None),
                    None => Err(TranslationError::UnknownColumn(name)),
                }
            }
            Err(e) => Err(e),
        }
    }

    fn group_by(
        &mut self,
        sql: &mut TokenStream,
        groups: &[ColumnReference],
        columns: &[DerivedColumn],
    ) -> TranslationResult<()> {
        if groups.is_empty() {
            return Ok(());
        }
        let keys = groups
            .iter()
            .map(|group| self.group_key(group, columns))
            .collect::<TranslationResult<Vec<_>>>()?;
        sql.space().push(Token::GroupBy).space().comma_separated(&keys);
        Ok(())
    }

    /// Sort keys resolve against the schema first, then select aliases.
    fn order_by(
        &self,
        sql: &mut TokenStream,
        sorts: &[SortSpecification],
        columns: &[DerivedColumn],
    ) -> TranslationResult<()> {
        if sorts.is_empty() {
            return Ok(());
        }
        let mut keys = Vec::with_capacity(sorts.len());
        for sort in sorts {
            let mut key = match self.mapper.lookup(&sort.column) {
                Ok(resolved) => self.column(&resolved),
                Err(TranslationError::UnknownColumn(name))
                    if sort.column.qualifier.is_none()
                        && columns.iter().any(|c| c.alias.as_deref() == Some(name.as_str())) =>
                {
                    let mut alias = TokenStream::new();
                    alias.push(Token::QuotedIdent(name));
                    alias
                }
                Err(e) => return Err(e),
            };
            match sort.direction {
                Some(SortDirection::Asc) => key.space().push(Token::Asc),
                Some(SortDirection::Desc) => key.space().push(Token::Desc),
                None => &mut key,
            };
            keys.push(key);
        }
        sql.space().push(Token::OrderBy).space().comma_separated(&keys);
        Ok(())
    }

    fn pagination(&mut self, sql: &mut TokenStream, pagination: &Pagination) -> TranslationResult<()> {
        if pagination.limit < 0 {
            return Err(TranslationError::NegativePagination("limit"));
        }
        let limit = self.bind(DbValue::Long(pagination.limit));
        sql.space().push(Token::Limit).space().push(limit);
        if let Some(offset) = pagination.offset {
            if offset < 0 {
                return Err(TranslationError::NegativePagination("offset"));
            }
            let offset = self.bind(DbValue::Long(offset));
            sql.space().push(Token::Offset).space().push(offset);
        }
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Values
    // ------------------------------------------------------------------------

    /// Logical type of a bare column reference, used to type its bound
    /// comparison values.
    fn column_type_of(&self, expr: &ValueExpression) -> TranslationResult<Option<ColumnType>> {
        match expr.as_column() {
            Some(reference) => Ok(Some(self.mapper.lookup(reference)?.column_type())),
            None => Ok(None),
        }
    }

    fn value(&mut self, expr: &ValueExpression, bind_type: Option<ColumnType>) -> TranslationResult<TokenStream> {
        let mut out = TokenStream::new();
        match expr {
            ValueExpression::Column(reference) => {
                out.append(&self.column_reference(reference)?);
            }
            ValueExpression::Literal(Literal::Null) => {
                out.push(Token::Null);
            }
            ValueExpression::Literal(literal) => {
                let bind = self.bind(literal_value(literal, bind_type));
                out.push(bind);
            }
            ValueExpression::Arithmetic { left, op, right } => {
                let left = self.value(left, None)?;
                let right = self.value(right, None)?;
                out.append(&left)
                    .space()
                    .push(arithmetic_token(*op))
                    .space()
                    .append(&right);
            }
            ValueExpression::Negative(inner) => {
                let inner = self.value(inner, bind_type)?;
                out.push(Token::Minus).append(&inner);
            }
            ValueExpression::Nested(inner) => {
                let inner = self.value(inner, bind_type)?;
                out.lparen().append(&inner).rparen();
            }
            ValueExpression::SetFunction {
                function,
                distinct,
                argument,
            } => {
                out.push(Token::FunctionName(function.name().into())).lparen();
                if *distinct {
                    out.push(Token::Distinct).space();
                }
                match argument {
                    Some(argument) => {
                        let argument = self.value(argument, None)?;
                        out.append(&argument);
                    }
                    None => {
                        out.push(Token::Star);
                    }
                }
                out.rparen();
            }
            ValueExpression::Function {
                function,
                arguments,
            } => {
                let arguments = arguments
                    .iter()
                    .map(|argument| self.value(argument, None))
                    .collect::<TranslationResult<Vec<_>>>()?;
                out.push(Token::FunctionName(function.name().into()))
                    .lparen()
                    .comma_separated(&arguments)
                    .rparen();
            }
        }
        Ok(out)
    }

    // ------------------------------------------------------------------------
    // Conditions
    // ------------------------------------------------------------------------

    fn condition(&mut self, condition: &SearchCondition) -> TranslationResult<TokenStream> {
        let mut out = TokenStream::new();
        match condition {
            SearchCondition::Or(left, right) | SearchCondition::And(left, right) => {
                let keyword = match condition {
                    SearchCondition::Or(..) => Token::Or,
                    _ => Token::And,
                };
                let left = self.condition(left)?;
                let right = self.condition(right)?;
                out.append(&left).space().push(keyword).space().append(&right);
            }
            SearchCondition::Not(inner) => {
                let inner = self.condition(inner)?;
                out.push(Token::Not).space().append(&inner);
            }
            SearchCondition::Nested(inner) => {
                let inner = self.condition(inner)?;
                out.lparen().append(&inner).rparen();
            }
            SearchCondition::Predicate(predicate) => {
                out.append(&self.predicate(predicate)?);
            }
        }
        Ok(out)
    }

    fn not(out: &mut TokenStream, negated: bool) {
        if negated {
            out.push(Token::Not).space();
        }
    }

    fn predicate(&mut self, predicate: &Predicate) -> TranslationResult<TokenStream> {
        let mut out = TokenStream::new();
        match predicate {
            Predicate::Comparison { left, op, right } => {
                let bind_type = self.column_type_of(left)?;
                let left = self.value(left, None)?;
                let right = self.value(right, bind_type)?;
                out.append(&left)
                    .space()
                    .push(comparison_token(*op))
                    .space()
                    .append(&right);
            }
            Predicate::Between {
                expr,
                negated,
                low,
                high,
            } => {
                let bind_type = self.column_type_of(expr)?;
                let expr = self.value(expr, None)?;
                let low = self.value(low, bind_type)?;
                let high = self.value(high, bind_type)?;
                out.append(&expr).space();
                Self::not(&mut out, *negated);
                out.push(Token::Between)
                    .space()
                    .append(&low)
                    .space()
                    .push(Token::And)
                    .space()
                    .append(&high);
            }
            Predicate::InList {
                expr,
                negated,
                list,
            } => {
                let bind_type = self.column_type_of(expr)?;
                let expr = self.value(expr, None)?;
                let list = list
                    .iter()
                    .map(|item| self.value(item, bind_type))
                    .collect::<TranslationResult<Vec<_>>>()?;
                out.append(&expr).space();
                Self::not(&mut out, *negated);
                out.push(Token::In).space().lparen().comma_separated(&list).rparen();
            }
            Predicate::Like {
                expr,
                negated,
                pattern,
                escape,
            } => {
                let expr = self.value(expr, None)?;
                let pattern = self.value(pattern, None)?;
                out.append(&expr).space();
                Self::not(&mut out, *negated);
                out.push(Token::Like).space().append(&pattern);
                if let Some(escape) = escape {
                    let escape = self.bind(DbValue::Text(escape.clone()));
                    out.space().push(Token::Escape).space().push(escape);
                }
            }
            Predicate::IsNull { expr, negated } => {
                let expr = self.value(expr, None)?;
                out.append(&expr).space().push(Token::Is).space();
                Self::not(&mut out, *negated);
                out.push(Token::Null);
            }
            Predicate::IsBoolean {
                expr,
                negated,
                value,
            } => {
                let expr = self.value(expr, None)?;
                out.append(&expr).space().push(Token::Is).space();
                Self::not(&mut out, *negated);
                out.push(if *value { Token::True } else { Token::False });
            }
            Predicate::BooleanFunction { function, column } => {
                out.append(&self.boolean_function(*function, column)?);
            }
        }
        Ok(out)
    }

    /// `isNaN` and `isInfinity` test the shadow column of a DOUBLE.
    fn boolean_function(
        &self,
        function: BooleanFunction,
        column: &ColumnReference,
    ) -> TranslationResult<TokenStream> {
        let (table, model) = match self.mapper.lookup(column)? {
            ResolvedColumn::Schema { table, model } => (table, model),
            ResolvedColumn::Metadata { .. } => {
                return Err(TranslationError::NotASchemaColumn(function.name().into()))
            }
        };
        if model.column_type != ColumnType::Double {
            return Err(TranslationError::NotADoubleColumn {
                function: function.name().into(),
                column_type: model.column_type,
            });
        }
        let shadow = self.physical(table, &naming::double_shadow_name(model.id));
        let mut out = TokenStream::new();
        out.lparen()
            .append(&shadow)
            .space()
            .push(Token::Is)
            .space()
            .push(Token::Not)
            .space()
            .push(Token::Null)
            .space()
            .push(Token::And)
            .space()
            .append(&shadow)
            .space();
        match function {
            BooleanFunction::IsNaN => {
                out.push(Token::Eq)
                    .space()
                    .push(Token::LitString(NonFiniteTag::NaN.as_str().into()));
            }
            BooleanFunction::IsInfinity => {
                let tags = [NonFiniteTag::NegativeInfinity, NonFiniteTag::Infinity].map(|tag| {
                    let mut literal = TokenStream::new();
                    literal.push(Token::LitString(tag.as_str().into()));
                    literal
                });
                out.push(Token::In).space().lparen().comma_separated(&tags).rparen();
            }
        }
        out.rparen();
        Ok(out)
    }
}
