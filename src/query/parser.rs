//! Query text to [`QuerySpecification`].
//!
//! Parsing is delegated to sqlparser with the generic dialect; the
//! resulting statement is then narrowed to the supported subset. Anything
//! outside it is rejected here, so the translator only ever sees trees it
//! can handle.

use sqlparser::ast::{
    self as sql, BinaryOperator as SqlBinaryOp, Expr as SqlExpr, UnaryOperator as SqlUnaryOp,
    Value as SqlValue,
};
use sqlparser::dialect::GenericDialect;
use sqlparser::parser::Parser;

use super::ast::*;
use super::error::{TranslationError, TranslationResult};

fn unsupported(what: impl ToString) -> TranslationError {
    TranslationError::Unsupported(what.to_string())
}

/// Parse a single SELECT statement.
///
/// # Examples
///
/// ```
/// use quarry::query::parse_query;
///
/// let query = parse_query("select score from syn123 where score > 0.5").unwrap();
/// assert_eq!(query.to_string(), "SELECT score FROM syn123 WHERE score > 0.5");
/// ```
pub fn parse_query(text: &str) -> TranslationResult<QuerySpecification> {
    let dialect = GenericDialect {};
    let statements =
        Parser::parse_sql(&dialect, text).map_err(|e| TranslationError::Parse(e.to_string()))?;

    let [statement] = statements.as_slice() else {
        return Err(TranslationError::Parse(
            "expected exactly one statement".to_string(),
        ));
    };
    match statement {
        sql::Statement::Query(query) => convert_query(query),
        other => Err(unsupported(format!("statement: {}", other))),
    }
}

fn convert_query(query: &sql::Query) -> TranslationResult<QuerySpecification> {
    if query.with.is_some() {
        return Err(unsupported("WITH"));
    }
    if query.fetch.is_some() || !query.limit_by.is_empty() || !query.locks.is_empty() {
        return Err(unsupported(query));
    }
    let select = match query.body.as_ref() {
        sql::SetExpr::Select(select) => select,
        sql::SetExpr::SetOperation { .. } => return Err(unsupported("UNION")),
        other => return Err(unsupported(other)),
    };
    if select.top.is_some() || select.into.is_some() || select.qualify.is_some() {
        return Err(unsupported(select));
    }

    let distinct = match &select.distinct {
        None => false,
        Some(sql::Distinct::Distinct) => true,
        Some(other) => return Err(unsupported(other)),
    };

    let select_list = convert_select_list(&select.projection)?;
    let from = convert_from(&select.from)?;
    let where_clause = select.selection.as_ref().map(convert_condition).transpose()?;

    let group_by = match &select.group_by {
        sql::GroupByExpr::Expressions(exprs, modifiers) if modifiers.is_empty() => exprs
            .iter()
            .map(convert_column)
            .collect::<TranslationResult<Vec<_>>>()?,
        other => return Err(unsupported(other)),
    };
    let having = select.having.as_ref().map(convert_condition).transpose()?;

    let order_by = match &query.order_by {
        None => Vec::new(),
        Some(order_by) => order_by
            .exprs
            .iter()
            .map(convert_sort)
            .collect::<TranslationResult<Vec<_>>>()?,
    };

    let limit = query.limit.as_ref().map(convert_count).transpose()?;
    let offset = query
        .offset
        .as_ref()
        .map(|o| convert_count(&o.value))
        .transpose()?;
    let pagination = match (limit, offset) {
        (Some(limit), offset) => Some(Pagination { limit, offset }),
        (None, None) => None,
        (None, Some(_)) => return Err(unsupported("OFFSET without LIMIT")),
    };

    Ok(QuerySpecification {
        distinct,
        select_list,
        from,
        where_clause,
        group_by,
        having,
        order_by,
        pagination,
    })
}

fn convert_select_list(items: &[sql::SelectItem]) -> TranslationResult<SelectList> {
    if let [sql::SelectItem::Wildcard(_)] = items {
        return Ok(SelectList::Asterisk);
    }
    let columns = items
        .iter()
        .map(|item| match item {
            sql::SelectItem::UnnamedExpr(expr) => Ok(DerivedColumn::new(convert_value(expr)?)),
            sql::SelectItem::ExprWithAlias { expr, alias } => Ok(DerivedColumn {
                expr: convert_value(expr)?,
                alias: Some(alias.value.clone()),
            }),
            other => Err(unsupported(other)),
        })
        .collect::<TranslationResult<Vec<_>>>()?;
    Ok(SelectList::Columns(columns))
}

fn convert_from(from: &[sql::TableWithJoins]) -> TranslationResult<FromClause> {
    let [table] = from else {
        return Err(unsupported("FROM must name exactly one table expression"));
    };
    let joins = table
        .joins
        .iter()
        .map(|join| {
            let (kind, constraint) = match &join.join_operator {
                sql::JoinOperator::Inner(c) => (JoinKind::Inner, c),
                sql::JoinOperator::LeftOuter(c) => (JoinKind::LeftOuter, c),
                sql::JoinOperator::RightOuter(c) => (JoinKind::RightOuter, c),
                _ => return Err(unsupported("join type")),
            };
            let on = match constraint {
                sql::JoinConstraint::On(expr) => convert_condition(expr)?,
                _ => return Err(unsupported("join without ON")),
            };
            Ok(Join {
                kind,
                table: convert_table(&join.relation)?,
                on,
            })
        })
        .collect::<TranslationResult<Vec<_>>>()?;
    Ok(FromClause {
        table: convert_table(&table.relation)?,
        joins,
    })
}

fn convert_table(factor: &sql::TableFactor) -> TranslationResult<TableReference> {
    match factor {
        sql::TableFactor::Table { name, alias, .. } => {
            let parts: Vec<&str> = name.0.iter().map(|i| i.value.as_str()).collect();
            Ok(TableReference {
                name: parts.join("."),
                alias: alias.as_ref().map(|a| a.name.value.clone()),
            })
        }
        other => Err(unsupported(other)),
    }
}

fn convert_column(expr: &SqlExpr) -> TranslationResult<ColumnReference> {
    match expr {
        SqlExpr::Identifier(ident) => Ok(ColumnReference {
            qualifier: None,
            name: ident.value.clone(),
            quoted: ident.quote_style.is_some(),
        }),
        SqlExpr::CompoundIdentifier(idents) => match idents.as_slice() {
            [qualifier, column] => Ok(ColumnReference {
                qualifier: Some(qualifier.value.clone()),
                name: column.value.clone(),
                quoted: column.quote_style.is_some(),
            }),
            _ => Err(unsupported(expr)),
        },
        SqlExpr::Nested(inner) => convert_column(inner),
        other => Err(unsupported(format!("expected a column reference: {}", other))),
    }
}

fn convert_sort(item: &sql::OrderByExpr) -> TranslationResult<SortSpecification> {
    if item.nulls_first.is_some() {
        return Err(unsupported("NULLS FIRST/LAST"));
    }
    Ok(SortSpecification {
        column: convert_column(&item.expr)?,
        direction: item.asc.map(|asc| {
            if asc {
                SortDirection::Asc
            } else {
                SortDirection::Desc
            }
        }),
    })
}

fn convert_count(expr: &SqlExpr) -> TranslationResult<i64> {
    match expr {
        SqlExpr::Value(SqlValue::Number(n, _)) => n
            .parse::<i64>()
            .map_err(|_| unsupported(format!("pagination value {}", n))),
        other => Err(unsupported(format!("pagination value {}", other))),
    }
}

// ============================================================================
// Conditions
// ============================================================================

fn convert_comparison(op: &SqlBinaryOp) -> Option<ComparisonOperator> {
    match op {
        SqlBinaryOp::Eq => Some(ComparisonOperator::Eq),
        SqlBinaryOp::NotEq => Some(ComparisonOperator::NotEq),
        SqlBinaryOp::Lt => Some(ComparisonOperator::Lt),
        SqlBinaryOp::Gt => Some(ComparisonOperator::Gt),
        SqlBinaryOp::LtEq => Some(ComparisonOperator::LtEq),
        SqlBinaryOp::GtEq => Some(ComparisonOperator::GtEq),
        _ => None,
    }
}

fn convert_condition(expr: &SqlExpr) -> TranslationResult<SearchCondition> {
    let predicate = match expr {
        SqlExpr::BinaryOp {
            left,
            op: SqlBinaryOp::And,
            right,
        } => return Ok(convert_condition(left)?.and(convert_condition(right)?)),
        SqlExpr::BinaryOp {
            left,
            op: SqlBinaryOp::Or,
            right,
        } => return Ok(convert_condition(left)?.or(convert_condition(right)?)),
        SqlExpr::UnaryOp {
            op: SqlUnaryOp::Not,
            expr,
        } => return Ok(SearchCondition::Not(Box::new(convert_condition(expr)?))),
        SqlExpr::Nested(inner) => return Ok(convert_condition(inner)?.nested()),

        SqlExpr::BinaryOp { left, op, right } => {
            let op = convert_comparison(op).ok_or_else(|| unsupported(expr))?;
            Predicate::Comparison {
                left: convert_value(left)?,
                op,
                right: convert_value(right)?,
            }
        }
        SqlExpr::IsNull(inner) | SqlExpr::IsNotNull(inner) => Predicate::IsNull {
            expr: convert_value(inner)?,
            negated: matches!(expr, SqlExpr::IsNotNull(_)),
        },
        SqlExpr::IsTrue(inner) => is_boolean(inner, false, true)?,
        SqlExpr::IsNotTrue(inner) => is_boolean(inner, true, true)?,
        SqlExpr::IsFalse(inner) => is_boolean(inner, false, false)?,
        SqlExpr::IsNotFalse(inner) => is_boolean(inner, true, false)?,
        SqlExpr::Between {
            expr,
            negated,
            low,
            high,
        } => Predicate::Between {
            expr: convert_value(expr)?,
            negated: *negated,
            low: convert_value(low)?,
            high: convert_value(high)?,
        },
        SqlExpr::InList {
            expr,
            list,
            negated,
        } => Predicate::InList {
            expr: convert_value(expr)?,
            negated: *negated,
            list: list
                .iter()
                .map(convert_value)
                .collect::<TranslationResult<Vec<_>>>()?,
        },
        SqlExpr::Like {
            negated,
            expr,
            pattern,
            escape_char,
            ..
        } => Predicate::Like {
            expr: convert_value(expr)?,
            negated: *negated,
            pattern: convert_value(pattern)?,
            escape: escape_char.as_ref().map(ToString::to_string),
        },
        SqlExpr::Function(func) => {
            let name = func.name.to_string();
            let function = BooleanFunction::from_name(&name)
                .ok_or(TranslationError::UnknownFunction(name))?;
            let args = function_arguments(func)?;
            let [FunctionArgument::Expr(arg)] = args.as_slice() else {
                return Err(unsupported(format!(
                    "{} takes exactly one column",
                    function.name()
                )));
            };
            Predicate::BooleanFunction {
                function,
                column: convert_column(arg)?,
            }
        }
        other => return Err(unsupported(format!("search condition {}", other))),
    };
    Ok(SearchCondition::Predicate(predicate))
}

fn is_boolean(inner: &SqlExpr, negated: bool, value: bool) -> TranslationResult<Predicate> {
    Ok(Predicate::IsBoolean {
        expr: convert_value(inner)?,
        negated,
        value,
    })
}

// ============================================================================
// Value expressions
// ============================================================================

enum FunctionArgument<'a> {
    Expr(&'a SqlExpr),
    Wildcard,
}

fn function_arguments(func: &sql::Function) -> TranslationResult<Vec<FunctionArgument<'_>>> {
    if func.over.is_some() || func.filter.is_some() || !func.within_group.is_empty() {
        return Err(unsupported(func));
    }
    match &func.args {
        sql::FunctionArguments::None => Ok(Vec::new()),
        sql::FunctionArguments::List(list) => list
            .args
            .iter()
            .map(|arg| match arg {
                sql::FunctionArg::Unnamed(sql::FunctionArgExpr::Expr(e)) => {
                    Ok(FunctionArgument::Expr(e))
                }
                sql::FunctionArg::Unnamed(sql::FunctionArgExpr::Wildcard) => {
                    Ok(FunctionArgument::Wildcard)
                }
                other => Err(unsupported(other)),
            })
            .collect(),
        sql::FunctionArguments::Subquery(_) => Err(unsupported("subquery arguments")),
    }
}

fn is_distinct(func: &sql::Function) -> bool {
    matches!(
        &func.args,
        sql::FunctionArguments::List(sql::FunctionArgumentList {
            duplicate_treatment: Some(sql::DuplicateTreatment::Distinct),
            ..
        })
    )
}

fn convert_function(func: &sql::Function) -> TranslationResult<ValueExpression> {
    let name = func.name.to_string();
    let args = function_arguments(func)?;

    if let Some(function) = SetFunction::from_name(&name) {
        let argument = match (function, args.as_slice()) {
            (SetFunction::Count, [FunctionArgument::Wildcard]) => None,
            (_, [FunctionArgument::Expr(e)]) => Some(Box::new(convert_value(e)?)),
            _ => {
                return Err(unsupported(format!(
                    "{} takes exactly one argument",
                    function.name()
                )))
            }
        };
        return Ok(ValueExpression::SetFunction {
            function,
            distinct: is_distinct(func),
            argument,
        });
    }

    let function = ScalarFunction::from_name(&name).ok_or(TranslationError::UnknownFunction(name))?;
    if is_distinct(func) {
        return Err(unsupported(format!("DISTINCT in {}", function.name())));
    }
    let arguments = args
        .iter()
        .map(|arg| match arg {
            FunctionArgument::Expr(e) => convert_value(e),
            FunctionArgument::Wildcard => Err(unsupported(format!("* in {}", function.name()))),
        })
        .collect::<TranslationResult<Vec<_>>>()?;
    Ok(ValueExpression::Function {
        function,
        arguments,
    })
}

fn convert_literal(value: &SqlValue) -> TranslationResult<Literal> {
    match value {
        SqlValue::Number(n, _) => Ok(Literal::Number(n.clone())),
        SqlValue::SingleQuotedString(s) => Ok(Literal::String(s.clone())),
        SqlValue::Boolean(b) => Ok(Literal::Boolean(*b)),
        SqlValue::Null => Ok(Literal::Null),
        other => Err(unsupported(format!("literal {}", other))),
    }
}

fn convert_value(expr: &SqlExpr) -> TranslationResult<ValueExpression> {
    match expr {
        SqlExpr::Identifier(_) | SqlExpr::CompoundIdentifier(_) => {
            convert_column(expr).map(ValueExpression::Column)
        }
        SqlExpr::Value(value) => convert_literal(value).map(ValueExpression::Literal),
        SqlExpr::BinaryOp { left, op, right } => {
            let op = match op {
                SqlBinaryOp::Plus => ArithmeticOperator::Add,
                SqlBinaryOp::Minus => ArithmeticOperator::Subtract,
                SqlBinaryOp::Multiply => ArithmeticOperator::Multiply,
                SqlBinaryOp::Divide => ArithmeticOperator::Divide,
                SqlBinaryOp::Modulo => ArithmeticOperator::Modulo,
                _ => return Err(unsupported(format!("operator {} in a value", op))),
            };
            Ok(ValueExpression::Arithmetic {
                left: Box::new(convert_value(left)?),
                op,
                right: Box::new(convert_value(right)?),
            })
        }
        SqlExpr::UnaryOp {
            op: SqlUnaryOp::Minus,
            expr,
        } => match expr.as_ref() {
            SqlExpr::Value(SqlValue::Number(n, _)) => {
                Ok(ValueExpression::Literal(Literal::Number(format!("-{}", n))))
            }
            inner => Ok(ValueExpression::Negative(Box::new(convert_value(inner)?))),
        },
        SqlExpr::UnaryOp {
            op: SqlUnaryOp::Plus,
            expr,
        } => convert_value(expr),
        SqlExpr::Nested(inner) => Ok(ValueExpression::Nested(Box::new(convert_value(inner)?))),
        SqlExpr::Function(func) => convert_function(func),
        SqlExpr::Trim {
            expr,
            trim_where: None,
            trim_what: None,
            ..
        } => Ok(ValueExpression::Function {
            function: ScalarFunction::Trim,
            arguments: vec![convert_value(expr)?],
        }),
        other => Err(unsupported(format!("expression {}", other))),
    }
}
