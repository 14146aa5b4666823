//! Select-column descriptors returned with a translated query.

use serde::{Deserialize, Serialize};

use crate::model::{ColumnId, ColumnType};
use crate::sql::naming;
use crate::types::max_size_for_type;

use super::ast::{DerivedColumn, ScalarFunction, SetFunction, ValueExpression};
use super::error::TranslationResult;
use super::mapper::{ResolvedColumn, TableAndColumnMapper};

/// Where a select column's values come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectColumnKind {
    /// A schema column selected under its own name.
    Schema,
    /// Computed, aggregated or renamed.
    Derived,
    /// Row id, version, etag or benefactor.
    Metadata,
}

/// One column of the result set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectColumn {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column_type: Option<ColumnType>,
    /// Logical column id, set only when the column maps one-to-one onto a
    /// schema column.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ColumnId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_size: Option<i64>,
}

impl SelectColumn {
    pub fn kind(&self) -> SelectColumnKind {
        if self.id.is_some() {
            SelectColumnKind::Schema
        } else if naming::reserved_column_name(&self.name).is_some() {
            SelectColumnKind::Metadata
        } else {
            SelectColumnKind::Derived
        }
    }

    /// Worst-case serialized size of one value.
    pub fn max_bytes(&self) -> i64 {
        max_size_for_type(self.column_type, self.max_size)
    }
}

/// Worst-case serialized size of one result row.
pub fn max_row_size_bytes(columns: &[SelectColumn]) -> i64 {
    columns.iter().map(SelectColumn::max_bytes).sum()
}

/// Describe each select-list entry.
///
/// Ids are cleared on every column of an aggregated query, and on every
/// column as soon as one column has none.
pub fn select_columns(
    columns: &[DerivedColumn],
    mapper: &TableAndColumnMapper,
    is_aggregate: bool,
) -> TranslationResult<Vec<SelectColumn>> {
    let mut selects = columns
        .iter()
        .map(|column| select_column(column, mapper))
        .collect::<TranslationResult<Vec<_>>>()?;
    if is_aggregate || selects.iter().any(|s| s.id.is_none()) {
        for select in &mut selects {
            select.id = None;
        }
    }
    Ok(selects)
}

fn select_column(column: &DerivedColumn, mapper: &TableAndColumnMapper) -> TranslationResult<SelectColumn> {
    let name = column.display_name();
    if let Some(reference) = column.expr.as_column() {
        let resolved = mapper.lookup(reference)?;
        let id = match &resolved {
            ResolvedColumn::Schema { model, .. } if model.name == name => Some(model.id),
            _ => None,
        };
        return Ok(SelectColumn {
            name,
            column_type: Some(resolved.column_type()),
            id,
            max_size: resolved.model().and_then(|m| m.max_size),
        });
    }
    let (column_type, max_size) = expression_type(&column.expr, mapper)?;
    Ok(SelectColumn {
        name,
        column_type,
        id: None,
        max_size,
    })
}

type TypeAndSize = (Option<ColumnType>, Option<i64>);

/// Result type of a derived expression, where it can be known.
fn expression_type(expr: &ValueExpression, mapper: &TableAndColumnMapper) -> TranslationResult<TypeAndSize> {
    let first_argument = |arguments: &[ValueExpression]| match arguments.first() {
        Some(argument) => expression_type(argument, mapper),
        None => Ok((None, None)),
    };
    Ok(match expr {
        ValueExpression::Column(reference) => {
            let resolved = mapper.lookup(reference)?;
            (
                Some(resolved.column_type()),
                resolved.model().and_then(|m| m.max_size),
            )
        }
        ValueExpression::Literal(_) | ValueExpression::Arithmetic { .. } => (None, None),
        ValueExpression::Negative(inner) | ValueExpression::Nested(inner) => {
            expression_type(inner, mapper)?
        }
        ValueExpression::SetFunction {
            function, argument, ..
        } => match function {
            SetFunction::Count => (Some(ColumnType::Integer), None),
            SetFunction::Avg => (Some(ColumnType::Double), None),
            SetFunction::Sum | SetFunction::Min | SetFunction::Max => match argument {
                Some(argument) => expression_type(argument, mapper)?,
                None => (None, None),
            },
        },
        ValueExpression::Function {
            function,
            arguments,
        } => match function {
            ScalarFunction::Length | ScalarFunction::UnixTimestamp => {
                (Some(ColumnType::Integer), None)
            }
            ScalarFunction::Upper
            | ScalarFunction::Lower
            | ScalarFunction::Trim
            | ScalarFunction::Round
            | ScalarFunction::Abs
            | ScalarFunction::Coalesce
            | ScalarFunction::IfNull => first_argument(arguments)?,
            ScalarFunction::Concat
            | ScalarFunction::Now
            | ScalarFunction::FromUnixtime
            | ScalarFunction::DateFormat => (Some(ColumnType::String), None),
        },
    })
}
