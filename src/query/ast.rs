//! Table query model.
//!
//! A closed sum-type tree for the supported query subset. Trees are built
//! by [`parser`](super::parser) or by the request edits, never mutated in
//! place, and render back to query text through `Display` such that
//! parsing the rendered text yields an equal tree.

use serde::{Deserialize, Serialize};
use std::fmt;

/// `SELECT ... FROM ... [WHERE] [GROUP BY] [HAVING] [ORDER BY] [LIMIT/OFFSET]`
#[derive(Debug, Clone, PartialEq)]
pub struct QuerySpecification {
    pub distinct: bool,
    pub select_list: SelectList,
    pub from: FromClause,
    pub where_clause: Option<SearchCondition>,
    pub group_by: Vec<ColumnReference>,
    pub having: Option<SearchCondition>,
    pub order_by: Vec<SortSpecification>,
    pub pagination: Option<Pagination>,
}

impl QuerySpecification {
    /// Aggregated results do not map onto table rows.
    pub fn is_aggregate(&self) -> bool {
        self.distinct || !self.group_by.is_empty() || self.select_list.has_aggregate()
    }

    /// Every table reference in FROM order.
    pub fn tables(&self) -> impl Iterator<Item = &TableReference> {
        std::iter::once(&self.from.table).chain(self.from.joins.iter().map(|j| &j.table))
    }
}

// ============================================================================
// Select list
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum SelectList {
    Asterisk,
    Columns(Vec<DerivedColumn>),
}

impl SelectList {
    pub fn has_aggregate(&self) -> bool {
        match self {
            SelectList::Asterisk => false,
            SelectList::Columns(columns) => columns.iter().any(|c| c.expr.contains_aggregate()),
        }
    }
}

/// One select-list entry: `<expr> [AS alias]`.
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedColumn {
    pub expr: ValueExpression,
    pub alias: Option<String>,
}

impl DerivedColumn {
    pub fn new(expr: ValueExpression) -> Self {
        Self { expr, alias: None }
    }

    /// Name the column is returned under.
    pub fn display_name(&self) -> String {
        if let Some(alias) = &self.alias {
            return alias.clone();
        }
        match &self.expr {
            ValueExpression::Column(column) => column.name.clone(),
            other => other.to_string(),
        }
    }
}

// ============================================================================
// FROM
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct FromClause {
    pub table: TableReference,
    pub joins: Vec<Join>,
}

/// `syn123 [alias]` or `"syn123.4" [alias]`.
#[derive(Debug, Clone, PartialEq)]
pub struct TableReference {
    /// Table reference text as written, without quotes.
    pub name: String,
    pub alias: Option<String>,
}

impl TableReference {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            alias: None,
        }
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    LeftOuter,
    RightOuter,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    pub kind: JoinKind,
    pub table: TableReference,
    pub on: SearchCondition,
}

// ============================================================================
// Value expressions
// ============================================================================

/// `[qualifier.]name`, optionally double quoted.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnReference {
    pub qualifier: Option<String>,
    pub name: String,
    pub quoted: bool,
}

impl ColumnReference {
    /// Quoted reference to a column by display name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            qualifier: None,
            name: name.into(),
            quoted: true,
        }
    }

    pub fn bare(name: impl Into<String>) -> Self {
        Self {
            qualifier: None,
            name: name.into(),
            quoted: false,
        }
    }

    pub fn qualified(qualifier: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            qualifier: Some(qualifier.into()),
            name: name.into(),
            quoted: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Literal {
    /// Numeric text exactly as written.
    Number(String),
    String(String),
    Boolean(bool),
    Null,
}

impl Literal {
    /// Literal text without quotes, as bound.
    pub fn text(&self) -> String {
        match self {
            Literal::Number(n) => n.clone(),
            Literal::String(s) => s.clone(),
            Literal::Boolean(b) => b.to_string(),
            Literal::Null => "NULL".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithmeticOperator {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetFunction {
    Count,
    Sum,
    Avg,
    Min,
    Max,
}

impl SetFunction {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_uppercase().as_str() {
            "COUNT" => Some(SetFunction::Count),
            "SUM" => Some(SetFunction::Sum),
            "AVG" => Some(SetFunction::Avg),
            "MIN" => Some(SetFunction::Min),
            "MAX" => Some(SetFunction::Max),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            SetFunction::Count => "COUNT",
            SetFunction::Sum => "SUM",
            SetFunction::Avg => "AVG",
            SetFunction::Min => "MIN",
            SetFunction::Max => "MAX",
        }
    }
}

/// Scalar functions the store is allowed to evaluate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarFunction {
    Upper,
    Lower,
    Concat,
    Trim,
    Length,
    Round,
    Abs,
    Coalesce,
    IfNull,
    Now,
    UnixTimestamp,
    FromUnixtime,
    DateFormat,
}

impl ScalarFunction {
    pub const ALL: [ScalarFunction; 13] = [
        ScalarFunction::Upper,
        ScalarFunction::Lower,
        ScalarFunction::Concat,
        ScalarFunction::Trim,
        ScalarFunction::Length,
        ScalarFunction::Round,
        ScalarFunction::Abs,
        ScalarFunction::Coalesce,
        ScalarFunction::IfNull,
        ScalarFunction::Now,
        ScalarFunction::UnixTimestamp,
        ScalarFunction::FromUnixtime,
        ScalarFunction::DateFormat,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ScalarFunction::Upper => "UPPER",
            ScalarFunction::Lower => "LOWER",
            ScalarFunction::Concat => "CONCAT",
            ScalarFunction::Trim => "TRIM",
            ScalarFunction::Length => "LENGTH",
            ScalarFunction::Round => "ROUND",
            ScalarFunction::Abs => "ABS",
            ScalarFunction::Coalesce => "COALESCE",
            ScalarFunction::IfNull => "IFNULL",
            ScalarFunction::Now => "NOW",
            ScalarFunction::UnixTimestamp => "UNIX_TIMESTAMP",
            ScalarFunction::FromUnixtime => "FROM_UNIXTIME",
            ScalarFunction::DateFormat => "DATE_FORMAT",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|f| f.name().eq_ignore_ascii_case(name))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ValueExpression {
    Column(ColumnReference),
    Literal(Literal),
    Arithmetic {
        left: Box<ValueExpression>,
        op: ArithmeticOperator,
        right: Box<ValueExpression>,
    },
    Negative(Box<ValueExpression>),
    Nested(Box<ValueExpression>),
    /// `COUNT(*)` has no argument.
    SetFunction {
        function: SetFunction,
        distinct: bool,
        argument: Option<Box<ValueExpression>>,
    },
    Function {
        function: ScalarFunction,
        arguments: Vec<ValueExpression>,
    },
}

impl ValueExpression {
    pub fn column(name: impl Into<String>) -> Self {
        ValueExpression::Column(ColumnReference::new(name))
    }

    pub fn string(value: impl Into<String>) -> Self {
        ValueExpression::Literal(Literal::String(value.into()))
    }

    pub fn contains_aggregate(&self) -> bool {
        match self {
            ValueExpression::SetFunction { .. } => true,
            ValueExpression::Column(_) | ValueExpression::Literal(_) => false,
            ValueExpression::Arithmetic { left, right, .. } => {
                left.contains_aggregate() || right.contains_aggregate()
            }
            ValueExpression::Negative(inner) | ValueExpression::Nested(inner) => {
                inner.contains_aggregate()
            }
            ValueExpression::Function { arguments, .. } => {
                arguments.iter().any(ValueExpression::contains_aggregate)
            }
        }
    }

    /// The column when this expression is a bare column reference.
    pub fn as_column(&self) -> Option<&ColumnReference> {
        match self {
            ValueExpression::Column(column) => Some(column),
            ValueExpression::Nested(inner) => inner.as_column(),
            _ => None,
        }
    }
}

// ============================================================================
// Search conditions
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonOperator {
    Eq,
    NotEq,
    Lt,
    Gt,
    LtEq,
    GtEq,
}

impl ComparisonOperator {
    pub fn symbol(&self) -> &'static str {
        match self {
            ComparisonOperator::Eq => "=",
            ComparisonOperator::NotEq => "<>",
            ComparisonOperator::Lt => "<",
            ComparisonOperator::Gt => ">",
            ComparisonOperator::LtEq => "<=",
            ComparisonOperator::GtEq => ">=",
        }
    }
}

/// Double-only boolean functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BooleanFunction {
    IsNaN,
    IsInfinity,
}

impl BooleanFunction {
    pub fn name(&self) -> &'static str {
        match self {
            BooleanFunction::IsNaN => "isNaN",
            BooleanFunction::IsInfinity => "isInfinity",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        [BooleanFunction::IsNaN, BooleanFunction::IsInfinity]
            .into_iter()
            .find(|f| f.name().eq_ignore_ascii_case(name))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Comparison {
        left: ValueExpression,
        op: ComparisonOperator,
        right: ValueExpression,
    },
    Between {
        expr: ValueExpression,
        negated: bool,
        low: ValueExpression,
        high: ValueExpression,
    },
    InList {
        expr: ValueExpression,
        negated: bool,
        list: Vec<ValueExpression>,
    },
    Like {
        expr: ValueExpression,
        negated: bool,
        pattern: ValueExpression,
        escape: Option<String>,
    },
    IsNull {
        expr: ValueExpression,
        negated: bool,
    },
    IsBoolean {
        expr: ValueExpression,
        negated: bool,
        value: bool,
    },
    BooleanFunction {
        function: BooleanFunction,
        column: ColumnReference,
    },
}

/// OR of ANDs of optionally negated predicates.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchCondition {
    Or(Box<SearchCondition>, Box<SearchCondition>),
    And(Box<SearchCondition>, Box<SearchCondition>),
    Not(Box<SearchCondition>),
    Nested(Box<SearchCondition>),
    Predicate(Predicate),
}

impl SearchCondition {
    pub fn and(self, other: SearchCondition) -> Self {
        SearchCondition::And(Box::new(self), Box::new(other))
    }

    pub fn or(self, other: SearchCondition) -> Self {
        SearchCondition::Or(Box::new(self), Box::new(other))
    }

    pub fn nested(self) -> Self {
        SearchCondition::Nested(Box::new(self))
    }

    /// AND all conditions together, `None` for an empty input.
    pub fn all(conditions: impl IntoIterator<Item = SearchCondition>) -> Option<Self> {
        conditions.into_iter().reduce(SearchCondition::and)
    }

    /// OR all conditions together, `None` for an empty input.
    pub fn any(conditions: impl IntoIterator<Item = SearchCondition>) -> Option<Self> {
        conditions.into_iter().reduce(SearchCondition::or)
    }
}

impl From<Predicate> for SearchCondition {
    fn from(predicate: Predicate) -> Self {
        SearchCondition::Predicate(predicate)
    }
}

// ============================================================================
// ORDER BY / pagination
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortDirection {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SortSpecification {
    pub column: ColumnReference,
    pub direction: Option<SortDirection>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub limit: i64,
    pub offset: Option<i64>,
}

// ============================================================================
// Rendering
// ============================================================================

fn is_simple_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn write_identifier(f: &mut fmt::Formatter<'_>, name: &str, quoted: bool) -> fmt::Result {
    if quoted || !is_simple_identifier(name) {
        write!(f, "\"{}\"", name.replace('"', "\"\""))
    } else {
        f.write_str(name)
    }
}

fn write_list<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

impl fmt::Display for QuerySpecification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SELECT ")?;
        if self.distinct {
            f.write_str("DISTINCT ")?;
        }
        write!(f, "{} FROM {}", self.select_list, self.from)?;
        if let Some(condition) = &self.where_clause {
            write!(f, " WHERE {}", condition)?;
        }
        if !self.group_by.is_empty() {
            f.write_str(" GROUP BY ")?;
            write_list(f, &self.group_by)?;
        }
        if let Some(condition) = &self.having {
            write!(f, " HAVING {}", condition)?;
        }
        if !self.order_by.is_empty() {
            f.write_str(" ORDER BY ")?;
            write_list(f, &self.order_by)?;
        }
        if let Some(pagination) = &self.pagination {
            write!(f, " LIMIT {}", pagination.limit)?;
            if let Some(offset) = pagination.offset {
                write!(f, " OFFSET {}", offset)?;
            }
        }
        Ok(())
    }
}

impl fmt::Display for SelectList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectList::Asterisk => f.write_str("*"),
            SelectList::Columns(columns) => write_list(f, columns),
        }
    }
}

impl fmt::Display for DerivedColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.expr)?;
        if let Some(alias) = &self.alias {
            f.write_str(" AS ")?;
            write_identifier(f, alias, false)?;
        }
        Ok(())
    }
}

impl fmt::Display for FromClause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.table)?;
        for join in &self.joins {
            write!(f, " {}", join)?;
        }
        Ok(())
    }
}

impl fmt::Display for TableReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_identifier(f, &self.name, false)?;
        if let Some(alias) = &self.alias {
            f.write_str(" ")?;
            write_identifier(f, alias, false)?;
        }
        Ok(())
    }
}

impl fmt::Display for Join {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keyword = match self.kind {
            JoinKind::Inner => "JOIN",
            JoinKind::LeftOuter => "LEFT JOIN",
            JoinKind::RightOuter => "RIGHT JOIN",
        };
        write!(f, "{} {} ON {}", keyword, self.table, self.on)
    }
}

impl fmt::Display for ColumnReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(qualifier) = &self.qualifier {
            write_identifier(f, qualifier, false)?;
            f.write_str(".")?;
        }
        write_identifier(f, &self.name, self.quoted)
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Number(n) => f.write_str(n),
            Literal::String(s) => write!(f, "'{}'", s.replace('\'', "''")),
            Literal::Boolean(true) => f.write_str("TRUE"),
            Literal::Boolean(false) => f.write_str("FALSE"),
            Literal::Null => f.write_str("NULL"),
        }
    }
}

impl fmt::Display for ArithmeticOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ArithmeticOperator::Add => "+",
            ArithmeticOperator::Subtract => "-",
            ArithmeticOperator::Multiply => "*",
            ArithmeticOperator::Divide => "/",
            ArithmeticOperator::Modulo => "%",
        })
    }
}

impl fmt::Display for ValueExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueExpression::Column(column) => write!(f, "{}", column),
            ValueExpression::Literal(literal) => write!(f, "{}", literal),
            ValueExpression::Arithmetic { left, op, right } => {
                write!(f, "{} {} {}", left, op, right)
            }
            ValueExpression::Negative(inner) => write!(f, "-{}", inner),
            ValueExpression::Nested(inner) => write!(f, "({})", inner),
            ValueExpression::SetFunction {
                function,
                distinct,
                argument,
            } => {
                write!(f, "{}(", function.name())?;
                if *distinct {
                    f.write_str("DISTINCT ")?;
                }
                match argument {
                    Some(argument) => write!(f, "{}", argument)?,
                    None => f.write_str("*")?,
                }
                f.write_str(")")
            }
            ValueExpression::Function {
                function,
                arguments,
            } => {
                write!(f, "{}(", function.name())?;
                write_list(f, arguments)?;
                f.write_str(")")
            }
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let not = |negated: &bool| if *negated { "NOT " } else { "" };
        match self {
            Predicate::Comparison { left, op, right } => {
                write!(f, "{} {} {}", left, op.symbol(), right)
            }
            Predicate::Between {
                expr,
                negated,
                low,
                high,
            } => write!(f, "{} {}BETWEEN {} AND {}", expr, not(negated), low, high),
            Predicate::InList {
                expr,
                negated,
                list,
            } => {
                write!(f, "{} {}IN (", expr, not(negated))?;
                write_list(f, list)?;
                f.write_str(")")
            }
            Predicate::Like {
                expr,
                negated,
                pattern,
                escape,
            } => {
                write!(f, "{} {}LIKE {}", expr, not(negated), pattern)?;
                if let Some(escape) = escape {
                    write!(f, " ESCAPE {}", Literal::String(escape.clone()))?;
                }
                Ok(())
            }
            Predicate::IsNull { expr, negated } => write!(f, "{} IS {}NULL", expr, not(negated)),
            Predicate::IsBoolean {
                expr,
                negated,
                value,
            } => {
                let value = if *value { "TRUE" } else { "FALSE" };
                write!(f, "{} IS {}{}", expr, not(negated), value)
            }
            Predicate::BooleanFunction { function, column } => {
                write!(f, "{}({})", function.name(), column)
            }
        }
    }
}

impl fmt::Display for SearchCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchCondition::Or(left, right) => write!(f, "{} OR {}", left, right),
            SearchCondition::And(left, right) => write!(f, "{} AND {}", left, right),
            SearchCondition::Not(inner) => write!(f, "NOT {}", inner),
            SearchCondition::Nested(inner) => write!(f, "({})", inner),
            SearchCondition::Predicate(predicate) => write!(f, "{}", predicate),
        }
    }
}

impl fmt::Display for SortSpecification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.column)?;
        match self.direction {
            Some(SortDirection::Asc) => f.write_str(" ASC"),
            Some(SortDirection::Desc) => f.write_str(" DESC"),
            None => Ok(()),
        }
    }
}
