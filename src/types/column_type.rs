//! Logical to physical column type mapping.
//!
//! The mapping is a closed, data-only table: [`ColumnTypeInfo::for_type`]
//! matches exhaustively over [`ColumnType`], so adding a logical type is a
//! compile error until it is mapped here.

use serde::{Deserialize, Serialize};

use super::error::{TypeError, TypeResult};
use super::value::{self, DbValue};
use crate::model::ColumnType;
use crate::sql::token::{format_float, quote_string};

/// Worst-case bytes per character for utf8mb4.
pub const MAX_BYTES_PER_CHAR_UTF8: i64 = 4;
/// Largest size a STRING or LINK column may declare.
pub const MAX_ALLOWED_STRING_SIZE: i64 = 1000;
/// Maximum characters accepted for LARGETEXT values.
pub const MAX_LARGE_TEXT_CHARACTERS: i64 = 524_288;
/// Display width of integer-like physical columns.
pub const INTEGER_DISPLAY_SIZE: i64 = 20;

pub const MAX_INTEGER_BYTES_AS_STRING: i64 = 20;
pub const MAX_DOUBLE_BYTES_AS_STRING: i64 = 23;
pub const MAX_BOOLEAN_BYTES_AS_STRING: i64 = 5;
pub const MAX_ENTITY_ID_BYTES_AS_STRING: i64 = 44;
pub const LARGE_TEXT_ESTIMATE_BYTES: i64 = 8_000;
pub const DEFAULT_UNKNOWN_BYTES: i64 = 64;

/// Charset and collation appended to every string-like physical column.
pub const UTF8_CHARSET: &str = "CHARACTER SET utf8mb4 COLLATE utf8mb4_0900_ai_ci";

/// Physical storage types in the table index store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MySqlColumnType {
    BigInt,
    Varchar,
    Double,
    Boolean,
    MediumText,
    Enum,
    Char,
}

impl MySqlColumnType {
    pub fn sql_name(&self) -> &'static str {
        match self {
            MySqlColumnType::BigInt => "BIGINT",
            MySqlColumnType::Varchar => "VARCHAR",
            MySqlColumnType::Double => "DOUBLE",
            MySqlColumnType::Boolean => "BOOLEAN",
            MySqlColumnType::MediumText => "MEDIUMTEXT",
            MySqlColumnType::Enum => "ENUM",
            MySqlColumnType::Char => "CHAR",
        }
    }

    /// Text types that need a prefix length when indexed.
    pub fn is_text(&self) -> bool {
        matches!(
            self,
            MySqlColumnType::Varchar | MySqlColumnType::MediumText | MySqlColumnType::Char
        )
    }

    /// Parse the `Type` column of `SHOW COLUMNS`, e.g. `varchar(50)`.
    ///
    /// `tinyint(1)` is how the store reports BOOLEAN.
    pub fn parse_introspected(type_text: &str) -> (Option<Self>, Option<i64>) {
        let lower = type_text.trim().to_ascii_lowercase();
        let (base, size) = match lower.split_once('(') {
            Some((base, rest)) => {
                let inner = rest.split(')').next().unwrap_or_default();
                (base.trim().to_string(), inner.trim().parse::<i64>().ok())
            }
            None => (
                lower.split_whitespace().next().unwrap_or_default().to_string(),
                None,
            ),
        };
        let kind = match base.as_str() {
            "bigint" => Some(MySqlColumnType::BigInt),
            "varchar" => Some(MySqlColumnType::Varchar),
            "double" => Some(MySqlColumnType::Double),
            "tinyint" if size == Some(1) => Some(MySqlColumnType::Boolean),
            "boolean" | "bool" => Some(MySqlColumnType::Boolean),
            "mediumtext" => Some(MySqlColumnType::MediumText),
            "enum" => Some(MySqlColumnType::Enum),
            "char" => Some(MySqlColumnType::Char),
            _ => None,
        };
        match kind {
            Some(MySqlColumnType::Enum) | Some(MySqlColumnType::Boolean) => (kind, None),
            _ => (kind, size),
        }
    }
}

/// How raw text is parsed into a bind value for a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueParser {
    Long,
    Double,
    Boolean,
    Date,
    EntityId,
    Text,
}

/// Immutable mapping entry for one logical type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnTypeInfo {
    pub column_type: ColumnType,
    pub mysql_type: MySqlColumnType,
    pub parser: ValueParser,
    /// Size used regardless of what the caller supplies.
    pub fixed_size: Option<i64>,
}

impl ColumnTypeInfo {
    pub fn for_type(column_type: ColumnType) -> Self {
        let (mysql_type, parser, fixed_size) = match column_type {
            ColumnType::Integer
            | ColumnType::FileHandleId
            | ColumnType::SubmissionId
            | ColumnType::EvaluationId
            | ColumnType::UserId => (
                MySqlColumnType::BigInt,
                ValueParser::Long,
                Some(INTEGER_DISPLAY_SIZE),
            ),
            ColumnType::Date => (
                MySqlColumnType::BigInt,
                ValueParser::Date,
                Some(INTEGER_DISPLAY_SIZE),
            ),
            ColumnType::EntityId => (
                MySqlColumnType::BigInt,
                ValueParser::EntityId,
                Some(INTEGER_DISPLAY_SIZE),
            ),
            ColumnType::String | ColumnType::Link => {
                (MySqlColumnType::Varchar, ValueParser::Text, None)
            }
            ColumnType::Double => (MySqlColumnType::Double, ValueParser::Double, None),
            ColumnType::Boolean => (MySqlColumnType::Boolean, ValueParser::Boolean, None),
            ColumnType::LargeText => (MySqlColumnType::MediumText, ValueParser::Text, None),
        };
        Self {
            column_type,
            mysql_type,
            parser,
            fixed_size,
        }
    }

    /// Look up a logical type by name; unknown names are a hard error.
    pub fn for_name(name: &str) -> TypeResult<Self> {
        name.parse::<ColumnType>()
            .map(Self::for_type)
            .map_err(TypeError::UnknownType)
    }

    /// STRING and LINK must declare their size.
    pub fn requires_size(&self) -> bool {
        matches!(self.mysql_type, MySqlColumnType::Varchar)
    }

    /// Physical type is character data.
    pub fn is_string_type(&self) -> bool {
        matches!(
            self.mysql_type,
            MySqlColumnType::Varchar | MySqlColumnType::MediumText
        )
    }

    /// Resolve the physical size for a caller-supplied maximum size.
    pub fn resolve_size(&self, max_size: Option<i64>) -> TypeResult<Option<i64>> {
        if let Some(fixed) = self.fixed_size {
            return Ok(Some(fixed));
        }
        match (self.requires_size(), max_size) {
            (true, None) => Err(TypeError::MissingSize(self.column_type)),
            (true, Some(size)) if !(1..=MAX_ALLOWED_STRING_SIZE).contains(&size) => {
                Err(TypeError::InvalidSize {
                    size,
                    max: MAX_ALLOWED_STRING_SIZE,
                })
            }
            (true, Some(size)) => Ok(Some(size)),
            (false, Some(size)) => Err(TypeError::SizeNotAllowed {
                column_type: self.column_type,
                size,
            }),
            (false, None) => Ok(None),
        }
    }

    /// Emit the physical type syntax including charset and DEFAULT clause.
    ///
    /// The default value is parsed through the type's parser before it is
    /// rendered, so only the normalized form of a valid value reaches the DDL.
    pub fn to_physical_type(
        &self,
        max_size: Option<i64>,
        default_value: Option<&str>,
    ) -> TypeResult<String> {
        let mut sql = self.mysql_type.sql_name().to_string();
        if let Some(size) = self.resolve_size(max_size)? {
            sql.push_str(&format!("({})", size));
        }
        if self.is_string_type() {
            sql.push(' ');
            sql.push_str(UTF8_CHARSET);
        }
        sql.push(' ');
        sql.push_str(&self.default_clause(max_size, default_value)?);
        Ok(sql)
    }

    fn default_clause(&self, max_size: Option<i64>, default_value: Option<&str>) -> TypeResult<String> {
        let Some(raw) = default_value else {
            return Ok("DEFAULT NULL".into());
        };
        if self.mysql_type == MySqlColumnType::MediumText {
            return Err(TypeError::DefaultNotAllowed(self.column_type));
        }
        let invalid = |reason: String| TypeError::InvalidDefault {
            column_type: self.column_type,
            value: raw.to_string(),
            reason,
        };
        let parsed = self
            .parse_for_write(raw, max_size)
            .map_err(|e| invalid(e.to_string()))?;
        let rendered = match parsed {
            DbValue::Null => "NULL".to_string(),
            DbValue::Long(n) => n.to_string(),
            DbValue::Double(f) if f.is_finite() => format_float(f),
            DbValue::Double(_) => return Err(invalid("non-finite defaults are not supported".into())),
            DbValue::Bool(b) => if b { "TRUE" } else { "FALSE" }.to_string(),
            DbValue::Text(s) => quote_string(&s),
            DbValue::LongList(_) => return Err(invalid("lists are not supported".into())),
        };
        Ok(format!("DEFAULT {}", rendered))
    }

    /// Parse caller text into the value written to the store.
    pub fn parse_for_write(&self, value: &str, max_size: Option<i64>) -> TypeResult<DbValue> {
        value::parse_for_write(self, value, max_size)
    }

    /// Normalize a stored value for return to callers.
    pub fn parse_for_read(&self, value: Option<&str>) -> TypeResult<Option<String>> {
        value::parse_for_read(self, value)
    }
}

/// Worst-case serialized size in bytes of one value of the given type.
///
/// `None` covers derived select columns with no known type.
pub fn max_size_for_type(column_type: Option<ColumnType>, max_size: Option<i64>) -> i64 {
    let Some(column_type) = column_type else {
        return DEFAULT_UNKNOWN_BYTES;
    };
    match column_type {
        ColumnType::String | ColumnType::Link => {
            MAX_BYTES_PER_CHAR_UTF8 * max_size.unwrap_or(MAX_ALLOWED_STRING_SIZE)
        }
        ColumnType::Integer
        | ColumnType::Date
        | ColumnType::FileHandleId
        | ColumnType::SubmissionId
        | ColumnType::EvaluationId
        | ColumnType::UserId => MAX_INTEGER_BYTES_AS_STRING,
        ColumnType::EntityId => MAX_ENTITY_ID_BYTES_AS_STRING,
        ColumnType::Double => MAX_DOUBLE_BYTES_AS_STRING,
        ColumnType::Boolean => MAX_BOOLEAN_BYTES_AS_STRING,
        ColumnType::LargeText => LARGE_TEXT_ESTIMATE_BYTES,
    }
}
