//! Bind values and the per-type value parsers.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::column_type::{ColumnTypeInfo, ValueParser, MAX_LARGE_TEXT_CHARACTERS};
use super::error::{TypeError, TypeResult};
use crate::model::ColumnType;
use crate::sql::token::format_float;

/// A value bound to a named placeholder at execution time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DbValue {
    Null,
    Bool(bool),
    Long(i64),
    Double(f64),
    Text(String),
    LongList(Vec<i64>),
}

impl DbValue {
    pub fn is_null(&self) -> bool {
        matches!(self, DbValue::Null)
    }
}

impl fmt::Display for DbValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DbValue::Null => f.write_str("NULL"),
            DbValue::Bool(b) => write!(f, "{}", b),
            DbValue::Long(n) => write!(f, "{}", n),
            DbValue::Double(d) => f.write_str(&format_float(*d)),
            DbValue::Text(s) => f.write_str(s),
            DbValue::LongList(list) => {
                let parts: Vec<String> = list.iter().map(|n| n.to_string()).collect();
                write!(f, "{}", parts.join(","))
            }
        }
    }
}

// ============================================================================
// Non-finite doubles
// ============================================================================

/// Tag stored in the `_DBL_C<id>_` shadow column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NonFiniteTag {
    NaN,
    Infinity,
    NegativeInfinity,
}

impl NonFiniteTag {
    pub const ALL: [NonFiniteTag; 3] = [
        NonFiniteTag::NaN,
        NonFiniteTag::Infinity,
        NonFiniteTag::NegativeInfinity,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            NonFiniteTag::NaN => "NaN",
            NonFiniteTag::Infinity => "Infinity",
            NonFiniteTag::NegativeInfinity => "-Infinity",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|t| t.as_str() == s)
    }

    pub fn classify(value: f64) -> Option<Self> {
        if value.is_nan() {
            Some(NonFiniteTag::NaN)
        } else if value == f64::INFINITY {
            Some(NonFiniteTag::Infinity)
        } else if value == f64::NEG_INFINITY {
            Some(NonFiniteTag::NegativeInfinity)
        } else {
            None
        }
    }
}

/// Split a double into the numeric column value and the shadow tag.
///
/// NaN stores a numeric NULL; infinities store the largest finite value of
/// the same sign so range predicates still order them correctly.
pub fn encode_double(value: f64) -> (DbValue, Option<NonFiniteTag>) {
    match NonFiniteTag::classify(value) {
        Some(NonFiniteTag::NaN) => (DbValue::Null, Some(NonFiniteTag::NaN)),
        Some(NonFiniteTag::Infinity) => (DbValue::Double(f64::MAX), Some(NonFiniteTag::Infinity)),
        Some(NonFiniteTag::NegativeInfinity) => (
            DbValue::Double(f64::MIN),
            Some(NonFiniteTag::NegativeInfinity),
        ),
        None => (DbValue::Double(value), None),
    }
}

/// Reassemble a double read back as (value, shadow).
pub fn decode_double(value: Option<&str>, shadow: Option<&str>) -> TypeResult<Option<String>> {
    if let Some(tag) = shadow.filter(|s| !s.is_empty()) {
        return NonFiniteTag::parse(tag)
            .map(|t| Some(t.as_str().to_string()))
            .ok_or_else(|| invalid(ColumnType::Double, tag, "unknown non-finite tag"));
    }
    match value {
        None => Ok(None),
        Some(v) => parse_double(v).map(|d| Some(normalize_double(d))),
    }
}

fn normalize_double(value: f64) -> String {
    match NonFiniteTag::classify(value) {
        Some(tag) => tag.as_str().to_string(),
        None => format_float(value),
    }
}

/// Parse double text including the accepted spellings of NaN and infinity.
pub fn parse_double(value: &str) -> TypeResult<f64> {
    let trimmed = value.trim();
    let lower = trimmed.to_ascii_lowercase();
    match lower.as_str() {
        "nan" => return Ok(f64::NAN),
        "inf" | "+inf" | "infinity" | "+infinity" | "∞" | "+∞" => return Ok(f64::INFINITY),
        "-inf" | "-infinity" | "-∞" => return Ok(f64::NEG_INFINITY),
        _ => {}
    }
    trimmed
        .parse::<f64>()
        .map_err(|e| invalid(ColumnType::Double, value, &e.to_string()))
}

// ============================================================================
// Parsers
// ============================================================================

fn invalid(column_type: ColumnType, value: &str, reason: &str) -> TypeError {
    TypeError::InvalidValue {
        column_type,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn parse_long(column_type: ColumnType, value: &str) -> TypeResult<i64> {
    value
        .trim()
        .parse::<i64>()
        .map_err(|e| invalid(column_type, value, &e.to_string()))
}

fn parse_boolean(value: &str) -> TypeResult<bool> {
    let trimmed = value.trim();
    if trimmed.eq_ignore_ascii_case("true") {
        Ok(true)
    } else if trimmed.eq_ignore_ascii_case("false") {
        Ok(false)
    } else {
        Err(invalid(ColumnType::Boolean, value, "expected true or false"))
    }
}

/// Epoch millis, or a UTC date/time in one of the SQL text forms.
pub fn parse_date(value: &str) -> TypeResult<i64> {
    let trimmed = value.trim();
    if let Ok(millis) = trimmed.parse::<i64>() {
        return Ok(millis);
    }
    for format in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(dt.and_utc().timestamp_millis());
        }
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc().timestamp_millis())
        .ok_or_else(|| invalid(ColumnType::Date, value, "expected epoch millis or YYYY-MM-DD[ HH:MM:SS[.fff]]"))
}

/// `syn123`, `syn123.4` or `123`; the stored form is the numeric id.
pub fn parse_entity_id(value: &str) -> TypeResult<i64> {
    let trimmed = value.trim();
    let body = match trimmed.get(..3) {
        Some(prefix) if prefix.eq_ignore_ascii_case("syn") => &trimmed[3..],
        _ => trimmed,
    };
    let id_part = body.split_once('.').map(|(id, _)| id).unwrap_or(body);
    let version_ok = body
        .split_once('.')
        .map(|(_, v)| !v.is_empty() && v.bytes().all(|b| b.is_ascii_digit()))
        .unwrap_or(true);
    if id_part.is_empty() || !id_part.bytes().all(|b| b.is_ascii_digit()) || !version_ok {
        return Err(invalid(ColumnType::EntityId, value, "expected syn<id>[.<version>]"));
    }
    id_part
        .parse::<i64>()
        .map_err(|e| invalid(ColumnType::EntityId, value, &e.to_string()))
}

pub(crate) fn parse_for_write(
    info: &ColumnTypeInfo,
    value: &str,
    max_size: Option<i64>,
) -> TypeResult<DbValue> {
    if info.parser != ValueParser::Text && value.trim().is_empty() {
        return Ok(DbValue::Null);
    }
    let column_type = info.column_type;
    match info.parser {
        ValueParser::Long => parse_long(column_type, value).map(DbValue::Long),
        ValueParser::Date => parse_date(value).map(DbValue::Long),
        ValueParser::EntityId => parse_entity_id(value).map(DbValue::Long),
        ValueParser::Double => parse_double(value).map(DbValue::Double),
        ValueParser::Boolean => parse_boolean(value).map(DbValue::Bool),
        ValueParser::Text => {
            let limit = match column_type {
                ColumnType::LargeText => Some(MAX_LARGE_TEXT_CHARACTERS),
                _ => max_size,
            };
            let length = value.chars().count();
            match limit {
                Some(max) if length as i64 > max => Err(TypeError::ValueTooLong {
                    length,
                    max_size: max,
                }),
                _ => Ok(DbValue::Text(value.to_string())),
            }
        }
    }
}

pub(crate) fn parse_for_read(
    info: &ColumnTypeInfo,
    value: Option<&str>,
) -> TypeResult<Option<String>> {
    let Some(value) = value else {
        return Ok(None);
    };
    let column_type = info.column_type;
    let normalized = match info.parser {
        ValueParser::Text => value.to_string(),
        ValueParser::Long | ValueParser::Date => parse_long(column_type, value)?.to_string(),
        ValueParser::EntityId => format!("syn{}", parse_entity_id(value)?),
        ValueParser::Double => normalize_double(parse_double(value)?),
        ValueParser::Boolean => match value.trim() {
            "1" => "true".to_string(),
            "0" => "false".to_string(),
            other => parse_boolean(other)?.to_string(),
        },
    };
    Ok(Some(normalized))
}
