//! Logical column definitions.
//!
//! A [`ColumnModel`] is owned by the external schema registry and is
//! immutable for the lifetime of a translation.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifier of a logical column.
pub type ColumnId = i64;

/// The abstract column-type taxonomy exposed to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ColumnType {
    String,
    Double,
    Integer,
    Boolean,
    Date,
    FileHandleId,
    EntityId,
    SubmissionId,
    EvaluationId,
    Link,
    LargeText,
    UserId,
}

impl ColumnType {
    pub const ALL: [ColumnType; 12] = [
        ColumnType::String,
        ColumnType::Double,
        ColumnType::Integer,
        ColumnType::Boolean,
        ColumnType::Date,
        ColumnType::FileHandleId,
        ColumnType::EntityId,
        ColumnType::SubmissionId,
        ColumnType::EvaluationId,
        ColumnType::Link,
        ColumnType::LargeText,
        ColumnType::UserId,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ColumnType::String => "STRING",
            ColumnType::Double => "DOUBLE",
            ColumnType::Integer => "INTEGER",
            ColumnType::Boolean => "BOOLEAN",
            ColumnType::Date => "DATE",
            ColumnType::FileHandleId => "FILEHANDLEID",
            ColumnType::EntityId => "ENTITYID",
            ColumnType::SubmissionId => "SUBMISSIONID",
            ColumnType::EvaluationId => "EVALUATIONID",
            ColumnType::Link => "LINK",
            ColumnType::LargeText => "LARGETEXT",
            ColumnType::UserId => "USERID",
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ColumnType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ColumnType::ALL
            .iter()
            .copied()
            .find(|t| t.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| s.to_string())
    }
}

/// How a column can be used as a facet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FacetType {
    Enumeration,
    Range,
}

/// Caller-facing column definition.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnModel {
    pub id: ColumnId,
    pub name: String,
    #[serde(alias = "type")]
    pub column_type: ColumnType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_size: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facet_type: Option<FacetType>,
}

impl ColumnModel {
    pub fn new(id: ColumnId, name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            id,
            name: name.into(),
            column_type,
            max_size: None,
            default_value: None,
            facet_type: None,
        }
    }

    pub fn with_max_size(mut self, size: i64) -> Self {
        self.max_size = Some(size);
        self
    }

    pub fn with_default(mut self, value: impl Into<String>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    pub fn with_facet(mut self, facet: FacetType) -> Self {
        self.facet_type = Some(facet);
        self
    }
}
