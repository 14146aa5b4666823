//! Table identity and table kinds.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A logical table id with an optional snapshot version (`syn123.4`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct IdAndVersion {
    pub id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<i64>,
}

impl IdAndVersion {
    pub fn new(id: i64) -> Self {
        Self { id, version: None }
    }

    pub fn versioned(id: i64, version: i64) -> Self {
        Self {
            id,
            version: Some(version),
        }
    }
}

impl fmt::Display for IdAndVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.version {
            Some(v) => write!(f, "syn{}.{}", self.id, v),
            None => write!(f, "syn{}", self.id),
        }
    }
}

/// Error for malformed table ids.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("Invalid table id: '{0}'")]
pub struct InvalidIdError(pub String);

impl FromStr for IdAndVersion {
    type Err = InvalidIdError;

    /// Accepts `syn123`, `SYN123.4`, and bare `123`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || InvalidIdError(s.to_string());
        let trimmed = s.trim();
        let body = match trimmed.get(..3) {
            Some(prefix) if prefix.eq_ignore_ascii_case("syn") => &trimmed[3..],
            _ => trimmed,
        };
        let (id_part, version_part) = match body.split_once('.') {
            Some((id, version)) => (id, Some(version)),
            None => (body, None),
        };
        let digits = |p: &str| !p.is_empty() && p.bytes().all(|b| b.is_ascii_digit());
        if !digits(id_part) {
            return Err(err());
        }
        let id = id_part.parse().map_err(|_| err())?;
        let version = match version_part {
            Some(v) if digits(v) => Some(v.parse().map_err(|_| err())?),
            Some(_) => return Err(err()),
            None => None,
        };
        Ok(Self { id, version })
    }
}

/// The kind of table an index backs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TableType {
    #[default]
    Table,
    EntityView,
    SubmissionView,
    MaterializedView,
}

impl TableType {
    /// Views carry the etag and benefactor metadata columns.
    pub fn is_view(&self) -> bool {
        matches!(self, TableType::EntityView | TableType::SubmissionView)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_id_and_version() {
        assert_eq!("syn123".parse::<IdAndVersion>().unwrap(), IdAndVersion::new(123));
        assert_eq!(
            "SYN123.4".parse::<IdAndVersion>().unwrap(),
            IdAndVersion::versioned(123, 4)
        );
        assert_eq!("42".parse::<IdAndVersion>().unwrap(), IdAndVersion::new(42));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!("syn".parse::<IdAndVersion>().is_err());
        assert!("syn12a".parse::<IdAndVersion>().is_err());
        assert!("syn12.".parse::<IdAndVersion>().is_err());
        assert!("foo".parse::<IdAndVersion>().is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(IdAndVersion::versioned(9, 2).to_string(), "syn9.2");
        assert_eq!(IdAndVersion::new(9).to_string(), "syn9");
    }
}
