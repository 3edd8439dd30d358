//! Source-neutral predicate tree
//!
//! The compiler emits these in each source's own field names. Sources either
//! evaluate them directly (`matches`) or render them (`Display`, SQL-like).

use chrono::{DateTime, Utc};
use std::fmt;

use crate::sources::RawRecord;

#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Matches every row
    All,
    And(Vec<Predicate>),
    Or(Vec<Predicate>),
    /// Case-insensitive substring match on a text or list-of-text field
    Contains { field: String, needle: String },
    /// Case-insensitive whole-value match on a text field or any item of a list
    IsLabel { field: String, label: String },
    AtLeast { field: String, value: i64 },
    AtMost { field: String, value: i64 },
    IsTrue { field: String },
    /// Membership of an exact tag spelling in a tag list
    HasTag { field: String, tag: String },
    UpdatedSince { field: String, since: DateTime<Utc> },
}

impl Predicate {
    /// Conjunction; `All` members are dropped and an empty list matches everything.
    pub fn all_of(parts: impl IntoIterator<Item = Predicate>) -> Self {
        let mut flat = Vec::new();
        for part in parts {
            match part {
                Self::All => {}
                Self::And(inner) => flat.extend(inner),
                other => flat.push(other),
            }
        }
        match flat.len() {
            0 => Self::All,
            1 => flat.remove(0),
            _ => Self::And(flat),
        }
    }

    /// Disjunction; an empty list means "no constraint", never "match nothing".
    pub fn any_of(parts: impl IntoIterator<Item = Predicate>) -> Self {
        let mut flat = Vec::new();
        for part in parts {
            match part {
                // One unconstrained branch makes the whole disjunction unconstrained
                Self::All => return Self::All,
                Self::Or(inner) => flat.extend(inner),
                other => flat.push(other),
            }
        }
        match flat.len() {
            0 => Self::All,
            1 => flat.remove(0),
            _ => Self::Or(flat),
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Self::All)
    }

    /// Evaluate against one row.
    ///
    /// A missing field never satisfies a comparison.
    pub fn matches(&self, record: &RawRecord) -> bool {
        match self {
            Self::All => true,
            Self::And(parts) => parts.iter().all(|p| p.matches(record)),
            Self::Or(parts) => parts.iter().any(|p| p.matches(record)),
            Self::Contains { field, needle } => {
                let needle = needle.to_lowercase();
                record
                    .texts(field)
                    .iter()
                    .any(|v| v.to_lowercase().contains(&needle))
            }
            Self::IsLabel { field, label } => {
                let label = label.trim().to_lowercase();
                record
                    .texts(field)
                    .iter()
                    .any(|v| v.trim().to_lowercase() == label)
            }
            Self::AtLeast { field, value } => record
                .number(field)
                .is_some_and(|n| n >= *value as f64),
            Self::AtMost { field, value } => record
                .number(field)
                .is_some_and(|n| n <= *value as f64),
            Self::IsTrue { field } => record.flag(field),
            Self::HasTag { field, tag } => record
                .string_list(field)
                .iter()
                .any(|t| t.eq_ignore_ascii_case(tag.trim())),
            Self::UpdatedSince { field, since } => {
                record.timestamp(field).is_some_and(|ts| ts >= *since)
            }
        }
    }
}

fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("TRUE"),
            Self::And(parts) | Self::Or(parts) => {
                let sep = if matches!(self, Self::And(_)) {
                    " AND "
                } else {
                    " OR "
                };
                f.write_str("(")?;
                for (i, part) in parts.iter().enumerate() {
                    if i > 0 {
                        f.write_str(sep)?;
                    }
                    write!(f, "{}", part)?;
                }
                f.write_str(")")
            }
            Self::Contains { field, needle } => {
                write!(f, "{} ILIKE {}", field, quote(&format!("%{}%", needle)))
            }
            Self::IsLabel { field, label } => write!(f, "{} ILIKE {}", field, quote(label)),
            Self::AtLeast { field, value } => write!(f, "{} >= {}", field, value),
            Self::AtMost { field, value } => write!(f, "{} <= {}", field, value),
            Self::IsTrue { field } => write!(f, "{} = TRUE", field),
            Self::HasTag { field, tag } => write!(f, "{} = ANY({})", quote(tag), field),
            Self::UpdatedSince { field, since } => {
                write!(f, "{} >= {}", field, quote(&since.to_rfc3339()))
            }
        }
    }
}
