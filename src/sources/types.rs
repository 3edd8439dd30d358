use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde_json::Value;

use crate::query::Predicate;

/// Source-shaped row as returned by a query
///
/// Only the normalizer and predicate evaluation look inside; everything else
/// passes it through untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord(Value);

impl RawRecord {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// Look up a dotted field path; JSON `null` counts as absent.
    pub(crate) fn get(&self, path: &str) -> Option<&Value> {
        let mut current = &self.0;
        for segment in path.split('.') {
            current = current.as_object()?.get(segment)?;
        }
        (!current.is_null()).then_some(current)
    }

    /// Non-empty trimmed text; numbers are rendered as text.
    pub(crate) fn text(&self, path: &str) -> Option<String> {
        match self.get(path)? {
            Value::String(s) => {
                let s = s.trim();
                (!s.is_empty()).then(|| s.to_string())
            }
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    /// Every text value under a field, whether it holds one string or a list.
    pub(crate) fn texts(&self, path: &str) -> Vec<String> {
        match self.get(path) {
            Some(Value::Array(items)) => items.iter().filter_map(value_as_text).collect(),
            Some(value) => value_as_text(value).into_iter().collect(),
            None => Vec::new(),
        }
    }

    /// Numeric value, accepting numbers and numeric strings.
    pub(crate) fn number(&self, path: &str) -> Option<f64> {
        match self.get(path)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().replace([' ', ','], "").parse().ok(),
            _ => None,
        }
    }

    pub(crate) fn integer(&self, path: &str) -> Option<i64> {
        self.number(path).map(|n| n.round() as i64)
    }

    pub(crate) fn flag(&self, path: &str) -> bool {
        match self.get(path) {
            Some(Value::Bool(b)) => *b,
            Some(Value::Number(n)) => n.as_i64().is_some_and(|n| n != 0),
            Some(Value::String(s)) => matches!(
                s.trim().to_ascii_lowercase().as_str(),
                "true" | "yes" | "1"
            ),
            _ => false,
        }
    }

    pub(crate) fn timestamp(&self, path: &str) -> Option<DateTime<Utc>> {
        match self.get(path)? {
            Value::String(s) => parse_timestamp(s),
            Value::Number(n) => {
                let raw = n.as_i64()?;
                // Anything this large is milliseconds
                if raw.abs() > 100_000_000_000 {
                    Utc.timestamp_millis_opt(raw).single()
                } else {
                    Utc.timestamp_opt(raw, 0).single()
                }
            }
            _ => None,
        }
    }

    /// Tag/image style field: a native list, or a string holding a serialized list.
    ///
    /// A string that does not parse as a list becomes a single-element sequence.
    pub(crate) fn string_list(&self, path: &str) -> Vec<String> {
        match self.get(path) {
            Some(Value::Array(items)) => items.iter().filter_map(value_as_text).collect(),
            Some(Value::String(s)) => parse_serialized_list(s),
            Some(other) => value_as_text(other).into_iter().collect(),
            None => Vec::new(),
        }
    }

    /// Copy of the record holding only the named top-level fields.
    pub(crate) fn project(&self, fields: &[&str]) -> Self {
        let mut out = serde_json::Map::new();
        if let Some(obj) = self.0.as_object() {
            for field in fields {
                if let Some(v) = obj.get(*field) {
                    out.insert((*field).to_string(), v.clone());
                }
            }
        }
        Self(Value::Object(out))
    }
}

impl From<Value> for RawRecord {
    fn from(value: Value) -> Self {
        Self::new(value)
    }
}

fn value_as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn parse_serialized_list(raw: &str) -> Vec<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }
    match serde_json::from_str::<Vec<Value>>(trimmed) {
        Ok(items) => items.iter().filter_map(value_as_text).collect(),
        Err(_) => vec![trimmed.to_string()],
    }
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Some(Utc.from_utc_datetime(&dt));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| Utc.from_utc_datetime(&dt))
}

/// Half-open row range `[offset, offset + limit)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub offset: usize,
    pub limit: usize,
}

impl Window {
    pub fn new(offset: usize, limit: usize) -> Self {
        Self { offset, limit }
    }

    /// Leading rows only, up to `cap`.
    pub fn capped(cap: usize) -> Self {
        Self::new(0, cap)
    }
}

/// How a source should compare values of its order field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderKind {
    /// Missing values count as zero
    Numeric,
    /// Missing values sort last in either direction
    Timestamp,
}

/// Ordering expressed in a source's own field names
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceOrder {
    pub field: String,
    pub kind: OrderKind,
    pub descending: bool,
}

/// Which fields a query needs back
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Projection {
    #[default]
    Full,
    IdentityOnly,
}

/// One read query against a source
#[derive(Debug, Clone)]
pub struct SourceQuery {
    pub predicate: Predicate,
    pub order: Option<SourceOrder>,
    pub window: Window,
    pub projection: Projection,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_dotted_lookup_and_null() {
        let record = RawRecord::new(json!({"size": {"built": 120, "plot": null}}));
        assert_eq!(record.number("size.built"), Some(120.0));
        assert!(record.get("size.plot").is_none());
        assert!(record.get("size.terrace").is_none());
        assert!(record.get("missing.path").is_none());
    }

    #[test]
    fn test_string_list_coercion() {
        let record = RawRecord::new(json!({
            "native": ["Views - Sea", " Pool - Private "],
            "serialized": "[\"Garden - Private\", \"Lift\"]",
            "broken": "[\"Garden - Private\"",
            "empty": "",
        }));
        assert_eq!(record.string_list("native"), vec!["Views - Sea", "Pool - Private"]);
        assert_eq!(record.string_list("serialized"), vec!["Garden - Private", "Lift"]);
        assert_eq!(record.string_list("broken"), vec!["[\"Garden - Private\""]);
        assert!(record.string_list("empty").is_empty());
        assert!(record.string_list("absent").is_empty());
    }

    #[test]
    fn test_timestamp_formats() {
        let record = RawRecord::new(json!({
            "rfc": "2026-10-01T12:00:00Z",
            "plain": "2026-10-01 12:00:00",
            "date": "2026-10-01",
            "epoch": 1_790_000_000,
            "millis": 1_790_000_000_000_i64,
            "junk": "yesterday",
        }));
        assert_eq!(record.timestamp("rfc"), record.timestamp("plain"));
        assert!(record.timestamp("date").is_some());
        assert_eq!(record.timestamp("epoch"), record.timestamp("millis"));
        assert!(record.timestamp("junk").is_none());
    }

    #[test]
    fn test_number_and_flag() {
        let record = RawRecord::new(json!({
            "price": "1 250 000",
            "pool": "yes",
            "garage": 0,
        }));
        assert_eq!(record.integer("price"), Some(1_250_000));
        assert!(record.flag("pool"));
        assert!(!record.flag("garage"));
        assert!(!record.flag("absent"));
    }

    #[test]
    fn test_project_keeps_named_fields() {
        let record = RawRecord::new(json!({"ref": "R1", "price": 10}));
        let projected = record.project(&["ref"]);
        assert_eq!(projected.text("ref").as_deref(), Some("R1"));
        assert!(projected.get("price").is_none());
    }
}
