//! Record values

use chrono::{DateTime, NaiveDate, Utc};
use indexmap::IndexMap;
use serde_json::{Number, Value};

/// An insertion-ordered mapping from field name to value
pub type Record = IndexMap<String, RecordValue>;

/// A closed integer range such as an age bracket (`0..5`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeValue {
    pub start: i64,
    pub end: i64,
}

impl RangeValue {
    /// Create a new range
    pub fn new(start: i64, end: i64) -> Self {
        Self { start, end }
    }

    /// Parse `"a..b"` (as written by v1 range fields)
    ///
    /// Exclusive `"a...b"` ranges are not representable and yield `None`.
    pub fn parse(s: &str) -> Option<Self> {
        let (start, end) = s.trim().split_once("..")?;
        if end.starts_with('.') {
            return None;
        }
        let start = start.trim().parse().ok()?;
        let end = end.trim().parse().ok()?;
        Some(Self { start, end })
    }
}

impl std::fmt::Display for RangeValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// A single field value
#[derive(Debug, Clone, PartialEq)]
pub enum RecordValue {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    /// Calendar date
    Date(NaiveDate),
    /// UTC timestamp
    DateTime(DateTime<Utc>),
    Range(RangeValue),
    /// Target-language expression resolved by the loader, emitted verbatim
    Expr(String),
    List(Vec<RecordValue>),
    Map(Record),
}

impl RecordValue {
    /// Create a string value
    pub fn string(s: impl Into<String>) -> Self {
        Self::String(s.into())
    }

    /// Create a verbatim expression value
    pub fn expr(s: impl Into<String>) -> Self {
        Self::Expr(s.into())
    }

    /// Create a list of string values
    pub fn strings<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::List(items.into_iter().map(|s| Self::String(s.into())).collect())
    }

    /// Null or an empty list
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Null => true,
            Self::List(items) => items.is_empty(),
            _ => false,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[RecordValue]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&Record> {
        match self {
            Self::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_map_mut(&mut self) -> Option<&mut Record> {
        match self {
            Self::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Short type name used in error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "boolean",
            Self::Number(_) => "number",
            Self::String(_) => "string",
            Self::Date(_) => "date",
            Self::DateTime(_) => "datetime",
            Self::Range(_) => "range",
            Self::Expr(_) => "expression",
            Self::List(_) => "list",
            Self::Map(_) => "map",
        }
    }
}

impl From<Value> for RecordValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(b),
            Value::Number(n) => Self::Number(n),
            Value::String(s) => Self::String(s),
            Value::Array(items) => Self::List(items.into_iter().map(Self::from).collect()),
            Value::Object(map) => Self::Map(
                map.into_iter()
                    .map(|(k, v)| (k, Self::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<&str> for RecordValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for RecordValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<bool> for RecordValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for RecordValue {
    fn from(n: i64) -> Self {
        Self::Number(n.into())
    }
}

impl From<Record> for RecordValue {
    fn from(map: Record) -> Self {
        Self::Map(map)
    }
}

impl From<Vec<RecordValue>> for RecordValue {
    fn from(items: Vec<RecordValue>) -> Self {
        Self::List(items)
    }
}

impl<T: Into<RecordValue>> From<Option<T>> for RecordValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Self::Null)
    }
}
