//! Graph value objects
//!
//! Values are the scalars stored under keys in node and edge attribute maps.
//! They are compared by value rather than identity, and every comparison or
//! coercion switches exhaustively over the value's tag.

use crate::error::{GraphError, GraphResult};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Date format used for date literals and date rendering
pub const DATE_FORMAT: &str = "%Y-%m-%d";

const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Attribute map stored inside a node or an edge
pub type DataDict = HashMap<String, Value>;

/// A single value stored under a key in a node or edge
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Value {
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Date(NaiveDate),
    #[serde(rename = "datetime")]
    DateTime(NaiveDateTime),
}

/// The runtime type tag of a [`Value`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    String,
    Int,
    Float,
    Bool,
    Date,
    DateTime,
}

impl ValueKind {
    /// Get the string representation of the kind
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueKind::String => "string",
            ValueKind::Int => "int",
            ValueKind::Float => "float",
            ValueKind::Bool => "bool",
            ValueKind::Date => "date",
            ValueKind::DateTime => "datetime",
        }
    }

    /// Whether values of this kind support `gt`/`gte`/`lt`/`lte`
    pub fn is_ordered(&self) -> bool {
        matches!(
            self,
            ValueKind::Int | ValueKind::Float | ValueKind::Date | ValueKind::DateTime
        )
    }

    /// Cast a raw literal to a value of this kind
    pub fn coerce(&self, literal: &str) -> GraphResult<Value> {
        let coercion_error = || GraphError::Coercion {
            literal: literal.to_string(),
            target: *self,
        };
        let trimmed = literal.trim();

        match self {
            ValueKind::String => Ok(Value::String(literal.to_string())),
            ValueKind::Int => trimmed
                .parse::<i64>()
                .map(Value::Int)
                .map_err(|_| coercion_error()),
            ValueKind::Float => trimmed
                .parse::<f64>()
                .map(Value::Float)
                .map_err(|_| coercion_error()),
            ValueKind::Bool => match trimmed.to_lowercase().as_str() {
                "true" | "1" | "yes" => Ok(Value::Bool(true)),
                "false" | "0" | "no" => Ok(Value::Bool(false)),
                _ => Err(coercion_error()),
            },
            ValueKind::Date => parse_date(trimmed)
                .map(Value::Date)
                .ok_or_else(coercion_error),
            ValueKind::DateTime => parse_datetime(trimmed)
                .map(Value::DateTime)
                .ok_or_else(coercion_error),
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parse a `YYYY-MM-DD` date
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw, DATE_FORMAT).ok()
}

/// Parse a naive date-time; a bare date is read as midnight
pub fn parse_datetime(raw: &str) -> Option<NaiveDateTime> {
    DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .or_else(|| parse_date(raw).and_then(|date| date.and_hms_opt(0, 0, 0)))
}

impl Value {
    /// Get the runtime type of this value
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::String(_) => ValueKind::String,
            Value::Int(_) => ValueKind::Int,
            Value::Float(_) => ValueKind::Float,
            Value::Bool(_) => ValueKind::Bool,
            Value::Date(_) => ValueKind::Date,
            Value::DateTime(_) => ValueKind::DateTime,
        }
    }

    /// Compare with another value of the same kind.
    ///
    /// Returns `None` for values of different kinds and for NaN floats.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
            (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
            (Value::Float(a), Value::Float(b)) => a.partial_cmp(b),
            (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
            (Value::Date(a), Value::Date(b)) => Some(a.cmp(b)),
            (Value::DateTime(a), Value::DateTime(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    /// Case-sensitive substring match against the rendered value
    pub fn contains_text(&self, term: &str) -> bool {
        match self {
            Value::String(s) => s.contains(term),
            other => other.to_string().contains(term),
        }
    }

    /// Convert a JSON scalar supplied by a caller into a value.
    ///
    /// Strings stay strings; dates only enter the model through typed sources.
    pub fn from_json(value: &serde_json::Value) -> GraphResult<Value> {
        match value {
            serde_json::Value::String(s) => Ok(Value::String(s.clone())),
            serde_json::Value::Bool(b) => Ok(Value::Bool(*b)),
            serde_json::Value::Number(n) => n
                .as_i64()
                .map(Value::Int)
                .or_else(|| n.as_f64().map(Value::Float))
                .ok_or_else(|| GraphError::validation(format!("Unsupported number: {n}"))),
            other => Err(GraphError::validation(format!(
                "Unsupported attribute value: {other}"
            ))),
        }
    }

    /// Natural JSON rendering, with dates as ISO strings
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::String(s) => serde_json::Value::from(s.as_str()),
            Value::Int(i) => serde_json::Value::from(*i),
            Value::Float(f) => serde_json::Value::from(*f),
            Value::Bool(b) => serde_json::Value::from(*b),
            Value::Date(_) | Value::DateTime(_) => serde_json::Value::from(self.to_string()),
        }
    }
}

/// Decode a JSON object into an attribute map
pub fn data_from_json(object: &serde_json::Map<String, serde_json::Value>) -> GraphResult<DataDict> {
    object
        .iter()
        .map(|(key, value)| Ok((key.clone(), Value::from_json(value)?)))
        .collect()
}

/// Render an attribute map as a JSON object
pub fn data_to_json(data: &DataDict) -> serde_json::Value {
    let object: serde_json::Map<String, serde_json::Value> = data
        .iter()
        .map(|(key, value)| (key.clone(), value.to_json()))
        .collect();
    serde_json::Value::Object(object)
}

// Identity equality: floats compare by bit pattern so that Eq and Hash agree.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits(),
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Date(a), Value::Date(b)) => a == b,
            (Value::DateTime(a), Value::DateTime(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.kind().hash(state);
        match self {
            Value::String(s) => s.hash(state),
            Value::Int(i) => i.hash(state),
            Value::Float(f) => f.to_bits().hash(state),
            Value::Bool(b) => b.hash(state),
            Value::Date(d) => d.hash(state),
            Value::DateTime(dt) => dt.hash(state),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => f.write_str(s),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x:?}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Date(d) => write!(f, "{}", d.format(DATE_FORMAT)),
            Value::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%dT%H:%M:%S")),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<NaiveDate> for Value {
    fn from(d: NaiveDate) -> Self {
        Value::Date(d)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(dt: NaiveDateTime) -> Self {
        Value::DateTime(dt)
    }
}
