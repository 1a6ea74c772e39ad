//! Typed field filters
//!
//! A [`Filter`] is one `field <operator> value` predicate. The value's type is
//! inferred once at construction from the raw literal: integer, then float,
//! then `YYYY-MM-DD` date, and plain text otherwise. Text values only accept
//! `eq` and `neq`.

use super::{predicate, FilterOperator};
use crate::error::{GraphError, GraphResult};
use crate::value_objects::{parse_date, DataDict, ValueKind, DATE_FORMAT};
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// The value of a filter after type inference
#[derive(Debug, Clone)]
pub enum FilterValue {
    Int(i64),
    Float(f64),
    Date(NaiveDate),
    Text(String),
}

impl FilterValue {
    /// Infer the type of a raw literal
    pub fn infer(raw: &str) -> Self {
        let trimmed = raw.trim();
        if let Ok(i) = trimmed.parse::<i64>() {
            return FilterValue::Int(i);
        }
        if let Ok(f) = trimmed.parse::<f64>() {
            return FilterValue::Float(f);
        }
        if let Some(date) = parse_date(trimmed) {
            return FilterValue::Date(date);
        }
        FilterValue::Text(raw.to_string())
    }

    /// The value type tag persisted alongside the filter
    pub fn kind(&self) -> ValueKind {
        match self {
            FilterValue::Int(_) => ValueKind::Int,
            FilterValue::Float(_) => ValueKind::Float,
            FilterValue::Date(_) => ValueKind::Date,
            FilterValue::Text(_) => ValueKind::String,
        }
    }
}

// Floats compare by bit pattern so a filter parsed from "nan" equals itself.
impl PartialEq for FilterValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (FilterValue::Int(a), FilterValue::Int(b)) => a == b,
            (FilterValue::Float(a), FilterValue::Float(b)) => a.to_bits() == b.to_bits(),
            (FilterValue::Date(a), FilterValue::Date(b)) => a == b,
            (FilterValue::Text(a), FilterValue::Text(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for FilterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterValue::Int(i) => write!(f, "{i}"),
            FilterValue::Float(x) => write!(f, "{x:?}"),
            FilterValue::Date(d) => write!(f, "{}", d.format(DATE_FORMAT)),
            FilterValue::Text(s) => f.write_str(s),
        }
    }
}

/// A single typed predicate over an attribute field
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(into = "FilterRecord", try_from = "FilterRecord")]
pub struct Filter {
    field: String,
    operator: FilterOperator,
    raw: String,
    value: FilterValue,
}

impl Filter {
    /// Build a filter, inferring the value type.
    ///
    /// Fails if the field is empty or if an ordering operator is paired with a
    /// text value.
    pub fn new(
        field: impl Into<String>,
        operator: FilterOperator,
        raw: impl Into<String>,
    ) -> GraphResult<Self> {
        let field = field.into();
        let raw = raw.into();
        if field.trim().is_empty() {
            return Err(GraphError::validation("Filter field must not be empty."));
        }

        let value = FilterValue::infer(&raw);
        if operator.is_ordering() && matches!(value, FilterValue::Text(_)) {
            return Err(GraphError::InvalidOperatorForType {
                operator,
                kind: ValueKind::String,
            });
        }

        Ok(Self {
            field,
            operator,
            raw,
            value,
        })
    }

    /// Build a filter from an operator name or symbol
    pub fn parse(field: &str, operator: &str, raw: &str) -> GraphResult<Self> {
        Self::new(field, operator.parse()?, raw)
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn operator(&self) -> FilterOperator {
        self.operator
    }

    /// The literal as supplied
    pub fn raw_value(&self) -> &str {
        &self.raw
    }

    /// The literal after type inference
    pub fn value(&self) -> &FilterValue {
        &self.value
    }

    pub fn kind(&self) -> ValueKind {
        self.value.kind()
    }

    /// Whether an attribute map passes this filter.
    ///
    /// The literal is cast to the stored value's type; rows that cannot be
    /// compared do not pass.
    pub fn matches(&self, data: &DataDict) -> bool {
        predicate::admits(data, &self.field, self.operator, &self.raw)
    }
}

impl PartialEq for Filter {
    fn eq(&self, other: &Self) -> bool {
        self.field == other.field && self.operator == other.operator && self.value == other.value
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.field, self.operator.symbol(), self.value)
    }
}

/// Persisted form of a filter: `{field, operator, value, type}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterRecord {
    pub field: String,
    pub operator: FilterOperator,
    #[serde(deserialize_with = "string_or_number")]
    pub value: String,
    #[serde(rename = "type", default)]
    pub kind: Option<ValueKind>,
}

impl From<Filter> for FilterRecord {
    fn from(filter: Filter) -> Self {
        let kind = Some(filter.kind());
        Self {
            field: filter.field,
            operator: filter.operator,
            value: filter.raw,
            kind,
        }
    }
}

impl TryFrom<FilterRecord> for Filter {
    type Error = GraphError;

    // The stored type tag is informational; the type is inferred again.
    fn try_from(record: FilterRecord) -> Result<Self, Self::Error> {
        Filter::new(record.field, record.operator, record.value)
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "filter value must be a string or number, got {other}"
        ))),
    }
}
