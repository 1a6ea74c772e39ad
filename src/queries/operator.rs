//! Comparison operators

use crate::error::GraphError;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// The six comparison operators a filter may use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterOperator {
    Eq,
    Neq,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl FilterOperator {
    /// All operators, in declaration order
    pub const ALL: [FilterOperator; 6] = [
        FilterOperator::Eq,
        FilterOperator::Neq,
        FilterOperator::Gt,
        FilterOperator::Gte,
        FilterOperator::Lt,
        FilterOperator::Lte,
    ];

    /// Wire name of the operator
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterOperator::Eq => "eq",
            FilterOperator::Neq => "neq",
            FilterOperator::Gt => "gt",
            FilterOperator::Gte => "gte",
            FilterOperator::Lt => "lt",
            FilterOperator::Lte => "lte",
        }
    }

    /// Mathematical symbol of the operator
    pub fn symbol(&self) -> &'static str {
        match self {
            FilterOperator::Eq => "==",
            FilterOperator::Neq => "!=",
            FilterOperator::Gt => ">",
            FilterOperator::Gte => ">=",
            FilterOperator::Lt => "<",
            FilterOperator::Lte => "<=",
        }
    }

    /// Whether the operator needs an ordered type
    pub fn is_ordering(&self) -> bool {
        !matches!(self, FilterOperator::Eq | FilterOperator::Neq)
    }

    /// Evaluate the operator against the result of `stored.compare(literal)`.
    ///
    /// An incomparable pair only satisfies `neq`.
    pub fn holds(&self, ordering: Option<Ordering>) -> bool {
        let Some(ordering) = ordering else {
            return *self == FilterOperator::Neq;
        };
        match self {
            FilterOperator::Eq => ordering == Ordering::Equal,
            FilterOperator::Neq => ordering != Ordering::Equal,
            FilterOperator::Gt => ordering == Ordering::Greater,
            FilterOperator::Gte => ordering != Ordering::Less,
            FilterOperator::Lt => ordering == Ordering::Less,
            FilterOperator::Lte => ordering != Ordering::Greater,
        }
    }
}

impl fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FilterOperator {
    type Err = GraphError;

    /// Accepts wire names and symbols
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let operator = match raw.trim() {
            "eq" | "==" => FilterOperator::Eq,
            "neq" | "!=" => FilterOperator::Neq,
            "gt" | ">" => FilterOperator::Gt,
            "gte" | ">=" => FilterOperator::Gte,
            "lt" | "<" => FilterOperator::Lt,
            "lte" | "<=" => FilterOperator::Lte,
            _ => return Err(GraphError::UnknownOperator(raw.to_string())),
        };
        Ok(operator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_names_and_symbols() {
        for operator in FilterOperator::ALL {
            assert_eq!(operator.as_str().parse::<FilterOperator>().unwrap(), operator);
            assert_eq!(operator.symbol().parse::<FilterOperator>().unwrap(), operator);
        }
        assert_eq!(
            "between".parse::<FilterOperator>().unwrap_err(),
            GraphError::UnknownOperator("between".into())
        );
    }

    #[test]
    fn test_holds() {
        use Ordering::*;
        assert!(FilterOperator::Gte.holds(Some(Equal)));
        assert!(FilterOperator::Gte.holds(Some(Greater)));
        assert!(!FilterOperator::Gt.holds(Some(Equal)));
        assert!(FilterOperator::Lte.holds(Some(Less)));
        assert!(FilterOperator::Neq.holds(None));
        assert!(!FilterOperator::Eq.holds(None));
    }
}
