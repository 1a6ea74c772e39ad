//! Evaluation of a single field predicate against an attribute map

use super::FilterOperator;
use crate::error::{GraphError, GraphResult};
use crate::value_objects::DataDict;
use tracing::debug;

/// Evaluate `field <operator> literal` against `data`.
///
/// The literal is cast to the runtime type of the stored value. A missing field
/// evaluates to `false`; an impossible cast or an ordering operator on an
/// unordered type is an error.
pub fn evaluate(
    data: &DataDict,
    field: &str,
    operator: FilterOperator,
    literal: &str,
) -> GraphResult<bool> {
    let Some(stored) = data.get(field) else {
        return Ok(false);
    };
    let kind = stored.kind();
    if operator.is_ordering() && !kind.is_ordered() {
        return Err(GraphError::InvalidOperatorForType { operator, kind });
    }
    let literal = kind.coerce(literal)?;
    Ok(operator.holds(stored.compare(&literal)))
}

/// Like [`evaluate`], but a row that cannot be compared is skipped
pub fn admits(data: &DataDict, field: &str, operator: FilterOperator, literal: &str) -> bool {
    match evaluate(data, field, operator, literal) {
        Ok(admitted) => admitted,
        Err(err) => {
            debug!(field, %operator, literal, error = %err, "Skipping row that cannot be compared");
            false
        }
    }
}
