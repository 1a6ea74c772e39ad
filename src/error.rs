//! Graph explorer errors
//!
//! A single error taxonomy shared by the data model, the query engine, the
//! persistence boundary and the command layer. The `Display` text of every
//! variant is what the command layer hands back to the user, so messages are
//! written as complete sentences.

use crate::queries::FilterOperator;
use crate::value_objects::ValueKind;
use std::fmt;

/// Result type used throughout the crate
pub type GraphResult<T> = Result<T, GraphError>;

/// The kind of entity an error refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Node,
    Edge,
    Filter,
    Workspace,
    DataSource,
    Visualizer,
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Entity::Node => "Node",
            Entity::Edge => "Edge",
            Entity::Filter => "Filter",
            Entity::Workspace => "Workspace",
            Entity::DataSource => "Data source",
            Entity::Visualizer => "Visualizer",
        };
        f.write_str(name)
    }
}

/// Errors raised by graph, query, context and command operations
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GraphError {
    /// Missing or malformed command arguments
    #[error("{0}")]
    Validation(String),

    /// A referenced entity does not exist
    #[error("{entity} {id} not found.")]
    NotFound { entity: Entity, id: String },

    /// An entity with the same identity already exists
    #[error("{}", duplicate_message(.entity, .id))]
    Duplicate { entity: Entity, id: Option<String> },

    /// A filter literal could not be cast to the stored value's type
    #[error("Cannot coerce '{literal}' to {target}")]
    Coercion { literal: String, target: ValueKind },

    /// An ordering operator was used with a type that has no order
    #[error("Operator '{operator}' is not valid for {kind} values")]
    InvalidOperatorForType {
        operator: FilterOperator,
        kind: ValueKind,
    },

    /// The operator name is not one of the supported comparison operators
    #[error("Unknown operator: {0}")]
    UnknownOperator(String),

    /// A data model method received a structurally invalid argument
    #[error("Type constraint violated: {0}")]
    TypeConstraint(String),

    /// The operation needs a bound data source
    #[error("No data source selected")]
    NoDataSourceSelected,

    /// A data source plugin failed while loading
    #[error("Failed to load data source '{source_id}': {message}")]
    DataSourceLoad { source_id: String, message: String },

    /// The graph or workspace store failed
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// An external call did not complete in time
    #[error("{operation} timed out after {millis}ms")]
    Timeout { operation: String, millis: u64 },
}

fn duplicate_message(entity: &Entity, id: &Option<String>) -> String {
    match id {
        Some(id) => format!("{entity} {id} already exists."),
        None => format!("{entity} already exists."),
    }
}

impl GraphError {
    /// Shorthand for a [`GraphError::NotFound`]
    pub fn not_found(entity: Entity, id: impl Into<String>) -> Self {
        GraphError::NotFound {
            entity,
            id: id.into(),
        }
    }

    /// Shorthand for a [`GraphError::Duplicate`] that names the entity id
    pub fn duplicate(entity: Entity, id: impl Into<String>) -> Self {
        GraphError::Duplicate {
            entity,
            id: Some(id.into()),
        }
    }

    /// Shorthand for a [`GraphError::Validation`]
    pub fn validation(message: impl Into<String>) -> Self {
        GraphError::Validation(message.into())
    }

    /// Whether a read that failed with this error may be attempted again
    pub fn is_retryable(&self) -> bool {
        matches!(self, GraphError::Persistence(_) | GraphError::Timeout { .. })
    }
}

impl From<std::io::Error> for GraphError {
    fn from(err: std::io::Error) -> Self {
        GraphError::Persistence(err.to_string())
    }
}
