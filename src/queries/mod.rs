//! Graph queries
//!
//! Filters and free-text search over the graph data model. Queries are
//! read-only: applying a [`GraphQuery`] produces a new graph holding the
//! matching nodes and the edges between them.

mod filter;
mod operator;
pub mod predicate;

pub use filter::{Filter, FilterRecord, FilterValue};
pub use operator::FilterOperator;

use crate::aggregate::{Graph, Node};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A conjunction of filters plus an optional search term
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphQuery {
    pub filters: Vec<Filter>,
    #[serde(default)]
    pub search_term: Option<String>,
}

impl GraphQuery {
    /// Create a query from filters and an optional search term
    pub fn new(filters: Vec<Filter>, search_term: Option<String>) -> Self {
        Self {
            filters,
            search_term,
        }
    }

    /// The search term, if it is non-empty
    pub fn active_search(&self) -> Option<&str> {
        self.search_term.as_deref().filter(|term| !term.is_empty())
    }

    /// Whether the query keeps every node
    pub fn is_unrestricted(&self) -> bool {
        self.filters.is_empty() && self.active_search().is_none()
    }

    /// Whether a node passes every filter and the search term
    pub fn admits(&self, node: &Node) -> bool {
        self.filters.iter().all(|filter| filter.matches(node.data()))
            && self
                .active_search()
                .map_or(true, |term| node.matches_search(term))
    }

    /// Build the subgraph of admitted nodes.
    ///
    /// An edge is kept when both of its endpoints are kept. Directedness and the
    /// root id carry over.
    pub fn apply(&self, graph: &Graph) -> Graph {
        if self.is_unrestricted() {
            return graph.clone();
        }

        let mut result = Graph::new(graph.is_directed());
        result.set_root_id(graph.root_id().map(str::to_string));

        for node in graph.nodes().values().filter(|node| self.admits(node)) {
            // Ids in a live graph are non-empty, so the insert cannot fail.
            let _ = result.add_node(Node::new(node.id(), node.data().clone()));
        }
        for edge in graph.edges().values() {
            if result.contains_node(edge.src()) && result.contains_node(edge.target()) {
                let _ = result.add_edge(edge.clone());
            }
        }

        debug!(
            filters = self.filters.len(),
            search = self.active_search().unwrap_or(""),
            nodes = result.node_count(),
            edges = result.edge_count(),
            "Applied graph query"
        );
        result
    }
}
