//! Graph nodes

use super::EdgeId;
use crate::value_objects::DataDict;
use std::hash::{Hash, Hasher};

/// A node in a property graph.
///
/// Identity is the id alone: two nodes with the same id are equal whatever
/// their attributes. The adjacency list is owned by the graph that holds the
/// node and lists the edge records whose source is this node.
#[derive(Debug, Clone)]
pub struct Node {
    id: String,
    data: DataDict,
    adjacency: Vec<EdgeId>,
}

impl Node {
    /// Create a new detached node
    pub fn new(id: impl Into<String>, data: DataDict) -> Self {
        Self {
            id: id.into(),
            data,
            adjacency: Vec::new(),
        }
    }

    /// Get the node id
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Get the node attributes
    pub fn data(&self) -> &DataDict {
        &self.data
    }

    /// Edge records leaving this node, in insertion order
    pub fn adjacency(&self) -> &[EdgeId] {
        &self.adjacency
    }

    /// Whether any attribute value contains `term` (case-sensitive)
    pub fn matches_search(&self, term: &str) -> bool {
        self.data.values().any(|value| value.contains_text(term))
    }

    pub(crate) fn replace_data(&mut self, data: DataDict) {
        self.data = data;
    }

    pub(crate) fn attach(&mut self, edge_id: EdgeId) {
        self.adjacency.push(edge_id);
    }

    pub(crate) fn detach(&mut self, edge_id: EdgeId) {
        self.adjacency.retain(|id| *id != edge_id);
    }

    pub(crate) fn detached(mut self) -> Self {
        self.adjacency.clear();
        self
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Node {}

impl Hash for Node {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}
