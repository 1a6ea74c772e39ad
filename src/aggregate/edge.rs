//! Graph edges

use crate::value_objects::DataDict;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Stable handle of an edge record inside one [`Graph`](super::Graph)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EdgeId(pub(crate) u64);

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "e{}", self.0)
    }
}

/// A directed edge between two node ids.
///
/// Equality is structural over source, target and the attribute map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    src: String,
    target: String,
    data: DataDict,
}

impl Edge {
    /// Create a new edge
    pub fn new(src: impl Into<String>, target: impl Into<String>, data: DataDict) -> Self {
        Self {
            src: src.into(),
            target: target.into(),
            data,
        }
    }

    /// Source node id
    pub fn src(&self) -> &str {
        &self.src
    }

    /// Target node id
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Edge attributes
    pub fn data(&self) -> &DataDict {
        &self.data
    }

    /// Whether the edge runs from `src` to `target`
    pub fn connects(&self, src: &str, target: &str) -> bool {
        self.src == src && self.target == target
    }

    /// Whether `node_id` is either endpoint
    pub fn touches(&self, node_id: &str) -> bool {
        self.src == node_id || self.target == node_id
    }

    /// The mirrored edge used for undirected graphs
    pub fn reversed(&self) -> Edge {
        Edge {
            src: self.target.clone(),
            target: self.src.clone(),
            data: self.data.clone(),
        }
    }

    pub(crate) fn replace_data(&mut self, data: DataDict) {
        self.data = data;
    }
}

impl Hash for Edge {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.src.hash(state);
        self.target.hash(state);
        // Attribute maps are unordered, so hash the pairs in key order.
        let mut pairs: Vec<_> = self.data.iter().collect();
        pairs.sort_by(|a, b| a.0.cmp(b.0));
        pairs.hash(state);
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.src, self.target)
    }
}
