//! Property graph aggregate
//!
//! The graph is an arena: nodes are keyed by id, edges are records keyed by a
//! graph-local [`EdgeId`] and refer to their endpoints by id. Adjacency lists
//! and the endpoint index are maintained on every mutation, so no node ever
//! holds a reference to another.

use super::{Edge, EdgeId, Node};
use crate::error::{Entity, GraphError, GraphResult};
use crate::queries::{predicate, FilterOperator};
use crate::value_objects::DataDict;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A mutable property graph
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(into = "GraphSnapshot", try_from = "GraphSnapshot")]
pub struct Graph {
    nodes: IndexMap<String, Node>,
    edges: IndexMap<EdgeId, Edge>,
    /// Edge records grouped by `(src, target)`
    by_endpoints: HashMap<(String, String), Vec<EdgeId>>,
    next_edge_id: u64,
    directed: bool,
    root_id: Option<String>,
}

impl Default for Graph {
    fn default() -> Self {
        Self::new(true)
    }
}

impl Graph {
    /// Create an empty graph
    pub fn new(directed: bool) -> Self {
        Self {
            nodes: IndexMap::new(),
            edges: IndexMap::new(),
            by_endpoints: HashMap::new(),
            next_edge_id: 0,
            directed,
            root_id: None,
        }
    }

    /// Set the root node id
    pub fn with_root(mut self, root_id: impl Into<String>) -> Self {
        self.root_id = Some(root_id.into());
        self
    }

    /// Whether edges are directed
    pub fn is_directed(&self) -> bool {
        self.directed
    }

    /// The informational root node id
    pub fn root_id(&self) -> Option<&str> {
        self.root_id.as_deref()
    }

    /// Replace the root node id
    pub fn set_root_id(&mut self, root_id: Option<String>) {
        self.root_id = root_id;
    }

    /// All nodes, in insertion order
    pub fn nodes(&self) -> &IndexMap<String, Node> {
        &self.nodes
    }

    /// All edge records, in insertion order
    pub fn edges(&self) -> &IndexMap<EdgeId, Edge> {
        &self.edges
    }

    /// Get a node by id
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// Check whether a node exists
    pub fn contains_node(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    /// Get an edge record by handle
    pub fn edge(&self, id: EdgeId) -> Option<&Edge> {
        self.edges.get(&id)
    }

    /// The first edge record running from `src` to `target`
    pub fn edge_between(&self, src: &str, target: &str) -> Option<&Edge> {
        self.ids_between(src, target)
            .first()
            .and_then(|id| self.edges.get(id))
    }

    /// Check whether a structurally equal edge exists
    pub fn contains_edge(&self, edge: &Edge) -> bool {
        self.find_edge(edge).is_some()
    }

    /// Number of nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of edge records (an undirected edge counts twice)
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Whether the graph has no nodes
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Edge records leaving a node
    pub fn outgoing_edges(&self, id: &str) -> Vec<&Edge> {
        self.nodes
            .get(id)
            .map(|node| {
                node.adjacency()
                    .iter()
                    .filter_map(|edge_id| self.edges.get(edge_id))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Nodes reachable over one outgoing edge
    pub fn neighbours(&self, id: &str) -> Vec<&Node> {
        self.outgoing_edges(id)
            .into_iter()
            .filter_map(|edge| self.nodes.get(edge.target()))
            .collect()
    }

    /// Add a node if no node with the same id exists.
    ///
    /// Adding an id that is already present keeps the stored attributes and
    /// returns `Ok(false)`.
    pub fn add_node(&mut self, node: Node) -> GraphResult<bool> {
        if node.id().trim().is_empty() {
            return Err(GraphError::TypeConstraint(
                "node id must not be empty".to_string(),
            ));
        }
        if self.nodes.contains_key(node.id()) {
            return Ok(false);
        }
        self.nodes.insert(node.id().to_string(), node.detached());
        Ok(true)
    }

    /// Remove a node and every edge record that touches it
    pub fn remove_node(&mut self, id: &str) -> GraphResult<Node> {
        let node = self
            .nodes
            .shift_remove(id)
            .ok_or_else(|| GraphError::not_found(Entity::Node, id))?;

        let incident: Vec<EdgeId> = self
            .edges
            .iter()
            .filter(|(_, edge)| edge.touches(id))
            .map(|(edge_id, _)| *edge_id)
            .collect();
        for edge_id in incident {
            self.detach_edge(edge_id);
        }

        Ok(node.detached())
    }

    /// Add an edge, creating missing endpoints with empty attributes.
    ///
    /// Structurally equal edges are not duplicated. In an undirected graph the
    /// mirrored record is stored alongside. Returns whether anything was added.
    pub fn add_edge(&mut self, edge: Edge) -> GraphResult<bool> {
        if edge.src().trim().is_empty() || edge.target().trim().is_empty() {
            return Err(GraphError::TypeConstraint(
                "edge endpoints must be non-empty node ids".to_string(),
            ));
        }
        for endpoint in [edge.src(), edge.target()] {
            if !self.nodes.contains_key(endpoint) {
                self.nodes
                    .insert(endpoint.to_string(), Node::new(endpoint, DataDict::new()));
            }
        }
        if self.contains_edge(&edge) {
            return Ok(false);
        }

        let mirror = (!self.directed).then(|| edge.reversed());
        self.insert_edge(edge);
        if let Some(mirror) = mirror {
            if !self.contains_edge(&mirror) {
                self.insert_edge(mirror);
            }
        }
        Ok(true)
    }

    /// Remove a structurally equal edge, and its mirror in an undirected graph
    pub fn remove_edge(&mut self, edge: &Edge) -> bool {
        let Some(edge_id) = self.find_edge(edge) else {
            return false;
        };
        self.detach_edge(edge_id);

        if !self.directed {
            if let Some(mirror_id) = self.find_edge(&edge.reversed()) {
                self.detach_edge(mirror_id);
            }
        }
        true
    }

    /// Replace a node's attributes. Returns `false` if the node is absent.
    pub fn update_node(&mut self, id: &str, data: DataDict) -> bool {
        match self.nodes.get_mut(id) {
            Some(node) => {
                node.replace_data(data);
                true
            }
            None => false,
        }
    }

    /// Replace the attributes of the first edge from `src` to `target`.
    ///
    /// In an undirected graph the mirrored record is updated too. Returns
    /// `false` if no such edge exists.
    pub fn update_edge(&mut self, src: &str, target: &str, data: DataDict) -> bool {
        let Some(edge_id) = self.ids_between(src, target).first().copied() else {
            return false;
        };

        if !self.directed && src != target {
            let old = self.edges.get(&edge_id).map(|edge| edge.data().clone());
            let mirror_id = self
                .ids_between(target, src)
                .iter()
                .copied()
                .find(|id| self.edges.get(id).map(Edge::data) == old.as_ref());
            if let Some(mirror) = mirror_id.and_then(|id| self.edges.get_mut(&id)) {
                mirror.replace_data(data.clone());
            }
        }

        match self.edges.get_mut(&edge_id) {
            Some(edge) => {
                edge.replace_data(data);
                true
            }
            None => false,
        }
    }

    /// Remove every node and edge; directedness and root are kept
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.edges.clear();
        self.by_endpoints.clear();
    }

    /// Nodes with an attribute value containing `term` (case-sensitive).
    ///
    /// An empty term matches every node that has at least one attribute;
    /// callers guard against empty terms.
    pub fn search_nodes(&self, term: &str) -> Vec<&Node> {
        self.nodes
            .values()
            .filter(|node| node.matches_search(term))
            .collect()
    }

    /// Edges whose own attributes or either endpoint's attributes contain `term`
    pub fn search_edges(&self, term: &str) -> Vec<&Edge> {
        self.edges
            .values()
            .filter(|edge| {
                edge.data().values().any(|value| value.contains_text(term))
                    || self.endpoint_matches(edge.src(), term)
                    || self.endpoint_matches(edge.target(), term)
            })
            .collect()
    }

    /// Nodes whose `field` satisfies `operator` against `literal`.
    ///
    /// The literal is cast to the stored value's type. Nodes without the
    /// field, and nodes whose value cannot be compared, are left out.
    pub fn filter_nodes(
        &self,
        field: &str,
        operator: &str,
        literal: &str,
    ) -> GraphResult<Vec<&Node>> {
        let operator: FilterOperator = operator.parse()?;
        Ok(self
            .nodes
            .values()
            .filter(|node| predicate::admits(node.data(), field, operator, literal))
            .collect())
    }

    /// Edges whose `field` satisfies `operator` against `literal`
    pub fn filter_edges(
        &self,
        field: &str,
        operator: &str,
        literal: &str,
    ) -> GraphResult<Vec<&Edge>> {
        let operator: FilterOperator = operator.parse()?;
        Ok(self
            .edges
            .values()
            .filter(|edge| predicate::admits(edge.data(), field, operator, literal))
            .collect())
    }

    fn endpoint_matches(&self, id: &str, term: &str) -> bool {
        self.nodes
            .get(id)
            .is_some_and(|node| node.matches_search(term))
    }

    fn ids_between(&self, src: &str, target: &str) -> &[EdgeId] {
        self.by_endpoints
            .get(&(src.to_string(), target.to_string()))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    fn find_edge(&self, edge: &Edge) -> Option<EdgeId> {
        self.ids_between(edge.src(), edge.target())
            .iter()
            .copied()
            .find(|id| self.edges.get(id) == Some(edge))
    }

    fn insert_edge(&mut self, edge: Edge) -> EdgeId {
        let edge_id = EdgeId(self.next_edge_id);
        self.next_edge_id += 1;

        self.by_endpoints
            .entry((edge.src().to_string(), edge.target().to_string()))
            .or_default()
            .push(edge_id);
        if let Some(node) = self.nodes.get_mut(edge.src()) {
            node.attach(edge_id);
        }
        self.edges.insert(edge_id, edge);
        edge_id
    }

    fn detach_edge(&mut self, edge_id: EdgeId) -> Option<Edge> {
        let edge = self.edges.shift_remove(&edge_id)?;
        let key = (edge.src().to_string(), edge.target().to_string());
        if let Some(ids) = self.by_endpoints.get_mut(&key) {
            ids.retain(|id| *id != edge_id);
            if ids.is_empty() {
                self.by_endpoints.remove(&key);
            }
        }
        if let Some(node) = self.nodes.get_mut(edge.src()) {
            node.detach(edge_id);
        }
        Some(edge)
    }
}

/// Serialized form of a node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeRecord {
    pub id: String,
    #[serde(default)]
    pub data: DataDict,
}

/// Serialized form of an edge record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeRecord {
    pub src: String,
    pub target: String,
    #[serde(default)]
    pub data: DataDict,
}

/// Serialized form of a whole graph
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphSnapshot {
    #[serde(default = "directed_by_default")]
    pub directed: bool,
    #[serde(default)]
    pub root_id: Option<String>,
    #[serde(default)]
    pub nodes: Vec<NodeRecord>,
    #[serde(default)]
    pub edges: Vec<EdgeRecord>,
}

fn directed_by_default() -> bool {
    true
}

impl From<Graph> for GraphSnapshot {
    fn from(graph: Graph) -> Self {
        Self {
            directed: graph.directed,
            root_id: graph.root_id,
            nodes: graph
                .nodes
                .into_values()
                .map(|node| NodeRecord {
                    id: node.id().to_string(),
                    data: node.data().clone(),
                })
                .collect(),
            edges: graph
                .edges
                .into_values()
                .map(|edge| EdgeRecord {
                    src: edge.src().to_string(),
                    target: edge.target().to_string(),
                    data: edge.data().clone(),
                })
                .collect(),
        }
    }
}

impl TryFrom<GraphSnapshot> for Graph {
    type Error = GraphError;

    fn try_from(snapshot: GraphSnapshot) -> Result<Self, Self::Error> {
        let mut graph = Graph::new(snapshot.directed);
        graph.root_id = snapshot.root_id;
        for record in snapshot.nodes {
            graph.add_node(Node::new(record.id, record.data))?;
        }
        for record in snapshot.edges {
            graph.add_edge(Edge::new(record.src, record.target, record.data))?;
        }
        Ok(graph)
    }
}
