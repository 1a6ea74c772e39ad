//! Graph aggregates

mod edge;
mod graph;
mod node;

pub use edge::{Edge, EdgeId};
pub use graph::{EdgeRecord, Graph, GraphSnapshot, NodeRecord};
pub use node::Node;
