//! Graph Integration Tests

use graph_explorer::{
    aggregate::{Edge, Graph, GraphSnapshot, Node},
    queries::{Filter, GraphQuery},
    DataDict, GraphError, Value,
};

fn data(pairs: &[(&str, Value)]) -> DataDict {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

fn people() -> Graph {
    let mut graph = Graph::new(true).with_root("ada");
    for (id, name, age) in [("ada", "Ada", 36), ("bob", "Bob", 25), ("cy", "Cyrus", 51)] {
        graph
            .add_node(Node::new(
                id,
                data(&[("name", Value::String(name.into())), ("age", Value::Int(age))]),
            ))
            .unwrap();
    }
    graph
        .add_edge(Edge::new("ada", "bob", data(&[("kind", Value::String("mentor".into()))])))
        .unwrap();
    graph
        .add_edge(Edge::new("bob", "cy", data(&[("kind", Value::String("friend".into()))])))
        .unwrap();
    graph
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_graph_creation() {
        let graph = people();
        assert!(graph.is_directed());
        assert_eq!(graph.root_id(), Some("ada"));
        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.edge_count(), 2);
        assert_eq!(graph.outgoing_edges("bob").len(), 1);
    }

    #[test]
    fn test_edge_adds_missing_endpoints() {
        let mut graph = Graph::default();
        graph.add_edge(Edge::new("x", "y", DataDict::new())).unwrap();
        assert!(graph.contains_node("x"));
        assert!(graph.contains_node("y"));
    }

    #[test]
    fn test_remove_node_cascades() {
        let mut graph = people();
        let removed = graph.remove_node("bob").unwrap();
        assert_eq!(removed.id(), "bob");
        assert_eq!(graph.edge_count(), 0);
        assert!(graph.node("ada").unwrap().adjacency().is_empty());

        assert!(matches!(
            graph.remove_node("bob"),
            Err(GraphError::NotFound { .. })
        ));
    }

    #[test]
    fn test_search_and_filter() {
        let graph = people();
        let found: Vec<_> = graph.search_nodes("rus").iter().map(|n| n.id().to_string()).collect();
        assert_eq!(found, vec!["cy"]);
        assert_eq!(graph.search_edges("mentor").len(), 1);

        let over_30 = graph.filter_nodes("age", ">", "30").unwrap();
        assert_eq!(over_30.len(), 2);
        assert!(matches!(
            graph.filter_nodes("age", "~", "30"),
            Err(GraphError::UnknownOperator(_))
        ));
    }

    #[test]
    fn test_query_keeps_edges_between_kept_nodes() {
        let graph = people();
        let query = GraphQuery::new(vec![Filter::parse("age", "lte", "40").unwrap()], None);
        let view = query.apply(&graph);

        assert_eq!(view.node_count(), 2);
        assert_eq!(view.edge_count(), 1);
        assert!(view.edge_between("ada", "bob").is_some());
        assert_eq!(view.root_id(), Some("ada"));
    }

    #[test]
    fn test_snapshot_round_trip() {
        let graph = people();
        let json = serde_json::to_string(&graph).unwrap();
        let restored: Graph = serde_json::from_str(&json).unwrap();

        assert_eq!(restored.node_count(), graph.node_count());
        assert_eq!(restored.edge_count(), graph.edge_count());
        assert_eq!(restored.node("cy").unwrap().data(), graph.node("cy").unwrap().data());

        let snapshot: GraphSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(snapshot.nodes.len(), 3);
    }
}
