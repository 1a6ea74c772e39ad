//! Bundled plugins

use super::{ConfigMap, ConfigParam, DataSourcePlugin, ParamType, Plugin, VisualizerPlugin};
use crate::aggregate::{Edge, Graph, Node};
use crate::value_objects::{data_from_json, data_to_json, DataDict};
use anyhow::{anyhow, Context};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::fmt::Write as _;

/// A data source that always yields an empty directed graph
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyDataSource;

impl EmptyDataSource {
    pub const IDENTIFIER: &'static str = "empty_data_source";
}

impl Plugin for EmptyDataSource {
    fn identifier(&self) -> &str {
        Self::IDENTIFIER
    }

    fn name(&self) -> &str {
        "Empty Data Source"
    }
}

#[async_trait]
impl DataSourcePlugin for EmptyDataSource {
    async fn load(&self, _config: &ConfigMap) -> anyhow::Result<Graph> {
        Ok(Graph::default())
    }
}

/// Loads a graph from a JSON document on disk.
///
/// The document holds plain JSON attribute values:
///
/// ```json
/// {"directed": true, "root_id": "1",
///  "nodes": [{"id": "1", "data": {"name": "Alice"}}],
///  "edges": [{"src": "1", "target": "2", "data": {"w": 5}}]}
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonFileDataSource;

impl JsonFileDataSource {
    pub const IDENTIFIER: &'static str = "json_file_data_source";
}

#[derive(Deserialize)]
struct SourceDocument {
    #[serde(default = "directed_by_default")]
    directed: bool,
    #[serde(default)]
    root_id: Option<String>,
    #[serde(default)]
    nodes: Vec<SourceNode>,
    #[serde(default)]
    edges: Vec<SourceEdge>,
}

#[derive(Deserialize)]
struct SourceNode {
    id: String,
    #[serde(default)]
    data: serde_json::Map<String, serde_json::Value>,
}

#[derive(Deserialize)]
struct SourceEdge {
    src: String,
    target: String,
    #[serde(default)]
    data: serde_json::Map<String, serde_json::Value>,
}

fn directed_by_default() -> bool {
    true
}

impl Plugin for JsonFileDataSource {
    fn identifier(&self) -> &str {
        Self::IDENTIFIER
    }

    fn name(&self) -> &str {
        "JSON File"
    }
}

#[async_trait]
impl DataSourcePlugin for JsonFileDataSource {
    fn configuration_parameters(&self) -> Vec<ConfigParam> {
        ConfigParam::new("path", ParamType::String)
            .map(|param| param.with_display_name("File path"))
            .into_iter()
            .collect()
    }

    async fn load(&self, config: &ConfigMap) -> anyhow::Result<Graph> {
        let path = config
            .get("path")
            .and_then(|value| value.as_str())
            .ok_or_else(|| anyhow!("missing 'path'"))?;

        let raw = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("reading {path}"))?;
        let document: SourceDocument =
            serde_json::from_str(&raw).with_context(|| format!("parsing {path}"))?;

        let mut graph = Graph::new(document.directed);
        graph.set_root_id(document.root_id);
        for node in document.nodes {
            let data = data_from_json(&node.data)
                .with_context(|| format!("node {}", node.id))?;
            graph.add_node(Node::new(node.id, data))?;
        }
        for edge in document.edges {
            let data = data_from_json(&edge.data)
                .with_context(|| format!("edge {} -> {}", edge.src, edge.target))?;
            graph.add_edge(Edge::new(edge.src, edge.target, data))?;
        }

        tracing::debug!(
            path,
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "Loaded graph document"
        );
        Ok(graph)
    }
}

/// Renders the graph as a JSON document with plain attribute values
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonVisualizer;

impl JsonVisualizer {
    pub const IDENTIFIER: &'static str = "json_visualizer";
}

impl Plugin for JsonVisualizer {
    fn identifier(&self) -> &str {
        Self::IDENTIFIER
    }

    fn name(&self) -> &str {
        "JSON visualizer"
    }
}

impl VisualizerPlugin for JsonVisualizer {
    fn display(&self, graph: &Graph) -> String {
        let nodes: Vec<_> = graph
            .nodes()
            .values()
            .map(|node| json!({"id": node.id(), "data": data_to_json(node.data())}))
            .collect();
        let edges: Vec<_> = graph
            .edges()
            .values()
            .map(|edge| {
                json!({
                    "src": edge.src(),
                    "target": edge.target(),
                    "data": data_to_json(edge.data()),
                })
            })
            .collect();

        json!({
            "directed": graph.is_directed(),
            "root_id": graph.root_id(),
            "nodes": nodes,
            "edges": edges,
        })
        .to_string()
    }
}

/// Plain-text listing of nodes and edges
#[derive(Debug, Clone, Copy, Default)]
pub struct SummaryVisualizer;

impl SummaryVisualizer {
    pub const IDENTIFIER: &'static str = "summary_visualizer";
}

impl Plugin for SummaryVisualizer {
    fn identifier(&self) -> &str {
        Self::IDENTIFIER
    }

    fn name(&self) -> &str {
        "Summary"
    }
}

fn render_data(data: &DataDict) -> String {
    let mut pairs: Vec<_> = data.iter().collect();
    pairs.sort_by(|a, b| a.0.cmp(b.0));
    let body = pairs
        .iter()
        .map(|(key, value)| format!("{key}: {value}"))
        .collect::<Vec<_>>()
        .join(", ");
    format!("{{{body}}}")
}

impl VisualizerPlugin for SummaryVisualizer {
    fn display(&self, graph: &Graph) -> String {
        let kind = if graph.is_directed() {
            "directed"
        } else {
            "undirected"
        };
        let mut out = format!(
            "Graph ({kind}): {} nodes, {} edges\n",
            graph.node_count(),
            graph.edge_count()
        );
        // Writing to a String cannot fail.
        for node in graph.nodes().values() {
            let _ = writeln!(out, "  node {} {}", node.id(), render_data(node.data()));
        }
        for edge in graph.edges().values() {
            let _ = writeln!(out, "  edge {edge} {}", render_data(edge.data()));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value_objects::Value;
    use std::io::Write;

    #[tokio::test]
    async fn test_empty_data_source() {
        let graph = EmptyDataSource.load(&ConfigMap::new()).await.unwrap();
        assert!(graph.is_empty());
        assert!(graph.is_directed());
    }

    #[tokio::test]
    async fn test_json_file_data_source() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"directed": false, "root_id": "1",
                "nodes": [{{"id": "1", "data": {{"name": "Alice", "age": 30}}}}],
                "edges": [{{"src": "1", "target": "2", "data": {{"w": 1.5}}}}]}}"#
        )
        .unwrap();

        let config = ConfigMap::from([(
            "path".to_string(),
            serde_json::Value::from(file.path().to_string_lossy().into_owned()),
        )]);
        let graph = JsonFileDataSource.load(&config).await.unwrap();

        assert!(!graph.is_directed());
        assert_eq!(graph.root_id(), Some("1"));
        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.edge_count(), 2);
        assert_eq!(graph.node("1").unwrap().data()["age"], Value::Int(30));
    }

    #[tokio::test]
    async fn test_json_file_data_source_missing_file() {
        let config = ConfigMap::from([(
            "path".to_string(),
            serde_json::Value::from("/definitely/not/here.json"),
        )]);
        let err = JsonFileDataSource.load(&config).await.unwrap_err();
        assert!(err.to_string().contains("reading"));
        assert_eq!(JsonFileDataSource.configuration_parameters().len(), 1);
    }

    #[test]
    fn test_visualizers() {
        let mut graph = Graph::default();
        graph
            .add_edge(Edge::new(
                "1",
                "2",
                DataDict::from([("w".to_string(), Value::Int(5))]),
            ))
            .unwrap();

        let rendered: serde_json::Value =
            serde_json::from_str(&JsonVisualizer.display(&graph)).unwrap();
        assert_eq!(rendered["edges"][0]["data"]["w"], 5);
        assert_eq!(rendered["nodes"].as_array().unwrap().len(), 2);

        let summary = SummaryVisualizer.display(&graph);
        assert!(summary.starts_with("Graph (directed): 2 nodes, 1 edges"));
        assert!(summary.contains("edge 1 -> 2 {w: 5}"));
    }
}
