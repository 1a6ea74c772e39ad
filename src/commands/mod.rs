//! Graph explorer commands
//!
//! Commands are the operations front ends can request. They arrive as a name
//! plus a loosely typed argument map and are validated into a typed
//! [`Command`] before anything touches the graph.

use crate::error::{GraphError, GraphResult};
use crate::plugins::ConfigMap;
use crate::queries::Filter;
use crate::value_objects::{data_from_json, DataDict};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Raw command arguments as supplied by a front end
pub type CommandArgs = serde_json::Map<String, serde_json::Value>;

/// Names of the supported commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CommandName {
    CreateNode,
    UpdateNode,
    DeleteNode,
    CreateEdge,
    UpdateEdge,
    DeleteEdge,
    ClearGraph,
    Search,
    Filter,
    ClearSearch,
    RemoveFilter,
    SelectWorkspace,
    CreateWorkspace,
    UpdateWorkspace,
    DeleteWorkspace,
    SelectVisualizer,
    RefreshDataSource,
}

impl CommandName {
    pub const ALL: [CommandName; 17] = [
        CommandName::CreateNode,
        CommandName::UpdateNode,
        CommandName::DeleteNode,
        CommandName::CreateEdge,
        CommandName::UpdateEdge,
        CommandName::DeleteEdge,
        CommandName::ClearGraph,
        CommandName::Search,
        CommandName::Filter,
        CommandName::ClearSearch,
        CommandName::RemoveFilter,
        CommandName::SelectWorkspace,
        CommandName::CreateWorkspace,
        CommandName::UpdateWorkspace,
        CommandName::DeleteWorkspace,
        CommandName::SelectVisualizer,
        CommandName::RefreshDataSource,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CommandName::CreateNode => "create-node",
            CommandName::UpdateNode => "update-node",
            CommandName::DeleteNode => "delete-node",
            CommandName::CreateEdge => "create-edge",
            CommandName::UpdateEdge => "update-edge",
            CommandName::DeleteEdge => "delete-edge",
            CommandName::ClearGraph => "clear-graph",
            CommandName::Search => "search",
            CommandName::Filter => "filter",
            CommandName::ClearSearch => "clear-search",
            CommandName::RemoveFilter => "remove-filter",
            CommandName::SelectWorkspace => "select-workspace",
            CommandName::CreateWorkspace => "create-workspace",
            CommandName::UpdateWorkspace => "update-workspace",
            CommandName::DeleteWorkspace => "delete-workspace",
            CommandName::SelectVisualizer => "select-visualizer",
            CommandName::RefreshDataSource => "refresh-data-source",
        }
    }
}

impl fmt::Display for CommandName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CommandName {
    type Err = GraphError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        CommandName::ALL
            .into_iter()
            .find(|name| name.as_str() == raw)
            .ok_or_else(|| GraphError::validation(format!("Unknown command: {raw}")))
    }
}

/// A validated command
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Add a node; fails if the id is taken
    CreateNode { id: String, data: DataDict },
    /// Replace a node's attributes
    UpdateNode { id: String, data: DataDict },
    /// Remove a node and its edges
    DeleteNode { id: String },
    /// Connect two existing nodes; self-loops and repeated pairs are rejected
    CreateEdge {
        src: String,
        tgt: String,
        data: DataDict,
    },
    /// Replace an edge's attributes
    UpdateEdge {
        src: String,
        tgt: String,
        data: DataDict,
    },
    DeleteEdge { src: String, tgt: String },
    /// Remove every node and edge
    ClearGraph,
    /// Set the free-text search term
    Search { query: String },
    /// Add a filter to the current workspace
    Filter { filter: Filter },
    ClearSearch,
    RemoveFilter { filter: Filter },
    SelectWorkspace { workspace_id: String },
    /// Create a workspace and make it current
    CreateWorkspace {
        name: String,
        data_source_id: String,
        config: ConfigMap,
    },
    /// Change a workspace and make it current
    UpdateWorkspace {
        workspace_id: String,
        name: String,
        data_source_id: String,
        config: ConfigMap,
    },
    DeleteWorkspace { workspace_id: String },
    SelectVisualizer { visualizer_id: String },
    /// Reload the current workspace's graph from its data source
    RefreshDataSource,
}

impl Command {
    /// Validate raw arguments into a command.
    ///
    /// Missing arguments produce a [`GraphError::Validation`] with a message
    /// naming what is missing.
    pub fn parse(name: CommandName, args: &CommandArgs) -> GraphResult<Self> {
        let command = match name {
            CommandName::CreateNode | CommandName::UpdateNode => {
                let id = require(args, "id", "Node ID is required.")?;
                let data = attributes(args, "data")?;
                if name == CommandName::CreateNode {
                    Command::CreateNode { id, data }
                } else {
                    Command::UpdateNode { id, data }
                }
            }
            CommandName::DeleteNode => Command::DeleteNode {
                id: require(args, "id", "Node ID is required.")?,
            },
            CommandName::CreateEdge | CommandName::UpdateEdge | CommandName::DeleteEdge => {
                let (src, tgt) = match (text(args, "src"), text(args, "tgt")) {
                    (Some(src), Some(tgt)) => (src, tgt),
                    _ => {
                        return Err(GraphError::validation(
                            "Both source and target node IDs are required.",
                        ))
                    }
                };
                match name {
                    CommandName::CreateEdge => {
                        if src == tgt {
                            return Err(GraphError::validation("Recursive edges are not possible"));
                        }
                        let data = attributes(args, "data")?;
                        Command::CreateEdge { src, tgt, data }
                    }
                    CommandName::UpdateEdge => {
                        let data = attributes(args, "data")?;
                        Command::UpdateEdge { src, tgt, data }
                    }
                    _ => Command::DeleteEdge { src, tgt },
                }
            }
            CommandName::ClearGraph => Command::ClearGraph,
            CommandName::Search => Command::Search {
                query: require(args, "query", "Query is required.")?,
            },
            CommandName::Filter | CommandName::RemoveFilter => {
                let filter = match (
                    text(args, "field"),
                    text(args, "operator"),
                    text(args, "value"),
                ) {
                    (Some(field), Some(operator), Some(value)) => {
                        Filter::parse(&field, &operator, &value)?
                    }
                    _ => {
                        return Err(GraphError::validation(
                            "All filter parameters are required.",
                        ))
                    }
                };
                if name == CommandName::Filter {
                    Command::Filter { filter }
                } else {
                    Command::RemoveFilter { filter }
                }
            }
            CommandName::ClearSearch => Command::ClearSearch,
            CommandName::SelectWorkspace => Command::SelectWorkspace {
                workspace_id: require(args, "workspace_id", "Missing 'workspace_id'")?,
            },
            CommandName::CreateWorkspace => Command::CreateWorkspace {
                name: require(args, "name", "Missing 'name'")?,
                data_source_id: require(args, "data_source_id", "Missing 'data source'")?,
                config: config(args, "config")?,
            },
            CommandName::UpdateWorkspace => Command::UpdateWorkspace {
                workspace_id: require(args, "workspace_id", "Missing 'workspace_id'")?,
                name: require(args, "name", "Missing 'name'")?,
                data_source_id: require(args, "data_source_id", "Missing 'data source'")?,
                config: config(args, "config")?,
            },
            CommandName::DeleteWorkspace => Command::DeleteWorkspace {
                workspace_id: require(args, "workspace_id", "Missing 'workspace_id'")?,
            },
            CommandName::SelectVisualizer => Command::SelectVisualizer {
                visualizer_id: require(args, "visualizer_id", "No visualizer id provided")?,
            },
            CommandName::RefreshDataSource => Command::RefreshDataSource,
        };
        Ok(command)
    }

    pub fn name(&self) -> CommandName {
        match self {
            Command::CreateNode { .. } => CommandName::CreateNode,
            Command::UpdateNode { .. } => CommandName::UpdateNode,
            Command::DeleteNode { .. } => CommandName::DeleteNode,
            Command::CreateEdge { .. } => CommandName::CreateEdge,
            Command::UpdateEdge { .. } => CommandName::UpdateEdge,
            Command::DeleteEdge { .. } => CommandName::DeleteEdge,
            Command::ClearGraph => CommandName::ClearGraph,
            Command::Search { .. } => CommandName::Search,
            Command::Filter { .. } => CommandName::Filter,
            Command::ClearSearch => CommandName::ClearSearch,
            Command::RemoveFilter { .. } => CommandName::RemoveFilter,
            Command::SelectWorkspace { .. } => CommandName::SelectWorkspace,
            Command::CreateWorkspace { .. } => CommandName::CreateWorkspace,
            Command::UpdateWorkspace { .. } => CommandName::UpdateWorkspace,
            Command::DeleteWorkspace { .. } => CommandName::DeleteWorkspace,
            Command::SelectVisualizer { .. } => CommandName::SelectVisualizer,
            Command::RefreshDataSource => CommandName::RefreshDataSource,
        }
    }
}

/// A non-empty string argument; numbers are accepted and rendered
fn text(args: &CommandArgs, key: &str) -> Option<String> {
    match args.get(key)? {
        serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn require(args: &CommandArgs, key: &str, message: &str) -> GraphResult<String> {
    text(args, key).ok_or_else(|| GraphError::validation(message))
}

/// A JSON object argument, given inline or as an encoded string
fn object(args: &CommandArgs, key: &str) -> GraphResult<CommandArgs> {
    match args.get(key) {
        None | Some(serde_json::Value::Null) => Ok(CommandArgs::new()),
        Some(serde_json::Value::Object(map)) => Ok(map.clone()),
        Some(serde_json::Value::String(raw)) if raw.trim().is_empty() => Ok(CommandArgs::new()),
        Some(serde_json::Value::String(raw)) => match serde_json::from_str(raw) {
            Ok(serde_json::Value::Object(map)) => Ok(map),
            _ => Err(GraphError::validation(format!("Invalid JSON format: {raw}"))),
        },
        Some(other) => Err(GraphError::validation(format!("Invalid JSON format: {other}"))),
    }
}

fn attributes(args: &CommandArgs, key: &str) -> GraphResult<DataDict> {
    data_from_json(&object(args, key)?)
}

fn config(args: &CommandArgs, key: &str) -> GraphResult<ConfigMap> {
    Ok(object(args, key)?.into_iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value_objects::Value;
    use serde_json::json;

    fn args(value: serde_json::Value) -> CommandArgs {
        value.as_object().cloned().unwrap()
    }

    fn rejection(name: CommandName, value: serde_json::Value) -> String {
        Command::parse(name, &args(value)).unwrap_err().to_string()
    }

    #[test]
    fn test_command_names() {
        for name in CommandName::ALL {
            assert_eq!(name.as_str().parse::<CommandName>().unwrap(), name);
        }
        assert_eq!(
            "explode".parse::<CommandName>().unwrap_err().to_string(),
            "Unknown command: explode"
        );
    }

    #[test]
    fn test_node_commands() {
        let command = Command::parse(
            CommandName::CreateNode,
            &args(json!({"id": 1, "data": "{\"name\": \"Alice\", \"age\": 30}"})),
        )
        .unwrap();
        let Command::CreateNode { id, data } = command else {
            panic!("expected create-node");
        };
        assert_eq!(id, "1");
        assert_eq!(data["age"], Value::Int(30));

        let inline = Command::parse(
            CommandName::UpdateNode,
            &args(json!({"id": "1", "data": {"name": "Bob"}})),
        )
        .unwrap();
        assert_eq!(inline.name(), CommandName::UpdateNode);

        assert_eq!(rejection(CommandName::CreateNode, json!({})), "Node ID is required.");
        assert_eq!(rejection(CommandName::DeleteNode, json!({"id": ""})), "Node ID is required.");
        assert_eq!(
            rejection(CommandName::CreateNode, json!({"id": "1", "data": "{oops"})),
            "Invalid JSON format: {oops"
        );
        assert_eq!(
            rejection(CommandName::CreateNode, json!({"id": "1", "data": "[1, 2]"})),
            "Invalid JSON format: [1, 2]"
        );
    }

    #[test]
    fn test_edge_commands() {
        assert_eq!(
            rejection(CommandName::CreateEdge, json!({"src": "1"})),
            "Both source and target node IDs are required."
        );
        assert_eq!(
            rejection(CommandName::CreateEdge, json!({"src": "1", "tgt": 1})),
            "Recursive edges are not possible"
        );
        let command =
            Command::parse(CommandName::DeleteEdge, &args(json!({"src": 1, "tgt": 2}))).unwrap();
        assert_eq!(
            command,
            Command::DeleteEdge {
                src: "1".into(),
                tgt: "2".into()
            }
        );
    }

    #[test]
    fn test_filter_commands() {
        let command = Command::parse(
            CommandName::Filter,
            &args(json!({"field": "w", "operator": "gte", "value": 5})),
        )
        .unwrap();
        assert_eq!(
            command,
            Command::Filter {
                filter: Filter::parse("w", "gte", "5").unwrap()
            }
        );

        assert_eq!(
            rejection(CommandName::Filter, json!({"field": "w", "operator": "gte"})),
            "All filter parameters are required."
        );
        assert_eq!(
            rejection(
                CommandName::RemoveFilter,
                json!({"field": "name", "operator": "gt", "value": "bob"})
            ),
            "Operator 'gt' is not valid for string values"
        );
        assert_eq!(
            rejection(CommandName::Search, json!({"query": ""})),
            "Query is required."
        );
    }

    #[test]
    fn test_workspace_commands() {
        assert_eq!(rejection(CommandName::CreateWorkspace, json!({})), "Missing 'name'");
        assert_eq!(
            rejection(CommandName::CreateWorkspace, json!({"name": "A"})),
            "Missing 'data source'"
        );
        assert_eq!(
            rejection(CommandName::UpdateWorkspace, json!({"name": "A"})),
            "Missing 'workspace_id'"
        );
        assert_eq!(
            rejection(CommandName::SelectVisualizer, json!({})),
            "No visualizer id provided"
        );

        let command = Command::parse(
            CommandName::CreateWorkspace,
            &args(json!({
                "name": "Files",
                "data_source_id": "json_file_data_source",
                "config": "{\"path\": \"graph.json\"}"
            })),
        )
        .unwrap();
        let Command::CreateWorkspace { config, .. } = command else {
            panic!("expected create-workspace");
        };
        assert_eq!(config["path"], json!("graph.json"));
    }
}
