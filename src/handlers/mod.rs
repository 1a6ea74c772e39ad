//! Command handlers
//!
//! The [`CommandProcessor`] validates a raw command, runs it against the active
//! workspace and reports the result as a [`CommandOutcome`]. Failures never
//! escape as errors; they become an unsuccessful outcome carrying the error's
//! message.

use crate::aggregate::{Edge, Graph, Node};
use crate::commands::{Command, CommandArgs, CommandName};
use crate::context::{ActiveSession, SessionSnapshot, WorkspaceSession};
use crate::error::{Entity, GraphError, GraphResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

/// Result envelope returned to front ends
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandOutcome {
    pub success: bool,
    pub message: String,
}

impl CommandOutcome {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

impl fmt::Display for CommandOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Executes commands against a [`WorkspaceSession`]
#[derive(Clone)]
pub struct CommandProcessor {
    session: Arc<WorkspaceSession>,
}

impl CommandProcessor {
    pub fn new(session: Arc<WorkspaceSession>) -> Self {
        Self { session }
    }

    pub fn session(&self) -> &WorkspaceSession {
        &self.session
    }

    /// Parse and run a command given by name
    pub async fn execute(&self, name: &str, args: &CommandArgs) -> CommandOutcome {
        let span = info_span!("command", command_id = %Uuid::new_v4(), name);
        async {
            let command = name
                .parse::<CommandName>()
                .and_then(|name| Command::parse(name, args));
            match command {
                Ok(command) => self.run(command).await,
                Err(err) => reject(err),
            }
        }
        .instrument(span)
        .await
    }

    /// Run an already validated command
    pub async fn execute_command(&self, command: Command) -> CommandOutcome {
        let span = info_span!("command", command_id = %Uuid::new_v4(), name = %command.name());
        self.run(command).instrument(span).await
    }

    pub async fn get_context(&self) -> GraphResult<SessionSnapshot> {
        self.session.get_context().await
    }

    async fn run(&self, command: Command) -> CommandOutcome {
        let mut active = self.session.lock().await;
        match handle(&mut active, command).await {
            Ok(message) => {
                info!(%message, "Command succeeded");
                CommandOutcome::ok(message)
            }
            Err(err) => reject(err),
        }
    }
}

impl fmt::Debug for CommandProcessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandProcessor").finish_non_exhaustive()
    }
}

fn reject(err: GraphError) -> CommandOutcome {
    warn!(error = %err, "Command rejected");
    CommandOutcome::failed(err.to_string())
}

async fn handle(active: &mut ActiveSession, command: Command) -> GraphResult<String> {
    match command {
        Command::CreateNode { id, data } => {
            let mut graph = active.context().get_graph().await?;
            if graph.contains_node(&id) {
                return Err(GraphError::duplicate(Entity::Node, id));
            }
            graph.add_node(Node::new(id.as_str(), data))?;
            active.context().save_graph(&graph).await?;
            Ok(format!("Node {id} created."))
        }

        Command::UpdateNode { id, data } => {
            let mut graph = active.context().get_graph().await?;
            if !graph.update_node(&id, data) {
                return Err(GraphError::not_found(Entity::Node, id));
            }
            active.context().save_graph(&graph).await?;
            Ok(format!("Node {id} updated."))
        }

        Command::DeleteNode { id } => {
            let mut graph = active.context().get_graph().await?;
            graph.remove_node(&id)?;
            active.context().save_graph(&graph).await?;
            Ok(format!("Node {id} deleted."))
        }

        Command::CreateEdge { src, tgt, data } => {
            let mut graph = active.context().get_graph().await?;
            require_endpoints(&graph, &src, &tgt)?;
            if graph.edge_between(&src, &tgt).is_some() {
                return Err(GraphError::Duplicate {
                    entity: Entity::Edge,
                    id: None,
                });
            }
            graph.add_edge(Edge::new(src.as_str(), tgt.as_str(), data))?;
            active.context().save_graph(&graph).await?;
            Ok(format!("Edge {src} -> {tgt} created."))
        }

        Command::UpdateEdge { src, tgt, data } => {
            let mut graph = active.context().get_graph().await?;
            require_endpoints(&graph, &src, &tgt)?;
            if !graph.update_edge(&src, &tgt, data) {
                return Err(GraphError::not_found(Entity::Edge, format!("{src} -> {tgt}")));
            }
            active.context().save_graph(&graph).await?;
            Ok(format!("Edge {src} -> {tgt} updated."))
        }

        Command::DeleteEdge { src, tgt } => {
            let mut graph = active.context().get_graph().await?;
            let edge = graph
                .edge_between(&src, &tgt)
                .cloned()
                .ok_or_else(|| GraphError::not_found(Entity::Edge, format!("{src} -> {tgt}")))?;
            graph.remove_edge(&edge);
            active.context().save_graph(&graph).await?;
            Ok(format!("Edge {src} -> {tgt} deleted."))
        }

        Command::ClearGraph => {
            let mut graph = active.context().get_graph().await?;
            graph.clear();
            active.context().save_graph(&graph).await?;
            Ok("Graph cleared.".to_string())
        }

        Command::Search { query } => {
            active.context_mut().set_search_term(query.as_str());
            Ok(format!("Search query: {query}"))
        }

        Command::ClearSearch => {
            active.context_mut().clear_search();
            Ok("Search cleared.".to_string())
        }

        Command::Filter { filter } => {
            let message = format!("Filter added: {filter}");
            active.context_mut().add_filter(filter).await?;
            Ok(message)
        }

        Command::RemoveFilter { filter } => {
            active.context_mut().remove_filter(&filter).await?;
            Ok(format!("Filter removed: {filter}"))
        }

        Command::SelectWorkspace { workspace_id } => {
            let workspace = active.select_workspace(&workspace_id, false).await?;
            Ok(format!("Selected workspace {}", workspace.name))
        }

        Command::CreateWorkspace {
            name,
            data_source_id,
            config,
        } => {
            require_data_source(active, &data_source_id)?;
            let workspace = active
                .workspaces()
                .create(&name, Some(data_source_id), config)
                .await?;
            active.select_workspace(&workspace.id, true).await?;
            Ok(format!("Created {}", workspace.name))
        }

        Command::UpdateWorkspace {
            workspace_id,
            name,
            data_source_id,
            config,
        } => {
            require_data_source(active, &data_source_id)?;
            let workspace = active
                .workspaces()
                .update(&workspace_id, &name, Some(data_source_id), config)
                .await?;
            active.select_workspace(&workspace.id, true).await?;
            Ok(format!("Updated {}", workspace.name))
        }

        Command::DeleteWorkspace { workspace_id } => {
            // Existence first, so an unknown id is reported as such
            active.workspaces().get(&workspace_id).await?;
            if active.is_last().await? {
                return Err(GraphError::validation("Cannot delete the last workspace."));
            }
            active.workspaces().delete(&workspace_id).await?;
            if active.current_workspace_id() == workspace_id {
                active.select_first_workspace().await?;
            }
            Ok("Successfully removed the workspace".to_string())
        }

        Command::SelectVisualizer { visualizer_id } => {
            let visualizer = active.context_mut().select_visualizer(&visualizer_id).await?;
            Ok(format!("Selected {} as visualizer", visualizer.name()))
        }

        Command::RefreshDataSource => {
            active.context_mut().refresh_data_source().await?;
            Ok("Successfully reloaded the data".to_string())
        }
    }
}

fn require_endpoints(graph: &Graph, src: &str, tgt: &str) -> GraphResult<()> {
    if graph.contains_node(src) && graph.contains_node(tgt) {
        Ok(())
    } else {
        Err(GraphError::validation("Both nodes must exist."))
    }
}

fn require_data_source(active: &ActiveSession, data_source_id: &str) -> GraphResult<()> {
    match active.plugins().data_source(data_source_id) {
        Some(_) => Ok(()),
        None => Err(GraphError::not_found(Entity::DataSource, data_source_id)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::GraphContextFactory;
    use crate::infrastructure::{
        GraphRepository, InMemoryGraphRepository, InMemoryWorkspaceRepository, IoPolicy,
    };
    use crate::plugins::PluginRegistry;
    use crate::value_objects::Value;
    use crate::workspaces::WorkspaceService;
    use serde_json::json;

    /// Test Coverage
    ///
    /// ```mermaid
    /// graph TD
    ///     R[raw name + args] -->|parse| C[Command]
    ///     R -->|bad name / args| F[failed outcome]
    ///     C -->|handle| G[GraphContext]
    ///     G -->|GraphError| F
    ///     G --> O[ok outcome]
    /// ```

    async fn processor() -> CommandProcessor {
        let graphs: Arc<dyn GraphRepository> = Arc::new(InMemoryGraphRepository::new());
        let workspaces = WorkspaceService::new(
            Arc::new(InMemoryWorkspaceRepository::new()),
            graphs.clone(),
            IoPolicy::default(),
        );
        let factory = GraphContextFactory::new(
            Arc::new(PluginRegistry::with_builtins()),
            workspaces.clone(),
            graphs,
            IoPolicy::default(),
        );
        let session = WorkspaceSession::open(workspaces, factory).await.unwrap();
        CommandProcessor::new(Arc::new(session))
    }

    async fn run(processor: &CommandProcessor, name: &str, args: serde_json::Value) -> CommandOutcome {
        processor
            .execute(name, args.as_object().unwrap())
            .await
    }

    /// A processor whose current workspace is bound to the empty data source
    async fn bound_processor() -> CommandProcessor {
        let processor = processor().await;
        let outcome = run(
            &processor,
            "create-workspace",
            json!({"name": "Scratch", "data_source_id": "empty_data_source"}),
        )
        .await;
        assert_eq!(outcome, CommandOutcome::ok("Created Scratch"));
        processor
    }

    #[tokio::test]
    async fn test_unknown_command() {
        let processor = processor().await;
        let outcome = run(&processor, "explode", json!({})).await;
        assert_eq!(outcome, CommandOutcome::failed("Unknown command: explode"));
    }

    #[tokio::test]
    async fn test_graph_commands_need_a_data_source() {
        let processor = processor().await;
        let outcome = run(&processor, "create-node", json!({"id": "1"})).await;
        assert_eq!(outcome, CommandOutcome::failed("No data source selected"));

        let outcome = run(&processor, "refresh-data-source", json!({})).await;
        assert_eq!(outcome, CommandOutcome::failed("No data source selected"));
    }

    #[tokio::test]
    async fn test_node_lifecycle() {
        let processor = bound_processor().await;

        let created = run(&processor, "create-node", json!({"id": 1, "data": {"name": "Alice"}})).await;
        assert_eq!(created, CommandOutcome::ok("Node 1 created."));
        let again = run(&processor, "create-node", json!({"id": "1"})).await;
        assert_eq!(again, CommandOutcome::failed("Node 1 already exists."));

        let updated = run(&processor, "update-node", json!({"id": "1", "data": "{\"name\": \"Bob\"}"})).await;
        assert_eq!(updated, CommandOutcome::ok("Node 1 updated."));
        let missing = run(&processor, "update-node", json!({"id": "9", "data": {}})).await;
        assert_eq!(missing, CommandOutcome::failed("Node 9 not found."));

        let deleted = run(&processor, "delete-node", json!({"id": "1"})).await;
        assert_eq!(deleted, CommandOutcome::ok("Node 1 deleted."));
        let gone = run(&processor, "delete-node", json!({"id": "1"})).await;
        assert_eq!(gone, CommandOutcome::failed("Node 1 not found."));
    }

    #[tokio::test]
    async fn test_edge_rules() {
        let processor = bound_processor().await;
        run(&processor, "create-node", json!({"id": "1"})).await;

        let dangling = run(&processor, "create-edge", json!({"src": "1", "tgt": "2"})).await;
        assert_eq!(dangling, CommandOutcome::failed("Both nodes must exist."));

        run(&processor, "create-node", json!({"id": "2"})).await;
        let created = run(&processor, "create-edge", json!({"src": "1", "tgt": "2", "data": {"w": 5}})).await;
        assert_eq!(created, CommandOutcome::ok("Edge 1 -> 2 created."));
        let duplicate = run(&processor, "create-edge", json!({"src": "1", "tgt": "2"})).await;
        assert_eq!(duplicate, CommandOutcome::failed("Edge already exists."));

        let looped = run(&processor, "create-edge", json!({"src": "1", "tgt": "1"})).await;
        assert_eq!(looped, CommandOutcome::failed("Recursive edges are not possible"));

        let missing = run(&processor, "update-edge", json!({"src": "2", "tgt": "1", "data": {}})).await;
        assert_eq!(missing, CommandOutcome::failed("Edge 2 -> 1 not found."));

        let deleted = run(&processor, "delete-edge", json!({"src": "1", "tgt": "2"})).await;
        assert_eq!(deleted, CommandOutcome::ok("Edge 1 -> 2 deleted."));
    }

    #[tokio::test]
    async fn test_filter_and_search_commands() {
        let processor = bound_processor().await;
        let args = json!({"field": "age", "operator": "gte", "value": "30"});

        let added = run(&processor, "filter", args.clone()).await;
        assert_eq!(added, CommandOutcome::ok("Filter added: age >= 30"));
        let duplicate = run(&processor, "filter", args.clone()).await;
        assert_eq!(duplicate, CommandOutcome::failed("Filter already exists."));
        let removed = run(&processor, "remove-filter", args).await;
        assert_eq!(removed, CommandOutcome::ok("Filter removed: age >= 30"));

        let search = run(&processor, "search", json!({"query": "ali"})).await;
        assert_eq!(search, CommandOutcome::ok("Search query: ali"));
        let cleared = run(&processor, "clear-search", json!({})).await;
        assert_eq!(cleared, CommandOutcome::ok("Search cleared."));
    }

    #[tokio::test]
    async fn test_workspace_commands() {
        let processor = bound_processor().await;

        let unknown = run(
            &processor,
            "create-workspace",
            json!({"name": "Nope", "data_source_id": "missing"}),
        )
        .await;
        assert_eq!(unknown, CommandOutcome::failed("Data source missing not found."));

        let selected = run(&processor, "select-workspace", json!({"workspace_id": "1"})).await;
        assert_eq!(selected, CommandOutcome::ok("Selected workspace Default Workspace"));

        let visualizer = run(
            &processor,
            "select-visualizer",
            json!({"visualizer_id": "summary_visualizer"}),
        )
        .await;
        assert_eq!(visualizer, CommandOutcome::ok("Selected Summary as visualizer"));

        let deleted = run(&processor, "delete-workspace", json!({"workspace_id": "1"})).await;
        assert_eq!(deleted, CommandOutcome::ok("Successfully removed the workspace"));
        let snapshot = processor.get_context().await.unwrap();
        assert_eq!(snapshot.current_workspace_id, "2");

        let last = run(&processor, "delete-workspace", json!({"workspace_id": "2"})).await;
        assert_eq!(last, CommandOutcome::failed("Cannot delete the last workspace."));
    }

    #[tokio::test]
    async fn test_update_edge_replaces_data() {
        let processor = bound_processor().await;
        run(&processor, "create-node", json!({"id": "1"})).await;
        run(&processor, "create-node", json!({"id": "2"})).await;
        run(&processor, "create-edge", json!({"src": "1", "tgt": "2", "data": {"w": 5, "kind": "road"}})).await;

        let updated = run(&processor, "update-edge", json!({"src": "1", "tgt": "2", "data": {"w": 7}})).await;
        assert_eq!(updated, CommandOutcome::ok("Edge 1 -> 2 updated."));

        let active = processor.session().lock().await;
        let graph = active.context().get_graph().await.unwrap();
        let edge = graph.edge_between("1", "2").unwrap();
        assert_eq!(edge.data().len(), 1);
        assert_eq!(edge.data()["w"], Value::Int(7));
    }

    #[tokio::test]
    async fn test_clear_graph_keeps_filters() {
        let processor = bound_processor().await;
        run(&processor, "create-node", json!({"id": "1"})).await;
        run(&processor, "create-node", json!({"id": "2"})).await;
        run(&processor, "create-edge", json!({"src": "1", "tgt": "2"})).await;
        run(&processor, "filter", json!({"field": "age", "operator": "gt", "value": "3"})).await;

        let cleared = run(&processor, "clear-graph", json!({})).await;
        assert_eq!(cleared, CommandOutcome::ok("Graph cleared."));

        let active = processor.session().lock().await;
        let graph = active.context().get_graph().await.unwrap();
        assert_eq!(graph.node_count(), 0);
        assert_eq!(graph.edge_count(), 0);
        assert_eq!(active.context().filters().len(), 1);
        assert_eq!(active.context().filters()[0].to_string(), "age > 3");
    }

    #[tokio::test]
    async fn test_select_unknown_visualizer() {
        let processor = bound_processor().await;
        let outcome = run(&processor, "select-visualizer", json!({"visualizer_id": "x"})).await;
        assert_eq!(outcome, CommandOutcome::failed("Visualizer x not found."));

        let snapshot = processor.get_context().await.unwrap();
        assert_eq!(snapshot.view.selected_visualizer_id.as_deref(), Some("json_visualizer"));
    }
}
