//! In-memory repositories

use super::json_workspace_repository::WorkspaceDocument;
use super::{GraphRepository, WorkspaceRepository};
use crate::aggregate::Graph;
use crate::error::GraphResult;
use crate::queries::{Filter, GraphQuery};
use crate::workspaces::Workspace;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;

/// Graph store held in process memory
#[derive(Debug, Default)]
pub struct InMemoryGraphRepository {
    graphs: Mutex<HashMap<String, Graph>>,
}

impl InMemoryGraphRepository {
    /// Create a new in-memory repository
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a graph is stored for the workspace
    pub fn contains(&self, workspace_id: &str) -> bool {
        self.graphs.lock().contains_key(workspace_id)
    }
}

#[async_trait]
impl GraphRepository for InMemoryGraphRepository {
    async fn save_graph(&self, workspace_id: &str, graph: &Graph) -> GraphResult<()> {
        self.graphs
            .lock()
            .insert(workspace_id.to_string(), graph.clone());
        Ok(())
    }

    async fn query_graph(
        &self,
        workspace_id: &str,
        filters: &[Filter],
        search_term: Option<&str>,
    ) -> GraphResult<Graph> {
        let graphs = self.graphs.lock();
        let Some(graph) = graphs.get(workspace_id) else {
            return Ok(Graph::default());
        };
        let query = GraphQuery::new(filters.to_vec(), search_term.map(str::to_string));
        Ok(query.apply(graph))
    }

    async fn delete_graph(&self, workspace_id: &str) -> GraphResult<()> {
        self.graphs.lock().remove(workspace_id);
        Ok(())
    }
}

/// Workspace store held in process memory
#[derive(Debug, Default)]
pub struct InMemoryWorkspaceRepository {
    document: Mutex<WorkspaceDocument>,
}

impl InMemoryWorkspaceRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl WorkspaceRepository for InMemoryWorkspaceRepository {
    async fn get_all(&self) -> GraphResult<Vec<Workspace>> {
        Ok(self.document.lock().workspaces.clone())
    }

    async fn get(&self, id: &str) -> GraphResult<Option<Workspace>> {
        Ok(self.document.lock().get(id).cloned())
    }

    async fn insert(&self, workspace: Workspace) -> GraphResult<Workspace> {
        Ok(self.document.lock().insert(workspace))
    }

    async fn update(&self, workspace: &Workspace) -> GraphResult<()> {
        self.document.lock().update(workspace)
    }

    async fn delete(&self, id: &str) -> GraphResult<()> {
        self.document.lock().delete(id)
    }
}
