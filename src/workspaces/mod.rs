//! Workspace registry
//!
//! A workspace is a named, persisted binding of a data source, a visualizer,
//! a filter list and the data source configuration. [`WorkspaceService`]
//! provides CRUD over workspace records and keeps the graph store free of
//! orphaned graphs.

use crate::error::{Entity, GraphError, GraphResult};
use crate::infrastructure::{GraphRepository, IoPolicy, WorkspaceRepository};
use crate::plugins::ConfigMap;
use crate::queries::Filter;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

/// Name given to the workspace created when none exist
pub const DEFAULT_WORKSPACE_NAME: &str = "Default Workspace";

/// Persisted workspace record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workspace {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub data_source_id: Option<String>,
    #[serde(default)]
    pub visualizer_id: Option<String>,
    #[serde(default)]
    pub filters: Vec<Filter>,
    #[serde(default)]
    pub data_source_config: ConfigMap,
}

impl Workspace {
    /// An unsaved workspace with no plugins and no filters
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            name: name.into(),
            data_source_id: None,
            visualizer_id: None,
            filters: Vec::new(),
            data_source_config: ConfigMap::new(),
        }
    }
}

/// CRUD over workspace records
#[derive(Clone)]
pub struct WorkspaceService {
    repository: Arc<dyn WorkspaceRepository>,
    graphs: Arc<dyn GraphRepository>,
    policy: IoPolicy,
}

impl WorkspaceService {
    pub fn new(
        repository: Arc<dyn WorkspaceRepository>,
        graphs: Arc<dyn GraphRepository>,
        policy: IoPolicy,
    ) -> Self {
        Self {
            repository,
            graphs,
            policy,
        }
    }

    /// All workspaces, in id order
    pub async fn get_all(&self) -> GraphResult<Vec<Workspace>> {
        self.policy
            .read("list workspaces", || self.repository.get_all())
            .await
    }

    /// Look a workspace up, returning `None` if absent
    pub async fn find(&self, id: &str) -> GraphResult<Option<Workspace>> {
        self.policy
            .read("get workspace", || self.repository.get(id))
            .await
    }

    /// Look a workspace up, failing if absent
    pub async fn get(&self, id: &str) -> GraphResult<Workspace> {
        self.find(id)
            .await?
            .ok_or_else(|| GraphError::not_found(Entity::Workspace, id))
    }

    /// Create a workspace with an empty filter list
    pub async fn create(
        &self,
        name: &str,
        data_source_id: Option<String>,
        config: ConfigMap,
    ) -> GraphResult<Workspace> {
        if name.trim().is_empty() {
            return Err(GraphError::validation("Missing 'name'"));
        }
        let workspace = Workspace {
            data_source_id,
            data_source_config: config,
            ..Workspace::new(name)
        };
        let workspace = self
            .policy
            .write("insert workspace", self.repository.insert(workspace))
            .await?;
        info!(workspace_id = %workspace.id, name = %workspace.name, "Created workspace");
        Ok(workspace)
    }

    /// Rename a workspace and rebind its data source and configuration
    pub async fn update(
        &self,
        id: &str,
        name: &str,
        data_source_id: Option<String>,
        config: ConfigMap,
    ) -> GraphResult<Workspace> {
        if name.trim().is_empty() {
            return Err(GraphError::validation("Missing 'name'"));
        }
        let mut workspace = self.get(id).await?;
        workspace.name = name.to_string();
        workspace.data_source_id = data_source_id;
        workspace.data_source_config = config;
        self.store(&workspace).await?;
        info!(workspace_id = %id, "Updated workspace");
        Ok(workspace)
    }

    /// Delete a workspace together with its stored graph
    pub async fn delete(&self, id: &str) -> GraphResult<()> {
        self.policy
            .write("delete graph", self.graphs.delete_graph(id))
            .await?;
        self.policy
            .write("delete workspace", self.repository.delete(id))
            .await?;
        info!(workspace_id = %id, "Deleted workspace");
        Ok(())
    }

    pub async fn set_name(&self, id: &str, name: &str) -> GraphResult<()> {
        self.modify(id, |workspace| workspace.name = name.to_string())
            .await
    }

    pub async fn set_filters(&self, id: &str, filters: &[Filter]) -> GraphResult<()> {
        self.modify(id, |workspace| workspace.filters = filters.to_vec())
            .await
    }

    pub async fn set_data_source(&self, id: &str, data_source_id: Option<String>) -> GraphResult<()> {
        self.modify(id, |workspace| workspace.data_source_id = data_source_id)
            .await
    }

    pub async fn set_visualizer(&self, id: &str, visualizer_id: Option<String>) -> GraphResult<()> {
        self.modify(id, |workspace| workspace.visualizer_id = visualizer_id)
            .await
    }

    /// Make sure at least one workspace exists and return the first
    pub async fn ensure_default(&self) -> GraphResult<Workspace> {
        match self.get_all().await?.into_iter().next() {
            Some(first) => Ok(first),
            None => {
                self.create(DEFAULT_WORKSPACE_NAME, None, ConfigMap::new())
                    .await
            }
        }
    }

    async fn modify(&self, id: &str, change: impl FnOnce(&mut Workspace) + Send) -> GraphResult<()> {
        let mut workspace = self.get(id).await?;
        change(&mut workspace);
        self.store(&workspace).await
    }

    async fn store(&self, workspace: &Workspace) -> GraphResult<()> {
        self.policy
            .write("update workspace", self.repository.update(workspace))
            .await
    }
}
