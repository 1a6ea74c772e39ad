use super::{ContextSnapshot, GraphContext, GraphContextFactory};
use crate::error::GraphResult;
use crate::plugins::PluginRegistry;
use crate::workspaces::{Workspace, WorkspaceService};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, MutexGuard};
use tracing::info;

/// Id and name of a workspace, for listings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceSummary {
    pub id: String,
    pub name: String,
}

/// Everything a front end shows for the current session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub current_workspace_id: String,
    pub workspaces: Vec<WorkspaceSummary>,
    #[serde(flatten)]
    pub view: ContextSnapshot,
}

/// The current workspace and its live graph context.
///
/// Only reachable through [`WorkspaceSession::lock`], so a command holds it for
/// its whole read-modify-write cycle.
pub struct ActiveSession {
    current_workspace_id: String,
    context: GraphContext,
    workspaces: WorkspaceService,
    factory: GraphContextFactory,
}

impl ActiveSession {
    pub fn current_workspace_id(&self) -> &str {
        &self.current_workspace_id
    }

    pub fn context(&self) -> &GraphContext {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut GraphContext {
        &mut self.context
    }

    pub fn workspaces(&self) -> &WorkspaceService {
        &self.workspaces
    }

    pub fn plugins(&self) -> &PluginRegistry {
        self.factory.plugins()
    }

    /// Make a workspace current, optionally reloading its data source
    pub async fn select_workspace(&mut self, id: &str, refresh: bool) -> GraphResult<Workspace> {
        let workspace = self.workspaces.get(id).await?;
        self.current_workspace_id = workspace.id.clone();
        self.context = self.factory.make(&workspace);
        info!(workspace_id = %workspace.id, name = %workspace.name, refresh, "Workspace selected");

        if refresh {
            self.context.refresh_data_source().await?;
        }
        Ok(workspace)
    }

    /// Whether at most one workspace exists
    pub async fn is_last(&self) -> GraphResult<bool> {
        Ok(self.workspaces.get_all().await?.len() <= 1)
    }

    /// Make the first workspace current, creating the default one if needed
    pub async fn select_first_workspace(&mut self) -> GraphResult<Workspace> {
        let first = self.workspaces.ensure_default().await?;
        self.select_workspace(&first.id, false).await
    }

    pub async fn get_context(&self) -> GraphResult<SessionSnapshot> {
        let workspaces = self
            .workspaces
            .get_all()
            .await?
            .into_iter()
            .map(|ws| WorkspaceSummary {
                id: ws.id,
                name: ws.name,
            })
            .collect();
        Ok(SessionSnapshot {
            current_workspace_id: self.current_workspace_id.clone(),
            workspaces,
            view: self.context.get_context().await?,
        })
    }
}

/// Serialised access to the active workspace
pub struct WorkspaceSession {
    active: Mutex<ActiveSession>,
}

impl WorkspaceSession {
    /// Start a session on the first workspace, creating a default one if none exist
    pub async fn open(workspaces: WorkspaceService, factory: GraphContextFactory) -> GraphResult<Self> {
        let first = workspaces.ensure_default().await?;
        let context = factory.make(&first);
        info!(workspace_id = %first.id, "Session opened");

        Ok(Self {
            active: Mutex::new(ActiveSession {
                current_workspace_id: first.id,
                context,
                workspaces,
                factory,
            }),
        })
    }

    /// Exclusive access for the duration of one command
    pub async fn lock(&self) -> MutexGuard<'_, ActiveSession> {
        self.active.lock().await
    }

    pub async fn get_context(&self) -> GraphResult<SessionSnapshot> {
        self.lock().await.get_context().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Entity, GraphError};
    use crate::infrastructure::{
        GraphRepository, InMemoryGraphRepository, InMemoryWorkspaceRepository, IoPolicy,
    };
    use crate::plugins::ConfigMap;
    use std::sync::Arc;

    async fn open() -> WorkspaceSession {
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
        WorkspaceSession::open(workspaces, factory).await.unwrap()
    }

    #[tokio::test]
    async fn test_open_creates_default_workspace() {
        let session = open().await;
        let snapshot = session.get_context().await.unwrap();
        assert_eq!(snapshot.current_workspace_id, "1");
        assert_eq!(snapshot.workspaces.len(), 1);
        assert_eq!(snapshot.workspaces[0].name, "Default Workspace");
        assert!(session.lock().await.is_last().await.unwrap());

        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["selected_visualizer_id"], "json_visualizer");
    }

    #[tokio::test]
    async fn test_select_workspace() {
        let session = open().await;
        let mut active = session.lock().await;
        let created = active
            .workspaces()
            .create("Second", Some("empty_data_source".into()), ConfigMap::new())
            .await
            .unwrap();

        active.select_workspace(&created.id, true).await.unwrap();
        assert_eq!(active.current_workspace_id(), created.id);
        assert_eq!(active.context().selected_data_source_id(), Some("empty_data_source"));
        assert!(active.context().get_graph().await.unwrap().is_empty());

        assert_eq!(
            active.select_workspace("77", false).await.unwrap_err(),
            GraphError::not_found(Entity::Workspace, "77")
        );

        active.select_first_workspace().await.unwrap();
        assert_eq!(active.current_workspace_id(), "1");
    }
}
