use super::GraphContext;
use crate::infrastructure::{GraphRepository, IoPolicy};
use crate::plugins::PluginRegistry;
use crate::workspaces::{Workspace, WorkspaceService};
use std::sync::Arc;
use tracing::warn;

/// Builds a [`GraphContext`] for a workspace record
#[derive(Clone)]
pub struct GraphContextFactory {
    plugins: Arc<PluginRegistry>,
    workspaces: WorkspaceService,
    graphs: Arc<dyn GraphRepository>,
    policy: IoPolicy,
}

impl GraphContextFactory {
    pub fn new(
        plugins: Arc<PluginRegistry>,
        workspaces: WorkspaceService,
        graphs: Arc<dyn GraphRepository>,
        policy: IoPolicy,
    ) -> Self {
        Self {
            plugins,
            workspaces,
            graphs,
            policy,
        }
    }

    pub fn plugins(&self) -> &PluginRegistry {
        &self.plugins
    }

    /// Bind the workspace's recorded plugins.
    ///
    /// An unknown data source leaves the context unbound. A missing or unknown
    /// visualizer falls back to the first registered one.
    pub fn make(&self, workspace: &Workspace) -> GraphContext {
        let data_source = workspace.data_source_id.as_deref().and_then(|id| {
            let plugin = self.plugins.data_source(id);
            if plugin.is_none() {
                warn!(workspace_id = %workspace.id, data_source = id, "Unknown data source");
            }
            plugin
        });
        let visualizer = workspace
            .visualizer_id
            .as_deref()
            .and_then(|id| self.plugins.visualizer(id))
            .or_else(|| self.plugins.default_visualizer());

        GraphContext::new(
            workspace,
            data_source,
            visualizer,
            self.plugins.clone(),
            self.workspaces.clone(),
            self.graphs.clone(),
            self.policy,
        )
    }
}
