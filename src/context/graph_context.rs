//! Per-workspace graph context
//!
//! A [`GraphContext`] binds one workspace to its data source, visualizer,
//! filters, search term and graph store. Every graph-mutating command goes
//! through it.

use crate::aggregate::Graph;
use crate::error::{Entity, GraphError, GraphResult};
use crate::infrastructure::{GraphRepository, IoPolicy};
use crate::plugins::{resolve_config, ConfigMap, DataSourcePlugin, PluginRegistry, VisualizerPlugin};
use crate::queries::Filter;
use crate::workspaces::{Workspace, WorkspaceService};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

/// Lifecycle of a context's data binding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextState {
    /// No data source selected
    Unbound,
    /// A data source is selected but the stored graph may be missing or outdated
    BoundStale,
    /// The stored graph reflects the last successful refresh
    BoundFresh,
}

/// What a front end needs to draw the current view
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContextSnapshot {
    pub selected_data_source_id: Option<String>,
    pub selected_visualizer_id: Option<String>,
    /// Visualizer output; empty unless both plugins are selected
    pub rendered_output: String,
}

/// Runtime session for one workspace
pub struct GraphContext {
    workspace_id: String,
    data_source: Option<Arc<dyn DataSourcePlugin>>,
    visualizer: Option<Arc<dyn VisualizerPlugin>>,
    data_source_config: ConfigMap,
    filters: Vec<Filter>,
    search_term: Option<String>,
    state: ContextState,
    plugins: Arc<PluginRegistry>,
    workspaces: WorkspaceService,
    graphs: Arc<dyn GraphRepository>,
    policy: IoPolicy,
}

impl GraphContext {
    pub(crate) fn new(
        workspace: &Workspace,
        data_source: Option<Arc<dyn DataSourcePlugin>>,
        visualizer: Option<Arc<dyn VisualizerPlugin>>,
        plugins: Arc<PluginRegistry>,
        workspaces: WorkspaceService,
        graphs: Arc<dyn GraphRepository>,
        policy: IoPolicy,
    ) -> Self {
        let state = if data_source.is_some() {
            ContextState::BoundStale
        } else {
            ContextState::Unbound
        };
        Self {
            workspace_id: workspace.id.clone(),
            data_source,
            visualizer,
            data_source_config: workspace.data_source_config.clone(),
            filters: workspace.filters.clone(),
            search_term: None,
            state,
            plugins,
            workspaces,
            graphs,
            policy,
        }
    }

    pub fn workspace_id(&self) -> &str {
        &self.workspace_id
    }

    pub fn state(&self) -> ContextState {
        self.state
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    pub fn search_term(&self) -> Option<&str> {
        self.search_term.as_deref()
    }

    pub fn data_source_config(&self) -> &ConfigMap {
        &self.data_source_config
    }

    pub fn selected_data_source_id(&self) -> Option<&str> {
        self.data_source.as_ref().map(|plugin| plugin.identifier())
    }

    pub fn selected_visualizer_id(&self) -> Option<&str> {
        self.visualizer.as_ref().map(|plugin| plugin.identifier())
    }

    /// Render the filtered graph when both plugins are selected.
    ///
    /// Without a data source or visualizer the snapshot carries an empty
    /// rendering; that is the normal state of a new workspace.
    pub async fn get_context(&self) -> GraphResult<ContextSnapshot> {
        let mut snapshot = ContextSnapshot {
            selected_data_source_id: self.selected_data_source_id().map(str::to_string),
            selected_visualizer_id: self.selected_visualizer_id().map(str::to_string),
            rendered_output: String::new(),
        };

        if let (Some(_), Some(visualizer)) = (&self.data_source, &self.visualizer) {
            let search = self.search_term.as_deref();
            let graph = self
                .policy
                .read("query graph", || {
                    self.graphs
                        .query_graph(&self.workspace_id, &self.filters, search)
                })
                .await?;
            snapshot.rendered_output = visualizer.display(&graph);
        }
        Ok(snapshot)
    }

    /// The whole stored graph, unfiltered
    pub async fn get_graph(&self) -> GraphResult<Graph> {
        if self.data_source.is_none() {
            return Err(GraphError::NoDataSourceSelected);
        }
        self.policy
            .read("query graph", || {
                self.graphs.query_graph(&self.workspace_id, &[], None)
            })
            .await
    }

    /// Replace the stored graph
    pub async fn save_graph(&self, graph: &Graph) -> GraphResult<()> {
        self.policy
            .write("save graph", self.graphs.save_graph(&self.workspace_id, graph))
            .await?;
        debug!(workspace_id = %self.workspace_id, nodes = graph.node_count(), "Graph saved");
        Ok(())
    }

    /// Load from the bound data source and overwrite the stored graph
    pub async fn refresh_data_source(&mut self) -> GraphResult<()> {
        let plugin = self
            .data_source
            .clone()
            .ok_or(GraphError::NoDataSourceSelected)?;
        let config = resolve_config(&plugin.configuration_parameters(), &self.data_source_config)?;
        let source_id = plugin.identifier().to_string();

        let graph = self
            .policy
            .bounded("load data source", async {
                plugin
                    .load(&config)
                    .await
                    .map_err(|err| GraphError::DataSourceLoad {
                        source_id: source_id.clone(),
                        message: format!("{err:#}"),
                    })
            })
            .await?;

        self.save_graph(&graph).await?;
        self.state = ContextState::BoundFresh;
        info!(
            workspace_id = %self.workspace_id,
            data_source = %source_id,
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "Data source refreshed"
        );
        Ok(())
    }

    /// Bind a data source, persist the choice and refresh
    pub async fn select_data_source(&mut self, data_source_id: &str) -> GraphResult<()> {
        let plugin = self
            .plugins
            .data_source(data_source_id)
            .ok_or_else(|| GraphError::not_found(Entity::DataSource, data_source_id))?;
        self.workspaces
            .set_data_source(&self.workspace_id, Some(data_source_id.to_string()))
            .await?;
        self.data_source = Some(plugin);
        self.state = ContextState::BoundStale;
        self.refresh_data_source().await
    }

    /// Bind a visualizer and persist the choice
    pub async fn select_visualizer(&mut self, visualizer_id: &str) -> GraphResult<Arc<dyn VisualizerPlugin>> {
        let plugin = self
            .plugins
            .visualizer(visualizer_id)
            .ok_or_else(|| GraphError::not_found(Entity::Visualizer, visualizer_id))?;
        self.workspaces
            .set_visualizer(&self.workspace_id, Some(visualizer_id.to_string()))
            .await?;
        self.visualizer = Some(plugin.clone());
        Ok(plugin)
    }

    /// Add a filter; an equal filter already present is rejected
    pub async fn add_filter(&mut self, filter: Filter) -> GraphResult<()> {
        if self.filters.contains(&filter) {
            return Err(GraphError::Duplicate {
                entity: Entity::Filter,
                id: None,
            });
        }
        let mut filters = self.filters.clone();
        filters.push(filter);
        self.replace_filters(filters).await
    }

    /// Remove every filter equal to `filter`
    pub async fn remove_filter(&mut self, filter: &Filter) -> GraphResult<()> {
        if !self.filters.contains(filter) {
            return Err(GraphError::not_found(Entity::Filter, filter.to_string()));
        }
        let filters = self
            .filters
            .iter()
            .filter(|existing| *existing != filter)
            .cloned()
            .collect();
        self.replace_filters(filters).await
    }

    /// Persist a new filter list, then adopt it
    async fn replace_filters(&mut self, filters: Vec<Filter>) -> GraphResult<()> {
        self.workspaces
            .set_filters(&self.workspace_id, &filters)
            .await?;
        self.filters = filters;
        Ok(())
    }

    /// Replace the configuration used by the next refresh
    pub fn set_data_source_config(&mut self, config: ConfigMap) {
        self.data_source_config = config;
        if self.data_source.is_some() {
            self.state = ContextState::BoundStale;
        }
    }

    pub fn set_search_term(&mut self, term: impl Into<String>) {
        self.search_term = Some(term.into());
    }

    pub fn clear_search(&mut self) {
        self.search_term = None;
    }
}

impl fmt::Debug for GraphContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GraphContext")
            .field("workspace_id", &self.workspace_id)
            .field("data_source", &self.selected_data_source_id())
            .field("visualizer", &self.selected_visualizer_id())
            .field("filters", &self.filters)
            .field("search_term", &self.search_term)
            .field("state", &self.state)
            .finish()
    }
}
