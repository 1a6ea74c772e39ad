//! Persistence boundary
//!
//! Repository traits for graph snapshots and workspace records, with in-memory
//! and JSON-file implementations, and the timeout/retry policy applied to every
//! call that crosses the boundary.

mod file_graph_repository;
mod io_policy;
mod json_workspace_repository;
mod memory;

pub use file_graph_repository::FileGraphRepository;
pub use io_policy::IoPolicy;
pub use json_workspace_repository::JsonWorkspaceRepository;
pub use memory::{InMemoryGraphRepository, InMemoryWorkspaceRepository};

use crate::aggregate::Graph;
use crate::error::GraphResult;
use crate::queries::Filter;
use crate::workspaces::Workspace;
use async_trait::async_trait;

/// Store of one graph per workspace
#[async_trait]
pub trait GraphRepository: Send + Sync {
    /// Replace the workspace's stored graph
    async fn save_graph(&self, workspace_id: &str, graph: &Graph) -> GraphResult<()>;

    /// Read the workspace's graph restricted by filters and a search term.
    ///
    /// A node is returned when it passes every filter and, for a non-empty
    /// term, matches the search; an edge is returned when both endpoints are.
    /// A workspace without a stored graph yields an empty directed graph.
    async fn query_graph(
        &self,
        workspace_id: &str,
        filters: &[Filter],
        search_term: Option<&str>,
    ) -> GraphResult<Graph>;

    /// Drop the workspace's stored graph, if any
    async fn delete_graph(&self, workspace_id: &str) -> GraphResult<()>;

    /// Release backend resources
    async fn close(&self) -> GraphResult<()> {
        Ok(())
    }
}

/// Store of workspace records
#[async_trait]
pub trait WorkspaceRepository: Send + Sync {
    /// All workspaces, in id order
    async fn get_all(&self) -> GraphResult<Vec<Workspace>>;

    async fn get(&self, id: &str) -> GraphResult<Option<Workspace>>;

    /// Store a new workspace, assigning it the next sequential id
    async fn insert(&self, workspace: Workspace) -> GraphResult<Workspace>;

    /// Overwrite an existing workspace; fails if the id is unknown
    async fn update(&self, workspace: &Workspace) -> GraphResult<()>;

    /// Remove a workspace; fails if the id is unknown
    async fn delete(&self, id: &str) -> GraphResult<()>;
}
