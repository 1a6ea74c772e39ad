//! Workspace records in a single JSON document

use super::file_graph_repository::write_atomically;
use super::WorkspaceRepository;
use crate::error::{Entity, GraphError, GraphResult};
use crate::workspaces::Workspace;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, error};

/// The stored document: `{ "next_id": n, "workspaces": [...] }`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(super) struct WorkspaceDocument {
    #[serde(default = "first_id")]
    pub next_id: u64,
    #[serde(default)]
    pub workspaces: Vec<Workspace>,
}

fn first_id() -> u64 {
    1
}

impl Default for WorkspaceDocument {
    fn default() -> Self {
        Self {
            next_id: first_id(),
            workspaces: Vec::new(),
        }
    }
}

impl WorkspaceDocument {
    pub fn get(&self, id: &str) -> Option<&Workspace> {
        self.workspaces.iter().find(|ws| ws.id == id)
    }

    pub fn insert(&mut self, mut workspace: Workspace) -> Workspace {
        // A hand-edited document may carry ids past the counter.
        let highest = self
            .workspaces
            .iter()
            .filter_map(|ws| ws.id.parse::<u64>().ok())
            .max()
            .unwrap_or(0);
        let id = self.next_id.max(highest + 1);
        self.next_id = id + 1;

        workspace.id = id.to_string();
        self.workspaces.push(workspace.clone());
        workspace
    }

    pub fn update(&mut self, workspace: &Workspace) -> GraphResult<()> {
        let slot = self
            .workspaces
            .iter_mut()
            .find(|ws| ws.id == workspace.id)
            .ok_or_else(|| GraphError::not_found(Entity::Workspace, &workspace.id))?;
        *slot = workspace.clone();
        Ok(())
    }

    pub fn delete(&mut self, id: &str) -> GraphResult<()> {
        let index = self
            .workspaces
            .iter()
            .position(|ws| ws.id == id)
            .ok_or_else(|| GraphError::not_found(Entity::Workspace, id))?;
        self.workspaces.remove(index);
        Ok(())
    }
}

/// Workspace store backed by one JSON file.
///
/// Every mutation reads the document, applies the change and writes it back
/// atomically; mutations are serialised through an async lock.
#[derive(Debug)]
pub struct JsonWorkspaceRepository {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonWorkspaceRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> GraphResult<WorkspaceDocument> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => serde_json::from_str(&raw).map_err(|err| {
                error!(path = %self.path.display(), error = %err, "Corrupt workspace document");
                GraphError::Persistence(format!("{}: {err}", self.path.display()))
            }),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(WorkspaceDocument::default()),
            Err(err) => Err(err.into()),
        }
    }

    async fn store(&self, document: &WorkspaceDocument) -> GraphResult<()> {
        let bytes = serde_json::to_vec_pretty(document)
            .map_err(|err| GraphError::Persistence(err.to_string()))?;
        write_atomically(&self.path, &bytes).await?;
        debug!(path = %self.path.display(), workspaces = document.workspaces.len(), "Stored workspaces");
        Ok(())
    }

    async fn modify<T: Send>(
        &self,
        change: impl FnOnce(&mut WorkspaceDocument) -> GraphResult<T> + Send,
    ) -> GraphResult<T> {
        let _guard = self.lock.lock().await;
        let mut document = self.load().await?;
        let result = change(&mut document)?;
        self.store(&document).await?;
        Ok(result)
    }
}

#[async_trait]
impl WorkspaceRepository for JsonWorkspaceRepository {
    async fn get_all(&self) -> GraphResult<Vec<Workspace>> {
        Ok(self.load().await?.workspaces)
    }

    async fn get(&self, id: &str) -> GraphResult<Option<Workspace>> {
        Ok(self.load().await?.get(id).cloned())
    }

    async fn insert(&self, workspace: Workspace) -> GraphResult<Workspace> {
        self.modify(|document| Ok(document.insert(workspace))).await
    }

    async fn update(&self, workspace: &Workspace) -> GraphResult<()> {
        self.modify(|document| document.update(workspace)).await
    }

    async fn delete(&self, id: &str) -> GraphResult<()> {
        self.modify(|document| document.delete(id)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::Filter;

    #[tokio::test]
    async fn test_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("workspaces.json");

        let repository = JsonWorkspaceRepository::new(&path);
        assert!(repository.get_all().await.unwrap().is_empty());

        let mut workspace = Workspace::new("Research");
        workspace.data_source_id = Some("empty_data_source".into());
        workspace.filters.push(Filter::parse("age", "gte", "18").unwrap());
        let stored = repository.insert(workspace).await.unwrap();
        assert_eq!(stored.id, "1");

        let reopened = JsonWorkspaceRepository::new(&path);
        let loaded = reopened.get("1").await.unwrap().unwrap();
        assert_eq!(loaded, stored);

        let second = reopened.insert(Workspace::new("Other")).await.unwrap();
        assert_eq!(second.id, "2");
    }

    #[tokio::test]
    async fn test_document_layout() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("workspaces.json");
        let repository = JsonWorkspaceRepository::new(&path);
        repository.insert(Workspace::new("A")).await.unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["next_id"], 2);
        assert_eq!(raw["workspaces"][0]["name"], "A");
        assert_eq!(raw["workspaces"][0]["filters"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_unknown_ids_and_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("workspaces.json");
        let repository = JsonWorkspaceRepository::new(&path);
        assert!(matches!(
            repository.delete("9").await,
            Err(GraphError::NotFound { .. })
        ));

        std::fs::write(&path, "not json").unwrap();
        assert!(matches!(
            repository.get_all().await,
            Err(GraphError::Persistence(_))
        ));
    }
}
