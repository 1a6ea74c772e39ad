//! Graph snapshots stored as one JSON file per workspace

use super::GraphRepository;
use crate::aggregate::Graph;
use crate::error::{GraphError, GraphResult};
use crate::queries::{Filter, GraphQuery};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, error};

/// Graph store backed by a directory of JSON snapshots
#[derive(Debug)]
pub struct FileGraphRepository {
    dir: PathBuf,
    write_lock: Mutex<()>,
}

impl FileGraphRepository {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Location of a workspace's snapshot.
    ///
    /// Bytes outside `[A-Za-z0-9-]` are written as `_xx` hex escapes, so
    /// distinct ids always map to distinct files.
    pub fn snapshot_path(&self, workspace_id: &str) -> PathBuf {
        self.dir
            .join(format!("workspace_{}.json", encode_file_stem(workspace_id)))
    }

    async fn load(&self, workspace_id: &str) -> GraphResult<Option<Graph>> {
        let path = self.snapshot_path(workspace_id);
        let raw = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        serde_json::from_str(&raw).map(Some).map_err(|err| {
            error!(path = %path.display(), error = %err, "Corrupt graph snapshot");
            GraphError::Persistence(format!("{}: {err}", path.display()))
        })
    }
}

#[async_trait]
impl GraphRepository for FileGraphRepository {
    async fn save_graph(&self, workspace_id: &str, graph: &Graph) -> GraphResult<()> {
        let bytes =
            serde_json::to_vec(graph).map_err(|err| GraphError::Persistence(err.to_string()))?;
        let path = self.snapshot_path(workspace_id);

        let _guard = self.write_lock.lock().await;
        write_atomically(&path, &bytes).await?;
        debug!(
            workspace_id,
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "Saved graph snapshot"
        );
        Ok(())
    }

    async fn query_graph(
        &self,
        workspace_id: &str,
        filters: &[Filter],
        search_term: Option<&str>,
    ) -> GraphResult<Graph> {
        let Some(graph) = self.load(workspace_id).await? else {
            return Ok(Graph::default());
        };
        let query = GraphQuery::new(filters.to_vec(), search_term.map(str::to_string));
        Ok(query.apply(&graph))
    }

    async fn delete_graph(&self, workspace_id: &str) -> GraphResult<()> {
        let _guard = self.write_lock.lock().await;
        match tokio::fs::remove_file(self.snapshot_path(workspace_id)).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

fn encode_file_stem(id: &str) -> String {
    let mut stem = String::with_capacity(id.len());
    for byte in id.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'-' {
            stem.push(char::from(byte));
        } else {
            stem.push_str(&format!("_{byte:02x}"));
        }
    }
    stem
}

/// Write `bytes` to `path` through a sibling temp file and a rename
pub(super) async fn write_atomically(path: &Path, bytes: &[u8]) -> GraphResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    let mut temp = path.as_os_str().to_owned();
    temp.push(".tmp");
    let temp = PathBuf::from(temp);

    tokio::fs::write(&temp, bytes).await?;
    tokio::fs::rename(&temp, path).await?;
    Ok(())
}
