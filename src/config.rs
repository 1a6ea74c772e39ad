//! Runtime configuration
//!
//! Settings come from the process environment, with a `.env` file in the
//! working directory honoured when present.

use crate::error::{GraphError, GraphResult};
use crate::infrastructure::IoPolicy;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

pub const WORKSPACE_DB_VAR: &str = "GRAPH_EXPLORER_WORKSPACE_DB";
pub const GRAPH_DIR_VAR: &str = "GRAPH_EXPLORER_GRAPH_DIR";
pub const IO_TIMEOUT_VAR: &str = "GRAPH_EXPLORER_IO_TIMEOUT_MS";
pub const READ_RETRIES_VAR: &str = "GRAPH_EXPLORER_READ_RETRIES";
pub const LOG_VAR: &str = "GRAPH_EXPLORER_LOG";

const DEFAULT_TIMEOUT_MS: u64 = 5000;
const DEFAULT_READ_RETRIES: u32 = 2;
const DEFAULT_LOG_FILTER: &str = "graph_explorer=info";

/// Application settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// JSON document holding the workspace records
    pub workspace_db_path: PathBuf,
    /// Directory of per-workspace graph snapshots
    pub graph_store_dir: PathBuf,
    pub io_timeout: Duration,
    pub read_retries: u32,
    /// Default `EnvFilter` directive when `RUST_LOG` is unset
    pub log_filter: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::with_data_dir(Path::new("."))
    }
}

impl AppConfig {
    fn with_data_dir(data_dir: &Path) -> Self {
        let root = data_dir.join("graph_explorer");
        Self {
            workspace_db_path: root.join("workspaces.json"),
            graph_store_dir: root.join("graphs"),
            io_timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            read_retries: DEFAULT_READ_RETRIES,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }

    /// Load from `.env` and the process environment
    pub fn from_env() -> GraphResult<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> GraphResult<Self> {
        let data_dir = lookup("XDG_DATA_HOME")
            .filter(|dir| !dir.is_empty())
            .map(PathBuf::from)
            .or_else(|| lookup("HOME").map(|home| Path::new(&home).join(".local/share")))
            .unwrap_or_else(|| PathBuf::from("."));
        let mut config = Self::with_data_dir(&data_dir);

        if let Some(path) = lookup(WORKSPACE_DB_VAR) {
            config.workspace_db_path = PathBuf::from(path);
        }
        if let Some(dir) = lookup(GRAPH_DIR_VAR) {
            config.graph_store_dir = PathBuf::from(dir);
        }
        if let Some(millis) = parse_var::<u64>(&lookup, IO_TIMEOUT_VAR)? {
            config.io_timeout = Duration::from_millis(millis);
        }
        if let Some(retries) = parse_var(&lookup, READ_RETRIES_VAR)? {
            config.read_retries = retries;
        }
        if let Some(filter) = lookup(LOG_VAR) {
            config.log_filter = filter;
        }
        Ok(config)
    }

    pub fn io_policy(&self) -> IoPolicy {
        IoPolicy::new(self.io_timeout, self.read_retries)
    }
}

fn parse_var<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> GraphResult<Option<T>> {
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| GraphError::validation(format!("Invalid value for {key}: '{raw}'"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults_under_data_home() {
        let config = AppConfig::from_lookup(lookup(&[("HOME", "/home/ada")])).unwrap();
        assert_eq!(
            config.workspace_db_path,
            PathBuf::from("/home/ada/.local/share/graph_explorer/workspaces.json")
        );
        assert_eq!(
            config.graph_store_dir,
            PathBuf::from("/home/ada/.local/share/graph_explorer/graphs")
        );
        assert_eq!(config.io_timeout, Duration::from_millis(5000));
        assert_eq!(config.read_retries, 2);
        assert_eq!(config.log_filter, "graph_explorer=info");

        let xdg = AppConfig::from_lookup(lookup(&[("XDG_DATA_HOME", "/data"), ("HOME", "/home/ada")]))
            .unwrap();
        assert_eq!(xdg.graph_store_dir, PathBuf::from("/data/graph_explorer/graphs"));

        assert_eq!(AppConfig::from_lookup(lookup(&[])).unwrap(), AppConfig::default());
    }

    #[test]
    fn test_overrides() {
        let config = AppConfig::from_lookup(lookup(&[
            (WORKSPACE_DB_VAR, "/tmp/ws.json"),
            (GRAPH_DIR_VAR, "/tmp/graphs"),
            (IO_TIMEOUT_VAR, "250"),
            (READ_RETRIES_VAR, "0"),
            (LOG_VAR, "graph_explorer=debug"),
        ]))
        .unwrap();
        assert_eq!(config.workspace_db_path, PathBuf::from("/tmp/ws.json"));
        assert_eq!(config.graph_store_dir, PathBuf::from("/tmp/graphs"));
        assert_eq!(config.io_policy(), IoPolicy::new(Duration::from_millis(250), 0));
        assert_eq!(config.log_filter, "graph_explorer=debug");
    }

    #[test]
    fn test_malformed_number() {
        let err = AppConfig::from_lookup(lookup(&[(READ_RETRIES_VAR, "many")])).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid value for GRAPH_EXPLORER_READ_RETRIES: 'many'"
        );
    }
}
