//! Graph explorer
//!
//! A typed in-memory property graph with filter and search queries, bound to
//! pluggable data sources and visualizers and persisted per workspace.
//! Front ends talk to it through the [`handlers::CommandProcessor`].

pub mod aggregate;
pub mod commands;
pub mod config;
pub mod context;
pub mod error;
pub mod handlers;
pub mod infrastructure;
pub mod plugins;
pub mod queries;
pub mod telemetry;
pub mod value_objects;
pub mod workspaces;

// Re-export main types
pub use aggregate::{Edge, EdgeId, Graph, GraphSnapshot, Node};
pub use error::{Entity, GraphError, GraphResult};
pub use value_objects::{DataDict, Value, ValueKind};

pub use queries::{Filter, FilterOperator, FilterValue, GraphQuery};

pub use commands::{Command, CommandArgs, CommandName};
pub use handlers::{CommandOutcome, CommandProcessor};

pub use context::{GraphContext, GraphContextFactory, WorkspaceSession};
pub use plugins::{DataSourcePlugin, PluginRegistry, VisualizerPlugin};
pub use workspaces::{Workspace, WorkspaceService};

pub use config::AppConfig;
