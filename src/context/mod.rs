//! Graph contexts and the workspace session
//!
//! The session owns the pointer to the current workspace and the live
//! [`GraphContext`] for it. Access goes through an async mutex so that at most
//! one command works against the active graph at a time.

mod factory;
mod graph_context;
mod session;

pub use factory::GraphContextFactory;
pub use graph_context::{ContextSnapshot, ContextState, GraphContext};
pub use session::{ActiveSession, SessionSnapshot, WorkspaceSession, WorkspaceSummary};
