//! Endpoint groups of the daemon API.

pub mod health;
pub mod mcp;
pub mod workspaces;

pub use health::{HealthApi, HealthResponse};
pub use mcp::McpApi;
pub use workspaces::{RegisterWorkspaceRequest, RegisterWorkspaceResponse, WorkspacesApi};
