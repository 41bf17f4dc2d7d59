//! MCP (Model Context Protocol) surface of gorev.
//!
//! [`Dispatcher`] runs inside the daemon and maps JSON-RPC methods onto the tool set;
//! [`proxy`] is the stdio process an MCP client launches, which forwards frames to the daemon.

pub mod dispatcher;
pub mod error;
pub mod protocol;
pub mod proxy;
pub mod tools;

pub use dispatcher::{extract_entity_id, Dispatch, Dispatcher};
pub use error::{DispatchError, ToolError, ToolResult};
pub use proxy::{find_workspace_root, Proxy, ProxyOptions};
pub use tools::{Tool, ToolName, ToolRegistry};
