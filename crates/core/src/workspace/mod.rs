//! Workspace identity, per-workspace runtime context, file watching and the
//! registry that owns them.

mod context;
mod id;
mod registry;
mod watcher;

pub use context::{WorkspaceContext, WorkspaceInfo};
pub use id::WorkspaceId;
pub use registry::{StorageMode, WorkspaceRegistry, DATABASE_FILE, WORKSPACE_DIR};
pub use watcher::{FileWatcher, WatcherConfig};
