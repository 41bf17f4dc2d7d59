pub mod workspace;

pub use workspace::{inject_workspace, CurrentWorkspace, Workspace};
