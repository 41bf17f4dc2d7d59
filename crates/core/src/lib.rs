//! Core types and functionality for the gorev task daemon

pub mod error;
pub mod events;
pub mod i18n;
pub mod ide;
pub mod service;
pub mod storage;
pub mod types;
pub mod workspace;

pub use error::{ServiceError, ServiceResult, WorkspaceError, WorkspaceResult};
pub use events::{Event, EventEmitter, EventKind, NoOpEmitter};
pub use i18n::{Lang, LanguageSetting, Msg};
pub use service::TaskService;
pub use types::*;
pub use workspace::{
    StorageMode, WatcherConfig, WorkspaceContext, WorkspaceId, WorkspaceInfo, WorkspaceRegistry,
};
