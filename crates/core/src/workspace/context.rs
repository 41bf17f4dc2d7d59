use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::Arc;

use super::{FileWatcher, WorkspaceId};
use crate::events::EventEmitter;
use crate::service::TaskService;

/// Runtime state of one registered workspace.
///
/// Owned by the registry; handlers hold an `Arc` only for the duration of a request.
pub struct WorkspaceContext {
    pub id: WorkspaceId,
    pub name: String,
    pub path: PathBuf,
    pub db_path: PathBuf,
    pub service: TaskService,
    pub emitter: Arc<dyn EventEmitter>,
    pub created_at: DateTime<Utc>,
    /// Idle unless the registry was built `with_file_watcher`
    pub watcher: FileWatcher,
    last_accessed: AtomicI64,
    task_count: AtomicUsize,
}

/// Display-safe snapshot of a workspace
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkspaceInfo {
    pub id: String,
    pub name: String,
    pub path: String,
    pub task_count: usize,
    pub last_accessed: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl WorkspaceContext {
    pub fn new(
        id: WorkspaceId,
        name: String,
        path: PathBuf,
        db_path: PathBuf,
        service: TaskService,
        emitter: Arc<dyn EventEmitter>,
    ) -> Self {
        let now = Utc::now();
        let task_count = service.task_count().unwrap_or_else(|e| {
            tracing::warn!(workspace = %id, error = %e, "Failed to count tasks");
            0
        });
        Self {
            id,
            name,
            path,
            db_path,
            service,
            emitter,
            created_at: now,
            watcher: FileWatcher::default(),
            last_accessed: AtomicI64::new(now.timestamp_millis()),
            task_count: AtomicUsize::new(task_count),
        }
    }

    pub fn touch(&self) {
        self.last_accessed
            .store(Utc::now().timestamp_millis(), Ordering::Relaxed);
    }

    pub fn last_accessed(&self) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(self.last_accessed.load(Ordering::Relaxed))
            .single()
            .unwrap_or(self.created_at)
    }

    /// Re-read the task count after a mutation.
    pub fn refresh_task_count(&self) {
        if let Ok(count) = self.service.task_count() {
            self.task_count.store(count, Ordering::Relaxed);
        }
    }

    /// Re-read the stored watches and point the OS watcher at them.
    pub fn sync_watches(&self) {
        if !self.watcher.is_active() {
            return;
        }
        match self.service.watch_targets(&self.path) {
            Ok(targets) => self.watcher.sync(targets),
            Err(e) => tracing::warn!(workspace = %self.id, error = %e, "Failed to load file watches"),
        }
    }

    pub fn task_count(&self) -> usize {
        self.task_count.load(Ordering::Relaxed)
    }

    pub fn info(&self) -> WorkspaceInfo {
        WorkspaceInfo {
            id: self.id.to_string(),
            name: self.name.clone(),
            path: self.path.display().to_string(),
            task_count: self.task_count(),
            last_accessed: self.last_accessed(),
            created_at: self.created_at,
        }
    }
}

impl std::fmt::Debug for WorkspaceContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkspaceContext")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("path", &self.path)
            .field("db_path", &self.db_path)
            .finish_non_exhaustive()
    }
}
