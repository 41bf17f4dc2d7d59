use redb::Database;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::Duration;

use super::{WatcherConfig, WorkspaceContext, WorkspaceId, WorkspaceInfo};
use crate::error::{WorkspaceError, WorkspaceResult};
use crate::events::{EventEmitter, NoOpEmitter};
use crate::i18n::LanguageSetting;
use crate::service::TaskService;
use crate::storage::{open_database, MigrationSource, TaskStore, LOCAL_PARTITION};

/// Directory created inside every local-mode workspace
pub const WORKSPACE_DIR: &str = ".gorev";
pub const DATABASE_FILE: &str = "gorev.db";

/// Where workspace databases live
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageMode {
    /// One database per workspace at `<path>/.gorev/gorev.db`
    Local,
    /// A single shared database partitioned by workspace id
    Centralized { db_path: PathBuf },
}

/// Process-wide table of registered workspaces.
///
/// The registry is the only owner of workspace database handles: contexts are
/// closed exactly once, by whichever of `unregister`, `cleanup` or `close_all`
/// removes them from the map.
pub struct WorkspaceRegistry {
    workspaces: RwLock<HashMap<String, Arc<WorkspaceContext>>>,
    mode: StorageMode,
    migrations: MigrationSource,
    shared_db: Mutex<Option<Arc<Database>>>,
    emitter: Arc<dyn EventEmitter>,
    lang: Arc<LanguageSetting>,
    file_watcher: Option<WatcherConfig>,
}

impl WorkspaceRegistry {
    pub fn new(mode: StorageMode, lang: Arc<LanguageSetting>) -> Self {
        Self {
            workspaces: RwLock::new(HashMap::new()),
            mode,
            migrations: MigrationSource::from_env(),
            shared_db: Mutex::new(None),
            emitter: Arc::new(NoOpEmitter),
            lang,
            file_watcher: None,
        }
    }

    /// Emitter handed to every context created from now on
    pub fn with_emitter(mut self, emitter: Arc<dyn EventEmitter>) -> Self {
        self.emitter = emitter;
        self
    }

    pub fn with_migrations(mut self, migrations: MigrationSource) -> Self {
        self.migrations = migrations;
        self
    }

    /// Give every workspace registered from now on an OS file watcher
    pub fn with_file_watcher(mut self, config: WatcherConfig) -> Self {
        self.file_watcher = Some(config);
        self
    }

    pub fn mode(&self) -> &StorageMode {
        &self.mode
    }

    pub fn language(&self) -> &Arc<LanguageSetting> {
        &self.lang
    }

    /// Register a directory, or return the existing context for it.
    pub fn register(&self, path: &Path, name: Option<&str>) -> WorkspaceResult<Arc<WorkspaceContext>> {
        let absolute = std::path::absolute(path).map_err(|e| WorkspaceError::InvalidPath {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        if !absolute.exists() {
            return Err(WorkspaceError::PathNotFound(absolute));
        }
        let absolute = absolute
            .canonicalize()
            .map_err(|e| WorkspaceError::InvalidPath {
                path: absolute.clone(),
                reason: e.to_string(),
            })?;
        if !absolute.is_dir() {
            return Err(WorkspaceError::InvalidPath {
                path: absolute,
                reason: "not a directory".to_string(),
            });
        }

        let id = WorkspaceId::from_path(&absolute);
        let mut workspaces = self.workspaces.write().unwrap_or_else(PoisonError::into_inner);

        if let Some(existing) = workspaces.get(id.as_str()) {
            existing.touch();
            tracing::debug!(workspace = %id, "Workspace already registered");
            return Ok(existing.clone());
        }

        let name = name
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| {
                absolute
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| absolute.display().to_string())
            });

        if let Some(missing) = self.migrations.missing_path() {
            return Err(WorkspaceError::MigrationsNotFound(missing.to_path_buf()));
        }

        let (db_path, store) = self.open_store(&absolute, &id)?;
        let service = TaskService::new(store, self.lang.clone());
        let context = Arc::new(WorkspaceContext::new(
            id.clone(),
            name,
            absolute,
            db_path,
            service,
            self.emitter.clone(),
        ));
        if let Some(config) = &self.file_watcher {
            match context.watcher.start(Arc::downgrade(&context), config) {
                Ok(()) => context.sync_watches(),
                Err(e) => tracing::warn!(workspace = %id, error = %e, "File watcher unavailable"),
            }
        }

        tracing::info!(
            workspace = %id,
            name = %context.name,
            path = %context.path.display(),
            tasks = context.task_count(),
            "Registered workspace"
        );
        workspaces.insert(id.to_string(), context.clone());
        Ok(context)
    }

    fn open_store(&self, root: &Path, id: &WorkspaceId) -> WorkspaceResult<(PathBuf, TaskStore)> {
        match &self.mode {
            StorageMode::Local => {
                let dir = root.join(WORKSPACE_DIR);
                create_workspace_dir(&dir).map_err(|e| WorkspaceError::DbOpenFailed {
                    path: dir.clone(),
                    message: e.to_string(),
                })?;
                let db_path = dir.join(DATABASE_FILE);
                let db = open_database(&db_path, &self.migrations).map_err(|e| {
                    WorkspaceError::DbOpenFailed {
                        path: db_path.clone(),
                        message: format!("{:#}", e),
                    }
                })?;
                Ok((db_path, TaskStore::new(db, LOCAL_PARTITION)))
            }
            StorageMode::Centralized { db_path } => {
                let mut shared = self.shared_db.lock().unwrap_or_else(PoisonError::into_inner);
                let db = match shared.as_ref() {
                    Some(db) => db.clone(),
                    None => {
                        let db = open_database(db_path, &self.migrations).map_err(|e| {
                            WorkspaceError::DbOpenFailed {
                                path: db_path.clone(),
                                message: format!("{:#}", e),
                            }
                        })?;
                        *shared = Some(db.clone());
                        db
                    }
                };
                Ok((db_path.clone(), TaskStore::new(db, id.as_str())))
            }
        }
    }

    pub fn get(&self, id: &str) -> WorkspaceResult<Arc<WorkspaceContext>> {
        let workspaces = self.workspaces.read().unwrap_or_else(PoisonError::into_inner);
        let context = workspaces
            .get(id)
            .ok_or_else(|| WorkspaceError::NotFound(id.to_string()))?;
        context.touch();
        Ok(context.clone())
    }

    pub fn list(&self) -> Vec<WorkspaceInfo> {
        let workspaces = self.workspaces.read().unwrap_or_else(PoisonError::into_inner);
        let mut infos: Vec<WorkspaceInfo> = workspaces.values().map(|c| c.info()).collect();
        infos.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        infos
    }

    pub fn len(&self) -> usize {
        self.workspaces
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn unregister(&self, id: &str) -> WorkspaceResult<()> {
        let context = {
            let mut workspaces = self.workspaces.write().unwrap_or_else(PoisonError::into_inner);
            workspaces
                .remove(id)
                .ok_or_else(|| WorkspaceError::NotFound(id.to_string()))?
        };
        close_context(&context)?;
        tracing::info!(workspace = %id, "Unregistered workspace");
        Ok(())
    }

    /// Evict workspaces idle for longer than `max_age`; returns the evicted ids.
    pub fn cleanup(&self, max_age: Duration) -> Vec<String> {
        let cutoff = chrono::Utc::now()
            - chrono::Duration::from_std(max_age).unwrap_or_else(|_| chrono::Duration::days(36_500));

        let evicted: Vec<Arc<WorkspaceContext>> = {
            let mut workspaces = self.workspaces.write().unwrap_or_else(PoisonError::into_inner);
            let stale: Vec<String> = workspaces
                .iter()
                .filter(|(_, c)| c.last_accessed() < cutoff)
                .map(|(id, _)| id.clone())
                .collect();
            stale.iter().filter_map(|id| workspaces.remove(id)).collect()
        };

        let mut ids = Vec::with_capacity(evicted.len());
        for context in evicted {
            if let Err(e) = close_context(&context) {
                tracing::warn!(workspace = %context.id, error = %e, "Failed to close idle workspace");
            }
            tracing::info!(workspace = %context.id, "Evicted idle workspace");
            ids.push(context.id.to_string());
        }
        ids
    }

    /// Close every workspace; errors are collected, never short-circuited.
    pub fn close_all(&self) -> Vec<WorkspaceError> {
        let drained: Vec<Arc<WorkspaceContext>> = {
            let mut workspaces = self.workspaces.write().unwrap_or_else(PoisonError::into_inner);
            workspaces.drain().map(|(_, c)| c).collect()
        };

        let errors: Vec<WorkspaceError> = drained
            .iter()
            .filter_map(|context| close_context(context).err())
            .collect();

        self.shared_db
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        if !drained.is_empty() {
            tracing::info!(closed = drained.len(), errors = errors.len(), "Closed all workspaces");
        }
        errors
    }
}

impl Drop for WorkspaceRegistry {
    fn drop(&mut self) {
        for error in self.close_all() {
            tracing::warn!(error = %error, "Failed to close workspace on drop");
        }
    }
}

fn close_context(context: &WorkspaceContext) -> WorkspaceResult<()> {
    context.watcher.stop();
    context
        .service
        .close()
        .map_err(|e| WorkspaceError::DbCloseFailed {
            id: context.id.to_string(),
            message: e.to_string(),
        })
}

#[cfg(unix)]
fn create_workspace_dir(dir: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::DirBuilderExt;
    if dir.is_dir() {
        return Ok(());
    }
    std::fs::DirBuilder::new().recursive(true).mode(0o755).create(dir)
}

#[cfg(not(unix))]
fn create_workspace_dir(dir: &Path) -> std::io::Result<()> {
    std::fs::create_dir_all(dir)
}
