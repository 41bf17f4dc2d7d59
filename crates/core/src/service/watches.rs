use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use super::{TaskService, TaskUpdate};
use crate::error::{ServiceError, ServiceResult};
use crate::storage::FILE_WATCHES;
use crate::types::{FileWatch, InteractionKind, Task, TaskStatus};

/// Kind of filesystem change seen on a watched path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileOp {
    Create,
    Write,
    Remove,
    Rename,
    Chmod,
}

impl FileOp {
    pub fn as_str(self) -> &'static str {
        match self {
            FileOp::Create => "create",
            FileOp::Write => "write",
            FileOp::Remove => "remove",
            FileOp::Rename => "rename",
            FileOp::Chmod => "chmod",
        }
    }

    /// Whether the change means someone is working on the file
    pub fn starts_work(self) -> bool {
        matches!(self, FileOp::Create | FileOp::Write)
    }
}

/// Absolute form of a stored watch path; relative paths hang off the workspace root.
pub fn resolve_watch_path(root: &Path, path: &str) -> PathBuf {
    let path = Path::new(path);
    let absolute = if path.is_absolute() { path.to_path_buf() } else { root.join(path) };
    absolute.canonicalize().unwrap_or(absolute)
}

/// Counters for `gorev_file_watch action=stats`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchStats {
    pub total_watches: usize,
    pub watched_tasks: usize,
    pub unique_paths: usize,
}

impl TaskService {
    /// Associate a file path with a task. Paths are stored as given.
    pub fn add_watch(&self, task_id: &str, path: &str) -> ServiceResult<FileWatch> {
        let path = path.trim();
        if path.is_empty() {
            return Err(ServiceError::invalid("file path is required"));
        }
        self.load_task(task_id)?;

        let key = format!("{}/{}", task_id, path);
        if let Some(existing) = self.store.get::<FileWatch>(FILE_WATCHES, &key)? {
            return Ok(existing);
        }

        let watch = FileWatch {
            task_id: task_id.to_string(),
            path: path.to_string(),
            added_at: Utc::now(),
        };
        self.store.put(FILE_WATCHES, &key, &watch)?;
        Ok(watch)
    }

    pub fn remove_watch(&self, task_id: &str, path: &str) -> ServiceResult<()> {
        let key = format!("{}/{}", task_id, path.trim());
        if !self.store.remove(FILE_WATCHES, &key)? {
            return Err(ServiceError::not_found("file watch", path));
        }
        Ok(())
    }

    pub fn list_watches(&self, task_id: Option<&str>) -> ServiceResult<Vec<FileWatch>> {
        let prefix = task_id.map(|id| format!("{}/", id)).unwrap_or_default();
        Ok(self.store.scan(FILE_WATCHES, &prefix)?)
    }

    pub fn watch_stats(&self) -> ServiceResult<WatchStats> {
        let watches = self.list_watches(None)?;
        let tasks: BTreeSet<&str> = watches.iter().map(|w| w.task_id.as_str()).collect();
        let paths: BTreeSet<&str> = watches.iter().map(|w| w.path.as_str()).collect();
        Ok(WatchStats {
            total_watches: watches.len(),
            watched_tasks: tasks.len(),
            unique_paths: paths.len(),
        })
    }

    /// Directories the OS watcher must observe, mapped to whether to recurse.
    ///
    /// A watched directory is observed recursively; a watched file through its
    /// parent directory. Paths whose directory does not exist yet are skipped.
    pub fn watch_targets(&self, root: &Path) -> ServiceResult<BTreeMap<PathBuf, bool>> {
        let mut targets = BTreeMap::new();
        for watch in self.list_watches(None)? {
            let watched = resolve_watch_path(root, &watch.path);
            if watched.is_dir() {
                targets.insert(watched, true);
            } else if let Some(parent) = watched.parent().filter(|p| p.is_dir()) {
                targets.entry(parent.to_path_buf()).or_insert(false);
            }
        }
        Ok(targets)
    }

    /// Ids of tasks watching `changed` itself or a directory above it
    pub fn tasks_watching(&self, root: &Path, changed: &Path) -> ServiceResult<Vec<String>> {
        let mut ids = BTreeSet::new();
        for watch in self.list_watches(None)? {
            if changed.starts_with(resolve_watch_path(root, &watch.path)) {
                ids.insert(watch.task_id);
            }
        }
        Ok(ids.into_iter().collect())
    }

    /// Record a file change against a task. Creating or writing a file starts a
    /// pending task; the updated task is returned when its status moved.
    pub fn apply_file_change(&self, task_id: &str, op: FileOp) -> ServiceResult<Option<Task>> {
        let task = self.load_task(task_id)?;
        let mut started = None;
        if op.starts_work() && task.status == TaskStatus::Pending {
            match self.update_task(task_id, TaskUpdate::status(TaskStatus::InProgress)) {
                Ok(task) => started = Some(task),
                Err(ServiceError::Conflict(reason)) => {
                    tracing::debug!(task = %task_id, %reason, "File change left task pending");
                }
                Err(e) => return Err(e),
            }
        }
        self.record_interaction(task_id, InteractionKind::FileChange)?;
        Ok(started)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::testing::{service, task};

    #[test]
    fn test_watch_lifecycle() {
        let (_dir, service) = service();
        let a = task(&service, "A");
        let b = task(&service, "B");

        service.add_watch(&a.id, "src/main.rs").unwrap();
        service.add_watch(&a.id, "src/main.rs").unwrap();
        service.add_watch(&a.id, "Cargo.toml").unwrap();
        service.add_watch(&b.id, "src/main.rs").unwrap();

        assert_eq!(service.list_watches(Some(&a.id)).unwrap().len(), 2);
        assert_eq!(
            service.watch_stats().unwrap(),
            WatchStats {
                total_watches: 3,
                watched_tasks: 2,
                unique_paths: 2,
            }
        );

        service.remove_watch(&a.id, "Cargo.toml").unwrap();
        assert!(service.remove_watch(&a.id, "Cargo.toml").is_err());

        service.delete_task(&a.id).unwrap();
        assert_eq!(service.list_watches(None).unwrap().len(), 1);
    }

    #[test]
    fn test_tasks_watching_matches_files_and_directories() {
        let (dir, service) = service();
        let root = dir.path().canonicalize().unwrap();
        std::fs::create_dir_all(root.join("src/nested")).unwrap();
        std::fs::write(root.join("README.md"), "x").unwrap();

        let by_file = task(&service, "file");
        let by_dir = task(&service, "dir");
        service.add_watch(&by_file.id, "README.md").unwrap();
        service.add_watch(&by_dir.id, root.join("src").to_str().unwrap()).unwrap();

        assert_eq!(
            service.tasks_watching(&root, &root.join("README.md")).unwrap(),
            vec![by_file.id.clone()]
        );
        assert_eq!(
            service.tasks_watching(&root, &root.join("src/nested/lib.rs")).unwrap(),
            vec![by_dir.id.clone()]
        );
        assert!(service.tasks_watching(&root, &root.join("srcx/a.rs")).unwrap().is_empty());

        let targets = service.watch_targets(&root).unwrap();
        assert_eq!(targets.get(&root), Some(&false));
        assert_eq!(targets.get(&root.join("src")), Some(&true));
    }

    #[test]
    fn test_file_change_starts_pending_task() {
        let (_dir, service) = service();
        let t = task(&service, "edit me");

        assert!(service.apply_file_change(&t.id, FileOp::Remove).unwrap().is_none());
        assert_eq!(service.load_task(&t.id).unwrap().status, TaskStatus::Pending);

        let started = service.apply_file_change(&t.id, FileOp::Write).unwrap().unwrap();
        assert_eq!(started.status, TaskStatus::InProgress);

        let interaction: crate::types::Interaction = service
            .store
            .get(crate::storage::INTERACTIONS, &t.id)
            .unwrap()
            .unwrap();
        assert_eq!(interaction.kind, InteractionKind::FileChange);

        // Already in progress: nothing further to report
        assert!(service.apply_file_change(&t.id, FileOp::Create).unwrap().is_none());
    }

    #[test]
    fn test_file_change_respects_dependencies() {
        let (_dir, service) = service();
        let first = task(&service, "first");
        let second = task(&service, "second");
        service.add_dependency(&first.id, &second.id, "onceki").unwrap();

        assert!(service.apply_file_change(&second.id, FileOp::Write).unwrap().is_none());
        assert_eq!(service.load_task(&second.id).unwrap().status, TaskStatus::Pending);
    }

    #[test]
    fn test_watch_unknown_task() {
        let (_dir, service) = service();
        assert!(matches!(
            service.add_watch("missing", "a.rs"),
            Err(ServiceError::NotFound(_))
        ));
    }
}
