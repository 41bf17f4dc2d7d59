use notify::event::ModifyKind;
use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use serde_json::json;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::sync::{Mutex, PoisonError, Weak};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use super::WorkspaceContext;
use crate::service::FileOp;

/// Directory names whose contents never trigger task updates
const IGNORED_DIRS: &[&str] = &[
    ".git",
    ".gorev",
    ".vscode",
    "node_modules",
    "vendor",
    "build",
    "dist",
    "target",
];
const IGNORED_SUFFIXES: &[&str] = &[".tmp", ".log", ".swp", "~"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatcherConfig {
    /// Quiet period before a burst of events on one path is acted on
    pub debounce: Duration,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(500),
        }
    }
}

/// OS-level watcher for the paths a workspace's tasks are associated with.
///
/// Events are debounced per path on a dedicated thread, matched against the
/// stored watches and turned into task updates plus `task_updated` events.
#[derive(Default)]
pub struct FileWatcher {
    running: Mutex<Option<Running>>,
}

struct Running {
    watcher: RecommendedWatcher,
    watched: BTreeMap<PathBuf, bool>,
    worker: Option<JoinHandle<()>>,
}

impl FileWatcher {
    pub fn is_active(&self) -> bool {
        self.lock().is_some()
    }

    /// Directories currently handed to the OS watcher
    pub fn watched_dirs(&self) -> Vec<PathBuf> {
        self.lock()
            .as_ref()
            .map(|r| r.watched.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub(crate) fn start(&self, context: Weak<WorkspaceContext>, config: &WatcherConfig) -> notify::Result<()> {
        let mut running = self.lock();
        if running.is_some() {
            return Ok(());
        }

        let (tx, rx) = mpsc::channel();
        let watcher = notify::recommended_watcher(tx)?;
        let debounce = config.debounce;
        let worker = thread::Builder::new()
            .name("gorev-file-watcher".to_string())
            .spawn(move || run_worker(rx, context, debounce))
            .map_err(notify::Error::io)?;

        *running = Some(Running {
            watcher,
            watched: BTreeMap::new(),
            worker: Some(worker),
        });
        Ok(())
    }

    /// Bring the OS watches in line with `targets` (directory -> recursive).
    pub(crate) fn sync(&self, targets: BTreeMap<PathBuf, bool>) {
        let mut guard = self.lock();
        let Some(running) = guard.as_mut() else {
            return;
        };

        let stale: Vec<PathBuf> = running
            .watched
            .iter()
            .filter(|(dir, recursive)| targets.get(*dir) != Some(*recursive))
            .map(|(dir, _)| dir.clone())
            .collect();
        for dir in stale {
            if let Err(e) = running.watcher.unwatch(&dir) {
                tracing::debug!(dir = %dir.display(), error = %e, "Failed to unwatch directory");
            }
            running.watched.remove(&dir);
        }

        for (dir, recursive) in targets {
            if running.watched.contains_key(&dir) {
                continue;
            }
            let mode = if recursive { RecursiveMode::Recursive } else { RecursiveMode::NonRecursive };
            match running.watcher.watch(&dir, mode) {
                Ok(()) => {
                    tracing::debug!(dir = %dir.display(), recursive, "Watching directory");
                    running.watched.insert(dir, recursive);
                }
                Err(e) => tracing::warn!(dir = %dir.display(), error = %e, "Failed to watch directory"),
            }
        }
    }

    /// Drop the OS watcher and wait for the worker to drain.
    pub(crate) fn stop(&self) {
        let Some(mut running) = self.lock().take() else {
            return;
        };
        let worker = running.worker.take();
        // Dropping the watcher closes the channel, which ends the worker loop.
        drop(running);
        if let Some(worker) = worker {
            if worker.thread().id() != thread::current().id() && worker.join().is_err() {
                tracing::warn!("File watcher thread panicked");
            }
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<Running>> {
        self.running.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for FileWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileWatcher")
            .field("watched", &self.watched_dirs())
            .finish()
    }
}

fn run_worker(rx: Receiver<notify::Result<notify::Event>>, context: Weak<WorkspaceContext>, debounce: Duration) {
    tracing::debug!(?debounce, "File watcher started");
    let mut pending: HashMap<PathBuf, (FileOp, Instant)> = HashMap::new();

    loop {
        let received = if pending.is_empty() {
            rx.recv().map_err(|_| RecvTimeoutError::Disconnected)
        } else {
            rx.recv_timeout(debounce)
        };

        match received {
            Ok(Ok(event)) => {
                if let Some(op) = file_op(&event.kind) {
                    for path in event.paths.into_iter().filter(|p| !is_ignored(p)) {
                        let entry = pending.entry(path).or_insert((op, Instant::now()));
                        // A write or create inside the window wins over metadata noise
                        if op.starts_work() || !entry.0.starts_work() {
                            entry.0 = op;
                        }
                        entry.1 = Instant::now();
                    }
                }
            }
            Ok(Err(e)) => tracing::warn!(error = %e, "File watcher error"),
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }

        let now = Instant::now();
        let due: Vec<(PathBuf, FileOp)> = pending
            .iter()
            .filter(|(_, (_, seen))| now.duration_since(*seen) >= debounce)
            .map(|(path, (op, _))| (path.clone(), *op))
            .collect();
        if due.is_empty() {
            continue;
        }
        let Some(context) = context.upgrade() else { break };
        for (path, op) in due {
            pending.remove(&path);
            handle_change(&context, &path, op);
        }
    }

    tracing::debug!("File watcher stopped");
}

fn handle_change(context: &WorkspaceContext, path: &Path, op: FileOp) {
    if context.db_path.parent().is_some_and(|dir| path.starts_with(dir)) {
        return;
    }
    let tasks = match context.service.tasks_watching(&context.path, path) {
        Ok(tasks) => tasks,
        Err(e) => {
            tracing::warn!(workspace = %context.id, error = %e, "Failed to match file change");
            return;
        }
    };

    for task_id in tasks {
        match context.service.apply_file_change(&task_id, op) {
            Ok(Some(task)) => {
                tracing::info!(
                    workspace = %context.id,
                    task = %task.id,
                    path = %path.display(),
                    operation = op.as_str(),
                    "File change started task"
                );
                context.emitter.emit_task_updated(
                    context.id.as_str(),
                    &task.id,
                    json!({
                        "durum": task.status,
                        "kaynak": "file_watcher",
                        "path": path.display().to_string(),
                        "operation": op,
                    }),
                );
            }
            Ok(None) => {
                tracing::debug!(task = %task_id, path = %path.display(), operation = op.as_str(), "Recorded file change")
            }
            Err(e) => tracing::warn!(task = %task_id, error = %e, "Failed to apply file change"),
        }
    }
}

fn file_op(kind: &EventKind) -> Option<FileOp> {
    match kind {
        EventKind::Create(_) => Some(FileOp::Create),
        EventKind::Modify(ModifyKind::Name(_)) => Some(FileOp::Rename),
        EventKind::Modify(ModifyKind::Metadata(_)) => Some(FileOp::Chmod),
        EventKind::Modify(_) => Some(FileOp::Write),
        EventKind::Remove(_) => Some(FileOp::Remove),
        EventKind::Access(_) | EventKind::Any | EventKind::Other => None,
    }
}

fn is_ignored(path: &Path) -> bool {
    let in_ignored_dir = path
        .components()
        .any(|c| IGNORED_DIRS.iter().any(|dir| c.as_os_str() == *dir));
    let ignored_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| IGNORED_SUFFIXES.iter().any(|s| n.ends_with(s)));
    in_ignored_dir || ignored_name
}
