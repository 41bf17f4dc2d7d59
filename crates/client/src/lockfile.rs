//! The lock file that advertises a running daemon.
//!
//! One file per host at `~/.gorev-daemon/.gorev.lock`. Whoever creates it owns it; everyone
//! else reads it and decides, via [`crate::health`], whether the owner is still around.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use crate::error::{ClientError, ClientResult};

pub const LOCK_DIR: &str = ".gorev-daemon";
pub const LOCK_FILE: &str = ".gorev.lock";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LockFile {
    pub pid: u32,
    pub port: u16,
    pub version: String,
    pub start_time: DateTime<Utc>,
    pub daemon_url: String,
}

impl LockFile {
    pub fn new(pid: u32, port: u16, version: impl Into<String>) -> Self {
        Self {
            pid,
            port,
            version: version.into(),
            start_time: Utc::now(),
            daemon_url: format!("http://localhost:{}", port),
        }
    }

    pub fn uptime(&self) -> chrono::Duration {
        Utc::now().signed_duration_since(self.start_time)
    }
}

#[derive(Debug, Clone)]
pub struct LockFileManager {
    path: PathBuf,
}

impl LockFileManager {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<dir>/.gorev.lock`
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self::new(dir.as_ref().join(LOCK_FILE))
    }

    /// The per-user location, `~/.gorev-daemon/.gorev.lock`.
    pub fn default_location() -> ClientResult<Self> {
        let home = dirs::home_dir()
            .ok_or_else(|| ClientError::Config("cannot determine home directory".to_string()))?;
        Ok(Self::in_dir(home.join(LOCK_DIR)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Write a fresh lock file. Fails with [`ClientError::LockExists`] if one is present;
    /// deciding whether that one is stale is the caller's job.
    pub fn create(&self, pid: u32, port: u16, version: &str) -> ClientResult<LockFile> {
        if let Some(dir) = self.path.parent() {
            create_private_dir(dir)?;
        }

        let lock = LockFile::new(pid, port, version);
        let body = serde_json::to_vec_pretty(&lock)?;

        let mut options = OpenOptions::new();
        options.write(true).create_new(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }

        let mut file = match options.open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(ClientError::LockExists(self.path.clone()))
            }
            Err(e) => return Err(ClientError::fs(&self.path, e)),
        };
        file.write_all(&body)
            .and_then(|_| file.sync_all())
            .map_err(|e| ClientError::fs(&self.path, e))?;

        tracing::debug!(path = %self.path.display(), pid, port, "Created lock file");
        Ok(lock)
    }

    pub fn read(&self) -> ClientResult<LockFile> {
        let raw = match std::fs::read(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(ClientError::LockNotFound(self.path.clone()))
            }
            Err(e) => return Err(ClientError::fs(&self.path, e)),
        };
        Ok(serde_json::from_slice(&raw)?)
    }

    /// Idempotent: a missing file is not an error.
    pub fn remove(&self) -> ClientResult<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                tracing::debug!(path = %self.path.display(), "Removed lock file");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ClientError::fs(&self.path, e)),
        }
    }
}

fn create_private_dir(dir: &Path) -> ClientResult<()> {
    let mut builder = std::fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o700);
    }
    builder.create(dir).map_err(|e| ClientError::fs(dir, e))
}
