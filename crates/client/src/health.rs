//! Liveness and health probes for the daemon.

use std::time::Duration;
use tokio::time::Instant;

use crate::error::{ClientError, ClientResult};
use crate::lockfile::{LockFile, LockFileManager};

pub const HEALTH_PATH: &str = "/api/health";
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(2);
pub const POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Whether a process with `pid` exists. Signal 0 performs the permission and existence
/// checks without delivering anything; `EPERM` still means the process is there.
#[cfg(unix)]
pub fn is_alive(pid: u32) -> bool {
    let Ok(pid) = libc::pid_t::try_from(pid) else {
        return false;
    };
    if pid <= 0 {
        return false;
    }
    // SAFETY: kill(2) with signal 0 only checks existence and has no memory-safety preconditions
    if unsafe { libc::kill(pid, 0) } == 0 {
        return true;
    }
    std::io::Error::last_os_error().raw_os_error() == Some(libc::EPERM)
}

/// Without a process check every pid counts as alive; stale locks are then
/// detected by the failing health check alone.
#[cfg(not(unix))]
pub fn is_alive(_pid: u32) -> bool {
    true
}

/// HTTP prober with a short per-request deadline.
#[derive(Debug, Clone)]
pub struct HealthProber {
    client: reqwest::Client,
}

impl HealthProber {
    pub fn new() -> ClientResult<Self> {
        Self::with_timeout(PROBE_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> ClientResult<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    /// `GET {url}/api/health` answered with a 2xx. Connection errors are just `false`.
    pub async fn is_healthy(&self, url: &str) -> bool {
        let target = format!("{}{}", url.trim_end_matches('/'), HEALTH_PATH);
        match self.client.get(&target).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                tracing::trace!(url = %target, error = %e, "Health probe failed");
                false
            }
        }
    }

    /// Poll until healthy or until `total` has elapsed.
    pub async fn wait_until_healthy(&self, url: &str, total: Duration) -> ClientResult<()> {
        let deadline = Instant::now() + total;
        loop {
            if self.is_healthy(url).await {
                return Ok(());
            }
            if Instant::now() + POLL_INTERVAL > deadline {
                return Err(ClientError::HealthTimeout {
                    url: url.to_string(),
                    waited: total,
                });
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }
}

/// Read the lock file and return it only if its daemon is alive and healthy.
///
/// A lock whose owner is gone or unresponsive is removed.
pub async fn find_running_daemon(
    locks: &LockFileManager,
    prober: &HealthProber,
) -> ClientResult<Option<LockFile>> {
    let lock = match locks.read() {
        Ok(lock) => lock,
        Err(ClientError::LockNotFound(_)) => return Ok(None),
        Err(ClientError::Json(e)) => {
            tracing::warn!(path = %locks.path().display(), error = %e, "Unreadable lock file, removing");
            locks.remove()?;
            return Ok(None);
        }
        Err(e) => return Err(e),
    };

    if is_alive(lock.pid) && prober.is_healthy(&lock.daemon_url).await {
        return Ok(Some(lock));
    }

    tracing::warn!(
        pid = lock.pid,
        url = %lock.daemon_url,
        "{}",
        ClientError::LockFileStale { pid: lock.pid }
    );
    locks.remove()?;
    Ok(None)
}
