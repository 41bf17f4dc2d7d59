//! Daemon lifecycle: foreground run, detached start, stop and status.

use anyhow::{bail, Context, Result};
use gorev_client::{
    find_running_daemon, is_alive, ClientError, HealthProber, LockFile, LockFileManager,
};
use gorev_core::{LanguageSetting, WorkspaceRegistry};
use gorev_mcp::{Dispatcher, ToolRegistry};
use serde::Serialize;
use std::path::Path;
use std::process::{Command, Stdio};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::api;
use crate::config::{AppState, DaemonConfig};
use crate::websocket::Hub;

const DETACHED_STARTUP_TIMEOUT: Duration = Duration::from_secs(15);
const STOP_TIMEOUT: Duration = Duration::from_secs(30);
const STOP_POLL: Duration = Duration::from_millis(250);

/// Run the daemon in this process until SIGINT or SIGTERM.
pub async fn run_foreground(config: DaemonConfig) -> Result<()> {
    config.validate()?;
    let locks = LockFileManager::default_location()?;
    let prober = HealthProber::new()?;

    if let Some(lock) = find_running_daemon(&locks, &prober).await? {
        return Err(ClientError::DaemonAlreadyRunning {
            pid: lock.pid,
            url: lock.daemon_url,
        }
        .into());
    }

    let addr = config.bind_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    let port = listener.local_addr()?.port();

    let lock = locks
        .create(std::process::id(), port, env!("CARGO_PKG_VERSION"))
        .context("Failed to create lock file")?;
    tracing::info!(pid = lock.pid, url = %lock.daemon_url, lock = %locks.path().display(), "Daemon starting");

    let outcome = serve(listener, &config).await;

    if let Err(e) = locks.remove() {
        tracing::warn!(error = %e, "Failed to remove lock file");
    }
    tracing::info!("Daemon stopped");
    outcome
}

async fn serve(listener: TcpListener, config: &DaemonConfig) -> Result<()> {
    let lang = Arc::new(LanguageSetting::default());
    let (hub, hub_task) = Hub::spawn(config.websocket.event_buffer, config.websocket.subscriber_buffer);
    let mut registry =
        WorkspaceRegistry::new(config.storage_mode()?, lang.clone()).with_emitter(Arc::new(hub.clone()));
    if let Some(watcher) = config.file_watcher() {
        registry = registry.with_file_watcher(watcher);
    }
    let registry = Arc::new(registry);
    let dispatcher = Arc::new(Dispatcher::new(
        ToolRegistry::with_defaults(dirs::home_dir()),
        lang,
        env!("CARGO_PKG_VERSION"),
    ));
    let state = Arc::new(AppState::new(registry.clone(), dispatcher, hub.clone()));

    let shutdown = CancellationToken::new();
    let cleanup = tokio::spawn(cleanup_loop(
        registry.clone(),
        config.cleanup_interval(),
        config.max_idle(),
        shutdown.clone(),
    ));

    let app = api::create_router(state);
    tracing::info!(addr = %listener.local_addr()?, mode = ?registry.mode(), "API server listening");
    let server_shutdown = shutdown.clone();
    let mut server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(server_shutdown.cancelled_owned())
            .await
    });

    let mut result = Ok(());
    tokio::select! {
        _ = shutdown_signal() => {
            tracing::info!("Shutdown signal received");
        }
        joined = &mut server => {
            result = flatten(joined);
        }
    }

    shutdown.cancel();
    if !server.is_finished() {
        match tokio::time::timeout(config.shutdown_timeout(), &mut server).await {
            Ok(joined) => result = flatten(joined),
            Err(_) => {
                tracing::warn!(
                    timeout_secs = config.shutdown_timeout_secs,
                    "In-flight requests did not finish in time, aborting"
                );
                server.abort();
            }
        }
    }

    let _ = cleanup.await;

    hub.shutdown().await;
    if let Err(e) = hub_task.await {
        tracing::warn!(error = %e, "Event hub task failed");
    }

    for error in registry.close_all() {
        tracing::error!(error = %error, "Failed to close workspace");
    }
    result
}

fn flatten(joined: Result<std::io::Result<()>, tokio::task::JoinError>) -> Result<()> {
    match joined {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(anyhow::Error::new(e).context("API server failed")),
        Err(e) => Err(anyhow::Error::new(e).context("API server task panicked")),
    }
}

async fn cleanup_loop(
    registry: Arc<WorkspaceRegistry>,
    every: Duration,
    max_idle: Duration,
    shutdown: CancellationToken,
) {
    let mut ticker = tokio::time::interval(every);
    // the first tick completes immediately
    ticker.tick().await;
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = ticker.tick() => {
                let evicted = registry.cleanup(max_idle);
                if !evicted.is_empty() {
                    tracing::info!(count = evicted.len(), "Evicted idle workspaces");
                }
            }
        }
    }
    tracing::debug!("Cleanup loop stopped");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Start a daemon in the background and return once it answers health probes.
pub async fn start_detached(exe: &Path, forwarded: &[String], port: u16) -> Result<LockFile> {
    let locks = LockFileManager::default_location()?;
    let prober = HealthProber::new()?;
    if let Some(lock) = find_running_daemon(&locks, &prober).await? {
        return Err(ClientError::DaemonAlreadyRunning {
            pid: lock.pid,
            url: lock.daemon_url,
        }
        .into());
    }

    let mut command = Command::new(exe);
    command
        .arg("daemon")
        .args(forwarded)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null());
    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        command.process_group(0);
    }
    let child = command
        .spawn()
        .with_context(|| format!("Failed to spawn {}", exe.display()))?;
    tracing::info!(pid = child.id(), port, "Spawned detached daemon");

    let url = format!("http://localhost:{}", port);
    prober.wait_until_healthy(&url, DETACHED_STARTUP_TIMEOUT).await?;
    locks.read().context("Daemon is healthy but wrote no lock file")
}

/// SIGTERM the running daemon, escalating to SIGKILL after a grace period.
pub async fn stop() -> Result<u32> {
    let locks = LockFileManager::default_location()?;
    let lock = match locks.read() {
        Ok(lock) => lock,
        Err(ClientError::LockNotFound(_)) => return Err(ClientError::DaemonNotRunning.into()),
        Err(e) => return Err(e.into()),
    };
    if !is_alive(lock.pid) {
        tracing::warn!(pid = lock.pid, "Daemon already gone, removing stale lock");
        locks.remove()?;
        return Err(ClientError::DaemonNotRunning.into());
    }

    signal(lock.pid, Signal::Term)?;
    let deadline = tokio::time::Instant::now() + STOP_TIMEOUT;
    while is_alive(lock.pid) {
        if tokio::time::Instant::now() >= deadline {
            tracing::warn!(pid = lock.pid, "Daemon ignored SIGTERM, killing");
            signal(lock.pid, Signal::Kill)?;
            break;
        }
        tokio::time::sleep(STOP_POLL).await;
    }

    locks.remove()?;
    Ok(lock.pid)
}

#[derive(Debug, Serialize)]
pub struct DaemonStatus {
    pub running: bool,
    pub healthy: bool,
    pub pid: u32,
    pub port: u16,
    pub url: String,
    pub version: String,
    pub start_time: chrono::DateTime<chrono::Utc>,
    pub uptime_seconds: i64,
    pub lock_path: String,
}

pub async fn status() -> Result<DaemonStatus> {
    let locks = LockFileManager::default_location()?;
    let lock = match locks.read() {
        Ok(lock) => lock,
        Err(ClientError::LockNotFound(_)) => return Err(ClientError::DaemonNotRunning.into()),
        Err(e) => return Err(e.into()),
    };
    let prober = HealthProber::new()?;
    let running = is_alive(lock.pid);
    let healthy = running && prober.is_healthy(&lock.daemon_url).await;
    if !running {
        bail!(
            "{} (lock file {} is stale)",
            ClientError::DaemonNotRunning,
            locks.path().display()
        );
    }

    Ok(DaemonStatus {
        running,
        healthy,
        pid: lock.pid,
        port: lock.port,
        url: lock.daemon_url.clone(),
        version: lock.version.clone(),
        start_time: lock.start_time,
        uptime_seconds: lock.uptime().num_seconds(),
        lock_path: locks.path().display().to_string(),
    })
}

enum Signal {
    Term,
    Kill,
}

#[cfg(unix)]
fn signal(pid: u32, signal: Signal) -> Result<()> {
    let signo = match signal {
        Signal::Term => libc::SIGTERM,
        Signal::Kill => libc::SIGKILL,
    };
    let pid = libc::pid_t::try_from(pid).context("pid out of range")?;
    // SAFETY: kill(2) has no memory-safety preconditions
    let rc = unsafe { libc::kill(pid, signo) };
    if rc != 0 {
        return Err(std::io::Error::last_os_error()).context("Failed to signal daemon");
    }
    Ok(())
}

#[cfg(not(unix))]
fn signal(_pid: u32, _signal: Signal) -> Result<()> {
    bail!("stopping the daemon is only supported on unix")
}
