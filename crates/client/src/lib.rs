//! # gorev client
//!
//! Everything a process needs to find, start-check and talk to the gorev daemon.
//!
//! ```rust,no_run
//! use gorev_client::{DaemonClient, ClientResult};
//!
//! # async fn example() -> ClientResult<()> {
//! let client = DaemonClient::builder()
//!     .base_url("http://localhost:5082")
//!     .build()?;
//!
//! let health = client.health().check().await?;
//! println!("daemon {} is {}", health.version, health.status);
//!
//! let registered = client.workspaces().register("/home/me/project", None).await?;
//! let scoped = client.for_workspace(registered.headers())?;
//! let (status, body) = scoped.mcp().call("tools/list", &serde_json::json!({})).await?;
//! println!("{} {}", status, body);
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod health;
pub mod lockfile;
pub mod transport;

pub use client::{DaemonClient, DaemonClientBuilder};
pub use config::{
    ClientConfig, RetryConfig, WorkspaceHeaders, DEFAULT_PORT, HEADER_WORKSPACE_ID,
    HEADER_WORKSPACE_NAME, HEADER_WORKSPACE_PATH,
};
pub use error::{ClientError, ClientResult};
pub use health::{find_running_daemon, is_alive, HealthProber};
pub use lockfile::{LockFile, LockFileManager};
pub use transport::EventSubscriber;

pub use gorev_core::events::{Event, EventKind};
pub use gorev_core::workspace::WorkspaceInfo;
