//! Configuration types for the gorev client.

use std::time::Duration;
use url::Url;

/// Port the daemon binds when none is given.
pub const DEFAULT_PORT: u16 = 5082;

pub const HEADER_WORKSPACE_ID: &str = "x-workspace-id";
pub const HEADER_WORKSPACE_PATH: &str = "x-workspace-path";
pub const HEADER_WORKSPACE_NAME: &str = "x-workspace-name";

/// Identity of the workspace a client speaks for, sent on every request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceHeaders {
    pub id: String,
    pub path: String,
    pub name: String,
}

/// Configuration for the daemon client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the daemon, e.g. `http://localhost:5082`.
    pub base_url: Url,
    /// Request timeout.
    pub timeout: Duration,
    /// Retry configuration.
    pub retry_config: RetryConfig,
    /// Workspace headers attached to every request.
    pub workspace: Option<WorkspaceHeaders>,
}

impl ClientConfig {
    /// Create a new configuration with the given base URL.
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            timeout: Duration::from_secs(30),
            retry_config: RetryConfig::default(),
            workspace: None,
        }
    }
}

/// Configuration for retry behavior.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    pub backoff_multiplier: f64,
    /// HTTP status codes to retry on.
    pub retry_on_status_codes: Vec<u16>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_secs(2),
            backoff_multiplier: 2.0,
            retry_on_status_codes: vec![502, 503, 504],
        }
    }
}

impl RetryConfig {
    /// Create a configuration with no retries.
    pub fn no_retry() -> Self {
        Self {
            max_retries: 0,
            ..Default::default()
        }
    }

    /// Calculate backoff duration for a given attempt.
    pub fn backoff_for_attempt(&self, attempt: u32) -> Duration {
        let backoff_ms = self.initial_backoff.as_millis() as f64
            * self.backoff_multiplier.powi(attempt as i32);
        let backoff = Duration::from_millis(backoff_ms as u64);
        std::cmp::min(backoff, self.max_backoff)
    }

    pub fn should_retry_status(&self, status: u16) -> bool {
        self.retry_on_status_codes.contains(&status)
    }
}
