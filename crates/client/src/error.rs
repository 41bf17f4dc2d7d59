//! Error types for the gorev client.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Failures talking to, locating or starting the daemon.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Daemon answered with a non-success status.
    #[error("API error (status {status}): {message}")]
    Api {
        status: u16,
        message: String,
        details: Option<String>,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("WebSocket error: {0}")]
    WebSocket(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Filesystem failure around the lock file.
    #[error("I/O error on {path}: {source}")]
    Fs {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("lock file not found: {0}")]
    LockNotFound(PathBuf),

    #[error("lock file already exists: {0}")]
    LockExists(PathBuf),

    #[error("daemon already running (pid {pid}) at {url}")]
    DaemonAlreadyRunning { pid: u32, url: String },

    #[error("daemon is not running")]
    DaemonNotRunning,

    #[error("daemon at {url} did not become healthy within {waited:?}")]
    HealthTimeout { url: String, waited: Duration },

    #[error("stale lock file for pid {pid}")]
    LockFileStale { pid: u32 },
}

impl ClientError {
    pub(crate) fn fs(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Fs {
            path: path.into(),
            source,
        }
    }

    /// Check if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http(e) => e.is_timeout() || e.is_connect(),
            Self::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Create an API error from a status code and response body.
    pub fn from_response(status: u16, body: &str) -> Self {
        match serde_json::from_str::<ErrorResponse>(body) {
            Ok(error_response) => Self::Api {
                status,
                message: error_response.error,
                details: error_response.details,
            },
            Err(_) => Self::Api {
                status,
                message: body.to_string(),
                details: None,
            },
        }
    }
}

/// Error body rendered by the daemon.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_response_parses_error_body() {
        let err = ClientError::from_response(
            400,
            r#"{"success":false,"error":"Missing workspace context","details":"send X-Workspace-Id"}"#,
        );
        match err {
            ClientError::Api {
                status,
                message,
                details,
            } => {
                assert_eq!(status, 400);
                assert_eq!(message, "Missing workspace context");
                assert_eq!(details.as_deref(), Some("send X-Workspace-Id"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_from_response_falls_back_to_raw_body() {
        let err = ClientError::from_response(502, "bad gateway");
        assert!(err.is_retryable());
        assert!(err.to_string().contains("bad gateway"));
    }
}
