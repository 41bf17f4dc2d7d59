use std::path::PathBuf;

/// Failures of the workspace registry
#[derive(Debug, thiserror::Error)]
pub enum WorkspaceError {
    #[error("invalid workspace path {path}: {reason}")]
    InvalidPath { path: PathBuf, reason: String },

    #[error("workspace path does not exist: {0}")]
    PathNotFound(PathBuf),

    #[error("migrations directory not found: {0}")]
    MigrationsNotFound(PathBuf),

    #[error("failed to open workspace database {path}: {message}")]
    DbOpenFailed { path: PathBuf, message: String },

    #[error("failed to close workspace database for {id}: {message}")]
    DbCloseFailed { id: String, message: String },

    #[error("workspace not found: {0}")]
    NotFound(String),
}

pub type WorkspaceResult<T> = Result<T, WorkspaceError>;

/// Business-level failures raised by the task service
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    InvalidInput(String),

    #[error("{0}")]
    Conflict(String),

    #[error("storage failure: {0:#}")]
    Storage(anyhow::Error),
}

impl ServiceError {
    pub fn not_found(kind: &str, id: &str) -> Self {
        Self::NotFound(format!("{} not found: {}", kind, id))
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    /// Storage failures are daemon-internal; the rest are caused by the caller.
    pub fn is_internal(&self) -> bool {
        matches!(self, Self::Storage(_))
    }
}

impl From<anyhow::Error> for ServiceError {
    fn from(err: anyhow::Error) -> Self {
        Self::Storage(err)
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;
