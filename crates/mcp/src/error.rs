use gorev_core::ServiceError;

/// Why a single tool invocation failed. Rendered to the caller as an `is_error` result.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("unknown tool: {0}")]
    Unknown(String),

    #[error("{0}")]
    InvalidArgument(String),

    #[error("Missing workspace context")]
    MissingWorkspace,

    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error("{0:#}")]
    Failed(#[from] anyhow::Error),
}

impl ToolError {
    pub fn missing(key: &str) -> Self {
        Self::InvalidArgument(format!("missing required argument '{}'", key))
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }
}

pub type ToolResult<T> = Result<T, ToolError>;

/// Failures that cannot be expressed as a tool result and surface at the transport.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// The request needs a workspace and none was attached.
    #[error("Missing workspace context")]
    MissingWorkspace,

    /// The frame itself is malformed, e.g. `tools/call` without a name.
    #[error("invalid params: {0}")]
    InvalidParams(String),

    /// Daemon-side failure such as an unreachable database.
    #[error("internal error: {0}")]
    Internal(String),
}

impl DispatchError {
    /// HTTP status the daemon answers with.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::MissingWorkspace | Self::InvalidParams(_) => 400,
            Self::Internal(_) => 500,
        }
    }
}
