//! Typed client for the daemon's HTTP API.

use crate::api::{HealthApi, McpApi, WorkspacesApi};
use crate::config::{ClientConfig, RetryConfig, WorkspaceHeaders, DEFAULT_PORT};
use crate::error::{ClientError, ClientResult};
use crate::transport::{EventSubscriber, HttpTransport};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

#[derive(Debug, Clone)]
pub struct DaemonClient {
    config: Arc<ClientConfig>,
    pub(crate) http: HttpTransport,
}

impl DaemonClient {
    pub fn builder() -> DaemonClientBuilder {
        DaemonClientBuilder::new()
    }

    fn from_config(config: ClientConfig) -> ClientResult<Self> {
        let config = Arc::new(config);
        let http = HttpTransport::new(config.clone())?;
        Ok(Self { config, http })
    }

    pub fn base_url(&self) -> &Url {
        &self.config.base_url
    }

    pub fn workspace(&self) -> Option<&WorkspaceHeaders> {
        self.config.workspace.as_ref()
    }

    /// A copy of this client that sends `headers` on every request.
    pub fn for_workspace(&self, headers: WorkspaceHeaders) -> ClientResult<Self> {
        let mut config = (*self.config).clone();
        config.workspace = Some(headers);
        Self::from_config(config)
    }

    pub fn health(&self) -> HealthApi<'_> {
        HealthApi::new(self)
    }

    pub fn workspaces(&self) -> WorkspacesApi<'_> {
        WorkspacesApi::new(self)
    }

    pub fn mcp(&self) -> McpApi<'_> {
        McpApi::new(self)
    }

    /// Subscribe to the events of the workspace this client is bound to.
    pub async fn subscribe(&self) -> ClientResult<EventSubscriber> {
        let ws = self
            .workspace()
            .ok_or_else(|| ClientError::Config("client is not bound to a workspace".to_string()))?;
        EventSubscriber::connect(&self.config.base_url, &ws.id).await
    }
}

pub struct DaemonClientBuilder {
    base_url: Option<String>,
    timeout: Duration,
    retry_config: RetryConfig,
    workspace: Option<WorkspaceHeaders>,
}

impl DaemonClientBuilder {
    pub fn new() -> Self {
        Self {
            base_url: None,
            timeout: Duration::from_secs(30),
            retry_config: RetryConfig::default(),
            workspace: None,
        }
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn retry_config(mut self, config: RetryConfig) -> Self {
        self.retry_config = config;
        self
    }

    pub fn workspace(mut self, headers: WorkspaceHeaders) -> Self {
        self.workspace = Some(headers);
        self
    }

    /// Defaults to `http://localhost:5082` when no base URL was set.
    pub fn build(self) -> ClientResult<DaemonClient> {
        let base_url = match self.base_url {
            Some(url) => Url::parse(&url)?,
            None => Url::parse(&format!("http://localhost:{}", DEFAULT_PORT))?,
        };

        DaemonClient::from_config(ClientConfig {
            base_url,
            timeout: self.timeout,
            retry_config: self.retry_config,
            workspace: self.workspace,
        })
    }
}

impl Default for DaemonClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
