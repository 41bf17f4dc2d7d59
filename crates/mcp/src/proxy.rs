//! Stdio to HTTP bridge.
//!
//! An MCP client launches `gorev mcp-proxy`; the proxy makes sure a daemon is running,
//! registers the workspace it was started in and then forwards newline-delimited
//! JSON-RPC frames from stdin to the daemon, writing one response line per request
//! to stdout. Nothing but protocol bytes ever goes to stdout.

use crate::protocol::{JsonRpcError, JsonRpcRequest, JsonRpcResponse};
use anyhow::{Context, Result};
use futures_util::StreamExt;
use gorev_client::{
    find_running_daemon, DaemonClient, HealthProber, LockFileManager, DEFAULT_PORT,
};
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio_util::codec::{AnyDelimiterCodec, FramedRead};

/// Directory that marks a workspace root
pub const WORKSPACE_MARKER: &str = ".gorev";

#[derive(Debug, Clone)]
pub struct ProxyOptions {
    pub port: u16,
    /// Executable started as `<exe> daemon --detach --port <port>` when no daemon is running
    pub daemon_exe: PathBuf,
    pub startup_timeout: Duration,
}

impl ProxyOptions {
    pub fn new(daemon_exe: impl Into<PathBuf>) -> Self {
        Self {
            port: DEFAULT_PORT,
            daemon_exe: daemon_exe.into(),
            startup_timeout: Duration::from_secs(15),
        }
    }
}

/// Nearest ancestor of `start` (inclusive) holding a `.gorev` directory, else `home`.
pub fn find_workspace_root(start: &Path, home: Option<&Path>) -> PathBuf {
    start
        .ancestors()
        .find(|dir| dir.join(WORKSPACE_MARKER).is_dir())
        .map(Path::to_path_buf)
        .or_else(|| home.map(Path::to_path_buf))
        .unwrap_or_else(|| start.to_path_buf())
}

/// Base URL of a healthy daemon, starting one if needed.
pub async fn ensure_daemon(locks: &LockFileManager, options: &ProxyOptions) -> Result<String> {
    let prober = HealthProber::new()?;
    if let Some(lock) = find_running_daemon(locks, &prober).await? {
        tracing::debug!(pid = lock.pid, url = %lock.daemon_url, "Reusing running daemon");
        return Ok(lock.daemon_url);
    }

    tracing::info!(exe = %options.daemon_exe.display(), port = options.port, "Starting daemon");
    let mut child = Command::new(&options.daemon_exe)
        .args(["daemon", "--detach", "--port", &options.port.to_string()])
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .with_context(|| format!("Failed to spawn {}", options.daemon_exe.display()))?;

    let url = format!("http://localhost:{}", options.port);
    prober
        .wait_until_healthy(&url, options.startup_timeout)
        .await
        .context("Daemon did not become healthy")?;
    // the launcher exits once the detached daemon answers; reap it if it already has
    let _ = child.try_wait();
    Ok(url)
}

/// Forwards frames for one registered workspace.
pub struct Proxy {
    client: DaemonClient,
}

impl Proxy {
    /// `client` must already carry the workspace headers.
    pub fn new(client: DaemonClient) -> Self {
        Self { client }
    }

    /// Response line for one input frame; `None` for notifications.
    pub async fn handle_frame(&self, line: &str) -> Option<JsonRpcResponse> {
        let request: JsonRpcRequest = match serde_json::from_str(line) {
            Ok(request) => request,
            Err(e) => {
                tracing::warn!(error = %e, "Unparseable frame");
                return Some(JsonRpcResponse::error(
                    Value::Null,
                    JsonRpcError::parse_error(e.to_string()),
                ));
            }
        };

        let params = request.params.clone().unwrap_or_else(|| json!({}));
        tracing::debug!(method = %request.method, id = ?request.id, "Forwarding frame");
        let outcome = self.client.mcp().call(&request.method, &params).await;

        let id = request.id?;
        Some(match outcome {
            Ok((status, body)) if (200..300).contains(&status) => JsonRpcResponse::success(id, body),
            Ok((status, body)) => {
                let message = body
                    .get("error")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("daemon returned HTTP {}", status));
                tracing::warn!(method = %request.method, status, %message, "Daemon rejected frame");
                JsonRpcResponse::error(id, JsonRpcError::server_error(message).with_data(body))
            }
            Err(e) => {
                tracing::warn!(method = %request.method, error = %e, "Daemon call failed");
                JsonRpcResponse::error(id, JsonRpcError::server_error(e.to_string()))
            }
        })
    }

    /// Pump frames until `input` reaches EOF.
    pub async fn pump<R, W>(&self, input: R, mut output: W) -> Result<()>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        // raw chunks so that one bad frame cannot end the session
        let mut frames = FramedRead::new(input, AnyDelimiterCodec::new(b"\n".to_vec(), b"\n".to_vec()));
        while let Some(frame) = frames.next().await {
            let frame = frame.context("Failed to read stdin")?;
            let response = match std::str::from_utf8(&frame) {
                Ok(line) if line.trim().is_empty() => continue,
                Ok(line) => match self.handle_frame(line.trim_end_matches('\r')).await {
                    Some(response) => response,
                    None => continue,
                },
                Err(e) => {
                    tracing::warn!(error = %e, len = frame.len(), "Frame is not valid UTF-8");
                    JsonRpcResponse::error(Value::Null, JsonRpcError::parse_error(e.to_string()))
                }
            };
            let mut bytes = serde_json::to_vec(&response)?;
            bytes.push(b'\n');
            output.write_all(&bytes).await?;
            output.flush().await?;
        }
        tracing::debug!("stdin closed, proxy exiting");
        Ok(())
    }
}

/// Full proxy lifecycle on the process's stdio.
pub async fn run(options: ProxyOptions) -> Result<()> {
    let locks = LockFileManager::default_location()?;
    let url = ensure_daemon(&locks, &options).await?;

    let cwd = std::env::current_dir().context("Failed to read current directory")?;
    let root = find_workspace_root(&cwd, dirs::home_dir().as_deref());
    let client = DaemonClient::builder().base_url(url.as_str()).build()?;
    let registered = client
        .workspaces()
        .register(root.display().to_string(), None)
        .await
        .with_context(|| format!("Failed to register workspace {}", root.display()))?;
    tracing::info!(
        workspace = %registered.workspace_id,
        path = %root.display(),
        "Workspace registered"
    );

    let proxy = Proxy::new(client.for_workspace(registered.headers())?);
    proxy.pump(tokio::io::stdin(), tokio::io::stdout()).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use gorev_client::WorkspaceHeaders;
    use tempfile::TempDir;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_find_workspace_root() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("project");
        let nested = root.join("src/deep");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::create_dir_all(root.join(WORKSPACE_MARKER)).unwrap();

        assert_eq!(find_workspace_root(&nested, None), root);

        let elsewhere = tmp.path().join("other");
        std::fs::create_dir_all(&elsewhere).unwrap();
        let home = tmp.path().join("home");
        assert_eq!(find_workspace_root(&elsewhere, Some(&home)), home);
    }

    async fn proxy_for(server: &MockServer) -> Proxy {
        let client = DaemonClient::builder()
            .base_url(server.uri())
            .build()
            .unwrap()
            .for_workspace(WorkspaceHeaders {
                id: "ws1".to_string(),
                path: "/tmp/ws1".to_string(),
                name: "ws1".to_string(),
            })
            .unwrap();
        Proxy::new(client)
    }

    #[tokio::test]
    async fn test_pump_forwards_and_wraps() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/mcp/tools/list"))
            .and(header("x-workspace-id", "ws1"))
            .and(body_json(json!({})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"tools": []})))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/v1/mcp/notifications/initialized"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .mount(&server)
            .await;

        let proxy = proxy_for(&server).await;
        let input = concat!(
            r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
            "\n\n",
            r#"{"jsonrpc":"2.0","id":7,"method":"tools/list"}"#,
            "\n",
            "not json\n",
        );
        let mut output = Vec::new();
        proxy.pump(input.as_bytes(), &mut output).await.unwrap();

        let lines: Vec<Value> = String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["id"], 7);
        assert_eq!(lines[0]["result"], json!({"tools": []}));
        assert_eq!(lines[1]["error"]["code"], JsonRpcError::PARSE_ERROR);
    }

    #[tokio::test]
    async fn test_daemon_error_becomes_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/mcp/gorev_listele"))
            .respond_with(
                ResponseTemplate::new(400).set_body_json(json!({"success": false, "error": "Missing workspace context"})),
            )
            .mount(&server)
            .await;

        let proxy = proxy_for(&server).await;
        let response = proxy
            .handle_frame(r#"{"jsonrpc":"2.0","id":"a","method":"gorev_listele","params":{}}"#)
            .await
            .unwrap();
        let error = response.error.unwrap();
        assert_eq!(error.code, JsonRpcError::SERVER_ERROR);
        assert_eq!(error.message, "Missing workspace context");
    }

    #[tokio::test]
    async fn test_unreachable_daemon_is_reported_per_frame() {
        let server = MockServer::start().await;
        let proxy = proxy_for(&server).await;
        drop(server);

        let response = proxy
            .handle_frame(r#"{"jsonrpc":"2.0","id":1,"method":"tools/list"}"#)
            .await
            .unwrap();
        assert_eq!(response.error.unwrap().code, JsonRpcError::SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_invalid_utf8_frame_does_not_stop_the_pump() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/mcp/tools/list"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"tools": []})))
            .mount(&server)
            .await;

        let proxy = proxy_for(&server).await;
        let mut input = br#"{"jsonrpc":"2.0","id":1,"method":"tools/list","x":""#.to_vec();
        input.push(0xff);
        input.extend_from_slice(b"\"}\n");
        input.extend_from_slice(b"{\"jsonrpc\":\"2.0\",\"id\":2,\"method\":\"tools/list\"}\r\n");

        let mut output = Vec::new();
        proxy.pump(input.as_slice(), &mut output).await.unwrap();

        let lines: Vec<Value> = String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["id"], Value::Null);
        assert_eq!(lines[0]["error"]["code"], JsonRpcError::PARSE_ERROR);
        assert_eq!(lines[1]["id"], 2);
        assert_eq!(lines[1]["result"], json!({"tools": []}));
    }

    #[tokio::test]
    async fn test_null_id_request_is_answered() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/mcp/tools/list"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"tools": []})))
            .mount(&server)
            .await;

        let proxy = proxy_for(&server).await;
        let response = proxy
            .handle_frame(r#"{"jsonrpc":"2.0","id":null,"method":"tools/list"}"#)
            .await
            .unwrap();
        assert_eq!(response.id, Value::Null);
        assert_eq!(response.result, Some(json!({"tools": []})));
    }
}
