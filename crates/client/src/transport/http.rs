//! HTTP transport for daemon requests.

use crate::config::{ClientConfig, HEADER_WORKSPACE_ID, HEADER_WORKSPACE_NAME, HEADER_WORKSPACE_PATH};
use crate::error::{ClientError, ClientResult};
use reqwest::{header, Client, RequestBuilder, Response};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    config: Arc<ClientConfig>,
}

impl HttpTransport {
    pub fn new(config: Arc<ClientConfig>) -> ClientResult<Self> {
        let mut headers = header::HeaderMap::new();

        if let Some(ref ws) = config.workspace {
            for (name, value) in [
                (HEADER_WORKSPACE_ID, ws.id.as_str()),
                (HEADER_WORKSPACE_PATH, ws.path.as_str()),
                (HEADER_WORKSPACE_NAME, ws.name.as_str()),
            ] {
                headers.insert(
                    header::HeaderName::from_static(name),
                    header::HeaderValue::from_str(value).map_err(|_| {
                        ClientError::Config(format!("Invalid value for header {}", name))
                    })?,
                );
            }
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .build()?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn build_url(&self, path: &str) -> ClientResult<url::Url> {
        Ok(self.config.base_url.join(path)?)
    }

    /// Execute a request, retrying on the configured statuses and on timeouts.
    async fn execute_with_retry(&self, request_builder: RequestBuilder) -> ClientResult<Response> {
        let retry_config = &self.config.retry_config;
        let mut attempts = 0;

        loop {
            let request = request_builder
                .try_clone()
                .ok_or_else(|| ClientError::Config("Request cannot be cloned".to_string()))?;

            match request.send().await {
                Ok(response) => {
                    let status = response.status().as_u16();

                    if response.status().is_success() {
                        return Ok(response);
                    }

                    if attempts < retry_config.max_retries
                        && retry_config.should_retry_status(status)
                    {
                        let backoff = retry_config.backoff_for_attempt(attempts);
                        warn!(
                            status = status,
                            attempt = attempts + 1,
                            backoff_ms = backoff.as_millis(),
                            "Request failed, retrying"
                        );
                        tokio::time::sleep(backoff).await;
                        attempts += 1;
                        continue;
                    }

                    let body = response.text().await.unwrap_or_default();
                    return Err(ClientError::from_response(status, &body));
                }
                Err(e) => {
                    if attempts < retry_config.max_retries && e.is_timeout() {
                        let backoff = retry_config.backoff_for_attempt(attempts);
                        warn!(
                            attempt = attempts + 1,
                            backoff_ms = backoff.as_millis(),
                            "Request timed out, retrying"
                        );
                        tokio::time::sleep(backoff).await;
                        attempts += 1;
                        continue;
                    }
                    return Err(e.into());
                }
            }
        }
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        let url = self.build_url(path)?;
        debug!(url = %url, "GET request");

        let response = self.execute_with_retry(self.client.get(url)).await?;
        Ok(response.json().await?)
    }

    pub async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> ClientResult<T> {
        let url = self.build_url(path)?;
        debug!(url = %url, "POST request");

        let response = self
            .execute_with_retry(self.client.post(url).json(body))
            .await?;
        Ok(response.json().await?)
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        let url = self.build_url(path)?;
        debug!(url = %url, "DELETE request");

        let response = self.execute_with_retry(self.client.delete(url)).await?;
        Ok(response.json().await?)
    }

    /// Single POST that hands back status and JSON body whatever the status is.
    ///
    /// Used for tool calls, which are not idempotent and must not be retried.
    pub async fn post_raw(&self, path: &str, body: &Value) -> ClientResult<(u16, Value)> {
        let url = self.build_url(path)?;
        debug!(url = %url, "POST request (raw)");

        let response = self.client.post(url).json(body).send().await?;
        let status = response.status().as_u16();
        let text = response.text().await?;
        let value = if text.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text).unwrap_or(Value::String(text))
        };
        Ok((status, value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{RetryConfig, WorkspaceHeaders};
    use serde::Deserialize;
    use std::time::Duration;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[derive(Debug, Deserialize, PartialEq)]
    struct Reply {
        message: String,
    }

    fn create_config(base_url: &str, workspace: Option<WorkspaceHeaders>) -> Arc<ClientConfig> {
        Arc::new(ClientConfig {
            base_url: url::Url::parse(base_url).unwrap(),
            timeout: Duration::from_secs(5),
            retry_config: RetryConfig::no_retry(),
            workspace,
        })
    }

    #[tokio::test]
    async fn test_get_request() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/workspaces"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"message": "ok"})))
            .mount(&server)
            .await;

        let transport = HttpTransport::new(create_config(&server.uri(), None)).unwrap();
        let reply: Reply = transport.get("/api/v1/workspaces").await.unwrap();
        assert_eq!(reply.message, "ok");
    }

    #[tokio::test]
    async fn test_workspace_headers_are_sent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/tasks"))
            .and(header("x-workspace-id", "0123456789abcdef"))
            .and(header("x-workspace-path", "/tmp/ws"))
            .and(header("x-workspace-name", "ws"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"message": "scoped"})))
            .mount(&server)
            .await;

        let ws = WorkspaceHeaders {
            id: "0123456789abcdef".to_string(),
            path: "/tmp/ws".to_string(),
            name: "ws".to_string(),
        };
        let transport = HttpTransport::new(create_config(&server.uri(), Some(ws))).unwrap();
        let reply: Reply = transport.get("/api/v1/tasks").await.unwrap();
        assert_eq!(reply.message, "scoped");
    }

    #[tokio::test]
    async fn test_error_status_becomes_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/api/v1/workspaces/nope"))
            .respond_with(
                ResponseTemplate::new(404)
                    .set_body_json(serde_json::json!({"success": false, "error": "workspace not found: nope"})),
            )
            .mount(&server)
            .await;

        let transport = HttpTransport::new(create_config(&server.uri(), None)).unwrap();
        let result: ClientResult<Reply> = transport.delete("/api/v1/workspaces/nope").await;
        match result {
            Err(ClientError::Api { status, message, .. }) => {
                assert_eq!(status, 404);
                assert!(message.contains("nope"));
            }
            other => panic!("Expected Api error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_retries_on_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/flaky"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/flaky"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"message": "recovered"})))
            .mount(&server)
            .await;

        let config = Arc::new(ClientConfig {
            retry_config: RetryConfig {
                initial_backoff: Duration::from_millis(1),
                ..Default::default()
            },
            ..ClientConfig::new(url::Url::parse(&server.uri()).unwrap())
        });
        let transport = HttpTransport::new(config).unwrap();
        let reply: Reply = transport.get("/flaky").await.unwrap();
        assert_eq!(reply.message, "recovered");
    }

    #[tokio::test]
    async fn test_post_raw_keeps_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/mcp/initialize"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({"error": "Missing workspace context"})))
            .mount(&server)
            .await;

        let transport = HttpTransport::new(create_config(&server.uri(), None)).unwrap();
        let (status, body) = transport
            .post_raw("/api/v1/mcp/initialize", &serde_json::json!({}))
            .await
            .unwrap();
        assert_eq!(status, 400);
        assert_eq!(body["error"], "Missing workspace context");
    }

    #[tokio::test]
    async fn test_build_url_with_trailing_slash() {
        let transport = HttpTransport::new(create_config("http://localhost:5082/", None)).unwrap();
        let url = transport.build_url("api/health").unwrap();
        assert_eq!(url.as_str(), "http://localhost:5082/api/health");
    }
}
