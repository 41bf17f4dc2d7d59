use crate::client::DaemonClient;
use crate::error::ClientResult;
use serde_json::Value;

/// Raw access to the JSON-RPC tool endpoint.
pub struct McpApi<'a> {
    client: &'a DaemonClient,
}

impl<'a> McpApi<'a> {
    pub(crate) fn new(client: &'a DaemonClient) -> Self {
        Self { client }
    }

    /// POST `params` to `/api/v1/mcp/<method>`; returns status and body untouched.
    pub async fn call(&self, method: &str, params: &Value) -> ClientResult<(u16, Value)> {
        let path = format!("/api/v1/mcp/{}", method.trim_start_matches('/'));
        self.client.http.post_raw(&path, params).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WorkspaceHeaders;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_call_slash_method_with_headers() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/mcp/tools/list"))
            .and(header("x-workspace-id", "abc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"tools": []})))
            .mount(&server)
            .await;

        let client = DaemonClient::builder()
            .base_url(server.uri())
            .build()
            .unwrap()
            .for_workspace(WorkspaceHeaders {
                id: "abc".to_string(),
                path: "/tmp/ws".to_string(),
                name: "ws".to_string(),
            })
            .unwrap();

        let (status, body) = client.mcp().call("tools/list", &json!({})).await.unwrap();
        assert_eq!(status, 200);
        assert_eq!(body, json!({"tools": []}));
    }
}
