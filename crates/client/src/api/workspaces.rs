use crate::client::DaemonClient;
use crate::config::WorkspaceHeaders;
use crate::error::ClientResult;
use gorev_core::workspace::WorkspaceInfo;
use serde::{Deserialize, Serialize};

pub struct WorkspacesApi<'a> {
    client: &'a DaemonClient,
}

impl<'a> WorkspacesApi<'a> {
    pub(crate) fn new(client: &'a DaemonClient) -> Self {
        Self { client }
    }

    /// Register `path`; an already registered path returns the existing workspace.
    pub async fn register(
        &self,
        path: impl Into<String>,
        name: Option<String>,
    ) -> ClientResult<RegisterWorkspaceResponse> {
        let request = RegisterWorkspaceRequest {
            path: path.into(),
            name,
            workspace_id: None,
        };
        self.client
            .http
            .post("/api/v1/workspaces/register", &request)
            .await
    }

    pub async fn list(&self) -> ClientResult<Vec<WorkspaceInfo>> {
        let response: ListWorkspacesResponse = self.client.http.get("/api/v1/workspaces").await?;
        Ok(response.workspaces)
    }

    pub async fn get(&self, id: &str) -> ClientResult<WorkspaceInfo> {
        let response: WorkspaceResponse = self
            .client
            .http
            .get(&format!("/api/v1/workspaces/{}", id))
            .await?;
        Ok(response.workspace)
    }

    pub async fn unregister(&self, id: &str) -> ClientResult<()> {
        let _: serde_json::Value = self
            .client
            .http
            .delete(&format!("/api/v1/workspaces/{}", id))
            .await?;
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterWorkspaceRequest {
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspace_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterWorkspaceResponse {
    pub success: bool,
    pub workspace_id: String,
    pub workspace: WorkspaceInfo,
}

impl RegisterWorkspaceResponse {
    /// Headers that scope later requests to this workspace.
    pub fn headers(&self) -> WorkspaceHeaders {
        WorkspaceHeaders {
            id: self.workspace_id.clone(),
            path: self.workspace.path.clone(),
            name: self.workspace.name.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ListWorkspacesResponse {
    workspaces: Vec<WorkspaceInfo>,
}

#[derive(Debug, Deserialize)]
struct WorkspaceResponse {
    workspace: WorkspaceInfo,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ClientError;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn info(name: &str) -> serde_json::Value {
        json!({
            "id": "0123456789abcdef",
            "name": name,
            "path": "/tmp/ws",
            "task_count": 3,
            "last_accessed": "2025-01-01T00:00:00Z",
            "created_at": "2025-01-01T00:00:00Z"
        })
    }

    #[tokio::test]
    async fn test_register() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/workspaces/register"))
            .and(body_json(json!({"path": "/tmp/ws", "name": "A"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "workspace_id": "0123456789abcdef",
                "workspace": info("A")
            })))
            .mount(&server)
            .await;

        let client = DaemonClient::builder().base_url(server.uri()).build().unwrap();
        let response = client
            .workspaces()
            .register("/tmp/ws", Some("A".to_string()))
            .await
            .unwrap();

        assert_eq!(response.workspace.task_count, 3);
        let headers = response.headers();
        assert_eq!(headers.id, "0123456789abcdef");
        assert_eq!(headers.path, "/tmp/ws");
        assert_eq!(headers.name, "A");
    }

    #[tokio::test]
    async fn test_list_and_get() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/workspaces"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "workspaces": [info("A")],
                "total": 1
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v1/workspaces/0123456789abcdef"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "workspace": info("A")
            })))
            .mount(&server)
            .await;

        let client = DaemonClient::builder().base_url(server.uri()).build().unwrap();
        assert_eq!(client.workspaces().list().await.unwrap().len(), 1);
        assert_eq!(
            client.workspaces().get("0123456789abcdef").await.unwrap().name,
            "A"
        );
    }

    #[tokio::test]
    async fn test_unregister_unknown() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/api/v1/workspaces/missing"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "success": false,
                "error": "workspace not found: missing"
            })))
            .mount(&server)
            .await;

        let client = DaemonClient::builder().base_url(server.uri()).build().unwrap();
        let err = client.workspaces().unregister("missing").await.unwrap_err();
        assert!(matches!(err, ClientError::Api { status: 404, .. }));
    }
}
