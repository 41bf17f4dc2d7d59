use axum::{
    extract::{Path, State},
    Json,
};
use gorev_client::api::{RegisterWorkspaceRequest, RegisterWorkspaceResponse};
use serde_json::{json, Value};
use std::sync::Arc;

use super::{ApiError, ApiResult};
use crate::config::AppState;

/// Register a workspace directory; registering twice returns the existing entry.
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RegisterWorkspaceRequest>,
) -> ApiResult<Json<RegisterWorkspaceResponse>> {
    if let Some(id) = request.workspace_id.as_deref().filter(|id| !id.is_empty()) {
        if let Ok(context) = state.registry.get(id) {
            return Ok(Json(RegisterWorkspaceResponse {
                success: true,
                workspace_id: context.id.to_string(),
                workspace: context.info(),
            }));
        }
    }

    if request.path.trim().is_empty() {
        return Err(ApiError::bad_request("path is required"));
    }

    let name = request.name.as_deref().filter(|n| !n.trim().is_empty());
    let context = state
        .registry
        .register(std::path::Path::new(request.path.trim()), name)?;
    tracing::info!(workspace = %context.id, path = %context.path.display(), "Workspace registered via API");

    Ok(Json(RegisterWorkspaceResponse {
        success: true,
        workspace_id: context.id.to_string(),
        workspace: context.info(),
    }))
}

pub async fn list(State(state): State<Arc<AppState>>) -> Json<Value> {
    let workspaces = state.registry.list();
    Json(json!({
        "success": true,
        "total": workspaces.len(),
        "workspaces": workspaces,
    }))
}

pub async fn get_one(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let context = state.registry.get(&id)?;
    Ok(Json(json!({ "success": true, "workspace": context.info() })))
}

pub async fn unregister(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    state.registry.unregister(&id)?;
    Ok(Json(json!({
        "success": true,
        "message": format!("workspace {} unregistered", id),
    })))
}

#[cfg(test)]
mod tests {
    use crate::api::testing::TestApp;
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    #[tokio::test]
    async fn test_register_list_get_unregister() {
        let app = TestApp::new();
        let path = app.dir.path().display().to_string();

        let (status, body) = app
            .request(
                Method::POST,
                "/api/v1/workspaces/register",
                None,
                Some(json!({ "path": path, "name": "demo" })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["workspace"]["name"], "demo");
        let id = body["workspace_id"].as_str().unwrap().to_string();
        assert_eq!(id.len(), gorev_core::WorkspaceId::LEN);

        let (_, again) = app
            .request(
                Method::POST,
                "/api/v1/workspaces/register",
                None,
                Some(json!({ "path": path, "name": "other" })),
            )
            .await;
        assert_eq!(again["workspace_id"], id.as_str());
        assert_eq!(again["workspace"]["name"], "demo");

        let (_, list) = app.request(Method::GET, "/api/v1/workspaces", None, None).await;
        assert_eq!(list["workspaces"].as_array().unwrap().len(), 1);

        let uri = format!("/api/v1/workspaces/{}", id);
        let (status, one) = app.request(Method::GET, &uri, None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(one["workspace"]["id"], id.as_str());

        let (status, _) = app.request(Method::DELETE, &uri, None, None).await;
        assert_eq!(status, StatusCode::OK);
        let (status, body) = app.request(Method::DELETE, &uri, None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn test_register_missing_path_is_bad_request() {
        let app = TestApp::new();
        let missing = app.dir.path().join("nope").display().to_string();
        let (status, body) = app
            .request(
                Method::POST,
                "/api/v1/workspaces/register",
                None,
                Some(json!({ "path": missing })),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("does not exist"));
    }
}
