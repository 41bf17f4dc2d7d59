use axum::{
    extract::{Path, Query},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use super::{ok, ApiError, ApiResult};
use crate::middleware::Workspace;

#[derive(Debug, Deserialize)]
pub struct CreateProjectRequest {
    pub isim: String,
    #[serde(default)]
    pub tanim: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProjectRequest {
    #[serde(default)]
    pub isim: Option<String>,
    #[serde(default)]
    pub tanim: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Page {
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub offset: usize,
}

pub async fn list(Workspace(ws): Workspace) -> ApiResult<Json<Value>> {
    let projects = ws.service.list_projects()?;
    Ok(Json(json!({
        "success": true,
        "total": projects.len(),
        "data": projects,
    })))
}

pub async fn create(
    Workspace(ws): Workspace,
    Json(request): Json<CreateProjectRequest>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let project = ws.service.create_project(&request.isim, &request.tanim)?;
    tracing::info!(workspace = %ws.id, project = %project.id, "Project created");
    ws.emitter.emit_project_created(
        ws.id.as_str(),
        &project.id,
        serde_json::to_value(&project).unwrap_or_default(),
    );
    Ok((StatusCode::CREATED, ok(project)))
}

pub async fn get_one(Workspace(ws): Workspace, Path(id): Path<String>) -> ApiResult<Json<Value>> {
    Ok(ok(ws.service.get_project(&id)?))
}

pub async fn update(
    Workspace(ws): Workspace,
    Path(id): Path<String>,
    Json(request): Json<UpdateProjectRequest>,
) -> ApiResult<Json<Value>> {
    if request.isim.is_none() && request.tanim.is_none() {
        return Err(ApiError::bad_request("no fields to update"));
    }
    let project = ws
        .service
        .update_project(&id, request.isim.as_deref(), request.tanim.as_deref())?;
    ws.emitter.emit_workspace_sync(ws.id.as_str());
    Ok(ok(project))
}

pub async fn delete_one(Workspace(ws): Workspace, Path(id): Path<String>) -> ApiResult<Json<Value>> {
    let project = ws.service.delete_project(&id)?;
    ws.emitter.emit_workspace_sync(ws.id.as_str());
    Ok(Json(json!({
        "success": true,
        "message": format!("project {} deleted", project.id),
    })))
}

pub async fn tasks(
    Workspace(ws): Workspace,
    Path(id): Path<String>,
    Query(page): Query<Page>,
) -> ApiResult<Json<Value>> {
    let tasks = ws.service.project_tasks(&id, page.limit, page.offset)?;
    Ok(Json(json!({
        "success": true,
        "total": tasks.len(),
        "data": tasks,
    })))
}

pub async fn activate(Workspace(ws): Workspace, Path(id): Path<String>) -> ApiResult<Json<Value>> {
    let project = ws.service.set_active_project(&id)?;
    ws.emitter.emit_workspace_sync(ws.id.as_str());
    Ok(ok(project))
}

pub async fn active(Workspace(ws): Workspace) -> ApiResult<Json<Value>> {
    Ok(ok(ws.service.active_project()?))
}

pub async fn clear_active(Workspace(ws): Workspace) -> ApiResult<Json<Value>> {
    ws.service.clear_active_project()?;
    ws.emitter.emit_workspace_sync(ws.id.as_str());
    Ok(Json(json!({ "success": true })))
}

#[cfg(test)]
mod tests {
    use crate::api::testing::TestApp;
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    #[tokio::test]
    async fn test_project_lifecycle() {
        let app = TestApp::new();
        let ws = app.workspace();
        let id = Some(ws.id.as_str());
        let mut events = app.state.hub.subscribe(ws.id.as_str()).await.unwrap();

        let (status, created) = app
            .request(
                Method::POST,
                "/api/v1/projects",
                id,
                Some(json!({ "isim": "Backend", "tanim": "API" })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        let project_id = created["data"]["id"].as_str().unwrap().to_string();
        assert_eq!(events.events.recv().await.unwrap().type_name(), "project_created");

        let (status, _) = app
            .request(Method::PUT, &format!("/api/v1/projects/{}/activate", project_id), id, None)
            .await;
        assert_eq!(status, StatusCode::OK);

        let (_, active) = app.request(Method::GET, "/api/v1/active-project", id, None).await;
        assert_eq!(active["data"]["id"], project_id.as_str());

        let (_, list) = app.request(Method::GET, "/api/v1/projects", id, None).await;
        assert_eq!(list["data"][0]["is_active"], true);

        let (status, updated) = app
            .request(
                Method::PUT,
                &format!("/api/v1/projects/{}", project_id),
                id,
                Some(json!({ "isim": "Core" })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["data"]["isim"], "Core");

        let (status, tasks) = app
            .request(Method::GET, &format!("/api/v1/projects/{}/tasks?limit=5", project_id), id, None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(tasks["total"], 0);

        let (status, _) = app.request(Method::DELETE, "/api/v1/active-project", id, None).await;
        assert_eq!(status, StatusCode::OK);
        let (_, active) = app.request(Method::GET, "/api/v1/active-project", id, None).await;
        assert!(active["data"].is_null());

        let (status, _) = app
            .request(Method::DELETE, &format!("/api/v1/projects/{}", project_id), id, None)
            .await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = app
            .request(Method::GET, &format!("/api/v1/projects/{}", project_id), id, None)
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_workspaces_do_not_see_each_others_data() {
        let app = TestApp::new();
        let dir_a = tempfile::TempDir::new().unwrap();
        let dir_b = tempfile::TempDir::new().unwrap();

        let mut ids = Vec::new();
        for (dir, name) in [(&dir_a, "A"), (&dir_b, "B")] {
            let (status, body) = app
                .request(
                    Method::POST,
                    "/api/v1/workspaces/register",
                    None,
                    Some(json!({ "path": dir.path(), "name": name })),
                )
                .await;
            assert_eq!(status, StatusCode::OK, "{}", body);
            ids.push(body["workspace_id"].as_str().unwrap().to_string());
        }
        let (a, b) = (Some(ids[0].as_str()), Some(ids[1].as_str()));
        assert_ne!(a, b);

        let (status, _) = app
            .request(Method::POST, "/api/v1/projects", a, Some(json!({ "isim": "Alpha" })))
            .await;
        assert_eq!(status, StatusCode::CREATED);
        let (status, _) = app
            .request(
                Method::POST,
                "/api/v1/tasks/from-template",
                a,
                Some(json!({
                    "template_id": "research",
                    "degerler": { "topic": "t", "purpose": "p", "questions": "q", "criteria": "c" }
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);

        let (_, projects_b) = app.request(Method::GET, "/api/v1/projects", b, None).await;
        assert_eq!(projects_b["total"], 0);
        let (_, tasks_b) = app.request(Method::GET, "/api/v1/tasks?tum_projeler=true", b, None).await;
        assert_eq!(tasks_b["total"], 0);

        let (_, projects_a) = app.request(Method::GET, "/api/v1/projects", a, None).await;
        let names: Vec<&str> = projects_a["data"]
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p["isim"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["Alpha"]);
        let (_, tasks_a) = app.request(Method::GET, "/api/v1/tasks?tum_projeler=true", a, None).await;
        assert_eq!(tasks_a["total"], 1);
    }
}
