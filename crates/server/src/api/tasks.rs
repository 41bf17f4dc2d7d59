use axum::{
    extract::{Path, Query},
    http::StatusCode,
    Json,
};
use gorev_core::service::{parse_due_date, NewTask, TaskUpdate};
use gorev_core::{Priority, TaskFilter};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;

use super::{ok, ApiError, ApiResult};
use crate::middleware::Workspace;

#[derive(Debug, Deserialize)]
pub struct FromTemplateRequest {
    pub template_id: String,
    #[serde(default)]
    pub degerler: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize)]
pub struct SubtaskRequest {
    pub baslik: String,
    #[serde(default)]
    pub aciklama: String,
    #[serde(default)]
    pub oncelik: Option<Priority>,
    #[serde(default)]
    pub son_tarih: Option<String>,
    #[serde(default)]
    pub etiketler: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct ParentRequest {
    /// Absent or empty moves the task to the root level
    #[serde(default)]
    pub parent_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DependencyRequest {
    /// Task the path task will wait for
    pub kaynak_id: String,
    #[serde(default)]
    pub baglanti_tipi: String,
}

pub async fn list(
    Workspace(ws): Workspace,
    Query(filter): Query<TaskFilter>,
) -> ApiResult<Json<Value>> {
    let tasks = ws.service.list_tasks(&filter)?;
    Ok(Json(json!({
        "success": true,
        "total": tasks.len(),
        "data": tasks,
    })))
}

pub async fn get_one(Workspace(ws): Workspace, Path(id): Path<String>) -> ApiResult<Json<Value>> {
    Ok(ok(ws.service.task_detail(&id)?))
}

pub async fn create_from_template(
    Workspace(ws): Workspace,
    Json(request): Json<FromTemplateRequest>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let (template, task) = ws
        .service
        .create_from_template(&request.template_id, &request.degerler)?;
    tracing::info!(workspace = %ws.id, task = %task.id, template = %template.id, "Task created from template");

    ws.refresh_task_count();
    ws.emitter
        .emit_task_created(ws.id.as_str(), &task.id, serde_json::to_value(&task).unwrap_or_default());
    Ok((StatusCode::CREATED, ok(task)))
}

pub async fn update(
    Workspace(ws): Workspace,
    Path(id): Path<String>,
    Json(update): Json<TaskUpdate>,
) -> ApiResult<Json<Value>> {
    if update.is_empty() {
        return Err(ApiError::bad_request("no fields to update"));
    }
    let task = ws.service.update_task(&id, update)?;
    ws.emitter
        .emit_task_updated(ws.id.as_str(), &task.id, serde_json::to_value(&task).unwrap_or_default());
    Ok(ok(task))
}

pub async fn delete_one(Workspace(ws): Workspace, Path(id): Path<String>) -> ApiResult<Json<Value>> {
    let task = ws.service.delete_task(&id)?;
    ws.refresh_task_count();
    ws.sync_watches();
    ws.emitter.emit_task_deleted(ws.id.as_str(), &task.id);
    Ok(Json(json!({
        "success": true,
        "message": format!("task {} deleted", task.id),
    })))
}

pub async fn create_subtask(
    Workspace(ws): Workspace,
    Path(parent_id): Path<String>,
    Json(request): Json<SubtaskRequest>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let due_date = match request.son_tarih.as_deref().map(str::trim) {
        Some(date) if !date.is_empty() => Some(parse_due_date(date)?),
        _ => None,
    };
    let task = ws.service.create_subtask(
        &parent_id,
        NewTask {
            title: request.baslik,
            description: request.aciklama,
            priority: request.oncelik.unwrap_or_default(),
            due_date,
            tags: request.etiketler,
            ..Default::default()
        },
    )?;

    ws.refresh_task_count();
    ws.emitter
        .emit_task_created(ws.id.as_str(), &task.id, serde_json::to_value(&task).unwrap_or_default());
    Ok((StatusCode::CREATED, ok(task)))
}

pub async fn change_parent(
    Workspace(ws): Workspace,
    Path(id): Path<String>,
    Json(request): Json<ParentRequest>,
) -> ApiResult<Json<Value>> {
    let parent = request.parent_id.as_deref().map(str::trim).filter(|p| !p.is_empty());
    let task = ws.service.change_parent(&id, parent)?;
    ws.emitter.emit_workspace_sync(ws.id.as_str());
    Ok(ok(task))
}

pub async fn hierarchy(Workspace(ws): Workspace, Path(id): Path<String>) -> ApiResult<Json<Value>> {
    Ok(ok(ws.service.hierarchy(&id)?))
}

pub async fn add_dependency(
    Workspace(ws): Workspace,
    Path(id): Path<String>,
    Json(request): Json<DependencyRequest>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let edge = ws
        .service
        .add_dependency(&request.kaynak_id, &id, &request.baglanti_tipi)?;
    ws.emitter.emit_workspace_sync(ws.id.as_str());
    Ok((StatusCode::CREATED, ok(edge)))
}

pub async fn remove_dependency(
    Workspace(ws): Workspace,
    Path((id, dep_id)): Path<(String, String)>,
) -> ApiResult<Json<Value>> {
    ws.service.remove_dependency(&id, &dep_id)?;
    ws.emitter.emit_workspace_sync(ws.id.as_str());
    Ok(Json(json!({ "success": true })))
}

#[cfg(test)]
mod tests {
    use crate::api::testing::TestApp;
    use axum::http::{Method, StatusCode};
    use gorev_core::service::NewTask;
    use serde_json::json;

    #[tokio::test]
    async fn test_task_crud_through_workspace_headers() {
        let app = TestApp::new();
        let ws = app.workspace();
        let id = Some(ws.id.as_str());
        let mut events = app.state.hub.subscribe(ws.id.as_str()).await.unwrap();

        let (status, created) = app
            .request(
                Method::POST,
                "/api/v1/tasks/from-template",
                id,
                Some(json!({
                    "template_id": "research",
                    "degerler": { "topic": "caching", "purpose": "p", "questions": "q", "criteria": "c" }
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{}", created);
        let task_id = created["data"]["id"].as_str().unwrap().to_string();
        assert_eq!(events.events.recv().await.unwrap().type_name(), "task_created");

        let (status, list) = app.request(Method::GET, "/api/v1/tasks?tum_projeler=true", id, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(list["total"], 1);

        let uri = format!("/api/v1/tasks/{}", task_id);
        let (status, updated) = app
            .request(Method::PUT, &uri, id, Some(json!({ "durum": "devam_ediyor" })))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["data"]["durum"], "devam_ediyor");
        assert_eq!(events.events.recv().await.unwrap().type_name(), "task_updated");

        let (status, _) = app.request(Method::PUT, &uri, id, Some(json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = app.request(Method::DELETE, &uri, id, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(events.events.recv().await.unwrap().type_name(), "task_deleted");

        let (status, body) = app.request(Method::GET, &uri, id, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn test_hierarchy_and_dependencies() {
        let app = TestApp::new();
        let ws = app.workspace();
        let id = Some(ws.id.as_str());
        let parent = ws
            .service
            .create_task(NewTask { title: "Parent".into(), ..Default::default() })
            .unwrap();
        let other = ws
            .service
            .create_task(NewTask { title: "Other".into(), ..Default::default() })
            .unwrap();

        let (status, child) = app
            .request(
                Method::POST,
                &format!("/api/v1/tasks/{}/subtasks", parent.id),
                id,
                Some(json!({ "baslik": "Child", "son_tarih": "2030-01-01" })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{}", child);
        let child_id = child["data"]["id"].as_str().unwrap().to_string();

        let (status, tree) = app
            .request(Method::GET, &format!("/api/v1/tasks/{}/hierarchy", parent.id), id, None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(tree["data"]["toplam_alt_gorev"], 1);

        let (status, _) = app
            .request(
                Method::PUT,
                &format!("/api/v1/tasks/{}/parent", child_id),
                id,
                Some(json!({ "parent_id": "" })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);

        let deps = format!("/api/v1/tasks/{}/dependencies", other.id);
        let (status, _) = app
            .request(Method::POST, &deps, id, Some(json!({ "kaynak_id": parent.id })))
            .await;
        assert_eq!(status, StatusCode::CREATED);
        let (status, _) = app
            .request(Method::POST, &deps, id, Some(json!({ "kaynak_id": parent.id })))
            .await;
        assert_eq!(status, StatusCode::CONFLICT);
        let (status, _) = app
            .request(Method::POST, &deps, id, Some(json!({ "kaynak_id": other.id })))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = app
            .request(Method::DELETE, &format!("{}/{}", deps, parent.id), id, None)
            .await;
        assert_eq!(status, StatusCode::OK);
    }
}
